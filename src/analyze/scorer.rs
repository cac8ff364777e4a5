use chrono::{DateTime, Utc};
use serde::Serialize;

/// Already-aggregated counts for one developer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGitHubData {
    pub prs_created: u64,
    pub prs_merged: u64,
    pub prs_rejected: u64,
    pub pr_review_time_hours: f64,
    pub commit_count: u64,
    pub review_comments_given: u64,
    pub review_comments_received: u64,
    pub issues_created: u64,
    pub issues_closed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    /// Between 0 and 1.
    pub review_participation_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScore {
    pub productivity_score: f64,
    pub collaboration_score: f64,
    pub review_quality_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperMetrics {
    pub developer_id: String,
    pub period: String,
    pub pr_created: u64,
    pub pr_merged: u64,
    pub pr_rejected: u64,
    /// Whole hours.
    pub pr_review_time: u64,
    pub commit_count: u64,
    pub review_comments_given: u64,
    pub review_comments_received: u64,
    pub issues_created: u64,
    pub issues_closed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub collaboration_score: f64,
    pub productivity_score: f64,
    pub review_quality_score: f64,
    pub updated_at: DateTime<Utc>,
}

// Saturation points: reaching the divisor scores 100.
const COMMITS_FOR_FULL: f64 = 20.0;
const PRS_FOR_FULL: f64 = 8.0;
const LINES_FOR_FULL: f64 = 3000.0;
const COMMENTS_FOR_FULL: f64 = 80.0;
const ISSUES_FOR_FULL: f64 = 5.0;
const REVIEW_COMMENTS_FOR_FULL: f64 = 40.0;

pub struct MetricsEngine;

impl MetricsEngine {
    pub fn calculate_scores(data: &RawGitHubData) -> CompositeScore {
        let productivity = Self::productivity_score(
            data.commit_count,
            data.prs_created,
            data.lines_added,
            data.lines_deleted,
        );
        let collaboration = Self::collaboration_score(
            data.review_comments_given,
            data.review_comments_received,
            data.issues_created,
            data.pr_review_time_hours,
            data.review_participation_rate,
        );
        let review_quality = Self::review_quality_score(
            data.prs_merged,
            data.prs_created,
            data.review_comments_given,
            data.pr_review_time_hours,
        );

        CompositeScore {
            productivity_score: productivity.min(100.0),
            collaboration_score: collaboration.min(100.0),
            review_quality_score: review_quality.min(100.0),
        }
    }

    fn productivity_score(
        commits: u64,
        prs_created: u64,
        lines_added: u64,
        lines_deleted: u64,
    ) -> f64 {
        let commit_score = saturating(commits as f64, COMMITS_FOR_FULL);
        let pr_score = saturating(prs_created as f64, PRS_FOR_FULL);
        let code_change_score = saturating((lines_added + lines_deleted) as f64, LINES_FOR_FULL);

        commit_score * 0.4 + pr_score * 0.35 + code_change_score * 0.25
    }

    fn collaboration_score(
        comments_given: u64,
        comments_received: u64,
        issues_created: u64,
        review_time_hours: f64,
        participation_rate: f64,
    ) -> f64 {
        let comments = (comments_given + comments_received) as f64;
        let comment_score = saturating(comments, COMMENTS_FOR_FULL);
        let issue_score = saturating(issues_created as f64, ISSUES_FOR_FULL);
        let response_time_score = (100.0 - review_time_hours * 2.0).max(0.0);
        let participation_score = participation_rate * 100.0;

        comment_score * 0.35
            + issue_score * 0.25
            + response_time_score * 0.2
            + participation_score * 0.2
    }

    fn review_quality_score(
        prs_merged: u64,
        prs_created: u64,
        review_comments: u64,
        review_time_hours: f64,
    ) -> f64 {
        let merge_rate = if prs_created > 0 {
            prs_merged as f64 / prs_created as f64 * 100.0
        } else {
            0.0
        };
        let comment_depth_score = saturating(review_comments as f64, REVIEW_COMMENTS_FOR_FULL);
        let response_time_score = (100.0 - review_time_hours).max(0.0);

        merge_rate * 0.5 + comment_depth_score * 0.3 + response_time_score * 0.2
    }

    pub fn to_metrics(
        developer_id: &str,
        data: &RawGitHubData,
        period: &str,
        updated_at: DateTime<Utc>,
    ) -> DeveloperMetrics {
        let scores = Self::calculate_scores(data);
        DeveloperMetrics {
            developer_id: developer_id.to_string(),
            period: period.to_string(),
            pr_created: data.prs_created,
            pr_merged: data.prs_merged,
            pr_rejected: data.prs_rejected,
            pr_review_time: data.pr_review_time_hours.max(0.0).round() as u64,
            commit_count: data.commit_count,
            review_comments_given: data.review_comments_given,
            review_comments_received: data.review_comments_received,
            issues_created: data.issues_created,
            issues_closed: data.issues_closed,
            lines_added: data.lines_added,
            lines_deleted: data.lines_deleted,
            collaboration_score: scores.collaboration_score,
            productivity_score: scores.productivity_score,
            review_quality_score: scores.review_quality_score,
            updated_at,
        }
    }
}

fn saturating(value: f64, full_at: f64) -> f64 {
    (value / full_at * 100.0).min(100.0)
}
