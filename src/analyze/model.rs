use crate::github::{ClassifiedComment, CommentCounts, PullRequest};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestActivity {
    pub pull_request: PullRequest,
    pub comments: Vec<ClassifiedComment>,
}

impl PullRequestActivity {
    pub fn new(pull_request: PullRequest, comments: Vec<ClassifiedComment>) -> Self {
        Self {
            pull_request,
            comments,
        }
    }

    pub fn counts(&self) -> CommentCounts {
        CommentCounts::of(&self.comments)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueCounts {
    pub created: u64,
    pub closed: u64,
}

/// Everything fetched for one member over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberActivity {
    pub username: String,
    pub pull_requests: Vec<PullRequestActivity>,
    pub issues: IssueCounts,
}

impl MemberActivity {
    pub fn new(username: impl ToString) -> Self {
        Self {
            username: username.to_string(),
            pull_requests: vec![],
            issues: IssueCounts::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberMetric {
    pub member: String,
    pub pr_count: usize,
    pub merged_prs: usize,
    pub rejected_prs: usize,
    pub merge_rate: u32,
    pub average_comments: u32,
    pub issue_comments: usize,
    pub review_comments: usize,
    pub team_comments_count: usize,
    pub other_comments_count: usize,
}

impl MemberMetric {
    pub fn total_comments(&self) -> usize {
        self.team_comments_count + self.other_comments_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterBucket {
    pub quarter: String,
    pub total_prs: usize,
    pub total_comments: usize,
    pub team_member_comments: usize,
    pub external_comments: usize,
    pub team_member_percent: u32,
    pub external_percent: u32,
    /// Distinct pull request authors.
    pub developer_count: usize,
    /// Two decimals.
    #[serde(rename = "avgCommentsPerPR")]
    pub avg_comments_per_pr: f64,
    /// Percent change against the preceding observed quarter, one decimal.
    pub pr_trend: f64,
    pub comment_trend: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterOrder {
    /// Label descending, for tables.
    MostRecentFirst,
    /// Label ascending, for trend charts.
    Chronological,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub total_prs: usize,
    pub total_merged_prs: usize,
    pub average_merge_rate: f64,
    pub total_team_comments: usize,
    pub total_external_comments: usize,
}

impl TeamSummary {
    pub fn total_comments(&self) -> usize {
        self.total_team_comments + self.total_external_comments
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub members: Vec<MemberMetric>,
    /// Most recent first.
    pub quarters: Vec<QuarterBucket>,
}
