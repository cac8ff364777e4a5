use crate::analyze::{
    Aggregate, MemberActivity, MemberMetric, PullRequestActivity, QuarterBucket, QuarterOrder,
    RawGitHubData, TeamSummary,
};
use crate::github::CommentCounts;
use crate::model::Quarter;
use std::collections::{BTreeMap, HashSet};

pub trait Analyzer {
    fn aggregate(&self) -> Aggregate;
}

impl Analyzer for [MemberActivity] {
    fn aggregate(&self) -> Aggregate {
        let members = self.iter().map(member_metric).collect();
        let mut quarters = quarter_buckets(self);
        sort_quarters(&mut quarters, QuarterOrder::MostRecentFirst);
        Aggregate { members, quarters }
    }
}

/// `round(part / whole * 100)`, 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// `round(total / count)`, 0 when `count` is 0.
pub fn rounded_average(total: usize, count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u32
}

/// `(current - previous) / previous * 100`, 0 when `previous` is 0.
pub fn metric_trend(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

pub fn member_metric(activity: &MemberActivity) -> MemberMetric {
    let pull_requests = &activity.pull_requests;
    let pr_count = pull_requests.len();
    let merged_prs = pull_requests
        .iter()
        .filter(|a| a.pull_request.is_merged())
        .count();
    let rejected_prs = pull_requests
        .iter()
        .filter(|a| a.pull_request.is_rejected())
        .count();
    let counts = pull_requests
        .iter()
        .fold(CommentCounts::default(), |mut acc, a| {
            acc += a.counts();
            acc
        });

    MemberMetric {
        member: activity.username.clone(),
        pr_count,
        merged_prs,
        rejected_prs,
        merge_rate: percentage(merged_prs, pr_count),
        average_comments: rounded_average(counts.total(), pr_count),
        issue_comments: counts.issue(),
        review_comments: counts.review(),
        team_comments_count: counts.team(),
        other_comments_count: counts.external(),
    }
}

#[derive(Default)]
struct QuarterTally<'a> {
    pull_requests: usize,
    counts: CommentCounts,
    authors: HashSet<&'a str>,
}

/// One bucket per quarter in which a pull request was created, oldest first.
///
/// Trends compare each bucket with the one before it in this order, so the
/// oldest bucket always has a trend of 0.
pub fn quarter_buckets(members: &[MemberActivity]) -> Vec<QuarterBucket> {
    let mut quarters: BTreeMap<Quarter, QuarterTally<'_>> = BTreeMap::new();
    for activity in members.iter().flat_map(|m| &m.pull_requests) {
        let pull_request = &activity.pull_request;
        let tally = quarters
            .entry(Quarter::of(&pull_request.created_at))
            .or_default();
        tally.pull_requests += 1;
        tally.counts += activity.counts();
        tally.authors.insert(&pull_request.author);
    }

    let mut previous: Option<(usize, usize)> = None;
    quarters
        .into_iter()
        .map(|(quarter, tally)| {
            let counts = tally.counts;
            let (pr_trend, comment_trend) = match previous {
                Some((prs, comments)) => (
                    metric_trend(tally.pull_requests as f64, prs as f64),
                    metric_trend(counts.total() as f64, comments as f64),
                ),
                None => (0.0, 0.0),
            };
            previous = Some((tally.pull_requests, counts.total()));
            let avg_comments_per_pr = if tally.pull_requests == 0 {
                0.0
            } else {
                counts.total() as f64 / tally.pull_requests as f64
            };
            QuarterBucket {
                quarter: quarter.label(),
                total_prs: tally.pull_requests,
                total_comments: counts.total(),
                team_member_comments: counts.team(),
                external_comments: counts.external(),
                team_member_percent: percentage(counts.team(), counts.total()),
                external_percent: percentage(counts.external(), counts.total()),
                developer_count: tally.authors.len(),
                avg_comments_per_pr: round_to(avg_comments_per_pr, 2),
                pr_trend: round_to(pr_trend, 1),
                comment_trend: round_to(comment_trend, 1),
            }
        })
        .collect()
}

pub fn sort_quarters(buckets: &mut [QuarterBucket], order: QuarterOrder) {
    match order {
        QuarterOrder::MostRecentFirst => buckets.sort_by(|a, b| b.quarter.cmp(&a.quarter)),
        QuarterOrder::Chronological => buckets.sort_by(|a, b| a.quarter.cmp(&b.quarter)),
    }
}

pub fn team_summary(metrics: &[MemberMetric]) -> TeamSummary {
    let average_merge_rate = if metrics.is_empty() {
        0.0
    } else {
        let sum: u32 = metrics.iter().map(|m| m.merge_rate).sum();
        (sum as f64 / metrics.len() as f64 * 10.0).round() / 10.0
    };
    TeamSummary {
        total_prs: metrics.iter().map(|m| m.pr_count).sum(),
        total_merged_prs: metrics.iter().map(|m| m.merged_prs).sum(),
        average_merge_rate,
        total_team_comments: metrics.iter().map(|m| m.team_comments_count).sum(),
        total_external_comments: metrics.iter().map(|m| m.other_comments_count).sum(),
    }
}

pub trait RawDataAnalyzer {
    /// Scorer input for `username`, with teammates' activity used for the review side.
    fn raw_data(&self, username: &str) -> Option<RawGitHubData>;
}

impl RawDataAnalyzer for [MemberActivity] {
    fn raw_data(&self, username: &str) -> Option<RawGitHubData> {
        let member = self.iter().find(|m| m.username == username)?;
        let teammate_prs = self
            .iter()
            .filter(|m| m.username != username)
            .flat_map(|m| &m.pull_requests)
            .filter(|a| a.pull_request.author != username)
            .collect::<Vec<_>>();

        let own_prs = &member.pull_requests;
        let changes = own_prs
            .iter()
            .filter_map(|a| a.pull_request.changes)
            .fold((0, 0, 0), |acc, c| {
                (acc.0 + c.commits, acc.1 + c.additions, acc.2 + c.deletions)
            });
        let received = own_prs
            .iter()
            .flat_map(|a| &a.comments)
            .filter(|c| c.comment.author != username)
            .count();
        let given = teammate_prs
            .iter()
            .flat_map(|a| &a.comments)
            .filter(|c| c.comment.author == username)
            .count();
        let participated = teammate_prs
            .iter()
            .filter(|a| a.comments.iter().any(|c| c.comment.author == username))
            .count();

        Some(RawGitHubData {
            prs_created: own_prs.len() as u64,
            prs_merged: own_prs.iter().filter(|a| a.pull_request.is_merged()).count() as u64,
            prs_rejected: own_prs.iter().filter(|a| a.pull_request.is_rejected()).count() as u64,
            pr_review_time_hours: review_time_hours(own_prs),
            commit_count: changes.0,
            review_comments_given: given as u64,
            review_comments_received: received as u64,
            issues_created: member.issues.created,
            issues_closed: member.issues.closed,
            lines_added: changes.1,
            lines_deleted: changes.2,
            review_participation_rate: if teammate_prs.is_empty() {
                0.0
            } else {
                participated as f64 / teammate_prs.len() as f64
            },
        })
    }
}

/// Mean hours from opening to the first comment by someone other than the author.
fn review_time_hours(pull_requests: &[PullRequestActivity]) -> f64 {
    let waits = pull_requests
        .iter()
        .filter_map(|a| {
            let author = &a.pull_request.author;
            let first = a.comments.iter().find(|c| &c.comment.author != author)?;
            let seconds = (first.comment.created_at - a.pull_request.created_at).num_seconds();
            Some(seconds.max(0) as f64 / 3600.0)
        })
        .collect::<Vec<_>>();
    if waits.is_empty() {
        0.0
    } else {
        waits.iter().sum::<f64>() / waits.len() as f64
    }
}
