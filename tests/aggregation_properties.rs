use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use team_pr_metrics::analyze::{
    Analyzer, MemberActivity, MetricsEngine, PullRequestActivity, RawDataAnalyzer,
};
use team_pr_metrics::github::{
    classify_comments, Comment, CommentKind, PullRequest, PullRequestRef, RepoCoords,
};
use team_pr_metrics::model::TeamRoster;

const AUTHORS: [&str; 4] = ["alice", "bob", "carol", "dave"];

#[derive(Debug, Clone)]
struct PullRequestShape {
    month: u32,
    merged: bool,
    closed: bool,
    commenters: Vec<(usize, bool)>,
}

fn pull_request_shape() -> impl Strategy<Value = PullRequestShape> {
    (
        1u32..=12,
        any::<bool>(),
        any::<bool>(),
        prop::collection::vec((0usize..AUTHORS.len(), any::<bool>()), 0..12),
    )
        .prop_map(|(month, merged, closed, commenters)| PullRequestShape {
            month,
            merged,
            closed,
            commenters,
        })
}

fn roster() -> TeamRoster {
    TeamRoster::new("core", ["alice", "bob"])
}

fn build(member_prs: Vec<Vec<PullRequestShape>>) -> Vec<MemberActivity> {
    let mut next_id = 0u64;
    member_prs
        .into_iter()
        .zip(AUTHORS)
        .map(|(shapes, username)| {
            let mut activity = MemberActivity::new(username);
            for shape in shapes {
                next_id += 1;
                let number = next_id;
                let created_at = Utc.with_ymd_and_hms(2024, shape.month, 1, 0, 0, 0).unwrap();
                let finished = Utc.with_ymd_and_hms(2024, shape.month, 2, 0, 0, 0).unwrap();
                let pull_request = PullRequest {
                    id: number,
                    number,
                    title: String::new(),
                    url: format!("https://github.com/acme/widgets/pull/{number}"),
                    author: username.into(),
                    created_at,
                    merged_at: shape.merged.then_some(finished),
                    closed_at: (shape.merged || shape.closed).then_some(finished),
                    comment_count: 0,
                    changes: None,
                };
                let comments = shape
                    .commenters
                    .iter()
                    .enumerate()
                    .map(|(i, (author, review))| Comment {
                        id: number * 100 + i as u64,
                        author: AUTHORS[*author].into(),
                        pull_request: PullRequestRef {
                            repository: RepoCoords::new("acme", "widgets"),
                            number,
                        },
                        created_at: finished,
                        body: String::new(),
                        kind: if *review {
                            CommentKind::Review
                        } else {
                            CommentKind::Issue
                        },
                    })
                    .collect();
                activity.pull_requests.push(PullRequestActivity::new(
                    pull_request,
                    classify_comments(comments, &roster()),
                ));
            }
            activity
        })
        .collect()
}

fn team_activity() -> impl Strategy<Value = Vec<MemberActivity>> {
    prop::collection::vec(prop::collection::vec(pull_request_shape(), 0..6), 1..=AUTHORS.len())
        .prop_map(build)
}

proptest! {
    #[test]
    fn member_rates_stay_in_range(activity in team_activity()) {
        let aggregate = activity.aggregate();
        for metric in &aggregate.members {
            prop_assert!(metric.merge_rate <= 100);
            prop_assert!(metric.merged_prs + metric.rejected_prs <= metric.pr_count);
            prop_assert_eq!(
                metric.team_comments_count + metric.other_comments_count,
                metric.issue_comments + metric.review_comments
            );
        }
    }

    #[test]
    fn quarters_partition_pull_requests_and_comments(activity in team_activity()) {
        let aggregate = activity.aggregate();
        let total_prs: usize = aggregate.members.iter().map(|m| m.pr_count).sum();
        let total_comments: usize = aggregate.members.iter().map(|m| m.total_comments()).sum();

        let quarters = &aggregate.quarters;
        prop_assert_eq!(quarters.iter().map(|q| q.total_prs).sum::<usize>(), total_prs);
        prop_assert_eq!(quarters.iter().map(|q| q.total_comments).sum::<usize>(), total_comments);
        for quarter in quarters {
            prop_assert_eq!(
                quarter.team_member_comments + quarter.external_comments,
                quarter.total_comments
            );
            prop_assert!(quarter.developer_count >= 1);
            prop_assert!(quarter.developer_count <= quarter.total_prs);
            if quarter.total_comments > 0 {
                let sum = quarter.team_member_percent + quarter.external_percent;
                prop_assert!((99..=101).contains(&sum));
            }
        }
        prop_assert!(quarters.windows(2).all(|w| w[0].quarter > w[1].quarter));
        // The oldest quarter has nothing to compare against.
        if let Some(oldest) = quarters.last() {
            prop_assert_eq!(oldest.pr_trend, 0.0);
            prop_assert_eq!(oldest.comment_trend, 0.0);
        }
    }

    #[test]
    fn scores_are_bounded(activity in team_activity()) {
        for member in &activity {
            let raw = activity.as_slice().raw_data(&member.username);
            prop_assert!(raw.is_some());
            let scores = MetricsEngine::calculate_scores(&raw.unwrap_or_default());
            let bounded = [
                scores.productivity_score,
                scores.collaboration_score,
                scores.review_quality_score,
            ];
            for score in bounded {
                prop_assert!((0.0..=100.0).contains(&score));
            }
        }
    }
}
