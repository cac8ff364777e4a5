use crate::analyze::{IssueCounts, MemberActivity, PullRequestActivity};
use crate::error::{FetchUnit, Partial, Result};
use crate::github::{
    fetch_comments, fetch_pull_requests, ChangeStats, Progress, ProgressCallback, PullRequest,
    SourceControl,
};
use crate::model::{TeamRoster, Window};
use futures::{stream, StreamExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Pull requests whose comments are fetched at the same time.
    pub comment_concurrency: usize,
    /// Read commit and line counts from each pull request's detail.
    pub fetch_changes: bool,
    /// Count issues opened and closed by each member.
    pub fetch_issues: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            comment_concurrency: 8,
            fetch_changes: false,
            fetch_issues: false,
        }
    }
}

/// Fetches every roster member's activity, one member at a time.
pub async fn collect_team<S: SourceControl>(
    source: &S,
    roster: &TeamRoster,
    window: &Window,
    options: &CollectOptions,
    cb: &mut ProgressCallback<'_>,
) -> Partial<Vec<MemberActivity>> {
    let mut result = Partial::new(vec![]);
    let total = roster.len();
    for (index, username) in roster.members().enumerate() {
        cb(Progress::Member {
            username,
            index,
            total,
        });
        match collect_member(source, roster, username, window, options, cb).await {
            Ok(member) => {
                let activity = result.absorb(member);
                result.data.push(activity);
            }
            Err(err) => {
                result.attempt();
                result.fail(
                    FetchUnit::Member {
                        username: username.to_string(),
                    },
                    err,
                );
            }
        }
    }
    tracing::info!(
        team = roster.team(),
        members = result.data.len(),
        attempted = result.attempted,
        failed = result.failures.len(),
        "Collected team activity"
    );
    result
}

pub async fn collect_member<S: SourceControl>(
    source: &S,
    roster: &TeamRoster,
    username: &str,
    window: &Window,
    options: &CollectOptions,
    cb: &mut ProgressCallback<'_>,
) -> Result<Partial<MemberActivity>> {
    let mut result = Partial::new(MemberActivity::new(username));
    let fetched = fetch_pull_requests(source, username, window, cb).await?;
    let pull_requests = result.absorb(fetched);

    cb(Progress::Comments {
        username,
        pull_requests: pull_requests.len(),
    });
    let activities = stream::iter(pull_requests)
        .map(|pull_request| {
            collect_pull_request(source, roster, pull_request, options.fetch_changes)
        })
        .buffered(options.comment_concurrency.max(1))
        .collect::<Vec<_>>()
        .await;
    for activity in activities {
        let activity = result.absorb(activity);
        result.data.pull_requests.push(activity);
    }

    if options.fetch_issues {
        let counts = fetch_issue_counts(source, username, window).await;
        let issues = result.absorb(counts);
        result.data.issues = issues;
    }
    Ok(result)
}

async fn collect_pull_request<S: SourceControl>(
    source: &S,
    roster: &TeamRoster,
    mut pull_request: PullRequest,
    with_changes: bool,
) -> Partial<PullRequestActivity> {
    let mut result = Partial::new(());
    let fetched = fetch_comments(source, &pull_request, roster).await;
    let comments = result.absorb(fetched);
    if with_changes {
        let fetched = fetch_changes(source, &pull_request).await;
        pull_request.changes = result.absorb(fetched);
    }
    result.map(|_| PullRequestActivity {
        pull_request,
        comments,
    })
}

async fn fetch_changes<S: SourceControl>(
    source: &S,
    pull_request: &PullRequest,
) -> Partial<Option<ChangeStats>> {
    let mut result = Partial::new(None);
    result.attempt();
    let unit = FetchUnit::Changes {
        pull_request: pull_request.url.clone(),
    };
    let changes = match pull_request.repository() {
        Ok(repository) => source.pull_request_changes(&repository, pull_request.number).await,
        Err(err) => Err(err),
    };
    match changes {
        Ok(changes) => result.data = Some(changes),
        Err(err) => result.fail(unit, err),
    }
    result
}

pub fn issue_query(username: &str, window: &Window, closed: bool) -> String {
    let state = if closed { " is:closed" } else { "" };
    format!(
        "author:{username} is:issue{state} {}",
        window.created_qualifier()
    )
}

async fn fetch_issue_counts<S: SourceControl>(
    source: &S,
    username: &str,
    window: &Window,
) -> Partial<IssueCounts> {
    let mut result = Partial::new(IssueCounts::default());
    result.attempt();
    let created_query = issue_query(username, window, false);
    let closed_query = issue_query(username, window, true);
    let (created, closed) = futures::join!(
        source.count_issues(&created_query),
        source.count_issues(&closed_query),
    );
    match (created, closed) {
        (Ok(created), Ok(closed)) => result.data = IssueCounts { created, closed },
        (Err(err), _) | (_, Err(err)) => result.fail(
            FetchUnit::Issues {
                username: username.to_string(),
            },
            err,
        ),
    }
    result
}
