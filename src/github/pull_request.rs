use crate::error::{Error, FetchUnit, Partial, Result};
use crate::github::{Progress, ProgressCallback, SourceControl, MAX_PAGES, PAGE_SIZE};
use crate::model::Window;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use reqwest::Url;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Issue-style comments as counted by the search index.
    pub comment_count: u32,
    pub changes: Option<ChangeStats>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn is_rejected(&self) -> bool {
        self.closed_at.is_some() && self.merged_at.is_none()
    }

    pub fn repository(&self) -> Result<RepoCoords> {
        RepoCoords::from_pull_request_url(&self.url)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeStats {
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
}

/// `owner/name` of the repository a pull request lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoCoords {
    pub owner: String,
    pub name: String,
}

impl RepoCoords {
    pub fn new(owner: impl ToString, name: impl ToString) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    /// Reads `/{owner}/{repo}/pull/{number}` out of a pull request page URL on any host.
    pub fn from_pull_request_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|_| Error::RepositoryUrl(url.to_string()))?;
        let segments = parsed
            .path_segments()
            .map(|s| s.filter(|s| !s.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default();
        // Owner and name may themselves be called `pull`.
        segments
            .iter()
            .enumerate()
            .skip(2)
            .find(|(index, s)| **s == "pull" && segments.len() > index + 1)
            .map(|(index, _)| Self::new(segments[index - 2], segments[index - 1]))
            .ok_or_else(|| Error::RepositoryUrl(url.to_string()))
    }
}

impl fmt::Display for RepoCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

pub fn pull_request_query(username: &str, window: &Window) -> String {
    format!("author:{username} is:pr {}", window.created_qualifier())
}

/// Collects every pull request `username` opened inside `window`.
///
/// Pages are requested until one comes back short or the page ceiling is hit.
/// A failed page ends pagination and the pages read so far are kept.
pub async fn fetch_pull_requests<S: SourceControl>(
    source: &S,
    username: &str,
    window: &Window,
    cb: &mut ProgressCallback<'_>,
) -> Result<Partial<Vec<PullRequest>>> {
    if username.trim().is_empty() {
        return Err(Error::EmptyUsername);
    }

    let query = pull_request_query(username, window);
    let mut result = Partial::new(vec![]);
    for page in 1..=MAX_PAGES {
        cb(Progress::Page { username, page });
        result.attempt();
        let pull_requests = match source.search_pull_requests(&query, page, PAGE_SIZE).await {
            Ok(pull_requests) => pull_requests,
            Err(err) => {
                result.fail(
                    FetchUnit::PullRequestPage {
                        username: username.to_string(),
                        page,
                    },
                    err,
                );
                break;
            }
        };
        let fetched = pull_requests.len();
        result.data.extend(pull_requests);
        if fetched < PAGE_SIZE as usize {
            break;
        }
        if page == MAX_PAGES {
            tracing::warn!(username, pages = MAX_PAGES, "Stopped at page ceiling");
        }
    }

    // Results shift between pages while the search index updates, and the
    // `created:` qualifier only has day precision.
    result.data = result
        .data
        .into_iter()
        .unique_by(|pr| pr.id)
        .filter(|pr| window.contains(&pr.created_at))
        .collect();
    tracing::debug!(username, count = result.data.len(), "Fetched pull requests");
    Ok(result)
}
