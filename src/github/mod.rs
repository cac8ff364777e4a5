pub mod activity;
pub mod client;
pub mod comment;
pub mod pull_request;
mod types;

pub use activity::{collect_member, collect_team, CollectOptions};
pub use client::GitHubClient;
pub use comment::{
    classify_comments, fetch_comments, Classification, ClassifiedComment, Comment, CommentCounts,
    CommentKind, PullRequestRef,
};
pub use pull_request::{
    fetch_pull_requests, pull_request_query, ChangeStats, PullRequest, RepoCoords,
};

use crate::error::Result;
use std::future::Future;

pub const PAGE_SIZE: u32 = 100;
/// Search never serves past the 1000th result.
pub const MAX_PAGES: u32 = 10;

/// Read-only source-control queries the pipeline depends on.
#[allow(async_fn_in_trait)]
pub trait SourceControl {
    async fn search_pull_requests(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PullRequest>>;

    async fn list_issue_comments(
        &self,
        repository: &RepoCoords,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Comment>>;

    async fn list_review_comments(
        &self,
        repository: &RepoCoords,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Comment>>;

    async fn pull_request_changes(
        &self,
        repository: &RepoCoords,
        number: u64,
    ) -> Result<ChangeStats>;

    /// Number of issues matching a search query.
    async fn count_issues(&self, query: &str) -> Result<u64>;
}

pub enum Progress<'a> {
    Member {
        username: &'a str,
        index: usize,
        total: usize,
    },
    Page {
        username: &'a str,
        page: u32,
    },
    Comments {
        username: &'a str,
        pull_requests: usize,
    },
}

pub type ProgressCallback<'a> = Box<dyn FnMut(Progress<'_>) + Send + 'a>;

pub fn silent<'a>() -> ProgressCallback<'a> {
    Box::new(|_| {})
}

/// Reads full pages until a short one or the page ceiling; any error fails the whole listing.
pub(crate) async fn paginate<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = vec![];
    for page in 1..=MAX_PAGES {
        let batch = fetch(page, PAGE_SIZE).await?;
        let fetched = batch.len();
        items.extend(batch);
        if fetched < PAGE_SIZE as usize {
            break;
        }
    }
    Ok(items)
}
