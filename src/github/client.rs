use crate::error::{Error, Result};
use crate::github::types::{CommentPayload, PullDetailPayload, SearchItem, SearchResponse};
use crate::github::{
    ChangeStats, Comment, CommentKind, PullRequest, PullRequestRef, RepoCoords, SourceControl,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT_HEADER: &str = "team-pr-metrics/1.0";
const ACCEPT_HEADER: &str = "application/vnd.github+json";

/// REST client for github.com or a GitHub Enterprise `/api/v3` base URL.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::MissingToken);
        }
        // `Url::join` drops the last segment unless the base ends with a slash.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|_| Error::BaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::BaseUrl(normalized));
        }
        let http = Client::builder().user_agent(USER_AGENT_HEADER).build()?;
        Ok(Self {
            http,
            base_url,
            token: token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|_| Error::BaseUrl(format!("{}{path}", self.base_url)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::trace!(%url, ?query, "GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .header(ACCEPT, ACCEPT_HEADER)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn list_comments(
        &self,
        path: String,
        pull_request: PullRequestRef,
        kind: CommentKind,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Comment>> {
        let payloads: Vec<CommentPayload> = self
            .get(
                &path,
                &[("per_page", per_page.to_string()), ("page", page.to_string())],
            )
            .await?;
        Ok(payloads
            .into_iter()
            .map(|payload| payload.into_comment(pull_request.clone(), kind))
            .collect())
    }
}

impl SourceControl for GitHubClient {
    async fn search_pull_requests(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PullRequest>> {
        let response: SearchResponse<SearchItem> = self
            .get(
                "search/issues",
                &[
                    ("q", query.to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        Ok(response
            .items
            .into_iter()
            .map(SearchItem::into_pull_request)
            .collect())
    }

    async fn list_issue_comments(
        &self,
        repository: &RepoCoords,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Comment>> {
        let path = format!(
            "repos/{}/{}/issues/{number}/comments",
            repository.owner, repository.name
        );
        let pull_request = PullRequestRef {
            repository: repository.clone(),
            number,
        };
        self.list_comments(path, pull_request, CommentKind::Issue, page, per_page)
            .await
    }

    async fn list_review_comments(
        &self,
        repository: &RepoCoords,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Comment>> {
        let path = format!(
            "repos/{}/{}/pulls/{number}/comments",
            repository.owner, repository.name
        );
        let pull_request = PullRequestRef {
            repository: repository.clone(),
            number,
        };
        self.list_comments(path, pull_request, CommentKind::Review, page, per_page)
            .await
    }

    async fn pull_request_changes(
        &self,
        repository: &RepoCoords,
        number: u64,
    ) -> Result<ChangeStats> {
        let path = format!("repos/{}/{}/pulls/{number}", repository.owner, repository.name);
        let payload: PullDetailPayload = self.get(&path, &[]).await?;
        Ok(payload.into())
    }

    async fn count_issues(&self, query: &str) -> Result<u64> {
        let response: SearchResponse<serde_json::Value> = self
            .get(
                "search/issues",
                &[("q", query.to_string()), ("per_page", "1".to_string())],
            )
            .await?;
        Ok(response.total_count)
    }
}
