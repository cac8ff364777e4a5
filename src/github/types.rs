use crate::github::{ChangeStats, Comment, CommentKind, PullRequest, PullRequestRef};
use chrono::{DateTime, Utc};
use serde::Deserialize;

// Response payloads ---------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse<T> {
    pub total_count: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    id: u64,
    number: u64,
    title: String,
    html_url: String,
    user: Option<UserPayload>,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    comments: u32,
    pull_request: Option<PullRequestLink>,
}

#[derive(Debug, Default, Deserialize)]
struct PullRequestLink {
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentPayload {
    id: u64,
    user: Option<UserPayload>,
    created_at: DateTime<Utc>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullDetailPayload {
    #[serde(default)]
    commits: u64,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
}

// Conversions ---------------------------------------------------------------

impl SearchItem {
    pub fn into_pull_request(self) -> PullRequest {
        PullRequest {
            id: self.id,
            number: self.number,
            title: self.title,
            url: self.html_url,
            author: self.user.map(|user| user.login).unwrap_or_default(),
            created_at: self.created_at,
            merged_at: self.pull_request.and_then(|pr| pr.merged_at),
            closed_at: self.closed_at,
            comment_count: self.comments,
            changes: None,
        }
    }
}

impl CommentPayload {
    pub fn into_comment(self, pull_request: PullRequestRef, kind: CommentKind) -> Comment {
        Comment {
            id: self.id,
            author: self.user.map(|user| user.login).unwrap_or_default(),
            pull_request,
            created_at: self.created_at,
            body: self.body.unwrap_or_default(),
            kind,
        }
    }
}

impl From<PullDetailPayload> for ChangeStats {
    fn from(payload: PullDetailPayload) -> Self {
        Self {
            commits: payload.commits,
            additions: payload.additions,
            deletions: payload.deletions,
        }
    }
}
