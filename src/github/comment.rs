use crate::error::{FetchUnit, Partial};
use crate::github::{paginate, PullRequest, RepoCoords, SourceControl};
use crate::model::TeamRoster;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    /// General conversation comment.
    Issue,
    /// Inline comment on the diff.
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Team,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PullRequestRef {
    pub repository: RepoCoords,
    pub number: u64,
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repository, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: u64,
    pub author: String,
    pub pull_request: PullRequestRef,
    pub created_at: DateTime<Utc>,
    pub body: String,
    pub kind: CommentKind,
}

impl Comment {
    pub fn classify(&self, roster: &TeamRoster) -> Classification {
        if roster.contains(&self.author) {
            Classification::Team
        } else {
            Classification::External
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub classification: Classification,
}

impl ClassifiedComment {
    pub fn is_team(&self) -> bool {
        self.classification == Classification::Team
    }
}

/// Tags each comment against the roster, oldest first.
pub fn classify_comments(comments: Vec<Comment>, roster: &TeamRoster) -> Vec<ClassifiedComment> {
    let mut classified = comments
        .into_iter()
        .map(|comment| ClassifiedComment {
            classification: comment.classify(roster),
            comment,
        })
        .collect::<Vec<_>>();
    classified.sort_by(|a, b| {
        a.comment
            .created_at
            .cmp(&b.comment.created_at)
            .then(a.comment.id.cmp(&b.comment.id))
    });
    classified
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommentCounts {
    pub team_issue: usize,
    pub team_review: usize,
    pub external_issue: usize,
    pub external_review: usize,
}

impl CommentCounts {
    pub fn of(comments: &[ClassifiedComment]) -> Self {
        comments.iter().fold(Self::default(), |mut acc, c| {
            match (c.classification, c.comment.kind) {
                (Classification::Team, CommentKind::Issue) => acc.team_issue += 1,
                (Classification::Team, CommentKind::Review) => acc.team_review += 1,
                (Classification::External, CommentKind::Issue) => acc.external_issue += 1,
                (Classification::External, CommentKind::Review) => acc.external_review += 1,
            }
            acc
        })
    }

    pub fn team(&self) -> usize {
        self.team_issue + self.team_review
    }

    pub fn external(&self) -> usize {
        self.external_issue + self.external_review
    }

    pub fn issue(&self) -> usize {
        self.team_issue + self.external_issue
    }

    pub fn review(&self) -> usize {
        self.team_review + self.external_review
    }

    pub fn total(&self) -> usize {
        self.team() + self.external()
    }
}

impl std::ops::AddAssign for CommentCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.team_issue += rhs.team_issue;
        self.team_review += rhs.team_review;
        self.external_issue += rhs.external_issue;
        self.external_review += rhs.external_review;
    }
}

/// Issue and review comments of one pull request, classified and oldest first.
///
/// Any failure (unparsable URL or either listing) drops the pull request's
/// comments and is recorded instead of returned.
pub async fn fetch_comments<S: SourceControl>(
    source: &S,
    pull_request: &PullRequest,
    roster: &TeamRoster,
) -> Partial<Vec<ClassifiedComment>> {
    let mut result = Partial::new(vec![]);
    result.attempt();
    let unit = || FetchUnit::Comments {
        pull_request: pull_request.url.clone(),
    };

    let repository = match pull_request.repository() {
        Ok(repository) => repository,
        Err(err) => {
            result.fail(unit(), err);
            return result;
        }
    };

    let number = pull_request.number;
    // The search index counts issue comments only, so review comments are always listed.
    let issue_comments = async {
        if pull_request.comment_count == 0 {
            return Ok(vec![]);
        }
        paginate(|page, per_page| source.list_issue_comments(&repository, number, page, per_page))
            .await
    };
    let (issue_comments, review_comments) = futures::join!(
        issue_comments,
        paginate(|page, per_page| source.list_review_comments(&repository, number, page, per_page)),
    );
    match (issue_comments, review_comments) {
        (Ok(mut issue_comments), Ok(review_comments)) => {
            issue_comments.extend(review_comments);
            result.data = classify_comments(issue_comments, roster);
        }
        (Err(err), _) | (_, Err(err)) => result.fail(unit(), err),
    }
    result
}
