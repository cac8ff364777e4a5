use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API token is missing")]
    MissingToken,
    #[error("Team identifier is missing")]
    MissingTeam,
    #[error("Username must not be empty")]
    EmptyUsername,
    #[error("Window start {since} is after window end {until}")]
    InvalidWindow { since: String, until: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Cannot derive repository from pull request URL `{0}`")]
    RepositoryUrl(String),
    #[error("Invalid API base URL `{0}`")]
    BaseUrl(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Report rendering failed: {0}")]
    Report(String),
}

/// Unit of work whose fetch failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum FetchUnit {
    PullRequestPage { username: String, page: u32 },
    Comments { pull_request: String },
    Changes { pull_request: String },
    Issues { username: String },
    Member { username: String },
}

impl fmt::Display for FetchUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchUnit::PullRequestPage { username, page } => {
                write!(f, "pull requests of {username} (page {page})")
            }
            FetchUnit::Comments { pull_request } => write!(f, "comments of {pull_request}"),
            FetchUnit::Changes { pull_request } => write!(f, "changes of {pull_request}"),
            FetchUnit::Issues { username } => write!(f, "issues of {username}"),
            FetchUnit::Member { username } => write!(f, "activity of {username}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FetchFailure {
    #[serde(flatten)]
    pub unit: FetchUnit,
    pub reason: String,
}

impl FetchFailure {
    pub fn new(unit: FetchUnit, reason: impl ToString) -> Self {
        Self {
            unit,
            reason: reason.to_string(),
        }
    }
}

/// Data gathered despite skipped fetches.
///
/// `attempted` counts every remote unit the pipeline tried to read, so callers
/// can report "N of M fetches failed" next to the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T> {
    pub data: T,
    pub attempted: usize,
    pub failures: Vec<FetchFailure>,
}

impl<T> Partial<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            attempted: 0,
            failures: vec![],
        }
    }

    pub fn attempt(&mut self) {
        self.attempted += 1;
    }

    pub fn fail(&mut self, unit: FetchUnit, reason: impl ToString) {
        let failure = FetchFailure::new(unit, reason);
        tracing::warn!(unit = %failure.unit, reason = %failure.reason, "Skipping failed fetch");
        self.failures.push(failure);
    }

    /// Moves the bookkeeping of `other` into `self` and hands back its data.
    pub fn absorb<U>(&mut self, other: Partial<U>) -> U {
        self.attempted += other.attempted;
        self.failures.extend(other.failures);
        other.data
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Partial<U> {
        Partial {
            data: f(self.data),
            attempted: self.attempted,
            failures: self.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_merges_counts_and_failures() {
        let mut outer = Partial::new(Vec::<u32>::new());
        outer.attempt();

        let mut inner = Partial::new(vec![1, 2]);
        inner.attempt();
        inner.attempt();
        inner.fail(
            FetchUnit::Issues {
                username: "alice".into(),
            },
            "boom",
        );

        let data = outer.absorb(inner);
        assert_eq!(data, vec![1, 2]);
        assert_eq!(outer.attempted, 3);
        assert_eq!(outer.failures.len(), 1);
        assert!(!outer.is_complete());
    }

    #[test]
    fn fetch_unit_display_names_the_unit() {
        let unit = FetchUnit::PullRequestPage {
            username: "bob".into(),
            page: 3,
        };
        assert_eq!(unit.to_string(), "pull requests of bob (page 3)");
    }
}
