use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{from_str, Value};
use std::fs;

/// How a member is shown in reports; both fields may be empty.
#[derive(Debug, Clone, Default, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub avatar_url: String,
    pub role: String,
}

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Member {
    pub username: String,
    pub avatar_url: String,
    pub role: String,
    pub teams: Vec<String>,
}

// Create
impl Member {
    pub fn from_config(path: &str) -> Result<Vec<Self>> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str)
    }

    pub fn new(
        username: impl ToString,
        avatar_url: impl ToString,
        role: impl ToString,
        teams: Vec<impl ToString>,
    ) -> Self {
        Self {
            username: username.to_string(),
            avatar_url: avatar_url.to_string(),
            role: role.to_string(),
            teams: teams.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn belongs_to(&self, team: &str) -> bool {
        self.teams.iter().any(|t| t == team)
    }

    pub fn profile(&self) -> Profile {
        Profile {
            avatar_url: self.avatar_url.clone(),
            role: self.role.clone(),
        }
    }
}

// Parser
impl Member {
    pub fn parse(json_str: &str) -> Result<Vec<Self>> {
        let elements: IndexMap<String, Value> = from_str(json_str)?;
        let mut result = Vec::new();
        for (username, details) in elements {
            if username.trim().is_empty() {
                return Err(Error::Config("Member with empty username".into()));
            }
            let avatar_url = details["avatarUrl"].as_str().unwrap_or_default();
            let role = details["role"].as_str().unwrap_or_default();
            let teams: Vec<String> = match details["teams"].as_array() {
                Some(teams) => teams
                    .iter()
                    .filter_map(|team| team.as_str().map(String::from))
                    .collect(),
                None => {
                    return Err(Error::Config(format!(
                        "Not found 'teams' field for `{username}`"
                    )))
                }
            };
            result.push(Self::new(username, avatar_url, role, teams));
        }
        Ok(result)
    }
}
