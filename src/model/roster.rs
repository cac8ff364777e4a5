use crate::error::{Error, Result};
use crate::model::{Member, Profile};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

/// Usernames treated as internal when classifying comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRoster {
    team: String,
    members: IndexSet<String>,
    profiles: IndexMap<String, Profile>,
}

impl TeamRoster {
    pub fn new<I, S>(team: impl ToString, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            team: team.to_string(),
            members: members
                .into_iter()
                .map(|m| m.to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            profiles: IndexMap::new(),
        }
    }

    /// Attaches `profile` to `username` if it is on the roster.
    pub fn with_profile(mut self, username: &str, profile: Profile) -> Self {
        if self.members.contains(username) {
            self.profiles.insert(username.to_string(), profile);
        }
        self
    }

    pub fn profile(&self, username: &str) -> Option<&Profile> {
        self.profiles.get(username)
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn contains(&self, username: &str) -> bool {
        self.members.contains(username)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Source of team rosters, queried once per aggregation run.
pub trait RosterStore {
    fn load_roster(&self, team: &str) -> Result<TeamRoster>;
}

/// Roster store backed by the members config file.
#[derive(Debug, Clone, Default)]
pub struct MemberDirectory {
    members: Vec<Member>,
}

impl MemberDirectory {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn from_config(path: &str) -> Result<Self> {
        Member::from_config(path).map(Self::new)
    }

    /// Every team named in the config, in first-seen order.
    pub fn teams(&self) -> Vec<String> {
        self.members
            .iter()
            .flat_map(|m| m.teams.iter().cloned())
            .unique()
            .collect()
    }
}

impl RosterStore for MemberDirectory {
    fn load_roster(&self, team: &str) -> Result<TeamRoster> {
        if team.trim().is_empty() {
            return Err(Error::MissingTeam);
        }
        let members = self
            .members
            .iter()
            .filter(|m| m.belongs_to(team))
            .collect::<Vec<_>>();
        let roster = members.iter().fold(
            TeamRoster::new(team, members.iter().map(|m| m.username.as_str())),
            |roster, m| roster.with_profile(&m.username, m.profile()),
        );
        if roster.is_empty() {
            tracing::warn!(team, "Team has no members, every comment will count as external");
        }
        Ok(roster)
    }
}
