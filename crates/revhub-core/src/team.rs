//! Team and member domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User listed in a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique within the owning team.
    pub user_id: String,
    /// Display label, not unique.
    pub username: String,
    pub is_active: bool,
}

impl Member {
    #[must_use]
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active,
        }
    }
}

/// Named group of members. The name is immutable once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    /// Members in registration order.
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a team stamped with the current time.
    #[must_use]
    pub fn new(team_name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            team_name: team_name.into(),
            members,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Looks a member up by user id.
    #[must_use]
    pub fn member(&self, user_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    /// Returns `true` when `user_id` is listed and active in this team.
    #[must_use]
    pub fn has_active_member(&self, user_id: &str) -> bool {
        self.member(user_id).is_some_and(|m| m.is_active)
    }

    /// Returns the first user id that appears more than once, if any.
    #[must_use]
    pub fn first_duplicate_member(members: &[Member]) -> Option<&str> {
        let mut seen = std::collections::HashSet::with_capacity(members.len());
        members
            .iter()
            .find(|m| !seen.insert(m.user_id.as_str()))
            .map(|m| m.user_id.as_str())
    }

    #[must_use]
    pub fn handle(&self) -> TeamHandle {
        TeamHandle {
            team_name: self.team_name.clone(),
            member_count: self.member_count(),
        }
    }
}

/// Summary returned by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamHandle {
    pub team_name: String,
    pub member_count: usize,
}

/// Cross-team view of one user after an activity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub user_id: String,
    /// Username from the most recently registered membership.
    pub username: String,
    pub is_active: bool,
    /// Teams listing this user, in registration order.
    pub teams: Vec<String>,
}
