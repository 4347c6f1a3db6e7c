//! Identity & membership store.
//!
//! Two sharded maps back the store:
//! - `teams`: team name → [`Team`] (members and their activity flags)
//! - `directory`: user id → names of the teams listing that user
//!
//! Registration inserts the team and then indexes its members in the
//! directory, all under the team's shard write lock, so a lookup that finds
//! a directory entry always finds the complete team. Lock order is team
//! shard, then directory shard; no path acquires them the other way round.

use std::collections::HashSet;

use revhub_core::{
    metrics, CoreError, CoreResult, Member, MemberDirectory, Team, TeamHandle, UserView,
};
use tracing::{debug, info, warn};

use crate::shard::ShardedMap;

pub struct MembershipStore {
    teams: ShardedMap<Team>,
    directory: ShardedMap<Vec<String>>,
}

impl MembershipStore {
    pub fn new(shard_count: usize) -> Self {
        Self {
            teams: ShardedMap::new(shard_count),
            directory: ShardedMap::new(shard_count),
        }
    }

    /// Registers a team with all its members, or nothing at all.
    ///
    /// # Errors
    ///
    /// - `DuplicateMember` when two entries share a `user_id`
    /// - `DuplicateTeam` when `team_name` is already registered
    pub fn register_team(&self, team_name: &str, members: Vec<Member>) -> CoreResult<TeamHandle> {
        if let Some(user_id) = Team::first_duplicate_member(&members) {
            warn!(team_name, user_id, "rejecting team with duplicate member");
            metrics::CONFLICTS.with_label_values(&["duplicate_member"]).inc();
            return Err(CoreError::DuplicateMember {
                team_name: team_name.to_string(),
                user_id: user_id.to_string(),
            });
        }

        let team = Team::new(team_name, members);
        let handle = team.handle();

        let mut shard = self.teams.write_shard(team_name);
        if shard.contains_key(team_name) {
            warn!(team_name, "team already exists");
            metrics::CONFLICTS.with_label_values(&["duplicate_team"]).inc();
            return Err(CoreError::DuplicateTeam {
                team_name: team_name.to_string(),
            });
        }

        let user_ids: Vec<String> = team.members.iter().map(|m| m.user_id.clone()).collect();
        shard.insert(team_name.to_string(), team);
        for user_id in user_ids {
            self.directory
                .write_shard(&user_id)
                .entry(user_id.clone())
                .or_default()
                .push(team_name.to_string());
        }
        drop(shard);

        metrics::TEAMS_CREATED.inc();
        info!(team_name, member_count = handle.member_count, "team registered");
        Ok(handle)
    }

    pub fn get_team(&self, team_name: &str) -> CoreResult<Team> {
        self.teams
            .get_cloned(team_name)
            .ok_or_else(|| CoreError::TeamNotFound {
                team_name: team_name.to_string(),
            })
    }

    /// Names of the teams listing `user_id`, in registration order.
    pub fn teams_of(&self, user_id: &str) -> Vec<String> {
        self.directory.get_cloned(user_id).unwrap_or_default()
    }

    /// Sets the activity flag of every membership of `user_id`.
    ///
    /// Each membership is updated under its own team lock.
    pub fn set_user_active(&self, user_id: &str, is_active: bool) -> CoreResult<UserView> {
        let teams = self.teams_of(user_id);
        if teams.is_empty() {
            return Err(CoreError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }

        let mut username = String::new();
        for team_name in &teams {
            self.teams.with_mut(team_name, |team| {
                let member = team.and_then(|t| t.members.iter_mut().find(|m| m.user_id == user_id));
                if let Some(member) = member {
                    member.is_active = is_active;
                    username.clone_from(&member.username);
                }
            });
        }

        debug!(user_id, is_active, team_count = teams.len(), "user activity updated");
        Ok(UserView {
            user_id: user_id.to_string(),
            username,
            is_active,
            teams,
        })
    }

    /// Returns the team after checking that it lists every id in `user_ids`.
    ///
    /// # Errors
    ///
    /// - `TeamNotFound` when `team_name` is not registered
    /// - `UserNotFound` for the first id the team does not list
    pub fn check_members(&self, team_name: &str, user_ids: &[String]) -> CoreResult<Team> {
        let team = self.get_team(team_name)?;
        if let Some(user_id) = user_ids.iter().find(|id| team.member(id).is_none()) {
            warn!(team_name, user_id = %user_id, "user is not a member of the team");
            return Err(CoreError::UserNotFound {
                user_id: user_id.clone(),
            });
        }
        Ok(team)
    }

    /// Deactivates every listed member of `team_name`.
    ///
    /// Membership is checked first, so an unknown id changes nothing. Each
    /// user is then deactivated in all of their teams, as `set_user_active`
    /// does. Returns the team as it reads afterwards.
    pub fn deactivate_members(&self, team_name: &str, user_ids: &[String]) -> CoreResult<Team> {
        self.check_members(team_name, user_ids)?;

        for user_id in user_ids {
            self.set_user_active(user_id, false)?;
        }

        metrics::TEAM_DEACTIVATIONS.inc();
        info!(team_name, count = user_ids.len(), "team members deactivated");
        self.get_team(team_name)
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub(crate) fn teams(&self) -> &ShardedMap<Team> {
        &self.teams
    }
}

impl MemberDirectory for MembershipStore {
    fn is_active_member(&self, user_id: &str) -> bool {
        self.teams_of(user_id).iter().any(|team_name| {
            self.teams
                .with(team_name, |team| team.is_some_and(|t| t.has_active_member(user_id)))
        })
    }

    fn user_exists(&self, user_id: &str) -> bool {
        self.directory.contains_key(user_id)
    }

    fn active_teammates(&self, user_id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut teammates = Vec::new();

        for team_name in self.teams_of(user_id) {
            self.teams.with(&team_name, |team| {
                let Some(team) = team else { return };
                for member in &team.members {
                    if member.is_active
                        && member.user_id != user_id
                        && seen.insert(member.user_id.clone())
                    {
                        teammates.push(member.user_id.clone());
                    }
                }
            });
        }

        teammates
    }
}
