use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pull request counts by lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub open: u64,
    pub merged: u64,
}

/// Point-in-time aggregate view of the registry.
///
/// Maps are ordered so repeated snapshots serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_teams: u64,
    /// Distinct user ids across all teams.
    pub total_members: u64,
    pub total_pull_requests: u64,
    pub pull_requests_per_author: BTreeMap<String, u64>,
    pub pull_requests_by_status: StatusCounts,
    /// Number of pull requests listing each user as reviewer.
    pub review_assignments_per_user: BTreeMap<String, u64>,
}
