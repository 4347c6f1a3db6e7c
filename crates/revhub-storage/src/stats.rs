//! Stats aggregation over the membership store and the ledger.

use std::collections::HashSet;
use std::sync::Arc;

use revhub_core::{PullRequestStatus, StatsSnapshot};
use tracing::debug;

use crate::ledger::PullRequestLedger;
use crate::membership::MembershipStore;

pub struct StatsAggregator {
    membership: Arc<MembershipStore>,
    ledger: Arc<PullRequestLedger>,
}

impl StatsAggregator {
    pub fn new(membership: Arc<MembershipStore>, ledger: Arc<PullRequestLedger>) -> Self {
        Self { membership, ledger }
    }

    /// Computes a point-in-time snapshot.
    ///
    /// Every ledger shard is read-locked, then every team shard, and all
    /// guards are held until counting is done. A pull request in the
    /// snapshot therefore always has its author's team in it too.
    pub fn get_stats(&self) -> StatsSnapshot {
        let records = self.ledger.records().read_all();
        let teams = self.membership.teams().read_all();

        let mut snapshot = StatsSnapshot::default();

        for shard in &records {
            for pr in shard.values() {
                snapshot.total_pull_requests += 1;
                *snapshot
                    .pull_requests_per_author
                    .entry(pr.author_id.clone())
                    .or_insert(0) += 1;

                match pr.status {
                    PullRequestStatus::Open => snapshot.pull_requests_by_status.open += 1,
                    PullRequestStatus::Merged => snapshot.pull_requests_by_status.merged += 1,
                }

                for reviewer in &pr.assigned_reviewers {
                    *snapshot
                        .review_assignments_per_user
                        .entry(reviewer.clone())
                        .or_insert(0) += 1;
                }
            }
        }

        let mut members = HashSet::new();
        for shard in &teams {
            for team in shard.values() {
                snapshot.total_teams += 1;
                members.extend(team.members.iter().map(|m| m.user_id.as_str()));
            }
        }
        snapshot.total_members = members.len() as u64;

        drop(teams);
        drop(records);

        debug!(
            total_teams = snapshot.total_teams,
            total_pull_requests = snapshot.total_pull_requests,
            "stats computed"
        );
        snapshot
    }
}
