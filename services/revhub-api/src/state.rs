//! API state management
//!
//! The stores live for the lifetime of the process and are shared by every
//! request through the router state; nothing is held in globals.

use revhub_core::RevhubConfig;
use revhub_storage::{MembershipStore, PullRequestLedger, StatsAggregator};
use std::sync::Arc;
use tracing::info;

/// Shared application state for the API server
#[derive(Clone)]
pub struct AppState {
    /// Teams, members and the user directory
    pub membership: Arc<MembershipStore>,
    /// Pull request records
    pub ledger: Arc<PullRequestLedger>,
    pub stats: Arc<StatsAggregator>,
}

impl AppState {
    /// Create empty stores with `shard_count` shards each.
    pub fn new(shard_count: usize, max_reviewers: usize) -> Self {
        let membership = Arc::new(MembershipStore::new(shard_count));
        let ledger = Arc::new(PullRequestLedger::new(
            membership.clone(),
            shard_count,
            max_reviewers,
        ));
        let stats = Arc::new(StatsAggregator::new(membership.clone(), ledger.clone()));

        Self {
            membership,
            ledger,
            stats,
        }
    }

    pub fn from_config(config: &RevhubConfig) -> Self {
        info!(
            shard_count = config.storage.shard_count,
            max_reviewers = config.reviewers.max_per_pull_request,
            "initializing in-memory stores"
        );
        Self::new(
            config.storage.shard_count,
            config.reviewers.max_per_pull_request,
        )
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&RevhubConfig::default())
    }
}
