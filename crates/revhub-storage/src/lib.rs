//! In-memory stores backing RevHub.
//!
//! - [`MembershipStore`]: teams, members and the user directory
//! - [`PullRequestLedger`]: pull request records and reviewer assignment
//! - [`StatsAggregator`]: point-in-time counts across both

pub mod ledger;
pub mod membership;
pub mod reviewers;
pub mod shard;
pub mod stats;

pub use ledger::PullRequestLedger;
pub use membership::MembershipStore;
pub use shard::ShardedMap;
pub use stats::StatsAggregator;
