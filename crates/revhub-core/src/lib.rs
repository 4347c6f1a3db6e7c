//! Core domain types, error taxonomy and configuration for RevHub.

pub mod config;
pub mod error;
pub mod metrics;
pub mod pull_request;
pub mod stats;
pub mod team;
pub mod traits;

pub use config::RevhubConfig;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use pull_request::{PullRequest, PullRequestShort, PullRequestStatus};
pub use stats::{StatsSnapshot, StatusCounts};
pub use team::{Member, Team, TeamHandle, UserView};
pub use traits::MemberDirectory;
