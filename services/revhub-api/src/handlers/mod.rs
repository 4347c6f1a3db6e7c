//! HTTP request handlers

mod error;
pub mod health;
pub mod metrics;
pub mod pull_requests;
pub mod stats;
pub mod teams;
pub mod users;

pub use error::{ApiError, ErrorResponse};
pub use health::health_check;
pub use metrics::metrics_handler;
pub use pull_requests::{create_pull_request, merge_pull_request, reassign_reviewer};
pub use stats::get_stats;
pub use teams::{add_team, deactivate_members, get_team};
pub use users::{get_review, set_is_active};
