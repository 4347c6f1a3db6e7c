//! Central metrics registry and metric definitions
//!
//! Metrics are registered lazily on first access using once_cell::Lazy.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

// ===== API Request Metrics =====

/// Total number of API requests by method, endpoint, and status code
pub static API_REQUEST_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "revhub_api_requests_total",
        "Total number of API requests",
        &["method", "endpoint", "status"]
    )
    .expect("Failed to register API request counter")
});

/// API request duration histogram
pub static API_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "revhub_api_request_duration_seconds",
        "API request duration in seconds",
        &["method", "endpoint"],
        // 0.1ms .. 1s; every handler is an in-memory operation
        vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0]
    )
    .expect("Failed to register API request duration histogram")
});

/// Number of requests currently being served
pub static ACTIVE_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "revhub_active_connections",
        "Number of in-flight requests on the API server"
    )
    .expect("Failed to register active connections gauge")
});

// ===== Registry Metrics =====

pub static TEAMS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("revhub_teams_created_total", "Total number of created teams")
        .expect("Failed to register teams created counter")
});

pub static PULL_REQUESTS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "revhub_pull_requests_created_total",
        "Total number of created pull requests"
    )
    .expect("Failed to register pull requests created counter")
});

pub static PULL_REQUESTS_MERGED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "revhub_pull_requests_merged_total",
        "Total number of pull requests moved to merged"
    )
    .expect("Failed to register pull requests merged counter")
});

pub static REVIEWERS_REASSIGNED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "revhub_reviewers_reassigned_total",
        "Total number of reviewer reassignments"
    )
    .expect("Failed to register reviewers reassigned counter")
});

pub static TEAM_DEACTIVATIONS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "revhub_team_deactivations_total",
        "Total number of bulk team member deactivations"
    )
    .expect("Failed to register team deactivations counter")
});

/// Rejected mutations by error code (duplicate_id, duplicate_team, ...)
pub static CONFLICTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "revhub_conflicts_total",
        "Total number of mutations rejected by a uniqueness or state rule",
        &["code"]
    )
    .expect("Failed to register conflicts counter")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let _ = &*API_REQUEST_COUNT;
        let _ = &*API_REQUEST_DURATION;
        let _ = &*ACTIVE_CONNECTIONS;
        let _ = &*TEAMS_CREATED;
        let _ = &*PULL_REQUESTS_CREATED;
        let _ = &*PULL_REQUESTS_MERGED;
        let _ = &*REVIEWERS_REASSIGNED;
        let _ = &*TEAM_DEACTIVATIONS;
        let _ = &*CONFLICTS;
    }

    #[test]
    fn test_conflict_counter_is_gathered() {
        CONFLICTS.with_label_values(&["duplicate_id"]).inc();

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|m| m.get_name() == "revhub_conflicts_total"));
    }
}
