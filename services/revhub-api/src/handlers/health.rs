//! Liveness endpoint

use tracing::debug;

/// Returns `ok` while the process is serving requests.
pub async fn health_check() -> &'static str {
    debug!("Health check requested");
    "ok"
}
