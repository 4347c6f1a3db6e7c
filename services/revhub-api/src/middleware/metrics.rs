//! Metrics middleware for tracking API requests
//!
//! Records request count, duration, and in-flight requests for every route.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, Response},
    middleware::Next,
};
use revhub_core::metrics::{ACTIVE_CONNECTIONS, API_REQUEST_COUNT, API_REQUEST_DURATION};
use std::time::Instant;

/// Counts one in-flight request for as long as it lives.
///
/// Dropped with the request future, so a cancelled request is released too.
struct InFlight;

impl InFlight {
    fn start() -> Self {
        ACTIVE_CONNECTIONS.inc();
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        ACTIVE_CONNECTIONS.dec();
    }
}

/// Middleware to track API request metrics
pub async fn track_metrics(req: Request<Body>, next: Next) -> Response<Body> {
    let start = Instant::now();
    let method = req.method().clone();

    // Matched route keeps label cardinality bounded
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unknown".to_string());

    let in_flight = InFlight::start();
    let response = next.run(req).await;
    drop(in_flight);

    let status = response.status().as_u16().to_string();

    API_REQUEST_COUNT
        .with_label_values(&[method.as_str(), &path, &status])
        .inc();
    API_REQUEST_DURATION
        .with_label_values(&[method.as_str(), &path])
        .observe(start.elapsed().as_secs_f64());

    response
}
