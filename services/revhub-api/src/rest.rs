use crate::{
    handlers::{
        add_team, create_pull_request, deactivate_members, get_review, get_stats, get_team,
        health_check, merge_pull_request, metrics_handler, reassign_reviewer, set_is_active,
    },
    middleware::track_metrics,
    state::AppState,
};
use axum::{
    extract::Request,
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Builds the Axum router hosting the RevHub REST API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check and metrics
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        // Teams
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/team/deactivateMembers", post(deactivate_members))
        // Users
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
        // Pull requests
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        // Stats
        .route("/stats", get(get_stats))
        .with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span)
                .on_request(|_request: &Request, _span: &Span| {
                    tracing::debug!("started processing request");
                })
                .on_response(log_response)
                .on_failure(|failure: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                    tracing::error!(failure = ?failure, latency_ms = latency.as_millis(), "request failed");
                }),
        )
}

/// One `http_request` span per request, tagged with a fresh request id.
fn make_span(request: &Request) -> Span {
    info_span!(
        "http_request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        uri = %request.uri(),
    )
}

fn log_response(response: &Response, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis();

    if status.is_server_error() {
        tracing::error!(%status, latency_ms, "request failed with server error");
    } else if status.is_client_error() {
        tracing::warn!(%status, latency_ms, "request rejected");
    } else {
        tracing::info!(%status, latency_ms, "request completed");
    }
}
