//! Pull request handlers

use crate::{handlers::ApiError, state::AppState, validation};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use revhub_core::PullRequest;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request to open a pull request
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReassignReviewerRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct PullRequestEnvelope {
    pub pr: PullRequest,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequest,
    pub replaced_by: String,
}

/// Create a pull request and assign reviewers
pub async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequest>), ApiError> {
    let Json(req) = payload?;

    validation::validate_id("pull_request_id", &req.pull_request_id)?;
    validation::validate_name("pull_request_name", &req.pull_request_name)?;
    validation::validate_id("author_id", &req.author_id)?;

    info!(
        "Creating pull request: {} (author {})",
        req.pull_request_id, req.author_id
    );

    let pr = state.ledger.create_pull_request(
        &req.pull_request_id,
        &req.pull_request_name,
        &req.author_id,
    )?;

    Ok((StatusCode::CREATED, Json(pr)))
}

/// Mark a pull request merged
pub async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> Result<Json<PullRequestEnvelope>, ApiError> {
    let Json(req) = payload?;
    validation::validate_id("pull_request_id", &req.pull_request_id)?;

    info!("Merging pull request: {}", req.pull_request_id);

    let pr = state.ledger.merge_pull_request(&req.pull_request_id)?;
    Ok(Json(PullRequestEnvelope { pr }))
}

/// Replace one reviewer of an open pull request
pub async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignReviewerRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let Json(req) = payload?;
    validation::validate_id("pull_request_id", &req.pull_request_id)?;
    validation::validate_id("old_user_id", &req.old_user_id)?;

    info!(
        "Reassigning reviewer {} on pull request {}",
        req.old_user_id, req.pull_request_id
    );

    let (pr, replaced_by) = state
        .ledger
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)?;

    Ok(Json(ReassignResponse { pr, replaced_by }))
}
