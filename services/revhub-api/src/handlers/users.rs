//! User handlers

use crate::{handlers::ApiError, state::AppState, validation};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use revhub_core::{PullRequestShort, UserView};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

/// Set the activity flag of a user in every team listing them
pub async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let Json(req) = payload?;
    validation::validate_id("user_id", &req.user_id)?;

    info!("Setting is_active={} for user {}", req.is_active, req.user_id);

    let user = state.membership.set_user_active(&req.user_id, req.is_active)?;
    Ok(Json(UserEnvelope { user }))
}

/// List pull requests the user is assigned to review
pub async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let Query(query) = query?;
    validation::validate_id("user_id", &query.user_id)?;

    debug!("Listing reviews for user: {}", query.user_id);

    let pull_requests = state.ledger.reviews_for(&query.user_id)?;
    Ok(Json(ReviewsResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}
