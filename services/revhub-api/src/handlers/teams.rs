//! Team registration handlers

use crate::{handlers::ApiError, state::AppState, validation};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use revhub_core::{Member, PullRequest, Team, TeamHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Request to register a team with its members
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTeamRequest {
    pub team_name: String,
    pub members: Vec<MemberPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberPayload {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamQuery {
    pub team_name: String,
}

/// Request to deactivate several members of one team
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeactivateMembersRequest {
    pub team_name: String,
    pub user_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeactivateMembersResponse {
    pub team: Team,
    pub reassigned: Vec<PullRequest>,
}

/// Register a team and all of its members
pub async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<AddTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamHandle>), ApiError> {
    let Json(req) = payload?;

    validation::validate_id("team_name", &req.team_name)?;
    for member in &req.members {
        validation::validate_id("user_id", &member.user_id)?;
    }

    info!("Registering team: {}", req.team_name);

    let members = req
        .members
        .into_iter()
        .map(|m| Member::new(m.user_id, m.username, m.is_active))
        .collect();
    let handle = state.membership.register_team(&req.team_name, members)?;

    Ok((StatusCode::CREATED, Json(handle)))
}

/// Get a team with its members
pub async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiError> {
    let Query(query) = query?;
    validation::validate_id("team_name", &query.team_name)?;

    debug!("Getting team: {}", query.team_name);

    let team = state.membership.get_team(&query.team_name)?;
    Ok(Json(team))
}

/// Deactivate team members and hand their open reviews to active teammates
pub async fn deactivate_members(
    State(state): State<AppState>,
    payload: Result<Json<DeactivateMembersRequest>, JsonRejection>,
) -> Result<Json<DeactivateMembersResponse>, ApiError> {
    let Json(req) = payload?;

    validation::validate_id("team_name", &req.team_name)?;
    if req.user_ids.is_empty() {
        return Err(ApiError::Validation("user_ids is required".to_string()));
    }
    for user_id in &req.user_ids {
        validation::validate_id("user_id", user_id)?;
    }

    info!(
        "Deactivating {} member(s) of team {}",
        req.user_ids.len(),
        req.team_name
    );

    state.membership.check_members(&req.team_name, &req.user_ids)?;
    // Planned while the flags are still set; no_candidate leaves everything as it was.
    let mut reassigned = state.ledger.hand_over_reviews(&req.user_ids)?;
    let team = state
        .membership
        .deactivate_members(&req.team_name, &req.user_ids)?;
    // Picks up pull requests created between the handover and the flag change.
    reassigned.extend(state.ledger.hand_over_reviews(&req.user_ids)?);

    Ok(Json(DeactivateMembersResponse { team, reassigned }))
}
