//! Stats handler

use crate::state::AppState;
use axum::{extract::State, Json};
use revhub_core::StatsSnapshot;

/// Point-in-time counts across teams and pull requests
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.get_stats())
}
