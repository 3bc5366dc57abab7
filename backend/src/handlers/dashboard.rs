//! Dashboard handlers

use axum::{extract::State, Json};
use roast_core::DashboardMetrics;

use crate::error::AppResult;
use crate::AppState;

/// Metrics over the most recent profiles; `null` when none are saved
pub async fn get_metrics(
    State(state): State<AppState>,
) -> AppResult<Json<Option<DashboardMetrics>>> {
    Ok(Json(state.profiles.metrics().await?))
}
