//! HTTP handlers for the automatic roast session

use axum::{extract::State, Json};
use roast_core::{RoastPlan, RoastSnapshot};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Body for on/off actuator commands
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub on: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreHeatRequest {
    pub pre_heat_target_temp: f64,
}

fn ensure_manual_idle(state: &AppState) -> AppResult<()> {
    if state.manual_roast.snapshot().is_active() {
        return Err(AppError::Conflict(
            "A manual roast is in progress".to_string(),
        ));
    }
    Ok(())
}

/// Current automatic session state
pub async fn get_session(State(state): State<AppState>) -> Json<RoastSnapshot> {
    Json(state.auto_roast.snapshot())
}

/// Start pressed: opens the pre-heat dialog
pub async fn start(State(state): State<AppState>) -> AppResult<Json<RoastSnapshot>> {
    let _guard = state.start_guard.lock().await;
    ensure_manual_idle(&state)?;
    Ok(Json(state.auto_roast.request_start().await?))
}

pub async fn confirm_pre_heat(
    State(state): State<AppState>,
    Json(input): Json<PreHeatRequest>,
) -> AppResult<Json<RoastSnapshot>> {
    // Pre-heat is where the automatic session becomes active
    let _guard = state.start_guard.lock().await;
    ensure_manual_idle(&state)?;
    Ok(Json(
        state
            .auto_roast
            .confirm_pre_heat(input.pre_heat_target_temp)
            .await?,
    ))
}

pub async fn beans_inserted(State(state): State<AppState>) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.confirm_beans_inserted().await?))
}

pub async fn acknowledge_turning_point(
    State(state): State<AppState>,
) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.acknowledge_turning_point().await?))
}

pub async fn submit_plan(
    State(state): State<AppState>,
    Json(plan): Json<RoastPlan>,
) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.submit_plan(plan).await?))
}

pub async fn request_finish(State(state): State<AppState>) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.request_finish().await?))
}

pub async fn confirm_finish(State(state): State<AppState>) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.confirm_finish().await?))
}

pub async fn cancel_modal(State(state): State<AppState>) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.cancel_modal().await?))
}

pub async fn stop(State(state): State<AppState>) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.stop().await?))
}

pub async fn set_heater(
    State(state): State<AppState>,
    Json(input): Json<ToggleRequest>,
) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.set_heater(input.on).await?))
}

pub async fn set_motor(
    State(state): State<AppState>,
    Json(input): Json<ToggleRequest>,
) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.set_motor(input.on).await?))
}

pub async fn set_pid_control(
    State(state): State<AppState>,
    Json(input): Json<ToggleRequest>,
) -> AppResult<Json<RoastSnapshot>> {
    Ok(Json(state.auto_roast.set_pid_control(input.on).await?))
}
