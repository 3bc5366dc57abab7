//! HTTP handlers for the manual roast session

use axum::{extract::State, http::StatusCode, Json};
use roast_core::{ManualRoastSettings, ManualSnapshot, RoastLogPatch, RoastProfile, SaveRoastInput};

use super::auto_roast::ToggleRequest;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Current manual session state
pub async fn get_session(State(state): State<AppState>) -> Json<ManualSnapshot> {
    Json(state.manual_roast.snapshot())
}

pub async fn start(
    State(state): State<AppState>,
    Json(settings): Json<ManualRoastSettings>,
) -> AppResult<Json<ManualSnapshot>> {
    let _guard = state.start_guard.lock().await;
    if state.auto_roast.snapshot().is_active() {
        return Err(AppError::Conflict(
            "An automatic roast is in progress".to_string(),
        ));
    }
    Ok(Json(state.manual_roast.start(settings).await?))
}

pub async fn set_heater(
    State(state): State<AppState>,
    Json(input): Json<ToggleRequest>,
) -> AppResult<Json<ManualSnapshot>> {
    Ok(Json(state.manual_roast.set_heater(input.on).await?))
}

pub async fn set_motor(
    State(state): State<AppState>,
    Json(input): Json<ToggleRequest>,
) -> AppResult<Json<ManualSnapshot>> {
    Ok(Json(state.manual_roast.set_motor(input.on).await?))
}

/// Merge edits into the roast log
pub async fn update_log(
    State(state): State<AppState>,
    Json(patch): Json<RoastLogPatch>,
) -> AppResult<Json<ManualSnapshot>> {
    Ok(Json(state.manual_roast.update_log(patch).await?))
}

/// Stop pressed: opens the stop confirmation
pub async fn request_stop(State(state): State<AppState>) -> AppResult<Json<ManualSnapshot>> {
    Ok(Json(state.manual_roast.request_stop().await?))
}

pub async fn confirm_stop(State(state): State<AppState>) -> AppResult<Json<ManualSnapshot>> {
    Ok(Json(state.manual_roast.confirm_stop().await?))
}

pub async fn cancel_stop(State(state): State<AppState>) -> AppResult<Json<ManualSnapshot>> {
    Ok(Json(state.manual_roast.cancel_stop().await?))
}

pub async fn save(
    State(state): State<AppState>,
    Json(input): Json<SaveRoastInput>,
) -> AppResult<(StatusCode, Json<RoastProfile>)> {
    let profile = state.manual_roast.save(input, &state.profiles).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn discard(State(state): State<AppState>) -> AppResult<Json<ManualSnapshot>> {
    Ok(Json(state.manual_roast.discard().await?))
}
