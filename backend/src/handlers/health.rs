//! Health check handlers

use axum::{extract::State, Json};
use roast_core::RealtimeField;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub realtime: String,
    pub profiles: String,
}

fn connectivity<T, E>(result: Result<T, E>) -> String {
    match result {
        Ok(_) => "connected".to_string(),
        Err(_) => "disconnected".to_string(),
    }
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let realtime = connectivity(state.realtime.read(RealtimeField::Status).await);
    let profiles = connectivity(state.profiles.recent(Some(1)).await);

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        realtime,
        profiles,
    })
}
