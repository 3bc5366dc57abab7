//! HTTP handlers for saved roast profiles

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use roast_core::{RoastProfile, RoastProfileInput};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ProfileQuery;
use crate::AppState;

/// List profiles, optionally filtered by search term and roast level
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> AppResult<Json<Vec<RoastProfile>>> {
    Ok(Json(state.profiles.list(&query).await?))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

pub async fn recent_profiles(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<RoastProfile>>> {
    Ok(Json(state.profiles.recent(query.limit).await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RoastProfile>> {
    Ok(Json(state.profiles.get(id).await?))
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(input): Json<RoastProfileInput>,
) -> AppResult<(StatusCode, Json<RoastProfile>)> {
    let profile = state.profiles.create(input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Overwrite a profile with the submitted document
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<RoastProfileInput>,
) -> AppResult<Json<RoastProfile>> {
    Ok(Json(state.profiles.update(id, input).await?))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.profiles.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
