//! HTTP handlers for the realtime field namespace
//!
//! The roaster hardware bridge pushes readings here and reads back the
//! commands written by the controllers.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use roast_core::{FieldValue, RealtimeField, RoastStatus};

use crate::error::{AppError, AppResult};
use crate::AppState;

fn parse_field(key: &str) -> AppResult<RealtimeField> {
    RealtimeField::from_key(key).ok_or_else(|| AppError::NotFound(format!("Field {}", key)))
}

/// Check that `value` has the scalar type the field holds
fn check_value(field: RealtimeField, value: &FieldValue) -> AppResult<()> {
    let valid = match field {
        RealtimeField::Heater
        | RealtimeField::Motor
        | RealtimeField::PidControl
        | RealtimeField::BeansInserted => value.as_bool().is_some(),
        // Manual sessions report "roasting" as their status
        RealtimeField::Status => value
            .as_str()
            .map(|s| s == "roasting" || RoastStatus::from_str(s).is_some())
            .unwrap_or(false),
        RealtimeField::Phase => value
            .as_str()
            .and_then(RoastStatus::from_str)
            .is_some(),
        _ => value.as_f64().map(f64::is_finite).unwrap_or(false),
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid value for {}: {:?}",
            field.key(),
            value
        )))
    }
}

/// Every field that currently holds a value, keyed by field name
pub async fn list_fields(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<&'static str, FieldValue>>> {
    let snapshot = state.realtime.snapshot().await?;
    Ok(Json(
        snapshot
            .into_iter()
            .map(|(field, value)| (field.key(), value))
            .collect(),
    ))
}

pub async fn get_field(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<Option<FieldValue>>> {
    let field = parse_field(&key)?;
    Ok(Json(state.realtime.read(field).await?))
}

pub async fn put_field(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<FieldValue>,
) -> AppResult<Json<FieldValue>> {
    let field = parse_field(&key)?;
    check_value(field, &value)?;
    state.realtime.write(field, value.clone()).await?;
    Ok(Json(value))
}
