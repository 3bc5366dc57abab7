//! Error handling for the roast companion server
//!
//! Provides consistent JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roast_core::{FieldError, RoastError};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Control errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Heater control is locked by the safety interlock")]
    HeaterLocked,

    #[error("No roast session is active")]
    NotRoasting,

    #[error("Conflict: {0}")]
    Conflict(String),

    // Controller task gone
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    // Store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<RoastError> for AppError {
    fn from(error: RoastError) -> Self {
        match error {
            RoastError::InvalidTransition(message) => AppError::InvalidStateTransition(message),
            RoastError::Validation(errors) => AppError::Validation(errors),
            RoastError::HeaterLocked => AppError::HeaterLocked,
            RoastError::NotRoasting => AppError::NotRoasting,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(roast_core::field_errors(&errors))
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            fields: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: errors
                        .first()
                        .map(|e| e.message.clone())
                        .unwrap_or_else(|| "Invalid input".to_string()),
                    field: errors.first().map(|e| e.field.clone()),
                    fields: Some(errors.clone()),
                },
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("BAD_REQUEST", msg.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone()),
            ),
            AppError::HeaterLocked => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "HEATER_LOCKED",
                    "Heater control is disabled for safety. Wait for the temperature to drop.",
                ),
            ),
            AppError::NotRoasting => (
                StatusCode::CONFLICT,
                ErrorDetail::new("NOT_ROASTING", "No roast session is active"),
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", msg.clone()),
            ),
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new("SERVICE_UNAVAILABLE", msg.clone()),
            ),
            AppError::Store(StoreError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("Roast profile {} not found", id)),
            ),
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("STORE_ERROR", "A storage error occurred"),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
