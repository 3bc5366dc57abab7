//! Errors raised by the roast control machines

use thiserror::Error;

use crate::validation::FieldError;

/// Rejections of operator commands. None of these mutate session state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoastError {
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Heater control is disabled by the safety interlock")]
    HeaterLocked,

    #[error("No roast session is active")]
    NotRoasting,
}

impl RoastError {
    pub fn transition(message: impl Into<String>) -> Self {
        RoastError::InvalidTransition(message.into())
    }
}

impl From<FieldError> for RoastError {
    fn from(error: FieldError) -> Self {
        RoastError::Validation(vec![error])
    }
}

impl From<Vec<FieldError>> for RoastError {
    fn from(errors: Vec<FieldError>) -> Self {
        RoastError::Validation(errors)
    }
}

pub type RoastResult<T> = Result<T, RoastError>;
