//! Service error type

use crate::agenda::AgendaError;

/// Errors returned by every service operation
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid input (bad CPF, slot outside the grid, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The change collides with existing records (slot taken, duplicate name, ...)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The acting user may not perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The appointment status does not allow the requested change
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Login failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AgendaError> for ServiceError {
    fn from(e: AgendaError) -> Self {
        ServiceError::Internal(e.into())
    }
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }
}
