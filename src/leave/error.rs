//! Errors returned by the leave workflow.
//!
//! Every variant except [`LeaveError::Storage`] is a recoverable outcome the
//! presentation layer turns into a user-facing message.

use crate::model::leave_request::LeaveStatus;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaveError {
    #[error("invalid leave request: {0}")]
    Validation(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("not allowed: {0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("cannot {attempted} a leave request that is {from}")]
    InvalidTransition { from: LeaveStatus, attempted: String },
    #[error("the leave request was modified by someone else, reload and try again")]
    ConcurrencyConflict,
    #[error("insufficient leave balance: {available} day(s) left, {requested} requested")]
    InsufficientBalance { available: i32, requested: i64 },
    #[error(transparent)]
    Storage(StoreError),
}

impl LeaveError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn invalid_transition(from: LeaveStatus, attempted: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from,
            attempted: attempted.into(),
        }
    }

    pub fn request_not_found(id: u64) -> Self {
        Self::NotFound(format!("leave request {id}"))
    }

    /// Stable machine-readable code for adapters.
    pub fn code(&self) -> &'static str {
        match self {
            LeaveError::Validation(_) => "validation_error",
            LeaveError::Unauthorized => "unauthorized",
            LeaveError::Forbidden(_) => "forbidden",
            LeaveError::NotFound(_) => "not_found",
            LeaveError::InvalidTransition { .. } => "invalid_transition",
            LeaveError::ConcurrencyConflict => "concurrency_conflict",
            LeaveError::InsufficientBalance { .. } => "insufficient_balance",
            LeaveError::Storage(StoreError::Connection { .. }) => "storage_unavailable",
            LeaveError::Storage(_) => "storage_error",
        }
    }
}

impl From<StoreError> for LeaveError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict => LeaveError::ConcurrencyConflict,
            other => LeaveError::Storage(other),
        }
    }
}
