use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::leave::LeaveError;
use crate::store::StoreError;

/// Body of every non-2xx response from the leave API.
#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "error": "invalid_transition",
    "message": "cannot approve a leave request that is final_approved"
}))]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::Unauthorized => StatusCode::UNAUTHORIZED,
            LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::InvalidTransition { .. } | LeaveError::ConcurrencyConflict => {
                StatusCode::CONFLICT
            }
            LeaveError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LeaveError::Storage(StoreError::Connection { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            LeaveError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Store details stay in the logs.
        let message = match self {
            LeaveError::Storage(e) => {
                tracing::error!(error = %e, "Leave store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.code().to_string(),
            message,
        })
    }
}
