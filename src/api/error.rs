//! Error responses for the HTTP transport

use crate::error::{error_kind, LadderError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Any ladder failure on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// HTTP status for an error, by its ladder kind
pub fn status_for(error: &anyhow::Error) -> StatusCode {
    match error.downcast_ref::<LadderError>() {
        Some(LadderError::InvalidComposition { .. }) | Some(LadderError::InvalidRequest { .. }) => {
            StatusCode::BAD_REQUEST
        }
        Some(LadderError::Unauthenticated) => StatusCode::UNAUTHORIZED,
        Some(LadderError::Forbidden { .. }) => StatusCode::FORBIDDEN,
        Some(LadderError::ParticipantNotFound { .. }) => StatusCode::NOT_FOUND,
        Some(LadderError::ConcurrencyConflict { .. }) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let kind = error_kind(&self.0);

        let message = if status.is_server_error() {
            error!("Request failed ({}): {:#}", kind, self.0);
            match kind {
                "internal" => "Internal server error".to_string(),
                _ => self.0.to_string(),
            }
        } else {
            debug!("Request rejected ({}): {}", kind, self.0);
            self.0.to_string()
        };

        let body = ErrorBody {
            error: kind.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
