//! Error handling for the axum server. Maps the domain error taxonomy to
//! HTTP status codes and the `{"reason": …}` JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tender_core::error::ProcurementError;

/// Wrapper to convert `ProcurementError` into an axum response.
pub struct AppError(ProcurementError);

impl From<ProcurementError> for AppError {
    fn from(e: ProcurementError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ProcurementError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ProcurementError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ProcurementError::Forbidden(_) => StatusCode::FORBIDDEN,
            ProcurementError::NotFound(_) => StatusCode::NOT_FOUND,
            ProcurementError::Conflict(_) => StatusCode::CONFLICT,
            ProcurementError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "reason": self.0.to_string() }));
        (status, body).into_response()
    }
}
