use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use spots::SpotsError;

/// Unified error type that renders as a JSON `{"error": "..."}` response
/// with an appropriate HTTP status code.
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<SpotsError> for AppError {
    fn from(e: SpotsError) -> Self {
        let status = match &e {
            SpotsError::NotFound(_) => StatusCode::NOT_FOUND,
            SpotsError::Conflict(_) => StatusCode::CONFLICT,
            SpotsError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SpotsError::Upstream { .. } | SpotsError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, "Request failed");
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}
