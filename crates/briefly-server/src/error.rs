use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use briefly_core::error::BrieflyError;

/// Thin `IntoResponse` wrapper — the read-only surface here never needs
/// richer error shapes than "which HTTP status, which message".
pub struct ApiError(BrieflyError);

impl From<BrieflyError> for ApiError {
    fn from(err: BrieflyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BrieflyError::NotFound(_) => StatusCode::NOT_FOUND,
            BrieflyError::Config(_) | BrieflyError::DataShape(_) => StatusCode::BAD_REQUEST,
            BrieflyError::CostCapExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
