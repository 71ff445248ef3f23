//! API Error Types

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required field was missing or empty.
    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("{0}")]
    Session(#[from] SessionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            Self::MissingFields(_) | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::Session(err) => {
                tracing::error!(reason = err.as_label(), "Session error in request: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(serde_json::json!({ "status": "error", "message": self.to_string() })),
        )
            .into_response()
    }
}
