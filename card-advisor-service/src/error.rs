use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use card_flow::FlowError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors returned by the HTTP handlers, rendered as `{"error": {"code", "message"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Flow(e) => {
                error!(error = %e, "Flow error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
