// Error type of the HTTP layer

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::error::RenderError;

/// API server error types. Messages are shown to clients verbatim.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InternalServerError(String),
    GatewayTimeout(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
        };

        let body = Json(json!({
            "error": {
                "status": status.as_u16(),
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

// Server-side failures are logged in full but reported without paths or arguments.
impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Validation(msg) => Self::BadRequest(msg),
            RenderError::UnknownItem(id) => Self::BadRequest(format!("Unknown item id {}", id)),
            RenderError::UnequippableItem(id) => {
                Self::BadRequest(format!("Item {} cannot be equipped", id))
            }
            RenderError::RenderTimeout(_) => {
                error!("Render job failed: {}", err);
                Self::GatewayTimeout("Render timed out".to_string())
            }
            RenderError::RenderProcess(_)
            | RenderError::ArtifactNotFound { .. }
            | RenderError::PostProcess { .. }
            | RenderError::Io(_) => {
                error!("Render job failed: {}", err);
                Self::InternalServerError("Render failed".to_string())
            }
        }
    }
}
