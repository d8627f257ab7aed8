//! Error types for the gateway crate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use skill_core::{ActionResponse, Sanitized};

/// Message returned when the body is not a JSON action envelope.
pub const BAD_BODY_MESSAGE: &str = "Invalid request body: expected JSON {category, action, params}";

/// Failures the gateway reports to the client, already safe to show.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The skill rejected the request or the vendor call failed.
    #[error("{}", .0.message)]
    Action(Sanitized),

    /// The body could not be read as an action envelope.
    #[error("{}", BAD_BODY_MESSAGE)]
    BadBody,

    /// No route matches the request path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl GatewayError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Action(sanitized) => {
                StatusCode::from_u16(sanitized.status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            Self::BadBody => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ActionResponse::failure(self.to_string()))).into_response()
    }
}
