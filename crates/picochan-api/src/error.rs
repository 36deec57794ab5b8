use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use picochan_store::CanvasError;

/// Request rejections. Neither variant is a server fault, so neither is logged
/// above debug level.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed or unacceptable input
    #[error("{0}")]
    Validation(&'static str),

    /// Posting again inside the cooldown
    #[error("slow down")]
    RateLimited,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

impl From<CanvasError> for ApiError {
    fn from(e: CanvasError) -> Self {
        match e {
            CanvasError::BatchTooLarge { .. } => Self::Validation("too many pixels"),
        }
    }
}
