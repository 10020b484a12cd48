use assessor_llm::UpstreamError;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

/// Errors returned by the assessment endpoint
///
/// Messages are sent to the client as plain text. Upstream failures
/// collapse to a generic 500 so no upstream detail leaks.
#[derive(Debug, Error)]
pub enum AssessError {
    #[error("Missing request type")]
    MissingRequestType,

    #[error("Unknown request type")]
    UnknownRequestType(String),

    #[error("Missing user prompt")]
    MissingCurrentLevel,

    #[error("Missing context inputs")]
    MissingSkill,

    #[error("Invalid current level")]
    InvalidCurrentLevel(String),

    #[error("Missing question")]
    MissingQuestion,

    #[error("Missing answer")]
    MissingAnswer,

    /// Body could not be read or parsed
    #[error("{0}")]
    InvalidBody(String),

    #[error("Request body is too large, limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unsupported Content-Type, expected application/json or application/x-www-form-urlencoded")]
    UnsupportedMediaType,

    #[error("Internal Server Error")]
    Upstream(#[from] UpstreamError),
}

impl AssessError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-supplied value that was rejected, for logs
    pub fn rejected_value(&self) -> Option<&str> {
        match self {
            Self::UnknownRequestType(value) | Self::InvalidCurrentLevel(value) => Some(value),
            _ => None,
        }
    }

    /// Outcome label recorded in metrics
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Upstream(e) => e.kind(),
            _ => "invalid",
        }
    }
}

impl IntoResponse for AssessError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
