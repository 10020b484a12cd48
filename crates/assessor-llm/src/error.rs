use thiserror::Error;

/// Errors raised while calling the upstream model API
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Client could not be built from configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Request never produced a response (connect, DNS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body is not a Messages API response
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// Reply did not call the expected tool
    #[error("upstream response has no `{tool}` tool call")]
    MissingToolCall { tool: &'static str },

    /// Tool input does not match the declared schema
    #[error("`{tool}` output rejected: {reason}")]
    Schema { tool: &'static str, reason: String },
}

impl UpstreamError {
    /// Short machine-readable label for logs and metrics
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
            Self::MissingToolCall { .. } => "missing_tool_call",
            Self::Schema { .. } => "schema",
        }
    }
}
