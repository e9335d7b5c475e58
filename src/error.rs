//! Unified error types for the traffic client.

use thiserror::Error;

/// Unified error type for the CLI and application glue.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Traffic API error.
    #[error("traffic api error: {0}")]
    Traffic(#[from] TrafficError),
}

/// Errors surfaced by the traffic data access layer.
///
/// Display strings are the user-facing messages; callers can show them
/// directly without inspecting transport details.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrafficError {
    /// A required parameter was missing or invalid. Raised before any I/O.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Backend answered 404.
    #[error("resource not found")]
    NotFound,

    /// Backend answered with a 5xx status.
    #[error("internal server error")]
    Server {
        /// HTTP status code.
        status: u16,
    },

    /// Backend answered with any other non-2xx status.
    #[error("{}", .message.as_deref().unwrap_or("request failed"))]
    Backend {
        /// HTTP status code.
        status: u16,
        /// `message` field of the error body, if the backend sent one.
        message: Option<String>,
    },

    /// The request went out but no response came back.
    #[error("network connection failed, check network settings")]
    Transport(String),

    /// The request could not be built or sent at all.
    #[error("request configuration error")]
    RequestConfig(String),

    /// A 2xx response whose body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TrafficError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            404 => Self::NotFound,
            500..=599 => Self::Server { status },
            _ => Self::Backend {
                status,
                message: backend_message(body),
            },
        }
    }

    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound => "not_found",
            Self::Server { .. } => "server",
            Self::Backend { .. } => "backend",
            Self::Transport(_) => "transport",
            Self::RequestConfig(_) => "request_config",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }

    /// Underlying detail for logs (the display text is what users see).
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Validation(detail)
            | Self::Transport(detail)
            | Self::RequestConfig(detail)
            | Self::InvalidResponse(detail) => Some(detail),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TrafficError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::RequestConfig(err.to_string())
        } else {
            // Timeouts, refused connections and resets all mean no response.
            Self::Transport(err.to_string())
        }
    }
}

/// Pull a non-empty `message` string out of an error body.
fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
