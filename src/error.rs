// ABOUTME: Error types for the import console
// ABOUTME: Mirrors the validation / request / cancellation taxonomy with actionable messages

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Client-side precondition failed. Never sent to the backend.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend answered with a non-success status.
    #[error("Request failed ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An in-flight fetch was superseded or its owner was torn down.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Failed to delete some items ({failed} of {total})")]
    PartialDelete { failed: usize, total: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Progress feed error: {0}")]
    Push(String),
}

impl ConsoleError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    pub fn push(message: impl Into<String>) -> Self {
        Self::Push(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// HTTP status if the backend rejected the request.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_exposes_status() {
        let err = ConsoleError::request(404, "Import not found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.to_string(), "Request failed (404): Import not found");
    }

    #[test]
    fn cancellation_is_distinguishable() {
        assert!(ConsoleError::Cancelled.is_cancelled());
        assert!(!ConsoleError::validation("x").is_cancelled());
        assert!(ConsoleError::validation("x").is_validation());
    }

    #[test]
    fn partial_delete_message_is_aggregate() {
        let err = ConsoleError::PartialDelete { failed: 2, total: 5 };
        assert_eq!(err.to_string(), "Failed to delete some items (2 of 5)");
    }
}
