//! Error types for backend calls.

use thiserror::Error;

/// Result type alias for backend calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// A failed backend call.
///
/// `Display` is the flat message shown to the user; the HTTP status and
/// transport details are kept as fields for logs and JSON output.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// No usable HTTP response (connection refused, timeout, DNS).
    #[error("{message}: {detail}")]
    Transport { message: String, detail: String },

    /// A 2xx response whose body was not the expected JSON.
    #[error("{message}: invalid response body: {detail}")]
    InvalidResponse { message: String, detail: String },
}

impl ApiError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stable snake_case name for machine output.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Status { .. } => "http_status",
            ApiError::Transport { .. } => "transport",
            ApiError::InvalidResponse { .. } => "invalid_response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_is_flat_message() {
        let err = ApiError::Status {
            status: 500,
            message: "Failed to fetch clients".into(),
        };
        assert_eq!(err.to_string(), "Failed to fetch clients");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.kind(), "http_status");
    }

    #[test]
    fn test_transport_has_no_status() {
        let err = ApiError::Transport {
            message: "Failed to fetch clients".into(),
            detail: "connection refused".into(),
        };
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("connection refused"));
    }
}
