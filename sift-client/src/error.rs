//! Error types for the Sift client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Sift client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    ///
    /// The orchestrator answers 400 for malformed requests and for requests
    /// naming an unknown run or worker; retrying them will not help.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (400..500).contains(status))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

/// Pull the message out of an `{"error": "..."}` body, falling back to the raw text
pub(crate) fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let missing = ClientError::api_error(404, "run 9");
        assert!(missing.is_not_found());
        assert!(missing.is_client_error());
        assert!(!missing.is_server_error());

        let internal = ClientError::api_error(500, "Internal server error");
        assert!(internal.is_server_error());
        assert!(!internal.is_client_error());
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"error": "unknown run 12"}"#),
            "unknown run 12"
        );
        assert_eq!(extract_message("Bad Gateway"), "Bad Gateway");
    }
}
