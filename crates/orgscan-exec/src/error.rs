//! Error types for orgscan-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the remote account
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Transport-level failure (DNS, TLS, connection reset)
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The platform rejected the request
    #[error("API error ({status}) {code}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Platform error code (e.g. `INVALID_TYPE`)
        code: String,
        /// Error message from the platform
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Credentials could not be resolved
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// Request timed out
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl ExecError {
    /// Platform error code, if the failure came from the API
    #[must_use]
    pub fn api_code(&self) -> Option<&str> {
        match self {
            ExecError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ExecError::Api {
            status: 400,
            code: "INVALID_TYPE".to_string(),
            message: "sObject type 'ServiceResource' is not supported.".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "API error (400) INVALID_TYPE: sObject type 'ServiceResource' is not supported."
        );
        assert_eq!(err.api_code(), Some("INVALID_TYPE"));
    }

    #[test]
    fn test_api_code_absent_for_transport_errors() {
        let err = ExecError::ConnectionFailed("reset".to_string());
        assert_eq!(err.api_code(), None);
    }
}
