//! Error types and handling for Stratus
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting. The five API-facing
//! variants (`Unauthorized`, `NotFound`, `ServerError`, `RateLimited`,
//! `Malformed`) carry the upstream failure taxonomy the sync pipeline keys
//! its fallback decisions on.

use thiserror::Error;

/// Result type alias for Stratus operations
pub type Result<T> = std::result::Result<T, StratusError>;

/// Main error type for Stratus
#[derive(Debug, Error)]
pub enum StratusError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Credentials missing, expired, or refused by the upstream
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The addressed resource does not exist upstream
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Upstream returned a 5xx response
    #[error("Upstream server error: {message}")]
    ServerError { message: String },

    /// Upstream rate limit hit; back off instead of retrying
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Response body could not be decoded into the expected shape
    #[error("Malformed response: {message}")]
    Malformed { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network/transport-level errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl StratusError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        StratusError::Config {
            message: message.into(),
        }
    }

    /// Create a new unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        StratusError::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        StratusError::NotFound {
            message: message.into(),
        }
    }

    /// Create a new upstream server error
    pub fn server<S: Into<String>>(message: S) -> Self {
        StratusError::ServerError {
            message: message.into(),
        }
    }

    /// Create a new rate-limited error
    pub fn rate_limited<S: Into<String>>(message: S) -> Self {
        StratusError::RateLimited {
            message: message.into(),
        }
    }

    /// Create a new malformed-response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        StratusError::Malformed {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        StratusError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        StratusError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        StratusError::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        StratusError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        StratusError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for StratusError {
    fn from(err: std::io::Error) -> Self {
        StratusError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for StratusError {
    fn from(err: serde_yaml::Error) -> Self {
        StratusError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StratusError {
    fn from(err: serde_json::Error) -> Self {
        StratusError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for StratusError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StratusError::timeout(err.to_string())
        } else if err.is_decode() {
            StratusError::malformed(err.to_string())
        } else {
            StratusError::network(err.to_string())
        }
    }
}

impl From<chrono::ParseError> for StratusError {
    fn from(err: chrono::ParseError) -> Self {
        StratusError::validation("datetime", &err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StratusError::config("test config error");
        assert!(matches!(err, StratusError::Config { .. }));

        let err = StratusError::server("test upstream error");
        assert!(matches!(err, StratusError::ServerError { .. }));

        let err = StratusError::validation("field", "test validation error");
        assert!(matches!(err, StratusError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = StratusError::rate_limited("slow down");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Rate limited: slow down");

        let err = StratusError::validation("test_field", "invalid value");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Validation error: test_field - invalid value");
    }
}
