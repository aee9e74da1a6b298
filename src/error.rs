//! Client error types

use std::time::Duration;
use thiserror::Error;

/// Backend/client error with classification
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("backend returned HTTP {status}")
        } else {
            format!("backend returned HTTP {status}: {}", body.trim())
        };

        match status {
            401 | 403 => Self::auth(message),
            404 => Self::not_found(message),
            400 | 409 | 422 => Self::validation(message),
            408 | 429 => Self::network(message),
            500..=599 => Self::server(message),
            _ => Self::new(ErrorKind::Server, message),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), "")
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Error classification for retry logic and user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection failures, timeouts, 429 - retryable
    Network,
    /// 401/403 or missing credentials - not retryable
    Auth,
    /// 404 - not retryable
    NotFound,
    /// Bad request or a local precondition failed - not retryable
    Validation,
    /// 5xx - retryable
    Server,
    /// Response body did not match the expected shape
    Decode,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }
}

/// Backoff before the given retry attempt (1-based).
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ClientError::from_status(401, "").kind, ErrorKind::Auth);
        assert_eq!(ClientError::from_status(403, "").kind, ErrorKind::Auth);
        assert_eq!(ClientError::from_status(404, "").kind, ErrorKind::NotFound);
        assert_eq!(ClientError::from_status(422, "").kind, ErrorKind::Validation);
        assert_eq!(ClientError::from_status(503, "").kind, ErrorKind::Server);
        assert_eq!(ClientError::from_status(429, "").kind, ErrorKind::Network);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ClientError::network("timeout").is_retryable());
        assert!(ClientError::server("boom").is_retryable());
        assert!(!ClientError::auth("nope").is_retryable());
        assert!(!ClientError::validation("bad").is_retryable());
        assert!(!ClientError::not_found("gone").is_retryable());
    }

    #[test]
    fn test_status_message_includes_body() {
        let err = ClientError::from_status(500, "  internal  ");
        assert_eq!(err.message, "backend returned HTTP 500: internal");
    }

    #[test]
    fn test_retry_delay_is_linear() {
        let base = Duration::from_millis(100);
        assert_eq!(retry_delay(base, 1), Duration::from_millis(100));
        assert_eq!(retry_delay(base, 3), Duration::from_millis(300));
    }
}
