//! Error types for the risk monitor

use std::fmt;

use thiserror::Error;

use crate::firewall::EvaluationMode;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the evaluation request an error belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub mode: EvaluationMode,
    pub tx_hash: Option<String>,
}

impl EventContext {
    pub fn new(mode: EvaluationMode, tx_hash: Option<String>) -> Self {
        Self { mode, tx_hash }
    }
}

impl fmt::Display for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tx_hash {
            Some(hash) => write!(f, "{} (tx {})", self.mode, hash),
            None => write!(f, "{}", self.mode),
        }
    }
}

/// Main error type for the risk monitor
#[derive(Error, Debug)]
pub enum Error {
    // Risk evaluation errors
    #[error("Transport error for {context}: {message}")]
    Transport {
        context: EventContext,
        status: Option<u16>,
        message: String,
    },

    #[error("Protocol error for {context}: {message}; raw body: {body}")]
    Protocol {
        context: EventContext,
        message: String,
        body: String,
    },

    #[error("Invalid transaction descriptor: {0}")]
    Validation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Upstream provider errors
    #[error("Block explorer error: {0}")]
    Explorer(String),

    #[error("Custody provider error: {0}")]
    Custody(String),

    #[error("Custody request rejected with HTTP {status}: {body}")]
    CustodyStatus { status: u16, body: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Whether resubmitting the same request by hand could succeed.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { status, .. } => status.map_or(true, |s| s >= 500 || s == 429),
            Error::Explorer(_) | Error::Custody(_) => true,
            Error::CustodyStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Raw response body attached to the error, if any
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Error::Protocol { body, .. } => Some(body),
            Error::CustodyStatus { body, .. } => Some(body),
            _ => None,
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> EventContext {
        EventContext::new(EvaluationMode::Broadcasted, Some("0xabc".to_string()))
    }

    #[test]
    fn test_context_display_includes_hash() {
        assert_eq!(
            context().to_string(),
            "transaction:broadcasted (tx 0xabc)"
        );
        let bare = EventContext::new(EvaluationMode::Prebroadcast, None);
        assert_eq!(bare.to_string(), "transaction:prebroadcast");
    }

    #[test]
    fn test_transport_retryable_by_status() {
        let server = Error::Transport {
            context: context(),
            status: Some(500),
            message: "boom".to_string(),
        };
        let client = Error::Transport {
            context: context(),
            status: Some(401),
            message: "unauthorized".to_string(),
        };
        let network = Error::Transport {
            context: context(),
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(network.is_retryable());
    }

    #[test]
    fn test_protocol_error_surfaces_body() {
        let err = Error::Protocol {
            context: context(),
            message: "expected value".to_string(),
            body: "<html>gateway</html>".to_string(),
        };
        assert_eq!(err.raw_body(), Some("<html>gateway</html>"));
        assert!(err.to_string().contains("<html>gateway</html>"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_validation_not_retryable() {
        assert!(!Error::Validation("missing r".to_string()).is_retryable());
    }
}
