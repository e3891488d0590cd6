//! Unified error handling for gandictl-core
//!
//! Wraps transport, configuration and lifecycle failures with consistent
//! helper methods.
//!
//! # Example
//!
//! ```rust
//! use gandictl_core::{CoreError, RpcError};
//!
//! let fault = RpcError::Fault { code: 510042, message: "CAUSE_NOTFOUND".to_string() };
//! let err: CoreError = fault.into();
//! assert!(err.is_fault());
//! assert!(!err.is_retryable());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::xmlrpc::RpcError;

/// Core error type for machine lifecycle operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Error from the XML-RPC transport or a server fault
    #[error("XML-RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Operation did not reach a terminal status in time
    #[error("Operation {operation_id} timed out after {timeout:?}")]
    OperationTimeout { operation_id: i64, timeout: Duration },

    /// Operation reached a status other than the in-flight ones or DONE
    #[error("Bad operation status for {operation_id} : {status}")]
    OperationFailed { operation_id: i64, status: String },

    /// Lookup returned no match
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Lookup returned more than one match
    #[error("{count} {kind}s match '{name}', expected exactly one")]
    Ambiguous {
        kind: &'static str,
        name: String,
        count: usize,
    },

    /// Machine has no VM on the provider side yet
    #[error("Machine '{name}' has not been created")]
    NotCreated { name: String },

    #[error("IP address is not set")]
    IpNotSet,

    /// The provider answered with data the driver cannot use
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if a lookup found nothing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }

    /// Returns true if the server answered with an XML-RPC fault
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, CoreError::Rpc(e) if e.is_fault())
    }

    /// Returns true for request timeouts and operation wait timeouts
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Rpc(e) => e.is_timeout(),
            CoreError::OperationTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if a provider-side operation ended badly
    #[must_use]
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, CoreError::OperationFailed { .. })
    }

    /// Returns true if the input was rejected before any call was made
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Rpc(e) => e.is_retryable(),
            CoreError::OperationTimeout { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_from_rpc() {
        let err: CoreError = RpcError::Http {
            status: 503,
            body: "unavailable".to_string(),
        }
        .into();

        assert!(err.is_retryable());
        assert!(!err.is_fault());
        assert!(err.to_string().contains("XML-RPC error"));
    }

    #[test]
    fn test_operation_failed_message() {
        let err = CoreError::OperationFailed {
            operation_id: 77,
            status: "ERROR".to_string(),
        };
        assert!(err.is_operation_failure());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Bad operation status for 77 : ERROR");
    }

    #[test]
    fn test_operation_timeout() {
        let err = CoreError::OperationTimeout {
            operation_id: 3,
            timeout: Duration::from_secs(60),
        };
        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_lookup_errors() {
        let missing = CoreError::NotFound {
            kind: "datacenter",
            name: "XX-YY1".to_string(),
        };
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), "datacenter 'XX-YY1' not found");

        let ambiguous = CoreError::Ambiguous {
            kind: "image",
            name: "Debian".to_string(),
            count: 3,
        };
        assert!(!ambiguous.is_not_found());
        assert!(ambiguous.to_string().contains("3 images"));
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = CoreError::Validation("api key is required".to_string());
        assert!(err.is_bad_request());
        assert!(!err.is_retryable());
    }
}
