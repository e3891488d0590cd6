//! Error types for the XML-RPC transport

use thiserror::Error;

/// Errors raised while talking to an XML-RPC endpoint
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Invalid endpoint URL '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The server answered with a `<fault>` document
    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("Malformed XML-RPC document: {0}")]
    Malformed(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Failed to convert XML-RPC value: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for XML-RPC operations
pub type Result<T> = std::result::Result<T, RpcError>;

impl RpcError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        RpcError::Malformed(message.into())
    }

    /// Returns true if the server returned an XML-RPC fault
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, RpcError::Fault { .. })
    }

    /// Returns true if the request never produced a usable HTTP answer
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }

    /// Returns true if the HTTP request timed out
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            RpcError::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if the endpoint answered with a 5xx status
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, RpcError::Http { status, .. } if *status >= 500)
    }

    /// Returns true if retrying the same call might succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_transport() || self.is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_classification() {
        let err = RpcError::Fault {
            code: 510150,
            message: "Error on object : OBJECT_ACCOUNT (CAUSE_UNKNOWN)".to_string(),
        };
        assert!(err.is_fault());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("510150"));
    }

    #[test]
    fn test_http_status_classification() {
        let server = RpcError::Http {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert!(server.is_server_error());
        assert!(server.is_retryable());

        let client = RpcError::Http {
            status: 404,
            body: String::new(),
        };
        assert!(!client.is_server_error());
        assert!(!client.is_retryable());
    }

    #[test]
    fn test_malformed_is_terminal() {
        let err = RpcError::malformed("missing <params>");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("missing <params>"));
    }
}
