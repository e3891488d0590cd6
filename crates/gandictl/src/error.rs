//! Error types for gandictl
//!
//! Structured errors with suggestions, printed as cargo-style diagnostics.

use colored::Colorize;
use gandictl_core::{ConfigError, CoreError, RpcError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// ```text
/// error: Machine 'web-1' not found
///
///   tip: List known machines: gandictl ls
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    pub fn tip(mut self, text: &str) -> Self {
        self.tips.push(text.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for tip in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", tip);
        }
    }
}

/// Main error type for the gandictl application
#[derive(Error, Debug)]
pub enum GandiCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No API key configured")]
    MissingCredentials,

    #[error("Machine '{name}' not found")]
    MachineNotFound { name: String },

    #[error("Machine '{name}' already exists")]
    MachineExists { name: String },

    #[error("Machine '{name}' has not been created on Gandi")]
    MachineNotCreated { name: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Interrupted")]
    Cancelled,

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for gandictl operations
pub type Result<T> = std::result::Result<T, GandiCtlError>;

impl GandiCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            GandiCtlError::ProfileNotFound { name } => vec![
                "List available profiles: gandictl profile list".to_string(),
                format!("Create profile '{}': gandictl profile set {} --api-key <key>", name, name),
            ],
            GandiCtlError::MissingCredentials => vec![
                "Pass --api-key or set GANDI_APIKEY".to_string(),
                "Store the key in a profile: gandictl profile set <name> --api-key <key> --default"
                    .to_string(),
            ],
            GandiCtlError::MachineNotFound { .. } => {
                vec!["List known machines: gandictl ls".to_string()]
            }
            GandiCtlError::MachineExists { name } => vec![
                format!("Remove it first: gandictl rm {}", name),
                "Or pick another name".to_string(),
            ],
            GandiCtlError::MachineNotCreated { name } => vec![
                format!("Forget the local record: gandictl rm {}", name),
            ],
            GandiCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the endpoint: --url or GANDI_URL".to_string(),
            ],
            GandiCtlError::Timeout { .. } => vec![
                "The operation may still finish; check it with: gandictl operation info <id>"
                    .to_string(),
                "Raise the limit with --wait-timeout, or 0 to wait forever".to_string(),
            ],
            GandiCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());
        if let GandiCtlError::ApiError { message } = self
            && message.contains("CAUSE_BADPARAMETERS")
        {
            diag = diag.detail("Gandi rejected the request parameters");
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<RpcError> for GandiCtlError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Transport(e) if e.is_timeout() => GandiCtlError::Timeout {
                message: e.to_string(),
            },
            RpcError::Transport(e) => GandiCtlError::ConnectionError {
                message: e.to_string(),
            },
            RpcError::InvalidEndpoint { .. } => GandiCtlError::InvalidInput {
                message: err.to_string(),
            },
            _ => GandiCtlError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<CoreError> for GandiCtlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Rpc(rpc) => GandiCtlError::from(rpc),
            CoreError::OperationTimeout { .. } => GandiCtlError::Timeout {
                message: err.to_string(),
            },
            CoreError::OperationFailed { .. } => GandiCtlError::OperationFailed {
                message: err.to_string(),
            },
            CoreError::NotCreated { name } => GandiCtlError::MachineNotCreated { name },
            CoreError::Validation(message) => GandiCtlError::InvalidInput { message },
            CoreError::Config(config) => GandiCtlError::from(config),
            CoreError::NotFound { .. }
            | CoreError::Ambiguous { .. }
            | CoreError::IpNotSet
            | CoreError::UnexpectedResponse(_) => GandiCtlError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for GandiCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => GandiCtlError::ProfileNotFound { name },
            ConfigError::MachineNotFound { name } => GandiCtlError::MachineNotFound { name },
            other => GandiCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GandiCtlError {
    fn from(err: serde_json::Error) -> Self {
        GandiCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for GandiCtlError {
    fn from(err: std::io::Error) -> Self {
        GandiCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for GandiCtlError {
    fn from(err: anyhow::Error) -> Self {
        GandiCtlError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_failure_keeps_provider_message() {
        let err = GandiCtlError::from(CoreError::OperationFailed {
            operation_id: 9,
            status: "ERROR".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Operation failed: Bad operation status for 9 : ERROR"
        );
    }

    #[test]
    fn test_config_errors_map_to_specific_variants() {
        let err = GandiCtlError::from(ConfigError::MachineNotFound {
            name: "web-1".to_string(),
        });
        assert!(matches!(err, GandiCtlError::MachineNotFound { ref name } if name == "web-1"));

        let err = GandiCtlError::from(CoreError::Config(ConfigError::ProfileNotFound {
            name: "prod".to_string(),
        }));
        assert!(matches!(err, GandiCtlError::ProfileNotFound { .. }));
    }

    #[test]
    fn test_fault_becomes_api_error() {
        let err = GandiCtlError::from(CoreError::Rpc(RpcError::Fault {
            code: 510042,
            message: "CAUSE_NOTFOUND".to_string(),
        }));
        assert!(matches!(err, GandiCtlError::ApiError { ref message } if message.contains("CAUSE_NOTFOUND")));
    }

    #[test]
    fn test_missing_credentials_has_suggestions() {
        let suggestions = GandiCtlError::MissingCredentials.suggestions();
        assert!(suggestions.iter().any(|s| s.contains("GANDI_APIKEY")));
    }
}
