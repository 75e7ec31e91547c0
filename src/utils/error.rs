use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeplanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service answered {operation} with HTTP {status}: {body}")]
    HttpStatus {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("SOAP fault [{code}]: {reason}")]
    Fault {
        code: String,
        reason: String,
        detail: Option<String>,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected response to {operation}: {message}")]
    UnexpectedResponse { operation: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Remote,
    Data,
    Local,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NeplanError {
    pub fn unexpected(operation: &str, message: impl Into<String>) -> Self {
        NeplanError::UnexpectedResponse {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            NeplanError::Http(_) | NeplanError::HttpStatus { .. } => ErrorCategory::Transport,
            NeplanError::Fault { .. } | NeplanError::UnexpectedResponse { .. } => {
                ErrorCategory::Remote
            }
            NeplanError::Xml(_)
            | NeplanError::Base64(_)
            | NeplanError::Serialization(_)
            | NeplanError::Csv(_)
            | NeplanError::Zip(_) => ErrorCategory::Data,
            NeplanError::Io(_) => ErrorCategory::Local,
            NeplanError::ConfigError { .. }
            | NeplanError::MissingConfigError { .. }
            | NeplanError::InvalidConfigValueError { .. }
            | NeplanError::ValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Local | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Transport => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            NeplanError::Http(_) => {
                "Check that the web service address is reachable; use --insecure for self-signed certificates"
            }
            NeplanError::HttpStatus { status: 401 | 403, .. } => {
                "Check the user name and the SHA1 password hash (generate one with `neplan crypt`)"
            }
            NeplanError::HttpStatus { .. } => "Check the web service address and the service logs",
            NeplanError::Fault { .. } => {
                "Inspect the fault detail; run with --dump-exchange to see the raw SOAP messages"
            }
            NeplanError::UnexpectedResponse { .. } => {
                "The service version may not match this client; run with --dump-exchange"
            }
            NeplanError::Xml(_) | NeplanError::Base64(_) => {
                "The service returned a malformed message; run with --dump-exchange"
            }
            NeplanError::Io(_) => "Check that the paths exist and are writable",
            NeplanError::Zip(_) => "The downloaded archive is damaged; retry the export",
            NeplanError::Csv(_) | NeplanError::Serialization(_) => "Check the output destination",
            NeplanError::ConfigError { .. }
            | NeplanError::MissingConfigError { .. }
            | NeplanError::InvalidConfigValueError { .. } => {
                "Pass the value on the command line or add it to the config file"
            }
            NeplanError::ValidationError { .. } => "Fix the reported argument and retry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            NeplanError::Fault { reason, detail, .. } => match detail {
                Some(detail) => format!("The service rejected the request: {} ({})", reason, detail),
                None => format!("The service rejected the request: {}", reason),
            },
            NeplanError::MissingConfigError { field } => {
                format!("No value given for '{}'", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NeplanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_is_remote_and_medium() {
        let err = NeplanError::Fault {
            code: "s:Client".to_string(),
            reason: "Project locked".to_string(),
            detail: None,
        };
        assert_eq!(err.category(), ErrorCategory::Remote);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(
            err.user_friendly_message(),
            "The service rejected the request: Project locked"
        );
    }

    #[test]
    fn auth_status_gets_credential_hint() {
        let err = NeplanError::HttpStatus {
            operation: "GetProjects".to_string(),
            status: 401,
            body: String::new(),
        };
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert!(err.recovery_suggestion().contains("crypt"));
    }
}
