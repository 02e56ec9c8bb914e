// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → operator-facing responses
// - Provides a consistent error format for `--json` output
// - Never exposes SQL or connection details
// - Logs errors for debugging

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Resource not found
    NotFound,

    /// Invalid input/validation error
    Validation,

    /// Domain invariant violation
    DomainError,

    /// Database/persistence error
    Database,

    /// Object storage or other remote service error
    ExternalService,

    /// File system error
    FileSystem,

    /// Bad configuration file or value
    Configuration,

    /// Other/unknown error
    Internal,
}

impl ErrorType {
    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorType::NotFound | ErrorType::Validation | ErrorType::DomainError => 2,
            ErrorType::Configuration => 3,
            _ => 1,
        }
    }
}

impl ErrorResponse {
    fn new(error_type: ErrorType, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error_type,
            message: message.into(),
            details,
        }
    }

    /// Create error response from AppError
    pub fn from_app_error(error: &AppError) -> Self {
        match error {
            AppError::NotFound => Self::new(ErrorType::NotFound, "Resource not found", None),

            AppError::Domain(domain_error) => Self::new(
                ErrorType::DomainError,
                "Domain validation failed",
                Some(domain_error.to_string()),
            ),

            AppError::InvalidFormat(message) => Self::validation(message.clone()),

            AppError::Database(db_error) => {
                log::error!("Database error: {:?}", db_error);
                Self::new(
                    ErrorType::Database,
                    "Database operation failed",
                    Some("Check logs for details".to_string()),
                )
            }

            AppError::Pool(pool_error) => {
                log::error!("Connection pool error: {}", pool_error);
                Self::new(ErrorType::Database, "Database connection failed", None)
            }

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);
                Self::new(ErrorType::Internal, "Data serialization failed", None)
            }

            AppError::Io(io_error) => {
                log::error!("IO error: {:?}", io_error);
                Self::new(
                    ErrorType::FileSystem,
                    "File system operation failed",
                    Some(io_error.to_string()),
                )
            }

            AppError::Http(http_error) => {
                log::error!("HTTP error: {:?}", http_error);
                Self::new(
                    ErrorType::ExternalService,
                    "Remote service request failed",
                    Some(http_error.to_string()),
                )
            }

            AppError::Storage(message) => Self::new(
                ErrorType::ExternalService,
                "File storage error",
                Some(message.clone()),
            ),

            AppError::Config(message) => Self::new(
                ErrorType::Configuration,
                "Invalid configuration",
                Some(message.clone()),
            ),

            AppError::Other(message) => {
                log::error!("Other error: {}", message);
                Self::new(ErrorType::Internal, message.clone(), None)
            }
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self::new(ErrorType::Validation, message, None)
    }

    /// Create not found error
    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorType::NotFound, format!("{} not found", resource), None)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "Internal error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_not_found_error() {
        let error = ErrorResponse::from_app_error(&AppError::NotFound);
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert_eq!(error.message, "Resource not found");
        assert_eq!(error.error_type.exit_code(), 2);
    }

    #[test]
    fn test_validation_error() {
        let error = ErrorResponse::validation("Invalid input".to_string());
        assert_eq!(error.error_type, ErrorType::Validation);
        assert!(!error.success);
    }

    #[test]
    fn test_domain_error_keeps_details() {
        let error = ErrorResponse::from_app_error(&AppError::Domain(
            DomainError::InvariantViolation("Report number must be digits".to_string()),
        ));
        assert_eq!(error.error_type, ErrorType::DomainError);
        assert!(error.details.unwrap().contains("digits"));
    }

    #[test]
    fn test_invalid_format_is_validation() {
        let error = ErrorResponse::from_app_error(&AppError::InvalidFormat("bad".to_string()));
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.message, "bad");
    }

    #[test]
    fn test_config_error_exit_code() {
        let error = ErrorResponse::from_app_error(&AppError::Config("missing".to_string()));
        assert_eq!(error.error_type.exit_code(), 3);
        assert!(error.to_json().contains("\"configuration\""));
    }
}
