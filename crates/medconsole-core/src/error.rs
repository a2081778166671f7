use thiserror::Error;

use crate::validation::ValidationErrors;

/// Core error types for medconsole domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid hospital id: {0}")]
    InvalidHospitalId(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unexpected response shape: {message}")]
    UnexpectedShape { message: String },
}

impl CoreError {
    /// Create a new InvalidHospitalId error
    pub fn invalid_hospital_id(id: impl Into<String>) -> Self {
        Self::InvalidHospitalId(id.into())
    }

    /// Create a new InvalidDate error
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate(value.into())
    }

    /// Create a new UnexpectedShape error
    pub fn unexpected_shape(message: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            message: message.into(),
        }
    }

    /// Get error category for logging and user-facing messaging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidHospitalId(_) | Self::InvalidDate(_) | Self::Validation(_) => {
                ErrorCategory::Validation
            }
            Self::JsonError(_) | Self::UnexpectedShape { .. } => ErrorCategory::Serialization,
        }
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Error categories shared by the core and client crates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Permission,
    NotFound,
    Conflict,
    Network,
    Serialization,
    Decode,
    Server,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authentication => write!(f, "authentication"),
            Self::Permission => write!(f, "permission"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Network => write!(f, "network"),
            Self::Serialization => write!(f, "serialization"),
            Self::Decode => write!(f, "decode"),
            Self::Server => write!(f, "server"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
