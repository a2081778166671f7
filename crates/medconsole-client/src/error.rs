use medconsole_core::{CoreError, ErrorCategory, ValidationErrors};
use thiserror::Error;

use crate::imaging::DecodeError;
use crate::storage::StorageError;

/// Errors surfaced by the client services.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Session expired: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to connect to server: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response from server: {0}")]
    InvalidResponse(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported server URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Maps a non-success HTTP status to its error variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Http { status, message },
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn invalid_file(message: impl Into<String>) -> Self {
        Self::InvalidFile(message.into())
    }

    /// HTTP status behind this error, when it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Conflict(_) => Some(409),
            Self::Http { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) | Self::NotAuthenticated => ErrorCategory::Authentication,
            Self::Forbidden(_) => ErrorCategory::Permission,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Conflict(_) => ErrorCategory::Conflict,
            Self::Http { .. } => ErrorCategory::Server,
            Self::Network(_) => ErrorCategory::Network,
            Self::InvalidResponse(_) => ErrorCategory::Serialization,
            Self::Validation(_) | Self::InvalidFile(_) => ErrorCategory::Validation,
            Self::InvalidUrl(_) | Self::UnsupportedScheme(_) | Self::Storage(_) | Self::Io(_) => {
                ErrorCategory::Configuration
            }
            Self::Core(err) => err.category(),
            Self::Decode(_) => ErrorCategory::Decode,
        }
    }
}

/// Convenience result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ClientError::from_status(401, "expired"),
            ClientError::Unauthorized(_)
        ));
        assert!(matches!(
            ClientError::from_status(403, "nope"),
            ClientError::Forbidden(_)
        ));
        assert!(ClientError::from_status(404, "gone").is_not_found());
        let err = ClientError::from_status(500, "boom");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ClientError::from_status(401, "").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            ClientError::from_status(403, "").category(),
            ErrorCategory::Permission
        );
        assert_eq!(
            ClientError::invalid_file("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ClientError::from(DecodeError::Empty).category(),
            ErrorCategory::Decode
        );
    }
}
