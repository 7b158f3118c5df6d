//! Error types for the core library

use thiserror::Error;

/// Failures of the authentication endpoints.
///
/// These are the only errors shown to the user, inline on the login form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered")]
    UserAlreadyExists,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Failures of the table endpoints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Not signed in")]
    Unauthenticated,
}

impl ServiceError {
    /// Message text as reported by the backend, without our prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(msg)
            | Self::PermissionDenied(msg)
            | Self::Constraint(msg)
            | Self::Decode(msg) => msg,
            Self::Rejected { message, .. } => message,
            Self::Unauthenticated => "Not signed in",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_message_strips_prefix() {
        let err = ServiceError::Constraint(
            "null value in column \"title\" violates not-null constraint".into(),
        );
        assert!(err.to_string().starts_with("Constraint violation"));
        assert!(err.message().starts_with("null value"));

        let err = ServiceError::Rejected {
            status: 400,
            message: "bad filter".into(),
        };
        assert_eq!(err.message(), "bad filter");
    }

    #[test]
    fn config_error_display() {
        let err = Error::Config("SUPABASE_URL is not set".into());
        assert_eq!(err.to_string(), "Configuration error: SUPABASE_URL is not set");
    }
}
