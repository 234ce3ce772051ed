//! Unified application error types for AuthCenter.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Callers branch on [`ErrorKind`],
//! never on the message text.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Missing or malformed input. The caller's fault, never retried.
    InvalidRequest,
    /// Unknown handle or wrong credential. Deliberately uninformative.
    InvalidCredentials,
    /// The principal exists but its status forbids authentication.
    AccountDisabled,
    /// Token signature, structure, algorithm, issuer or kind rejected.
    TokenInvalid,
    /// Token is past its expiry instant.
    TokenExpired,
    /// Session behind a refresh token is absent, revoked or expired.
    SessionInvalid,
    /// A session store operation addressed a session that does not exist.
    SessionNotFound,
    /// The principal referenced by a token no longer exists.
    PrincipalNotFound,
    /// A role required by the operation could not be resolved.
    RoleLookup,
    /// A rate limit was exceeded.
    RateLimited,
    /// A collaborator lookup found nothing.
    NotFound,
    /// Registration collided on the username handle.
    UsernameTaken,
    /// Registration collided on the email handle.
    EmailTaken,
    /// Registration collided on the phone handle.
    PhoneTaken,
    /// The persistence layer failed.
    Persistence,
    /// A persistence call exceeded its deadline.
    Timeout,
    /// Credential hashing failed.
    Hashing,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "INVALID_REQUEST"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::AccountDisabled => write!(f, "ACCOUNT_DISABLED"),
            Self::TokenInvalid => write!(f, "TOKEN_INVALID"),
            Self::TokenExpired => write!(f, "TOKEN_EXPIRED"),
            Self::SessionInvalid => write!(f, "SESSION_INVALID"),
            Self::SessionNotFound => write!(f, "SESSION_NOT_FOUND"),
            Self::PrincipalNotFound => write!(f, "PRINCIPAL_NOT_FOUND"),
            Self::RoleLookup => write!(f, "ROLE_LOOKUP"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::UsernameTaken => write!(f, "USERNAME_TAKEN"),
            Self::EmailTaken => write!(f, "EMAIL_TAKEN"),
            Self::PhoneTaken => write!(f, "PHONE_TAKEN"),
            Self::Persistence => write!(f, "PERSISTENCE"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Hashing => write!(f, "HASHING"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout AuthCenter.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Create the single, uninformative credential failure.
    ///
    /// Unknown handles and wrong passwords both map here.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid credentials")
    }

    /// Create an account-disabled error.
    pub fn account_disabled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccountDisabled, message)
    }

    /// Create a token-invalid error.
    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenInvalid, message)
    }

    /// Create a token-expired error.
    pub fn token_expired() -> Self {
        Self::new(ErrorKind::TokenExpired, "Token has expired")
    }

    /// Create a session-invalid error.
    pub fn session_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionInvalid, message)
    }

    /// Create a session-not-found error.
    pub fn session_not_found(session_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::SessionNotFound,
            format!("Session not found: {session_id}"),
        )
    }

    /// Create a principal-not-found error.
    pub fn principal_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PrincipalNotFound, message)
    }

    /// Create a role-lookup error.
    pub fn role_lookup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RoleLookup, message)
    }

    /// Create a rate-limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a hashing error.
    pub fn hashing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Hashing, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Infrastructure failures the caller may retry with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Persistence | ErrorKind::Timeout)
    }

    /// Rejections that callers are expected to forward to an audit sink.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidCredentials
                | ErrorKind::AccountDisabled
                | ErrorKind::RateLimited
                | ErrorKind::TokenInvalid
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::invalid_credentials();
        assert_eq!(err.to_string(), "INVALID_CREDENTIALS: Invalid credentials");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(AppError::timeout("deadline").is_retryable());
        assert!(AppError::persistence("down").is_retryable());
        assert!(!AppError::invalid_credentials().is_retryable());
        assert!(!AppError::rate_limited("slow down").is_retryable());
    }

    #[test]
    fn test_rate_limit_distinct_from_credentials() {
        let limited = AppError::rate_limited("Too many login attempts");
        let denied = AppError::invalid_credentials();
        assert_ne!(limited.kind, denied.kind);
        assert!(limited.is_security_event());
        assert!(denied.is_security_event());
    }
}
