//! Core error types and traits for the Zyros client

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Result type alias for Zyros client operations
pub type ZyrosResult<T> = Result<T, ZyrosError>;

/// Unified error trait implemented by [`ZyrosError`].
///
/// - error_code(): Unique code for programmatic error identification
/// - message(): Human-readable error message
/// - context(): Optional additional context
/// - status(): HTTP status the API answered with, if any
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// HTTP status associated with the error
    fn status(&self) -> Option<u16> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> ZyrosResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ZyrosResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context<C: std::fmt::Display>(self, context: C) -> ZyrosResult<T> {
        self.map_err(|e| ZyrosError::other(format!("{}: {}", context, e)))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ZyrosResult<T> {
        self.map_err(|e| ZyrosError::other(format!("{}: {}", f(), e)))
    }
}

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with context message
    fn context<C: std::fmt::Display>(self, context: C) -> ZyrosResult<T>;

    /// Convert Option to Result with lazy context message
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ZyrosResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> ZyrosResult<T> {
        self.ok_or_else(|| ZyrosError::other(context.to_string()))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ZyrosResult<T> {
        self.ok_or_else(|| ZyrosError::other(f().to_string()))
    }
}

/// Main error type for the Zyros client
///
/// The enum is `Clone` because failed fetches are shared between every caller
/// waiting on the same query key and kept on the cache entry afterwards.
#[derive(Error, Debug, Clone)]
pub enum ZyrosError {
    /// Client-side field constraints failed; the request was never sent
    #[error("Validation failed: {errors}")]
    Validation {
        errors: ValidationErrors,
        context: Option<String>,
    },

    /// 401 from the API, or an operation that needs a signed-in user
    #[error("Authentication error: {message}")]
    Auth {
        message: String,
        context: Option<String>,
    },

    /// 409 from the API (e.g. duplicate username)
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// The request never got an HTTP answer
    #[error("Network error: {message}")]
    Network {
        message: String,
        url: Option<String>,
        context: Option<String>,
    },

    /// Any other non-success answer from the API
    #[error("Server error ({status}): {message}")]
    Server {
        status: u16,
        message: String,
        context: Option<String>,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        resource_type: Option<String>,
        context: Option<String>,
    },

    /// Bearer token could not be decoded
    #[error("Token error: {message}")]
    Token {
        message: String,
        context: Option<String>,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Token storage errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// A background task was cancelled before it produced a value
    #[error("Task was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
