//! Constructor methods for ZyrosError

use super::types::ZyrosError;
use crate::validation::ValidationErrors;

/// Fallback shown when neither the API nor the transport gave a message
pub(crate) const UNKNOWN_ERROR: &str = "Unknown error";

impl ZyrosError {
    /// Create a validation error from a collected error list
    pub fn validation(errors: ValidationErrors) -> Self {
        Self::Validation {
            errors,
            context: None,
        }
    }

    /// Create a new authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            context: None,
        }
    }

    /// Create a conflict error pinned to a form field
    pub fn conflict(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            field: Some(field.into()),
            context: None,
        }
    }

    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            url: None,
            context: None,
        }
    }

    /// Create a network error with the URL that failed
    pub fn network_with_url(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            url: Some(url.into()),
            context: None,
        }
    }

    /// Create a new server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
            context: None,
        }
    }

    /// Create a new not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: None,
            context: None,
        }
    }

    /// Create a not found error for a typed resource
    pub fn not_found_resource(message: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: Some(resource_type.into()),
            context: None,
        }
    }

    /// Create a new token decode error
    pub fn token(message: impl Into<String>) -> Self {
        Self::Token {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            path: None,
            context: None,
        }
    }

    /// Create a storage error with the path involved
    pub fn storage_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            path: Some(path.into()),
            context: None,
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
            context: None,
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            context: None,
        }
    }

    /// Map an HTTP status and the API's error message onto an error kind.
    ///
    /// An empty message is replaced by [`UNKNOWN_ERROR`] so that whatever
    /// reaches the user is always a readable string.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = UNKNOWN_ERROR.to_string();
        }
        match status {
            401 => Self::auth(message),
            404 => Self::not_found(message),
            409 => Self::conflict(message, "username"),
            _ => Self::server(status, message),
        }
    }

    /// Attach context to any variant that carries it
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        let ctx = Some(ctx.into());
        match &mut self {
            Self::Validation { context, .. }
            | Self::Auth { context, .. }
            | Self::Conflict { context, .. }
            | Self::Network { context, .. }
            | Self::Server { context, .. }
            | Self::NotFound { context, .. }
            | Self::Token { context, .. }
            | Self::Config { context, .. }
            | Self::Storage { context, .. }
            | Self::Json { context, .. }
            | Self::Other { context, .. } => *context = ctx,
            Self::Cancelled => {}
        }
        self
    }

    /// Whether this error is a 401 that must reset the session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;

    #[test]
    fn test_from_status_maps_kinds() {
        assert!(matches!(ZyrosError::from_status(401, "nope"), ZyrosError::Auth { .. }));
        assert!(matches!(
            ZyrosError::from_status(404, "Post not found"),
            ZyrosError::NotFound { .. }
        ));
        assert!(matches!(
            ZyrosError::from_status(409, "taken"),
            ZyrosError::Conflict { .. }
        ));
        assert!(matches!(
            ZyrosError::from_status(500, "boom"),
            ZyrosError::Server { status: 500, .. }
        ));
    }

    #[test]
    fn test_from_status_fills_empty_message() {
        let err = ZyrosError::from_status(502, "   ");
        assert_eq!(err.message(), UNKNOWN_ERROR);
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_with_context() {
        let err = ZyrosError::network("connection refused").with_context("listing posts");
        assert_eq!(err.context(), Some("listing posts"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_context_extensions() {
        use crate::error::{OptionExt, ResultExt};

        let parsed: Result<u32, _> = "x".parse::<u32>();
        let err = parsed.context("page number").unwrap_err();
        assert!(err.message().starts_with("page number: "));

        let missing: Option<u32> = None;
        let err = missing.with_context(|| format!("post {}", 7)).unwrap_err();
        assert_eq!(err.message(), "post 7");
    }
}
