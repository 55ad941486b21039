//! User-facing error classification
//!
//! Transport errors are normalized to a message string at the mutation
//! boundary; this module decides how that string is shown.

use super::constructors::UNKNOWN_ERROR;
use super::types::{UnifiedError, ZyrosError};
use crate::routes::LOGIN_PATH;

/// Error category for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Client-side field constraints
    UserInput,
    /// Missing or rejected credentials
    Authentication,
    /// Duplicate resources
    Conflict,
    /// Request never reached the API
    Network,
    /// API answered with a failure
    Server,
    /// Resource not available
    ResourceUnavailable,
    /// Local configuration problems
    Configuration,
    /// Token storage problems
    Storage,
    /// Internal errors
    Internal,
}

impl ErrorCategory {
    /// Get a user-friendly category name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::UserInput => "Invalid Input",
            Self::Authentication => "Authentication Error",
            Self::Conflict => "Already Exists",
            Self::Network => "Network Error",
            Self::Server => "Server Error",
            Self::ResourceUnavailable => "Not Found",
            Self::Configuration => "Configuration Error",
            Self::Storage => "Storage Error",
            Self::Internal => "Internal Error",
        }
    }
}

/// Where an error ends up in front of the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// Shown next to the named form fields
    Inline { fields: Vec<String> },
    /// Session is reset and the user is sent to the given path
    Redirect { to: &'static str },
    /// Transient notification; cached data stays on screen
    Toast,
}

/// Normalized error ready for display
#[derive(Debug, Clone)]
pub struct UserFacing {
    /// The error category
    pub category: ErrorCategory,
    /// Message string, never empty
    pub message: String,
    /// How to present it
    pub presentation: Presentation,
    /// Original technical error code
    pub error_code: String,
}

impl ZyrosError {
    /// Classify the error for display
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::UserInput,
            Self::Auth { .. } | Self::Token { .. } => ErrorCategory::Authentication,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Network { .. } => ErrorCategory::Network,
            Self::Server { .. } => ErrorCategory::Server,
            Self::NotFound { .. } => ErrorCategory::ResourceUnavailable,
            Self::Config { .. } => ErrorCategory::Configuration,
            Self::Storage { .. } => ErrorCategory::Storage,
            Self::Json { .. } | Self::Cancelled | Self::Other { .. } => ErrorCategory::Internal,
        }
    }

    /// Message string shown to the user
    pub fn display_message(&self) -> String {
        match self {
            Self::Validation { errors, .. } => errors.to_string(),
            other => {
                let message = other.message().trim();
                if message.is_empty() {
                    UNKNOWN_ERROR.to_string()
                } else {
                    message.to_string()
                }
            }
        }
    }

    /// Normalize into a [`UserFacing`] error
    pub fn user_facing(&self) -> UserFacing {
        let presentation = match self {
            Self::Validation { errors, .. } => Presentation::Inline {
                fields: errors.fields(),
            },
            Self::Conflict {
                field: Some(field), ..
            } => Presentation::Inline {
                fields: vec![field.clone()],
            },
            Self::Auth { .. } => Presentation::Redirect { to: LOGIN_PATH },
            _ => Presentation::Toast,
        };

        UserFacing {
            category: self.category(),
            message: self.display_message(),
            presentation,
            error_code: self.error_code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FieldError, ValidationErrors};

    #[test]
    fn test_validation_is_inline() {
        let mut errors = ValidationErrors::new();
        errors.push(FieldError::required("title"));
        let facing = ZyrosError::validation(errors).user_facing();
        assert_eq!(facing.category, ErrorCategory::UserInput);
        assert_eq!(
            facing.presentation,
            Presentation::Inline {
                fields: vec!["title".to_string()]
            }
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let facing = ZyrosError::from_status(401, "token expired").user_facing();
        assert_eq!(facing.presentation, Presentation::Redirect { to: "/login" });
        assert_eq!(facing.message, "token expired");
    }

    #[test]
    fn test_duplicate_username_is_field_error() {
        let facing = ZyrosError::from_status(409, "username taken").user_facing();
        assert_eq!(facing.category, ErrorCategory::Conflict);
        assert_eq!(
            facing.presentation,
            Presentation::Inline {
                fields: vec!["username".to_string()]
            }
        );
    }

    #[test]
    fn test_server_errors_toast() {
        let facing = ZyrosError::server(500, "").user_facing();
        assert_eq!(facing.presentation, Presentation::Toast);
        assert_eq!(facing.message, "Unknown error");
    }
}
