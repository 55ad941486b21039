//! UnifiedError trait implementation for ZyrosError

use super::types::{UnifiedError, ZyrosError};

impl UnifiedError for ZyrosError {
    fn error_code(&self) -> &str {
        match self {
            Self::Validation { .. } => "ZYROS_VALIDATION",
            Self::Auth { .. } => "ZYROS_AUTH",
            Self::Conflict { .. } => "ZYROS_CONFLICT",
            Self::Network { .. } => "ZYROS_NETWORK",
            Self::Server { .. } => "ZYROS_SERVER",
            Self::NotFound { .. } => "ZYROS_NOT_FOUND",
            Self::Token { .. } => "ZYROS_TOKEN",
            Self::Config { .. } => "ZYROS_CONFIG",
            Self::Storage { .. } => "ZYROS_STORAGE",
            Self::Json { .. } => "ZYROS_JSON",
            Self::Cancelled => "ZYROS_CANCELLED",
            Self::Other { .. } => "ZYROS_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Validation { .. } => "Validation failed",
            Self::Auth { message, .. } => message,
            Self::Conflict { message, .. } => message,
            Self::Network { message, .. } => message,
            Self::Server { message, .. } => message,
            Self::NotFound { message, .. } => message,
            Self::Token { message, .. } => message,
            Self::Config { message, .. } => message,
            Self::Storage { message, .. } => message,
            Self::Json { message, .. } => message,
            Self::Cancelled => "Task was cancelled",
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Validation { context, .. } => context.as_deref(),
            Self::Auth { context, .. } => context.as_deref(),
            Self::Conflict { context, .. } => context.as_deref(),
            Self::Network { context, .. } => context.as_deref(),
            Self::Server { context, .. } => context.as_deref(),
            Self::NotFound { context, .. } => context.as_deref(),
            Self::Token { context, .. } => context.as_deref(),
            Self::Config { context, .. } => context.as_deref(),
            Self::Storage { context, .. } => context.as_deref(),
            Self::Json { context, .. } => context.as_deref(),
            Self::Cancelled => None,
            Self::Other { context, .. } => context.as_deref(),
        }
    }

    fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
