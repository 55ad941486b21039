//! From trait implementations for ZyrosError conversions

use super::types::ZyrosError;
use crate::auth::TokenStorageError;
use crate::validation::ValidationErrors;

impl From<anyhow::Error> for ZyrosError {
    fn from(error: anyhow::Error) -> Self {
        Self::other(error.to_string())
    }
}

impl From<std::io::Error> for ZyrosError {
    fn from(error: std::io::Error) -> Self {
        Self::storage(error.to_string())
    }
}

impl From<serde_json::Error> for ZyrosError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<toml::de::Error> for ZyrosError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(format!("Invalid TOML: {}", error))
    }
}

impl From<url::ParseError> for ZyrosError {
    fn from(error: url::ParseError) -> Self {
        Self::config(format!("Invalid URL: {}", error))
    }
}

impl From<reqwest::Error> for ZyrosError {
    fn from(error: reqwest::Error) -> Self {
        let url = error.url().map(|u| u.to_string());
        match error.status() {
            Some(status) => Self::from_status(status.as_u16(), error.to_string()),
            None if error.is_decode() => Self::json(error.to_string()),
            None => Self::Network {
                message: error.to_string(),
                url,
                context: None,
            },
        }
    }
}

impl From<ValidationErrors> for ZyrosError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

impl From<TokenStorageError> for ZyrosError {
    fn from(error: TokenStorageError) -> Self {
        match error {
            TokenStorageError::Io { message, path } => Self::Storage {
                message,
                path,
                context: None,
            },
            other => Self::storage(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ZyrosError {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::other(format!("Background task panicked: {}", error))
        }
    }
}
