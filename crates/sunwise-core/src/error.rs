//! Centralized error types for Sunwise.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging
//!
//! External-call failures (weather, advice, playlist, beaches, location) are
//! recovered with fallback values by their callers. What does reach the
//! binary (configuration, storage, client setup) arrives as an [`AppError`].

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Advisor error: {0}")]
    Advisor(#[from] AdvisorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Advisor(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Cannot access configuration file: {0}")]
    Access(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::Access(_) => "Unable to read or write the configuration file.",
        }
    }
}

/// Local storage errors (the persisted profile blob).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write storage: {0}")]
    Write(String),

    #[error("Stored value for {key} is malformed: {message}")]
    Malformed { key: String, message: String },
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Write(_) => "Failed to save your data. Changes may be lost.",
            StorageError::Malformed { .. } => {
                "Saved data looks corrupted. Consider resetting your profile."
            }
        }
    }
}

/// Generative-AI advisor errors (advice, playlist, beach lookup).
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Failed to parse model output: {0}")]
    Parse(String),

    #[error("Model returned unusable advice: {0}")]
    InvalidAdvice(String),
}

impl AdvisorError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AdvisorError::MissingApiKey => "AI features need an API key. Check settings.",
            AdvisorError::Network(_) => "Network error. Check your connection.",
            AdvisorError::Api { status, .. } if *status >= 500 => {
                "The AI service is experiencing issues. Please try again later."
            }
            AdvisorError::Api { .. } => "The AI request failed. Please try again.",
            AdvisorError::EmptyResponse | AdvisorError::Parse(_) => {
                "The AI gave an unexpected answer. Please try again."
            }
            AdvisorError::InvalidAdvice(_) => "The AI advice was unusable. Using safe defaults.",
        }
    }

    /// Whether this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdvisorError::Network(e) => e.is_timeout() || e.is_connect(),
            AdvisorError::Api { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
