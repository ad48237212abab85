//! Error types for the anistream providers
//!
//! Provides a single error enum with human-readable messages
//! and Tauri-compatible serialization.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all provider operations
///
/// Implements Display for human-readable messages and Serialize
/// for Tauri command compatibility.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to parse HTML content
    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Every configured domain failed for the endpoint
    #[error("All domains failed for {0}")]
    AllDomainsFailed(String),

    /// Page or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Empty or malformed identifier / query
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// Malformed JSON payload
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Serialize for ProviderError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<url::ParseError> for ProviderError {
    fn from(err: url::ParseError) -> Self {
        ProviderError::InvalidUrl(err.to_string())
    }
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
