// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for confab
//!
//! Capability failures are raised before any I/O. Chat failures cover the
//! transport call and reading its response. File loading fails with `NotFound`
//! or `Io`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for confab operations
#[derive(Error, Debug)]
pub enum ConfabError {
    /// Content kind not supported by the active provider
    #[error("Capability error: {0}")]
    Capability(String),

    /// Transport invocation or response extraction failed
    #[error("Chat error: {0}")]
    Chat(String),

    /// A content source path did not resolve to a file
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// API-related errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// API-specific error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Rate limited by the API
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    /// Requested model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// API returned an error
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Timeout waiting for response
    #[error("Request timed out")]
    Timeout,
}

/// Result type alias for confab operations
pub type Result<T> = std::result::Result<T, ConfabError>;

impl ConfabError {
    /// Whether this is a pre-flight capability failure
    pub fn is_capability(&self) -> bool {
        matches!(self, ConfabError::Capability(_))
    }

    /// Whether this is a chat failure
    pub fn is_chat(&self) -> bool {
        matches!(self, ConfabError::Chat(_))
    }
}
