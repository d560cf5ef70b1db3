//! Error types for ccbrowse-core
//!
//! Every failure here is local and recoverable by retrying the operation.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for ccbrowse operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete file: {path}")]
    FileDelete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    // ===================
    // Parse Errors
    // ===================
    #[error("Failed to parse JSON in {path}: {message}")]
    JsonParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    // ===================
    // Store Errors
    // ===================
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    // ===================
    // HTTP Errors
    // ===================
    #[error("Request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid response body from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    /// True when the requested session does not exist (locally or remotely)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::SessionNotFound { .. } | CoreError::HttpStatus { status: 404, .. }
        )
    }

    /// Short message suitable for a status line
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Http { url, .. } => format!("Cannot reach {}", url),
            CoreError::HttpStatus { status, .. } => format!("Server returned HTTP {}", status),
            CoreError::Decode { .. } => "Server sent an unreadable response".to_string(),
            other => other.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
