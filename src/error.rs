//! Unified error types for slack2mm.
//!
//! This module provides a single [`MigrateError`] enum covering every
//! condition that aborts a conversion run. Data-integrity problems inside an
//! export (a reply whose root is missing, an unknown author, oversized props)
//! are *not* errors: they are logged, counted in
//! [`TransformStats`](crate::core::stats::TransformStats) and the offending
//! message is skipped.
//!
//! # Error Classes
//!
//! - **Backend errors** abort the current channel and therefore the run:
//!   remote thread-store failures, (de)serialization of stored posts,
//!   failures writing attachment copies.
//! - **Configuration errors** are raised at startup, before any channel is
//!   processed.
//! - **Export errors** describe an export directory or archive that cannot
//!   be read.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for slack2mm operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// The error type for all slack2mm operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MigrateError {
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing/serialization error.
    ///
    /// Raised for malformed export files and for thread-store values that
    /// cannot be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The export archive is not a readable zip file.
    #[error("Zip archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The remote thread-store backend failed.
    #[error("Thread store backend failed while {operation}: {source}")]
    Backend {
        /// What the store was doing (e.g. "fetching general:1700000000000")
        operation: String,
        /// The underlying backend error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The export directory does not have the expected layout.
    #[error("Invalid export{}: {message}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Export {
        /// The file or directory at fault, if known
        path: Option<PathBuf>,
        /// Description of what's wrong
        message: String,
    },

    /// An attachment could not be copied into the attachments directory.
    #[error("Failed to copy attachment {file_id} to {}: {source}", path.display())]
    Attachment {
        /// Slack file identifier
        file_id: String,
        /// Destination path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Invalid configuration (CLI values or remote backend parameters).
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong
        message: String,
    },
}

impl MigrateError {
    /// Creates a backend error from any error source.
    pub fn backend(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        MigrateError::Backend {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Creates an export layout error.
    pub fn export(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        MigrateError::Export {
            path,
            message: message.into(),
        }
    }

    /// Creates an attachment copy error.
    pub fn attachment(file_id: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        MigrateError::Attachment {
            file_id: file_id.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        MigrateError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, MigrateError::Io(_))
    }

    /// Returns `true` if the remote thread store failed.
    pub fn is_backend(&self) -> bool {
        matches!(self, MigrateError::Backend { .. })
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, MigrateError::InvalidConfig { .. })
    }

    /// Returns `true` if the export could not be read.
    pub fn is_export(&self) -> bool {
        matches!(self, MigrateError::Export { .. } | MigrateError::Archive(_))
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for MigrateError {
    fn from(err: redis::RedisError) -> Self {
        MigrateError::backend("talking to redis", err)
    }
}
