//! Custom error types for localmind.
//!
//! This module provides structured error types that enable better
//! error handling, reporting, and recovery throughout the application.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for localmind operations
#[derive(Error, Debug)]
pub enum MindError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Model Errors
    // =========================================================================
    /// Model invocation failed
    #[error("Model error: {message}")]
    Model { message: String },

    /// Model response could not be parsed as expected
    #[error("Unparseable model response for mode '{mode}': {reason}")]
    ResponseFormat { mode: String, reason: String },

    // =========================================================================
    // Patch Errors
    // =========================================================================
    /// Patch target does not exist under the working root
    #[error("Patch target not found: {path}")]
    PatchTargetMissing { path: PathBuf },

    /// Backup could not be written; the original file was left untouched
    #[error("Backup failed for {path}: {message}")]
    BackupFailed { path: PathBuf, message: String },

    /// The overwrite step failed; the backup remains on disk
    #[error("Write failed for {path} (backup preserved at {backup}): {message}")]
    WriteFailed {
        path: PathBuf,
        backup: PathBuf,
        message: String,
    },

    /// A file reference escaped the working root
    #[error("Path escapes working root: {path}")]
    PathEscapesRoot { path: String },

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Log store operation failed
    #[error("Log store error: {message}")]
    Store { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MindError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a model error
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error leaves a session able to continue.
    ///
    /// Model failures and single-patch failures degrade to "keep going";
    /// configuration problems do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Model { .. }
                | Self::ResponseFormat { .. }
                | Self::PatchTargetMissing { .. }
                | Self::BackupFailed { .. }
                | Self::WriteFailed { .. }
        )
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            Self::Store { .. } => 3,
            Self::PathEscapesRoot { .. } => 2,
            _ => 1,
        }
    }
}

/// Type alias for localmind results
pub type Result<T> = std::result::Result<T, MindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MindError::PatchTargetMissing {
            path: PathBuf::from("src/app.py"),
        };
        assert!(err.to_string().contains("src/app.py"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(MindError::model("timeout").is_recoverable());
        assert!(MindError::PatchTargetMissing {
            path: PathBuf::from("x.py")
        }
        .is_recoverable());
        assert!(!MindError::config("bad toml").is_recoverable());
        assert!(!MindError::store("lock poisoned").is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(MindError::config("test").exit_code(), 7);
        assert_eq!(MindError::store("test").exit_code(), 3);
        assert_eq!(
            MindError::PathEscapesRoot {
                path: "../../etc/passwd".into()
            }
            .exit_code(),
            2
        );
        assert_eq!(MindError::model("test").exit_code(), 1);
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/test/localmind.toml");
        let err = MindError::config_with_path("failed to parse", path.clone());
        if let MindError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "failed to parse");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: MindError = io_err.into();
        assert!(matches!(err, MindError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
