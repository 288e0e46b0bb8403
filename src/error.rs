//! Custom error types for snag.
//!
//! This module provides structured error types that map the failure modes
//! of the scanner, store, plugin protocol and version-control adapters to
//! process exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for snag operations
#[derive(Error, Debug)]
pub enum SnagError {
    /// Working directory is not under version control, or the underlying
    /// command failed
    #[error("{vc} unavailable: {message}")]
    VcUnavailable { vc: String, message: String },

    /// No user identity configured in the version-control system
    #[error("no user identity configured in {vc}: {message}")]
    IdentityUnset { vc: String, message: String },

    /// Malformed diff input for a single file
    #[error("could not parse diff for {file}: {message}")]
    DiffParse { file: String, message: String },

    /// Plugin operation returned non-zero status or failed to start,
    /// carrying whatever the subprocess printed
    #[error("plugin '{operation}' failed: {output}")]
    PluginExecution { operation: String, output: String },

    /// Task or config file unreadable or unwritable
    #[error("store error: {message}")]
    Store {
        message: String,
        path: Option<PathBuf>,
    },

    /// Required configuration missing and cannot be supplied
    /// non-interactively
    #[error("configuration incomplete: {missing} (run 'snag init')")]
    ConfigIncomplete { missing: String },

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

impl SnagError {
    /// Create a version-control unavailable error
    pub fn vc_unavailable(vc: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VcUnavailable {
            vc: vc.into(),
            message: message.into(),
        }
    }

    /// Create an identity-unset error
    pub fn identity_unset(vc: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IdentityUnset {
            vc: vc.into(),
            message: message.into(),
        }
    }

    /// Create a diff parse error scoped to one file
    pub fn diff_parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DiffParse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a plugin execution error
    pub fn plugin(operation: impl Into<String>, output: impl Into<String>) -> Self {
        Self::PluginExecution {
            operation: operation.into(),
            output: output.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            path: None,
        }
    }

    /// Create a store error with the offending path
    pub fn store_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Store {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a configuration-incomplete error naming the missing field
    pub fn config_incomplete(missing: impl Into<String>) -> Self {
        Self::ConfigIncomplete {
            missing: missing.into(),
        }
    }

    /// Check if this error is scoped rather than fatal to the invocation:
    /// diff failures are file-scoped, plugin failures during push are
    /// task-scoped
    pub fn is_scoped(&self) -> bool {
        matches!(self, Self::DiffParse { .. } | Self::PluginExecution { .. })
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::VcUnavailable { .. } => 2,
            Self::IdentityUnset { .. } => 3,
            Self::DiffParse { .. } => 4,
            Self::PluginExecution { .. } => 5,
            Self::Store { .. } => 6,
            Self::ConfigIncomplete { .. } => 7,
            _ => 1,
        }
    }
}

/// Type alias for snag results
pub type Result<T> = std::result::Result<T, SnagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SnagError::vc_unavailable("Git", "not a git repository");
        assert!(err.to_string().contains("Git"));
        assert!(err.to_string().contains("not a git repository"));
    }

    #[test]
    fn test_plugin_error_carries_output() {
        let err = SnagError::plugin("create", "disk full");
        assert!(err.to_string().contains("create"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_is_scoped() {
        assert!(SnagError::diff_parse("a.go", "bad hunk").is_scoped());
        assert!(SnagError::plugin("done", "timeout").is_scoped());
        assert!(!SnagError::store("unwritable").is_scoped());
        assert!(!SnagError::config_incomplete("author").is_scoped());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SnagError::vc_unavailable("Git", "x").exit_code(), 2);
        assert_eq!(SnagError::identity_unset("Git", "x").exit_code(), 3);
        assert_eq!(SnagError::diff_parse("f", "x").exit_code(), 4);
        assert_eq!(SnagError::plugin("getid", "x").exit_code(), 5);
        assert_eq!(SnagError::store("x").exit_code(), 6);
        assert_eq!(SnagError::config_incomplete("plugin").exit_code(), 7);
    }

    #[test]
    fn test_store_with_path() {
        let path = PathBuf::from("/repo/.git/snag/tasks.json");
        let err = SnagError::store_with_path("unreadable", path.clone());
        if let SnagError::Store { path: p, .. } = err {
            assert_eq!(p, Some(path));
        } else {
            panic!("wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: SnagError = io_err.into();
        assert!(matches!(err, SnagError::Io(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
