//! Error types for deploynote.
//!
//! Library crates use [`DeployNoteError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Boxed cause attached to collaborator failures for diagnostics.
pub type ErrorSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all deploynote operations.
#[derive(Debug, thiserror::Error)]
pub enum DeployNoteError {
    /// Configuration loading or missing-credential error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A source-control host call failed or returned an unexpected status.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    /// A required remote object does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The generative-model call failed.
    #[error("synthesis error: {message}")]
    Synthesis {
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    /// Structural validation failure. Resolved locally by the validator and
    /// never surfaced to the pipeline caller.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Read-back after a write found no stored content.
    #[error("consistency error: {message}")]
    Consistency { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DeployNoteError>;

impl DeployNoteError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a transport error with no underlying cause.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a transport error preserving the original cause.
    pub fn transport_from(msg: impl Into<String>, source: impl Into<ErrorSource>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(source.into()),
        }
    }

    /// Create a not-found error naming the missing object.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a synthesis error with no underlying cause.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a synthesis error preserving the original cause.
    pub fn synthesis_from(msg: impl Into<String>, source: impl Into<ErrorSource>) -> Self {
        Self::Synthesis {
            message: msg.into(),
            source: Some(source.into()),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a consistency error from any displayable message.
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means "the object does not exist" rather than a
    /// failed call.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DeployNoteError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = DeployNoteError::consistency("note missing after write");
        assert!(err.to_string().contains("note missing after write"));
    }

    #[test]
    fn transport_preserves_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = DeployNoteError::transport_from("fetch failed", cause);
        assert_eq!(err.to_string(), "transport error: fetch failed");
        assert!(err.source().is_some());
        assert!(err.source().unwrap().to_string().contains("timed out"));
    }

    #[test]
    fn not_found_is_distinguishable() {
        assert!(DeployNoteError::not_found("pull request #7").is_not_found());
        assert!(!DeployNoteError::transport("HTTP 500").is_not_found());
    }
}
