//! Error types for the mend library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using mend's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the repair pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source file not found.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported language for the given file.
    #[error("Unsupported language for file: {path}")]
    UnsupportedLanguage { path: PathBuf },

    /// Parse error from tree-sitter.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Input JSON does not match the expected schema.
    #[error("Schema error in {path}: {message}")]
    BadSchema { path: PathBuf, message: String },

    /// A patch could not be applied to the working tree.
    #[error("Patch {patch_id} could not be applied: {message}")]
    PatchApply { patch_id: String, message: String },

    /// A patched file could not be restored to its original content.
    #[error("Restore failed for {path}: {message}")]
    Restore { path: PathBuf, message: String },

    /// A subprocess exceeded its time budget.
    #[error("Timed out after {elapsed_ms} ms: {command}")]
    Timeout { command: String, elapsed_ms: u64 },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a new schema error.
    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::BadSchema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new patch-application error.
    pub fn patch_apply(patch_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PatchApply {
            patch_id: patch_id.into(),
            message: message.into(),
        }
    }

    /// Create a new restore error.
    pub fn restore(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Restore {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::schema("scores.json", "missing `data` array");
        assert_eq!(
            err.to_string(),
            "Schema error in scores.json: missing `data` array"
        );

        let err = Error::FileNotFound {
            path: PathBuf::from("src/list.cpp"),
        };
        assert_eq!(err.to_string(), "File not found: src/list.cpp");
    }

    #[test]
    fn test_patch_apply_error() {
        let err = Error::patch_apply("patch_3", "original code not found on line 12");
        match err {
            Error::PatchApply { patch_id, message } => {
                assert_eq!(patch_id, "patch_3");
                assert!(message.contains("line 12"));
            }
            _ => panic!("Expected PatchApply"),
        }
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            command: "ctest".to_string(),
            elapsed_ms: 5000,
        };
        assert!(err.to_string().contains("Timed out"));
        assert!(err.to_string().contains("ctest"));
    }
}
