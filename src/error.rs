//! Top-level error types for kodegen_bundler_launcher.
//!
//! Library layers keep their own errors ([`crate::bundler::Error`],
//! [`crate::sign::KeyError`]); this module wraps them for the binary and adds
//! actionable recovery suggestions.

use crate::bundler::Error as BundlerError;
use crate::sign::KeyError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for command-level operations
pub type Result<T> = std::result::Result<T, LauncherError>;

/// Main error type for command-level operations
#[derive(Error, Debug)]
pub enum LauncherError {
    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] BundlerError),

    /// Credential resolution errors
    #[error("Signing error: {0}")]
    Key(#[from] KeyError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// Application manifest could not be used
    #[error("Manifest error in {path}: {reason}")]
    Manifest {
        /// Manifest file
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl LauncherError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            LauncherError::Bundler(BundlerError::NoMainJar { .. }) => vec![
                "Mark exactly one jar with `main = true` in the manifest".to_string(),
            ],
            LauncherError::Bundler(BundlerError::MultipleMainJars { jars, .. }) => vec![
                format!("Keep `main = true` on only one of: {jars}"),
            ],
            LauncherError::Bundler(BundlerError::MissingStub { path, .. }) => vec![
                format!("Place the prebuilt launcher stub at {}", path.display()),
                "Point --stubs at the directory holding launcher-<os>-<arch> files".to_string(),
            ],
            LauncherError::Bundler(BundlerError::InvalidUrl { .. }) => vec![
                "Set `url` to a file://, http:// or https:// URL, or add a [source] table".to_string(),
            ],
            LauncherError::Bundler(BundlerError::InvalidName { .. }) => vec![
                "Use an application name without path separators; it becomes the launcher file name"
                    .to_string(),
            ],
            LauncherError::Bundler(BundlerError::UnknownTarget(_)) => vec![
                "Valid targets: linux, win, mac (with -x64/-arm64, -installer), webos, jnlp, all"
                    .to_string(),
            ],
            LauncherError::Key(KeyError::NoCredentialAvailable { .. }) => vec![
                "Export KODEGEN_PRIVATE_KEY and KODEGEN_CERTIFICATE (PEM or file paths)".to_string(),
                "Or set KODEGEN_DEVELOPER_ID and KODEGEN_KEYSTORE_PASSWORD for ~/.kodegen/keystore.p12"
                    .to_string(),
            ],
            LauncherError::Toml(_) | LauncherError::Manifest { .. } => vec![
                "Check the manifest against the documented [app], [[jar]] and [[native]] tables"
                    .to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_stub_suggestion_names_path() {
        let err = LauncherError::from(BundlerError::MissingStub {
            target: "linux-x64".into(),
            path: PathBuf::from("/stubs/launcher-linux-x64"),
        });
        assert!(err.recovery_suggestions()[0].contains("/stubs/launcher-linux-x64"));
    }

    #[test]
    fn test_key_exhaustion_suggestions() {
        let err = LauncherError::from(KeyError::NoCredentialAvailable { tried: vec![] });
        assert_eq!(err.recovery_suggestions().len(), 2);
    }
}
