//! Credential resolution errors.

use std::io;
use thiserror::Error;

/// Errors raised while resolving a signing credential.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Every registered backend declined, or none was registered.
    #[error("no credential available{}", tried_suffix(.tried))]
    NoCredentialAvailable {
        /// Backends that were tried, in order
        tried: Vec<String>,
    },

    /// An external tool ran but failed.
    #[error("{program} failed: {message}")]
    Command {
        /// Program name
        program: String,
        /// Captured stderr or exit status
        message: String,
    },

    /// Tool output or key material could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Backend cannot run on this host.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// I/O error reading key material.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl KeyError {
    /// Whether this is the exhaustion condition rather than a backend failure.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, KeyError::NoCredentialAvailable { .. })
    }
}

fn tried_suffix(tried: &[String]) -> String {
    if tried.is_empty() {
        ": no signing backend is registered".to_string()
    } else {
        format!(" (tried: {})", tried.join(", "))
    }
}

/// Result type for credential resolution.
pub type Result<T> = std::result::Result<T, KeyError>;
