//! Error types for bundler operations.
//!
//! Errors fall into the groups a bundling pass can hit:
//!
//! - **Configuration**: the [`AppDescription`](crate::bundler::AppDescription) cannot be
//!   launched on the requested target. Raised before any filesystem mutation.
//! - **I/O**: directory creation, copy or archive failures, carrying the offending path.
//! - **Trailer**: the writer refused to emit a trailer it could not encode.
//!
//! # Helpers
//!
//! - [`Context`] wraps an error with a description of the step that failed
//! - [`ErrorExt::fs_context`] attaches the path of a failed filesystem call
//!
//! ```no_run
//! use std::path::Path;
//! use kodegen_bundler_launcher::bundler::{ErrorExt, Result};
//!
//! fn read_stub(path: &Path) -> Result<Vec<u8>> {
//!     std::fs::read(path).fs_context("reading launcher stub", path)
//! }
//! ```

use std::{
    fmt::Display,
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Errors returned by the bundler.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by [`ErrorExt::fs_context`].
    #[error("{context} {path}: {error}")]
    Fs {
        /// Operation being performed (e.g., "creating release directory")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// No jar is marked main but the target launches a single entry point.
    #[error("application '{app}' has no jar marked as main")]
    NoMainJar {
        /// Application display name
        app: String,
    },

    /// More than one jar is marked main.
    #[error("application '{app}' has {count} jars marked as main ({jars}); exactly one is allowed")]
    MultipleMainJars {
        /// Application display name
        app: String,
        /// Number of main jars found
        count: usize,
        /// Comma separated jar names
        jars: String,
    },

    /// The prebuilt launcher stub for a target is missing.
    #[error("launcher stub for {target} not found at {path}")]
    MissingStub {
        /// Target identifier
        target: String,
        /// Where the stub was expected
        path: PathBuf,
    },

    /// Application URL is missing or uses an unsupported scheme.
    #[error("invalid application url '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// What is wrong with it
        reason: String,
    },

    /// Application name cannot be used as a file name.
    #[error("invalid application name '{name}': {reason}")]
    InvalidName {
        /// The offending name
        name: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// A native library directory does not exist.
    #[error("native library '{name}' directory {path} does not exist")]
    MissingNativeDir {
        /// Native library name
        name: String,
        /// Missing directory
        path: PathBuf,
    },

    /// The metadata offset does not fit the one-byte length field.
    #[error("trailer offset string is {len} bytes long; at most 255 can be encoded")]
    TrailerOverflow {
        /// Length of the decimal offset string
        len: usize,
    },

    /// A launcher file does not end with a readable trailer.
    #[error("malformed launcher trailer: {0}")]
    MalformedTrailer(String),

    /// Target identifier not recognized.
    #[error("unknown bundle target '{0}'")]
    UnknownTarget(String),

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Error walking a directory tree.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// ZIP archive creation/extraction error.
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Handlebars template rendering error.
    #[error("{0}")]
    HandleBarsError(#[from] handlebars::RenderError),

    /// Handlebars template parsing error.
    #[error("{0}")]
    Template(#[from] handlebars::TemplateError),

    /// JSON serialization error.
    #[error("{0}")]
    JsonError(#[from] serde_json::error::Error),

    /// Blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Whether this error was raised while validating the application description.
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::NoMainJar { .. }
            | Error::MultipleMainJars { .. }
            | Error::InvalidUrl { .. }
            | Error::InvalidName { .. }
            | Error::MissingNativeDir { .. }
            | Error::UnknownTarget(_) => true,
            Error::Context(_, inner) => inner.is_configuration(),
            _ => false,
        }
    }
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Works with both `Result<T>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying stub".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}
