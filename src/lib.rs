//! # kodegen_bundler_launcher
//!
//! Native launcher bundling for JVM applications.
//!
//! Turns one application description into per-platform deliverables:
//!
//! - **Launchers**: a prebuilt native stub with the application's `app.xml`
//!   appended as a trailer (Linux, Windows, macOS `.app`)
//! - **Directory bundles**: webOS application directories
//! - **Web deployment**: JNLP descriptors
//!
//! Around the bundlers sit a signing credential chain ([`sign`]), runtime
//! provisioning ([`runtime`]) and a publish driver ([`publish`]).
//!
//! ## Usage
//!
//! ```bash
//! kodegen_bundler_launcher bundle app.toml --stubs stubs/
//! kodegen_bundler_launcher inspect dist/linux-x64/Demo
//! kodegen_bundler_launcher resolve-key --developer-id acme-dev
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bundler;
pub mod cli;
pub mod error;
pub mod publish;
pub mod runtime;
pub mod sign;

pub use bundler::{AppDescription, BundleReport, Bundler, BundlerResult, BundlerSettings, Target};
pub use cli::Args;
pub use error::{CliError, LauncherError, Result};
pub use sign::{CompositeKeyProvider, Credential, KeyConfig};

use std::{future::Future, pin::Pin};

/// Boxed, sendable future used at dyn-compatible trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
