//! Launcher bundler.
//!
//! Turns an [`AppDescription`] into platform launchers. Trailer-based targets
//! copy a prebuilt stub and append the `app.xml` metadata document to it (see
//! [`trailer`]); directory targets (webOS, JNLP) lay out files instead.
//!
//! # Supported Targets
//!
//! | Target id | Output | Release |
//! |-----------|--------|---------|
//! | `linux-{x64,arm64}[-installer]` | launcher binary | .tar.gz |
//! | `win-{x64,arm64}[-installer]` | launcher .exe | .zip |
//! | `mac-{x64,arm64}` | .app bundle | .tar.gz |
//! | `webos` | app directory | none |
//! | `jnlp` | descriptor + lib/ | none |
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_launcher::bundler::{AppDescription, Bundler, Jar, SettingsBuilder, Target};
//!
//! # async fn example() -> kodegen_bundler_launcher::bundler::Result<()> {
//! let app = AppDescription::builder("Demo", "com.example.Main")
//!     .url("https://example.com/demo")
//!     .jar(Jar::new("demo.jar", "build/demo.jar").main())
//!     .build()?;
//!
//! let settings = SettingsBuilder::new()
//!     .stub_dir("stubs")
//!     .targets(vec![Target::parse("linux-x64")?])
//!     .build()?;
//!
//! let report = Bundler::new(settings).bundle(&app, "dist".as_ref(), "release".as_ref()).await;
//! for artifact in report.artifacts() {
//!     println!("{} -> {}", artifact.result.id(), artifact.result.output_file().display());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod app;
mod builder;
mod error;
pub mod metadata;
pub(crate) mod platform;
mod settings;
pub mod trailer;
pub mod utils;

// Public re-exports
pub use app::{
    AppDescription, AppDescriptionBuilder, DistributionSource, FileAssociation, Jar, NativeLib, Os,
    png_data_uri,
};
pub use builder::{BundleReport, BundledArtifact, Bundler, TargetFailure};
pub use error::{Context, Error, ErrorExt, Result};
pub use platform::{
    Arch, Platform, PlatformBundler, Target, jnlp::JnlpBundler, linux::LinuxBundler,
    macos::MacBundler, webos::WebOsBundler, windows::WindowsBundler,
};
pub use settings::{BundlerSettings, SettingsBuilder};

use std::path::{Path, PathBuf};

/// Output of one bundler invocation.
///
/// Only valid once returned without error; a cancelled build may leave a
/// partial output file behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlerResult {
    id: String,
    output_file: PathBuf,
    release_files: Vec<PathBuf>,
}

impl BundlerResult {
    /// Creates a result.
    pub fn new(id: impl Into<String>, output_file: PathBuf, release_files: Vec<PathBuf>) -> Self {
        Self {
            id: id.into(),
            output_file,
            release_files,
        }
    }

    /// Bundler identifier, e.g. `linux-x64-installer`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Primary output: the launcher, bundle directory or descriptor.
    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Upload-ready release files, in creation order.
    pub fn release_files(&self) -> &[PathBuf] {
        &self.release_files
    }
}
