//! Bundler configuration.
//!
//! [`BundlerSettings`] holds only options the bundlers recognize. There is no
//! global state: every bundler receives the settings explicitly.
//!
//! ```no_run
//! use kodegen_bundler_launcher::bundler::{SettingsBuilder, Target};
//!
//! let settings = SettingsBuilder::new()
//!     .stub_dir("stubs")
//!     .targets(vec![Target::parse("linux-x64")?])
//!     .verbosity(1)
//!     .build()?;
//! # Ok::<(), kodegen_bundler_launcher::bundler::Error>(())
//! ```

use crate::bundler::platform::Target;
use crate::runtime::RuntimeRequest;
use std::path::{Path, PathBuf};

/// Options shared by every platform bundler in a pass.
#[derive(Clone, Debug)]
pub struct BundlerSettings {
    verbosity: u8,
    admin: bool,
    dest_dir: Option<PathBuf>,
    release_dir: Option<PathBuf>,
    stub_dir: PathBuf,
    targets: Option<Vec<Target>>,
    runtime: Option<RuntimeRequest>,
    bundled_runtime: Option<PathBuf>,
}

impl BundlerSettings {
    /// Verbosity level. Anything above zero promotes step logging to `info`.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Whether launchers should request elevated privileges.
    pub fn admin(&self) -> bool {
        self.admin
    }

    /// Directory holding the prebuilt launcher stubs.
    pub fn stub_dir(&self) -> &Path {
        &self.stub_dir
    }

    /// Explicit target list, if any.
    pub fn targets(&self) -> Option<&[Target]> {
        self.targets.as_deref()
    }

    /// Runtime the orchestrator must provision before bundling targets that ship one.
    pub fn runtime(&self) -> Option<&RuntimeRequest> {
        self.runtime.as_ref()
    }

    /// Path of a provisioned runtime, set by the orchestrator.
    pub fn bundled_runtime(&self) -> Option<&Path> {
        self.bundled_runtime.as_deref()
    }

    /// Destination directory, honoring the override.
    pub fn dest_dir<'a>(&'a self, default: &'a Path) -> &'a Path {
        self.dest_dir.as_deref().unwrap_or(default)
    }

    /// Release directory, honoring the override.
    pub fn release_dir<'a>(&'a self, default: &'a Path) -> &'a Path {
        self.release_dir.as_deref().unwrap_or(default)
    }

    /// Copy of these settings pointing at a provisioned runtime.
    pub fn with_bundled_runtime(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            bundled_runtime: Some(path.into()),
            ..self.clone()
        }
    }

    /// Logs a bundling step at a level chosen by [`Self::verbosity`].
    pub(crate) fn step(&self, message: impl AsRef<str>) {
        if self.verbosity > 0 {
            log::info!("{}", message.as_ref());
        } else {
            log::debug!("{}", message.as_ref());
        }
    }
}

/// Builder for [`BundlerSettings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    verbosity: u8,
    admin: bool,
    dest_dir: Option<PathBuf>,
    release_dir: Option<PathBuf>,
    stub_dir: Option<PathBuf>,
    targets: Option<Vec<Target>>,
    runtime: Option<RuntimeRequest>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the verbosity level.
    pub fn verbosity(mut self, level: u8) -> Self {
        self.verbosity = level;
        self
    }

    /// Produce the admin/elevated variant.
    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// Overrides the destination directory.
    pub fn dest_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dest_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Overrides the release directory.
    pub fn release_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.release_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the stub directory.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn stub_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.stub_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets specific targets to build.
    ///
    /// Default: None (every launcher target)
    pub fn targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Requires a provisioned runtime for targets that bundle one.
    pub fn runtime(mut self, request: RuntimeRequest) -> Self {
        self.runtime = Some(request);
        self
    }

    /// Builds the settings.
    pub fn build(self) -> crate::bundler::Result<BundlerSettings> {
        use crate::bundler::error::Context;

        Ok(BundlerSettings {
            verbosity: self.verbosity,
            admin: self.admin,
            dest_dir: self.dest_dir,
            release_dir: self.release_dir,
            stub_dir: self.stub_dir.context("stub_dir is required")?,
            targets: self.targets,
            runtime: self.runtime,
            bundled_runtime: None,
        })
    }
}
