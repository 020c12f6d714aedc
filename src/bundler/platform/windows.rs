//! Windows launcher.
//!
//! Writes `{dest}/windows-{arch}/{name}.exe` (or `{name} Installer.jci.exe`)
//! and zips it to `{release}/windows-{arch}/{file}.zip`.

use super::{Arch, Platform, PlatformBundler, launcher};
use crate::bundler::{
    AppDescription, BundlerResult, BundlerSettings, Result, utils::archive::ArchiveFormat,
};
use std::path::Path;

/// Bundler for Windows launchers.
#[derive(Clone, Copy, Debug)]
pub struct WindowsBundler {
    arch: Arch,
}

impl WindowsBundler {
    /// Bundler for the given architecture.
    pub fn new(arch: Arch) -> Self {
        Self { arch }
    }

    /// Executable file name for an app.
    pub fn file_name(app: &AppDescription, installer: bool) -> String {
        if installer {
            format!("{} Installer.jci.exe", app.name())
        } else {
            format!("{}.exe", app.name())
        }
    }
}

impl PlatformBundler for WindowsBundler {
    async fn build(
        &self,
        settings: &BundlerSettings,
        app: &AppDescription,
        dest_dir: &Path,
        release_dir: &Path,
        installer: bool,
    ) -> Result<BundlerResult> {
        let platform = Platform::Windows(self.arch);
        let file_name = Self::file_name(app, installer);
        let mut id = format!("win-{}", self.arch.as_str());
        if installer {
            id.push_str("-installer");
        }

        let layout = launcher::LauncherLayout {
            id,
            platform_dir: platform.dir_name(),
            release_name: format!("{file_name}.zip"),
            file_name,
            format: ArchiveFormat::Zip,
            stub: settings
                .stub_dir()
                .join(platform.stub_file_name().unwrap_or_default()),
        };
        launcher::build_launcher(settings, app, dest_dir, release_dir, layout).await
    }
}
