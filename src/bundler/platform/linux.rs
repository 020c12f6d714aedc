//! Linux launcher.
//!
//! Writes `{dest}/linux-{arch}/{name}` (or `{name} Installer.jci`) and a
//! `.tar.gz` of it under `{release}/linux-{arch}/`.

use super::{Arch, Platform, PlatformBundler, launcher};
use crate::bundler::{
    AppDescription, BundlerResult, BundlerSettings, Result, utils::archive::ArchiveFormat,
};
use std::path::Path;

/// Bundler for Linux launchers.
#[derive(Clone, Copy, Debug)]
pub struct LinuxBundler {
    arch: Arch,
}

impl LinuxBundler {
    /// Bundler for the given architecture.
    pub fn new(arch: Arch) -> Self {
        Self { arch }
    }

    /// Launcher file name for an app.
    pub fn file_name(app: &AppDescription, installer: bool) -> String {
        if installer {
            format!("{} Installer.jci", app.name())
        } else {
            app.name().to_string()
        }
    }
}

impl PlatformBundler for LinuxBundler {
    async fn build(
        &self,
        settings: &BundlerSettings,
        app: &AppDescription,
        dest_dir: &Path,
        release_dir: &Path,
        installer: bool,
    ) -> Result<BundlerResult> {
        let platform = Platform::Linux(self.arch);
        let file_name = Self::file_name(app, installer);
        let mut id = format!("linux-{}", self.arch.as_str());
        if installer {
            id.push_str("-installer");
        }

        let layout = launcher::LauncherLayout {
            id,
            platform_dir: platform.dir_name(),
            release_name: format!("{}.tar.gz", launcher::dotted(&file_name)),
            file_name,
            format: ArchiveFormat::TarGz,
            stub: settings
                .stub_dir()
                .join(platform.stub_file_name().unwrap_or_default()),
        };
        launcher::build_launcher(settings, app, dest_dir, release_dir, layout).await
    }
}
