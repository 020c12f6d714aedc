//! Platform-specific bundlers.
//!
//! Each [`Platform`] maps to one [`PlatformBundler`] implementation. A
//! [`Target`] pairs a platform with the installer flag.
//!
//! | Platform | Output | Release archive | Module |
//! |----------|--------|-----------------|--------|
//! | Linux | launcher binary | .tar.gz | [`linux`] |
//! | Windows | launcher .exe | .zip | [`windows`] |
//! | macOS | .app bundle | .tar.gz | [`macos`] |
//! | webOS | app directory | none | [`webos`] |
//! | JNLP | descriptor + lib/ | none | [`jnlp`] |

pub mod jnlp;
pub(crate) mod launcher;
pub mod linux;
pub mod macos;
pub mod webos;
pub mod windows;

use crate::bundler::{
    AppDescription, BundlerResult, BundlerSettings, Os,
    error::{Error, Result},
    utils::archive::ArchiveFormat,
};
use std::{fmt, future::Future, path::Path};

/// Contract shared by all platform bundlers.
///
/// A bundler is a function of its inputs and the filesystem: it writes under
/// `dest_dir` and `release_dir` only, and holds no state between calls.
pub trait PlatformBundler {
    /// Builds the platform artifact.
    fn build(
        &self,
        settings: &BundlerSettings,
        app: &AppDescription,
        dest_dir: &Path,
        release_dir: &Path,
        installer: bool,
    ) -> impl Future<Output = Result<BundlerResult>> + Send;
}

/// CPU architecture of a launcher stub.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Arch {
    /// x86_64
    X64,
    /// aarch64
    Arm64,
}

impl Arch {
    /// Short name used in directory names and ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "x64" | "amd64" | "x86_64" => Some(Arch::X64),
            "arm64" | "aarch64" => Some(Arch::Arm64),
            _ => None,
        }
    }
}

/// Target platforms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Platform {
    /// Linux launcher binary
    Linux(Arch),
    /// Windows launcher executable
    Windows(Arch),
    /// macOS application bundle
    MacOs(Arch),
    /// webOS application directory
    WebOs,
    /// Web deployment descriptor
    Jnlp,
}

impl Platform {
    /// Every supported platform.
    pub fn all() -> Vec<Platform> {
        vec![
            Platform::MacOs(Arch::X64),
            Platform::MacOs(Arch::Arm64),
            Platform::Windows(Arch::X64),
            Platform::Windows(Arch::Arm64),
            Platform::Linux(Arch::X64),
            Platform::Linux(Arch::Arm64),
            Platform::WebOs,
            Platform::Jnlp,
        ]
    }

    /// Operating system whose native files this platform ships.
    pub fn os(&self) -> Option<Os> {
        match self {
            Platform::Linux(_) => Some(Os::Linux),
            Platform::Windows(_) => Some(Os::Windows),
            Platform::MacOs(_) => Some(Os::MacOs),
            Platform::WebOs => Some(Os::WebOs),
            Platform::Jnlp => None,
        }
    }

    /// Name of the per-platform output directory.
    pub fn dir_name(&self) -> String {
        match self {
            Platform::Linux(arch) => format!("linux-{}", arch.as_str()),
            Platform::Windows(arch) => format!("windows-{}", arch.as_str()),
            Platform::MacOs(arch) => format!("macos-{}", arch.as_str()),
            Platform::WebOs => "webos".to_string(),
            Platform::Jnlp => "jnlp".to_string(),
        }
    }

    /// File name of the prebuilt launcher stub inside the stub directory.
    pub fn stub_file_name(&self) -> Option<String> {
        match self {
            Platform::Linux(arch) => Some(format!("launcher-linux-{}", arch.as_str())),
            Platform::Windows(arch) => Some(format!("launcher-windows-{}.exe", arch.as_str())),
            Platform::MacOs(arch) => Some(format!("launcher-macos-{}", arch.as_str())),
            Platform::WebOs | Platform::Jnlp => None,
        }
    }

    /// Release archive format, if the platform produces one.
    pub fn archive_format(&self) -> Option<ArchiveFormat> {
        match self {
            Platform::Linux(_) | Platform::MacOs(_) => Some(ArchiveFormat::TarGz),
            Platform::Windows(_) => Some(ArchiveFormat::Zip),
            Platform::WebOs | Platform::Jnlp => None,
        }
    }

    /// Whether an installer variant exists.
    pub fn supports_installer(&self) -> bool {
        matches!(self, Platform::Linux(_) | Platform::Windows(_))
    }

    /// Whether the bundle ships its own runtime.
    pub fn requires_runtime(&self) -> bool {
        matches!(self, Platform::WebOs)
    }
}

/// A platform plus the installer flag: one bundler invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Target {
    platform: Platform,
    installer: bool,
}

impl Target {
    /// Plain (non-installer) target.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            installer: false,
        }
    }

    /// Installer variant. Fails for platforms without one.
    pub fn installer(platform: Platform) -> Result<Self> {
        if !platform.supports_installer() {
            return Err(Error::UnknownTarget(format!("{}-installer", platform.dir_name())));
        }
        Ok(Self {
            platform,
            installer: true,
        })
    }

    /// Platform being built.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether this is the installer variant.
    pub fn is_installer(&self) -> bool {
        self.installer
    }

    /// Bundler identifier, e.g. `linux-x64-installer` or `win-arm64`.
    pub fn id(&self) -> String {
        let base = match self.platform {
            Platform::Linux(arch) => format!("linux-{}", arch.as_str()),
            Platform::Windows(arch) => format!("win-{}", arch.as_str()),
            Platform::MacOs(arch) => format!("mac-{}", arch.as_str()),
            Platform::WebOs => "webos".to_string(),
            Platform::Jnlp => "jnlp".to_string(),
        };
        if self.installer {
            format!("{base}-installer")
        } else {
            base
        }
    }

    /// Every launcher target, plain and installer.
    pub fn all() -> Vec<Target> {
        let mut out = Vec::new();
        for platform in Platform::all() {
            if platform.stub_file_name().is_none() {
                continue;
            }
            out.push(Target::new(platform));
            if platform.supports_installer() {
                out.push(Target {
                    platform,
                    installer: true,
                });
            }
        }
        out
    }

    /// Parses a single target name.
    ///
    /// Accepts `{linux,win,windows,mac,macos}[-{x64,arm64}][-installer]`,
    /// `webos` and `jnlp`. Architecture defaults to x64.
    pub fn parse(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let (base, installer) = match lower.strip_suffix("-installer") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        let (os, arch) = match base.split_once('-') {
            Some((os, arch)) => (
                os,
                Arch::parse(arch).ok_or_else(|| Error::UnknownTarget(name.to_string()))?,
            ),
            None => (base, Arch::X64),
        };
        let platform = match os {
            "linux" => Platform::Linux(arch),
            "win" | "windows" => Platform::Windows(arch),
            "mac" | "macos" => Platform::MacOs(arch),
            "webos" if base == "webos" => Platform::WebOs,
            "jnlp" if base == "jnlp" => Platform::Jnlp,
            _ => return Err(Error::UnknownTarget(name.to_string())),
        };
        if installer {
            Target::installer(platform).map_err(|_| Error::UnknownTarget(name.to_string()))
        } else {
            Ok(Target::new(platform))
        }
    }

    /// Parses a list of names, expanding `all`.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>> {
        let mut out: Vec<Target> = Vec::new();
        for name in names {
            let parsed = if name.as_ref().eq_ignore_ascii_case("all") {
                Target::all()
            } else {
                vec![Target::parse(name.as_ref())?]
            };
            for target in parsed {
                if !out.contains(&target) {
                    out.push(target);
                }
            }
        }
        Ok(out)
    }

    /// Runs the bundler for this target.
    pub async fn build(
        &self,
        settings: &BundlerSettings,
        app: &AppDescription,
        dest_dir: &Path,
        release_dir: &Path,
    ) -> Result<BundlerResult> {
        let installer = self.installer;
        match self.platform {
            Platform::Linux(arch) => {
                linux::LinuxBundler::new(arch)
                    .build(settings, app, dest_dir, release_dir, installer)
                    .await
            }
            Platform::Windows(arch) => {
                windows::WindowsBundler::new(arch)
                    .build(settings, app, dest_dir, release_dir, installer)
                    .await
            }
            Platform::MacOs(arch) => {
                macos::MacBundler::new(arch)
                    .build(settings, app, dest_dir, release_dir, installer)
                    .await
            }
            Platform::WebOs => {
                webos::WebOsBundler
                    .build(settings, app, dest_dir, release_dir, installer)
                    .await
            }
            Platform::Jnlp => {
                jnlp::JnlpBundler
                    .build(settings, app, dest_dir, release_dir, installer)
                    .await
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl std::str::FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Target::parse(s)
    }
}
