//! Runtime provisioning.
//!
//! Targets that ship their own runtime (webOS) need a runtime directory
//! before they are bundled. The orchestrator asks a [`RuntimeProvisioner`] to
//! `locate` one and falls back to `install`. How a runtime is obtained is
//! entirely up to the provisioner; the bundler only consumes the path.

use crate::bundler::{
    Arch, Error, Os, Result,
    utils::{archive, archive::ArchiveFormat},
};
use crate::BoxFuture;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Runtime distribution flavour.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RuntimeVariant {
    /// Runtime only
    Jre,
    /// Full development kit
    Jdk,
}

impl fmt::Display for RuntimeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeVariant::Jre => "jre",
            RuntimeVariant::Jdk => "jdk",
        })
    }
}

/// What runtime a bundle needs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuntimeRequest {
    /// Version string, e.g. `17`
    pub version: String,
    /// Distribution flavour
    pub variant: RuntimeVariant,
    /// Whether the graphics modules must be included
    pub supports_graphics: bool,
    /// Operating system
    pub platform: Os,
    /// CPU architecture
    pub arch: Arch,
    /// Pointer width in bits
    pub bitness: u8,
}

impl RuntimeRequest {
    /// A 64-bit runtime request.
    pub fn new(version: impl Into<String>, variant: RuntimeVariant, platform: Os, arch: Arch) -> Self {
        Self {
            version: version.into(),
            variant,
            supports_graphics: false,
            platform,
            arch,
            bitness: 64,
        }
    }

    /// Same request for another operating system.
    pub fn for_os(&self, platform: Os) -> Self {
        Self {
            platform,
            ..self.clone()
        }
    }

    /// Conventional directory / archive stem, e.g. `jre-17-fx-linux-x64-64`.
    pub fn dir_name(&self) -> String {
        let fx = if self.supports_graphics { "-fx" } else { "" };
        format!(
            "{}-{}{}-{}-{}-{}",
            self.variant,
            self.version,
            fx,
            self.platform.dir_name(),
            self.arch.as_str(),
            self.bitness
        )
    }
}

/// Locates or installs runtimes under a base directory.
pub trait RuntimeProvisioner: Send + Sync {
    /// Returns the runtime directory if already present.
    fn locate<'a>(&'a self, base_dir: &'a Path, request: &'a RuntimeRequest) -> BoxFuture<'a, Result<Option<PathBuf>>>;

    /// Installs the runtime and returns its directory.
    fn install<'a>(&'a self, base_dir: &'a Path, request: &'a RuntimeRequest) -> BoxFuture<'a, Result<PathBuf>>;
}

/// Locates then installs.
pub async fn provision(
    provisioner: &dyn RuntimeProvisioner,
    base_dir: &Path,
    request: &RuntimeRequest,
) -> Result<PathBuf> {
    if let Some(found) = provisioner.locate(base_dir, request).await? {
        log::debug!("runtime {} found at {}", request.dir_name(), found.display());
        return Ok(found);
    }
    log::info!("installing runtime {}", request.dir_name());
    provisioner.install(base_dir, request).await
}

/// Provisioner backed by a directory of pre-downloaded runtime archives.
///
/// A runtime lives at `{base_dir}/{request.dir_name()}`. Installing extracts
/// `{cache_dir}/{request.dir_name()}.tar.gz` (or `.zip`) into that directory.
#[derive(Clone, Debug)]
pub struct DirectoryRuntimeProvisioner {
    cache_dir: PathBuf,
}

impl DirectoryRuntimeProvisioner {
    /// Provisioner reading archives from `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn cached_archive(&self, request: &RuntimeRequest) -> Option<PathBuf> {
        [ArchiveFormat::TarGz, ArchiveFormat::Zip]
            .iter()
            .map(|f| {
                self.cache_dir
                    .join(format!("{}.{}", request.dir_name(), f.extension()))
            })
            .find(|p| p.is_file())
    }
}

impl RuntimeProvisioner for DirectoryRuntimeProvisioner {
    fn locate<'a>(&'a self, base_dir: &'a Path, request: &'a RuntimeRequest) -> BoxFuture<'a, Result<Option<PathBuf>>> {
        Box::pin(async move {
            let dir = base_dir.join(request.dir_name());
            Ok(dir.is_dir().then_some(dir))
        })
    }

    fn install<'a>(&'a self, base_dir: &'a Path, request: &'a RuntimeRequest) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            let archive_path = self.cached_archive(request).ok_or_else(|| {
                Error::GenericError(format!(
                    "no cached runtime archive for {} in {}",
                    request.dir_name(),
                    self.cache_dir.display()
                ))
            })?;
            let dest = base_dir.join(request.dir_name());
            archive::extract(&archive_path, &dest).await?;
            Ok(dest)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RuntimeRequest {
        RuntimeRequest::new("17", RuntimeVariant::Jre, Os::Linux, Arch::X64)
    }

    #[test]
    fn test_dir_name() {
        let mut req = request();
        assert_eq!(req.dir_name(), "jre-17-linux-x64-64");
        req.supports_graphics = true;
        assert_eq!(req.for_os(Os::WebOs).dir_name(), "jre-17-fx-webos-x64-64");
    }

    #[tokio::test]
    async fn test_install_from_cache_then_locate() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        let staging = dir.path().join("staging/bin");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(staging.join("java"), b"#!/bin/sh\n").unwrap();
        archive::compress_as_zip(&cache.join("jre-17-linux-x64-64.zip"), &staging)
            .await
            .unwrap();

        let base = dir.path().join("runtimes");
        let provisioner = DirectoryRuntimeProvisioner::new(&cache);
        assert!(provisioner.locate(&base, &request()).await.unwrap().is_none());

        let installed = provision(&provisioner, &base, &request()).await.unwrap();
        assert!(installed.join("bin/java").is_file());
        assert_eq!(provisioner.locate(&base, &request()).await.unwrap(), Some(installed));
    }

    #[tokio::test]
    async fn test_install_without_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provisioner = DirectoryRuntimeProvisioner::new(dir.path());
        assert!(provisioner.install(dir.path(), &request()).await.is_err());
    }
}
