//! Bundle orchestration.
//!
//! [`Bundler`] runs every requested [`Target`] concurrently, one task per
//! target. A failing target never affects the others: its error lands in
//! [`BundleReport::failures`] while the rest still produce artifacts.
//!
//! # Overview
//!
//! 1. Resolve the target list (explicit targets, or every launcher target)
//! 2. Provision a runtime once if any target ships one
//! 3. Build all targets concurrently
//! 4. Hash every release file
//!
//! Results are reported in target order regardless of completion order.

use crate::bundler::{
    AppDescription, BundlerResult, BundlerSettings, Os, Result, Target,
    error::{Context, Error},
};
use crate::runtime::{self, RuntimeProvisioner};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// A successfully built target.
#[derive(Debug, Clone)]
pub struct BundledArtifact {
    /// Target that was built
    pub target: Target,
    /// What the platform bundler produced
    pub result: BundlerResult,
    /// SHA-256 of each release file, hex encoded
    pub checksums: Vec<(PathBuf, String)>,
}

/// A target that failed to build.
#[derive(Debug)]
pub struct TargetFailure {
    /// Target that failed
    pub target: Target,
    /// Why it failed
    pub error: Error,
}

/// Outcome of a bundling pass.
#[derive(Debug, Default)]
pub struct BundleReport {
    artifacts: Vec<BundledArtifact>,
    failures: Vec<TargetFailure>,
}

impl BundleReport {
    /// Built targets, in request order.
    pub fn artifacts(&self) -> &[BundledArtifact] {
        &self.artifacts
    }

    /// Failed targets, in request order.
    pub fn failures(&self) -> &[TargetFailure] {
        &self.failures
    }

    /// `true` when no target failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Main bundler orchestrator.
///
/// ```no_run
/// use kodegen_bundler_launcher::bundler::{AppDescription, Bundler, BundlerSettings};
/// use kodegen_bundler_launcher::runtime::DirectoryRuntimeProvisioner;
///
/// # async fn example(settings: BundlerSettings, app: AppDescription) {
/// let report = Bundler::new(settings)
///     .with_runtime_provisioner(DirectoryRuntimeProvisioner::new("cache"), "runtimes")
///     .bundle(&app, "dist".as_ref(), "release".as_ref())
///     .await;
/// for failure in report.failures() {
///     eprintln!("{}: {}", failure.target, failure.error);
/// }
/// # }
/// ```
pub struct Bundler {
    settings: BundlerSettings,
    provisioner: Option<(Arc<dyn RuntimeProvisioner>, PathBuf)>,
}

impl fmt::Debug for Bundler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .field(
                "provisioner",
                &self.provisioner.as_ref().map(|(_, base)| base.display().to_string()),
            )
            .finish()
    }
}

impl Bundler {
    /// Creates a bundler with the given settings.
    pub fn new(settings: BundlerSettings) -> Self {
        Self {
            settings,
            provisioner: None,
        }
    }

    /// Provisions runtimes under `base_dir` with `provisioner`.
    pub fn with_runtime_provisioner(
        mut self,
        provisioner: impl RuntimeProvisioner + 'static,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        self.provisioner = Some((Arc::new(provisioner), base_dir.into()));
        self
    }

    /// Returns the bundler settings.
    pub fn settings(&self) -> &BundlerSettings {
        &self.settings
    }

    /// Targets this bundler will build, in request order with duplicates removed.
    pub fn targets(&self) -> Vec<Target> {
        let Some(requested) = self.settings.targets() else {
            return Target::all();
        };
        let mut targets: Vec<Target> = Vec::with_capacity(requested.len());
        for target in requested {
            if targets.contains(target) {
                log::debug!("ignoring duplicate target {target}");
            } else {
                targets.push(*target);
            }
        }
        targets
    }

    /// Builds every target. Never fails as a whole; inspect the report.
    pub async fn bundle(&self, app: &AppDescription, dest_dir: &Path, release_dir: &Path) -> BundleReport {
        let dest_dir = self.settings.dest_dir(dest_dir).to_path_buf();
        let release_dir = self.settings.release_dir(release_dir).to_path_buf();
        let targets = self.targets();
        let mut report = BundleReport::default();

        let runtime_settings = if targets.iter().any(|t| t.platform().requires_runtime()) {
            match self.provision_runtime().await {
                Ok(settings) => Some(settings),
                Err(error) => {
                    let message = error.to_string();
                    for target in targets.iter().filter(|t| t.platform().requires_runtime()) {
                        report.failures.push(TargetFailure {
                            target: *target,
                            error: Error::GenericError(message.clone()),
                        });
                    }
                    None
                }
            }
        } else {
            None
        };

        let app = Arc::new(app.clone());
        let mut handles = Vec::with_capacity(targets.len());
        for target in targets {
            let settings = if target.platform().requires_runtime() {
                match &runtime_settings {
                    Some(settings) => settings.clone(),
                    None => continue,
                }
            } else {
                self.settings.clone()
            };
            let app = Arc::clone(&app);
            let dest_dir = dest_dir.clone();
            let release_dir = release_dir.clone();

            log::debug!("spawning bundler for {target}");
            let handle = tokio::spawn(async move {
                let result = target.build(&settings, &app, &dest_dir, &release_dir).await?;
                let mut checksums = Vec::with_capacity(result.release_files().len());
                for file in result.release_files() {
                    checksums.push((file.clone(), calculate_sha256(file).await?));
                }
                Ok::<_, Error>(BundledArtifact {
                    target,
                    result,
                    checksums,
                })
            });
            handles.push((target, handle));
        }

        for (target, handle) in handles {
            match handle.await.map_err(Error::from).and_then(|r| r) {
                Ok(artifact) => {
                    log::info!("✓ {} -> {}", target, artifact.result.output_file().display());
                    report.artifacts.push(artifact);
                }
                Err(error) => {
                    log::error!("✗ {target}: {error}");
                    report.failures.push(TargetFailure { target, error });
                }
            }
        }

        report
    }

    /// Settings for runtime-shipping targets.
    ///
    /// Without a runtime request or provisioner the settings are returned as
    /// they are and the bundle ships without a runtime.
    async fn provision_runtime(&self) -> Result<BundlerSettings> {
        let Some(request) = self.settings.runtime() else {
            return Ok(self.settings.clone());
        };
        let Some((provisioner, base_dir)) = &self.provisioner else {
            log::warn!(
                "runtime {} requested but no provisioner configured; bundling without it",
                request.dir_name()
            );
            return Ok(self.settings.clone());
        };
        let request = request.for_os(Os::WebOs);
        let path = runtime::provision(provisioner.as_ref(), base_dir, &request)
            .await
            .context(format!("provisioning runtime {}", request.dir_name()))?;
        Ok(self.settings.with_bundled_runtime(path))
    }
}

/// SHA-256 of a file, hex encoded. Directories hash every file in path order.
pub(crate) async fn calculate_sha256(path: &Path) -> Result<String> {
    use crate::bundler::error::ErrorExt;
    use sha2::{Digest, Sha256};
    use tokio::io::AsyncReadExt;

    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading release file metadata", path)?;

    let files = if metadata.is_dir() {
        let mut entries = walkdir::WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect::<Vec<_>>();
        entries.sort();
        entries
    } else {
        vec![path.to_path_buf()]
    };

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];
    for file_path in files {
        if metadata.is_dir()
            && let Ok(rel) = file_path.strip_prefix(path)
        {
            hasher.update(rel.to_string_lossy().as_bytes());
        }
        let mut file = tokio::fs::File::open(&file_path)
            .await
            .fs_context("opening file for hashing", &file_path)?;
        loop {
            let n = file
                .read(&mut buffer)
                .await
                .fs_context("reading file for hash calculation", &file_path)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abc.txt");
        std::fs::write(&file, b"abc").unwrap();
        assert_eq!(
            calculate_sha256(&file).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_sha256_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(calculate_sha256(&dir.path().join("nope")).await.is_err());
    }

    #[test]
    fn test_duplicate_targets_built_once() {
        let linux = Target::parse("linux").unwrap();
        let jnlp = Target::parse("jnlp").unwrap();
        let settings = crate::bundler::SettingsBuilder::new()
            .stub_dir("stubs")
            .targets(vec![linux, jnlp, linux, jnlp, linux])
            .build()
            .unwrap();
        assert_eq!(Bundler::new(settings).targets(), vec![linux, jnlp]);
    }

    #[tokio::test]
    async fn test_runtime_provisioning_failure_fails_runtime_targets_only() {
        use crate::bundler::{Arch, Jar};
        use crate::runtime::{DirectoryRuntimeProvisioner, RuntimeRequest, RuntimeVariant};

        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        std::fs::write(&jar, b"jar").unwrap();
        let app = AppDescription::builder("Demo", "demo.Main")
            .url("https://example.com/demo")
            .jar(Jar::new("app.jar", &jar).main())
            .build()
            .unwrap();
        let settings = crate::bundler::SettingsBuilder::new()
            .stub_dir(dir.path().join("stubs"))
            .targets(vec![Target::parse("webos").unwrap(), Target::parse("jnlp").unwrap()])
            .runtime(RuntimeRequest::new("17", RuntimeVariant::Jre, Os::WebOs, Arch::X64))
            .build()
            .unwrap();

        let report = Bundler::new(settings)
            .with_runtime_provisioner(
                DirectoryRuntimeProvisioner::new(dir.path().join("cache")),
                dir.path().join("runtimes"),
            )
            .bundle(&app, &dir.path().join("dist"), &dir.path().join("release"))
            .await;

        assert_eq!(report.artifacts().len(), 1);
        assert_eq!(report.artifacts()[0].target.id(), "jnlp");
        assert_eq!(report.failures().len(), 1);
        let failure = &report.failures()[0];
        assert_eq!(failure.target.id(), "webos");
        assert!(
            failure.error.to_string().starts_with("provisioning runtime jre-17-webos-x64-64: "),
            "{}",
            failure.error
        );
        assert!(!dir.path().join("dist/webos").exists());
    }
}
