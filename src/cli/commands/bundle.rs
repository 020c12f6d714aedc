//! `bundle` command.

use crate::bundler::{Bundler, SettingsBuilder, Target};
use crate::cli::{OutputManager, manifest::Manifest};
use crate::error::{CliError, Result};
use crate::publish::{self, DirectoryPublishDriver, PublishContext};
use crate::runtime::DirectoryRuntimeProvisioner;
use std::path::{Path, PathBuf};

/// Options of the `bundle` command.
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Manifest path
    pub manifest: PathBuf,
    /// Target names; empty falls back to the manifest, then every launcher target
    pub targets: Vec<String>,
    /// Destination override
    pub dest: Option<PathBuf>,
    /// Release override
    pub release: Option<PathBuf>,
    /// Stub directory override
    pub stubs: Option<PathBuf>,
    /// Elevated launchers
    pub admin: bool,
    /// Publish directory
    pub publish: Option<PathBuf>,
    /// Verbosity
    pub verbose: u8,
}

/// Bundles the manifest's application. Returns 1 if any target failed.
pub async fn execute_bundle(options: BundleOptions) -> Result<i32> {
    let output = OutputManager::new(options.verbose > 0);
    let manifest = Manifest::load(&options.manifest).await?;
    let base = options
        .manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let app = manifest.app_description(&base)?;

    let target_names = if options.targets.is_empty() {
        &manifest.bundle.targets
    } else {
        &options.targets
    };
    let stubs = options
        .stubs
        .clone()
        .or_else(|| manifest.bundle.stubs.as_ref().map(|s| base.join(s)))
        .ok_or_else(|| CliError::InvalidArguments {
            reason: "no stub directory: pass --stubs or set [bundle] stubs".to_string(),
        })?;

    let mut settings = SettingsBuilder::new()
        .verbosity(options.verbose)
        .admin(options.admin)
        .stub_dir(stubs);
    if !target_names.is_empty() {
        settings = settings.targets(Target::parse_list(target_names)?);
    }
    if let Some(request) = manifest.runtime_request()? {
        settings = settings.runtime(request);
    }
    let settings = settings.build()?;

    let mut bundler = Bundler::new(settings);
    if let Some(runtime) = &manifest.bundle.runtime {
        bundler = bundler.with_runtime_provisioner(
            DirectoryRuntimeProvisioner::new(base.join(&runtime.cache)),
            base.join(&runtime.dir),
        );
    }

    let dest = options.dest.clone().unwrap_or_else(|| base.join("dist"));
    let release = options.release.clone().unwrap_or_else(|| base.join("release"));

    let _ = output.section(&format!("Bundling {}", app.name()));
    for target in bundler.targets() {
        let _ = output.verbose(&format!("target {target}"));
    }

    let report = bundler.bundle(&app, &dest, &release).await;

    for artifact in report.artifacts() {
        let _ = output.success(&format!(
            "{} → {}",
            artifact.result.id(),
            artifact.result.output_file().display()
        ));
        for (file, sha256) in &artifact.checksums {
            let _ = output.indent(&format!("{}  {}", sha256, file.display()));
        }
    }
    for failure in report.failures() {
        output.error(&format!("{}: {}", failure.target, failure.error));
    }

    if let Some(publish_dir) = &options.publish {
        if report.artifacts().is_empty() {
            let _ = output.warn("nothing to publish");
        } else {
            let ctx = PublishContext::from_report(&app, &report);
            let driver = DirectoryPublishDriver::new(publish_dir);
            let record = publish::run(&driver, &ctx).await?;
            let _ = output.success(&format!(
                "published {} {} ({} files) to {}",
                record.name,
                record.version,
                record.files.len(),
                driver.version_dir(&ctx).display()
            ));
        }
    }

    if report.is_success() {
        Ok(0)
    } else {
        let _ = output.warn(&format!(
            "{} of {} targets failed",
            report.failures().len(),
            report.failures().len() + report.artifacts().len()
        ));
        Ok(1)
    }
}
