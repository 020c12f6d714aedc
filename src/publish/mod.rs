//! Publishing of bundled release files.
//!
//! A [`PublishContext`] is derived from a [`BundleReport`]. A
//! [`PublishDriver`] then runs three steps over it:
//!
//! 1. `prepare`: make the destination ready
//! 2. `make_package`: stage release files and checksums
//! 3. `publish`: record the release
//!
//! [`DirectoryPublishDriver`] publishes into a local directory laid out as
//! `{root}/{name}/{version}/{platform}/{file}` with a `SHA256SUMS` file and a
//! `publish.json` record next to the platform directories.

use crate::bundler::{AppDescription, BundleReport, ErrorExt, Result, utils::fs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    future::Future,
    path::{Path, PathBuf},
};

const CHECKSUMS_FILE: &str = "SHA256SUMS";
const RECORD_FILE: &str = "publish.json";

/// One release file to publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishFile {
    /// Bundler id that produced it
    pub target: String,
    /// Per-platform directory name
    pub platform_dir: String,
    /// Release file on disk
    pub path: PathBuf,
    /// Hex SHA-256
    pub sha256: String,
}

/// Everything a driver needs to publish one application version.
#[derive(Clone, Debug)]
pub struct PublishContext {
    name: String,
    version: String,
    files: Vec<PublishFile>,
}

impl PublishContext {
    /// Collects the release files of every successful target.
    pub fn from_report(app: &AppDescription, report: &BundleReport) -> Self {
        let files = report
            .artifacts()
            .iter()
            .flat_map(|artifact| {
                artifact.checksums.iter().map(|(path, sha256)| PublishFile {
                    target: artifact.target.id(),
                    platform_dir: artifact.target.platform().dir_name(),
                    path: path.clone(),
                    sha256: sha256.clone(),
                })
            })
            .collect();
        Self {
            name: app.name().to_string(),
            version: app.display_version().to_string(),
            files,
        }
    }

    /// Application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version being published.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Release files, in target order.
    pub fn files(&self) -> &[PublishFile] {
        &self.files
    }
}

/// Record written by a completed publish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    /// Application name
    pub name: String,
    /// Published version
    pub version: String,
    /// When the publish completed
    pub published_at: DateTime<Utc>,
    /// Published files relative to the version directory
    pub files: Vec<PublishedFile>,
}

/// One entry of a [`PublishRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedFile {
    /// Bundler id
    pub target: String,
    /// Path relative to the version directory
    pub path: String,
    /// Hex SHA-256
    pub sha256: String,
}

/// Publishing backend.
pub trait PublishDriver {
    /// Makes the destination ready for a new version.
    fn prepare(&self, ctx: &PublishContext) -> impl Future<Output = Result<()>> + Send;

    /// Stages release files. Returns the staged paths.
    fn make_package(&self, ctx: &PublishContext) -> impl Future<Output = Result<Vec<PathBuf>>> + Send;

    /// Completes the publish.
    fn publish(&self, ctx: &PublishContext) -> impl Future<Output = Result<PublishRecord>> + Send;
}

/// Runs all three steps.
pub async fn run<D: PublishDriver + Sync>(driver: &D, ctx: &PublishContext) -> Result<PublishRecord> {
    driver.prepare(ctx).await?;
    let staged = driver.make_package(ctx).await?;
    log::debug!("staged {} release files", staged.len());
    driver.publish(ctx).await
}

/// Publishes into a local directory tree.
#[derive(Clone, Debug)]
pub struct DirectoryPublishDriver {
    root: PathBuf,
}

impl DirectoryPublishDriver {
    /// Driver publishing under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory a version is published into.
    pub fn version_dir(&self, ctx: &PublishContext) -> PathBuf {
        self.root.join(&ctx.name).join(&ctx.version)
    }

    fn relative(file: &PublishFile) -> Option<String> {
        let name = file.path.file_name()?.to_string_lossy();
        Some(format!("{}/{}", file.platform_dir, name))
    }
}

impl PublishDriver for DirectoryPublishDriver {
    async fn prepare(&self, ctx: &PublishContext) -> Result<()> {
        let dir = self.version_dir(ctx);
        if dir.exists() {
            log::warn!("replacing previously published {} {}", ctx.name, ctx.version);
            fs::remove_dir_all(&dir).await?;
        }
        fs::create_dir_all(&dir).await
    }

    async fn make_package(&self, ctx: &PublishContext) -> Result<Vec<PathBuf>> {
        let dir = self.version_dir(ctx);
        let mut staged = Vec::with_capacity(ctx.files.len());
        let mut sums = String::new();

        for file in &ctx.files {
            let Some(relative) = Self::relative(file) else { continue };
            let dest = dir.join(&relative);
            fs::copy_to_file(&file.path, &dest).await?;
            sums.push_str(&format!("{}  {}\n", file.sha256, relative));
            staged.push(dest);
        }

        let sums_path = dir.join(CHECKSUMS_FILE);
        tokio::fs::write(&sums_path, sums)
            .await
            .fs_context("writing checksum file", &sums_path)?;
        Ok(staged)
    }

    async fn publish(&self, ctx: &PublishContext) -> Result<PublishRecord> {
        let record = PublishRecord {
            name: ctx.name.clone(),
            version: ctx.version.clone(),
            published_at: Utc::now(),
            files: ctx
                .files
                .iter()
                .filter_map(|file| {
                    Some(PublishedFile {
                        target: file.target.clone(),
                        path: Self::relative(file)?,
                        sha256: file.sha256.clone(),
                    })
                })
                .collect(),
        };

        let path = self.version_dir(ctx).join(RECORD_FILE);
        tokio::fs::write(&path, serde_json::to_string_pretty(&record)?)
            .await
            .fs_context("writing publish record", &path)?;
        log::info!("published {} {} to {}", ctx.name, ctx.version, path.display());
        Ok(record)
    }
}

/// Reads a record written by [`DirectoryPublishDriver`].
pub async fn read_record(version_dir: &Path) -> Result<PublishRecord> {
    let path = version_dir.join(RECORD_FILE);
    let json = tokio::fs::read_to_string(&path)
        .await
        .fs_context("reading publish record", &path)?;
    Ok(serde_json::from_str(&json)?)
}
