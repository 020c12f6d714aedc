//! Shared skeleton for trailer-based launchers.

use crate::bundler::{
    AppDescription, BundlerResult, BundlerSettings,
    error::{Error, Result},
    metadata, trailer,
    utils::{archive, archive::ArchiveFormat, fs},
};
use std::path::{Path, PathBuf};

/// Where a launcher build writes, computed before anything touches disk.
#[derive(Debug)]
pub(crate) struct LauncherLayout {
    pub id: String,
    pub platform_dir: String,
    pub file_name: String,
    pub release_name: String,
    pub format: ArchiveFormat,
    pub stub: PathBuf,
}

/// Fails with a configuration error when a jar-based app does not have
/// exactly one main jar, or when the stub is missing.
pub(crate) fn preflight(app: &AppDescription, target_id: &str, stub: &Path) -> Result<()> {
    if !app.jars().is_empty() {
        app.main_jar()?;
    }
    if !stub.is_file() {
        return Err(Error::MissingStub {
            target: target_id.to_string(),
            path: stub.to_path_buf(),
        });
    }
    Ok(())
}

/// Replaces whitespace runs with dots, as used for release file names.
pub(crate) fn dotted(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(".")
}

/// Copies `stub` to `dest`, appends the metadata trailer and makes the
/// result executable. The scratch `{file}.app.xml` next to `dest` is removed.
pub(crate) async fn write_launcher(
    settings: &BundlerSettings,
    app: &AppDescription,
    stub: &Path,
    dest: &Path,
) -> Result<()> {
    settings.step(format!("copying stub {} -> {}", stub.display(), dest.display()));
    fs::copy_to_file(stub, dest).await?;

    let file_name = dest.file_name().unwrap_or_default().to_string_lossy();
    let scratch = dest.with_file_name(format!("{file_name}.app.xml"));
    metadata::write_app_xml(app, settings, &scratch).await?;

    let offset = trailer::append_trailer(dest, &scratch).await?;
    settings.step(format!("appended metadata trailer at offset {offset}"));

    fs::set_executable(dest).await?;
    fs::remove_file(&scratch).await?;
    Ok(())
}

/// Runs the full launcher skeleton: directories, launcher, release archive.
pub(crate) async fn build_launcher(
    settings: &BundlerSettings,
    app: &AppDescription,
    dest_dir: &Path,
    release_dir: &Path,
    layout: LauncherLayout,
) -> Result<BundlerResult> {
    preflight(app, &layout.id, &layout.stub)?;

    let out_dir = dest_dir.join(&layout.platform_dir);
    let rel_dir = release_dir.join(&layout.platform_dir);
    fs::create_dir_all(&out_dir).await?;
    fs::create_dir_all(&rel_dir).await?;

    let dest = out_dir.join(&layout.file_name);
    write_launcher(settings, app, &layout.stub, &dest).await?;

    let release_file = rel_dir.join(&layout.release_name);
    fs::remove_file(&release_file).await?;
    archive::compress(layout.format, &release_file, &dest).await?;

    log::info!("{}: created {}", layout.id, release_file.display());
    Ok(BundlerResult::new(layout.id, dest, vec![release_file]))
}
