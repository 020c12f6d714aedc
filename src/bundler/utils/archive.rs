//! tar.gz and zip archives that keep unix permission bits.
//!
//! Both formats archive a single source path under its own file name, so a
//! file `Demo` unpacks to `Demo` and a directory `Demo.app` unpacks to
//! `Demo.app/...`. The work runs on the blocking pool.

use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::utils::fs::{apply_unix_mode, unix_mode};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tar::HeaderMode;
use walkdir::WalkDir;
use zip::{CompressionMethod, write::SimpleFileOptions};

/// Release archive formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArchiveFormat {
    /// gzip-compressed tarball
    TarGz,
    /// zip
    Zip,
}

impl ArchiveFormat {
    /// Detects the format from an archive file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Conventional file extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

/// Compresses `source` (file or directory) into `dest_archive` as tar.gz.
pub async fn compress_as_tar_gz(dest_archive: &Path, source: &Path) -> Result<PathBuf> {
    let dest = dest_archive.to_path_buf();
    let source = source.to_path_buf();
    tokio::task::spawn_blocking(move || {
        write_tar_gz(&dest, &source)?;
        Ok(dest)
    })
    .await?
}

/// Compresses `source` (file or directory) into `dest_archive` as zip.
pub async fn compress_as_zip(dest_archive: &Path, source: &Path) -> Result<PathBuf> {
    let dest = dest_archive.to_path_buf();
    let source = source.to_path_buf();
    tokio::task::spawn_blocking(move || {
        write_zip(&dest, &source)?;
        Ok(dest)
    })
    .await?
}

/// Compresses `source` with the given format.
pub async fn compress(format: ArchiveFormat, dest_archive: &Path, source: &Path) -> Result<PathBuf> {
    match format {
        ArchiveFormat::TarGz => compress_as_tar_gz(dest_archive, source).await,
        ArchiveFormat::Zip => compress_as_zip(dest_archive, source).await,
    }
}

/// Unpacks a tar.gz archive into `dest_dir`.
pub async fn decompress_tar_gz(archive: &Path, dest_dir: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest_dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&dest).fs_context("creating extraction directory", &dest)?;
        let file = File::open(&archive).fs_context("opening archive", &archive)?;
        let mut tar = tar::Archive::new(GzDecoder::new(file));
        tar.set_preserve_permissions(true);
        tar.unpack(&dest).fs_context("unpacking archive", &archive)
    })
    .await?
}

/// Unpacks a zip archive into `dest_dir`.
pub async fn decompress_zip(archive: &Path, dest_dir: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest_dir.to_path_buf();
    tokio::task::spawn_blocking(move || read_zip(&archive, &dest)).await?
}

/// Unpacks an archive, picking the format from its file name.
pub async fn extract(archive: &Path, dest_dir: &Path) -> Result<()> {
    match ArchiveFormat::from_path(archive) {
        Some(ArchiveFormat::TarGz) => decompress_tar_gz(archive, dest_dir).await,
        Some(ArchiveFormat::Zip) => decompress_zip(archive, dest_dir).await,
        None => Err(Error::GenericError(format!(
            "unsupported archive format: {}",
            archive.display()
        ))),
    }
}

/// Archive entries for `source`, as (absolute path, archive name) pairs.
fn entries(source: &Path) -> Result<Vec<(PathBuf, String)>> {
    if source.file_name().is_none() {
        return Err(Error::GenericError(format!("cannot archive {}", source.display())));
    }
    let base = source.parent().unwrap_or_else(|| Path::new(""));

    let mut out = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        let rel = entry.path().strip_prefix(base)?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        out.push((entry.path().to_path_buf(), name));
    }
    Ok(out)
}

fn write_tar_gz(dest: &Path, source: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).fs_context("creating release directory", parent)?;
    }
    let file = File::create(dest).fs_context("creating tar.gz file", dest)?;
    let enc = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for (path, name) in entries(source)? {
        let metadata = std::fs::metadata(&path).fs_context("reading metadata of", &path)?;
        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&metadata, HeaderMode::Complete);
        header.set_mode(unix_mode(&metadata));

        if metadata.is_dir() {
            tar.append_data(&mut header, &name, &mut io::empty())
                .fs_context("adding directory to tar", &path)?;
        } else {
            let mut file = File::open(&path).fs_context("opening file for tar", &path)?;
            tar.append_data(&mut header, &name, &mut file)
                .fs_context("adding file to tar", &path)?;
        }
    }

    let enc = tar.into_inner().fs_context("finishing tar stream", dest)?;
    let mut finished = enc.finish().fs_context("finishing gzip stream", dest)?;
    finished.flush().fs_context("flushing", dest)?;
    Ok(())
}

fn write_zip(dest: &Path, source: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).fs_context("creating release directory", parent)?;
    }
    let file = File::create(dest).fs_context("creating zip file", dest)?;
    let mut zip = zip::ZipWriter::new(file);

    for (path, name) in entries(source)? {
        let metadata = std::fs::metadata(&path).fs_context("reading metadata of", &path)?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(unix_mode(&metadata));

        if metadata.is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input = File::open(&path).fs_context("opening file for zip", &path)?;
            io::copy(&mut input, &mut zip).fs_context("writing zip entry", &path)?;
        }
    }
    zip.finish()?;
    Ok(())
}

fn read_zip(archive: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest).fs_context("creating extraction directory", dest)?;
    let file = File::open(archive).fs_context("opening archive", archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    let mut dir_modes = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(rel) = entry.enclosed_name() else {
            log::warn!("skipping zip entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = dest.join(rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).fs_context("creating directory", &out_path)?;
            if let Some(mode) = entry.unix_mode() {
                dir_modes.push((out_path, mode & 0o7777));
            }
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
            }
            let mut out = File::create(&out_path).fs_context("creating file", &out_path)?;
            io::copy(&mut entry, &mut out).fs_context("extracting zip entry", &out_path)?;
            if let Some(mode) = entry.unix_mode() {
                apply_unix_mode(&out_path, mode & 0o7777)?;
            }
        }
    }

    // Directory modes last, deepest first: a read-only directory must still
    // receive its children.
    dir_modes.sort_by_key(|(path, _)| std::cmp::Reverse(path.components().count()));
    for (path, mode) in dir_modes {
        apply_unix_mode(&path, mode)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(root: &Path) -> PathBuf {
        let app = root.join("Demo.app");
        std::fs::create_dir_all(app.join("Contents/MacOS")).unwrap();
        std::fs::write(app.join("Contents/Info.plist"), b"<plist/>").unwrap();
        std::fs::write(app.join("Contents/MacOS/launcher"), b"\x7fELF\x00\x01").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(
                app.join("Contents/MacOS/launcher"),
                std::fs::Permissions::from_mode(0o750),
            )
            .unwrap();
            std::fs::set_permissions(
                app.join("Contents/Info.plist"),
                std::fs::Permissions::from_mode(0o644),
            )
            .unwrap();
        }
        app
    }

    fn assert_same_tree(original: &Path, restored: &Path) {
        for entry in WalkDir::new(original) {
            let entry = entry.unwrap();
            let rel = entry.path().strip_prefix(original).unwrap();
            let copy = if rel.as_os_str().is_empty() {
                restored.to_path_buf()
            } else {
                restored.join(rel)
            };
            assert!(copy.exists(), "missing {}", copy.display());
            if entry.file_type().is_file() {
                assert_eq!(std::fs::read(entry.path()).unwrap(), std::fs::read(&copy).unwrap());
                #[cfg(unix)]
                {
                    let a = unix_mode(&entry.metadata().unwrap()) & 0o111;
                    let b = unix_mode(&std::fs::metadata(&copy).unwrap()) & 0o111;
                    assert_eq!(a, b, "exec bits differ for {}", rel.display());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_tar_gz_tree_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let app = tree(dir.path());
        let archive = dir.path().join("out/Demo.tar.gz");
        compress_as_tar_gz(&archive, &app).await.unwrap();

        let unpacked = dir.path().join("unpacked");
        decompress_tar_gz(&archive, &unpacked).await.unwrap();
        assert_same_tree(&app, &unpacked.join("Demo.app"));
    }

    #[tokio::test]
    async fn test_tar_gz_single_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let app = tree(dir.path());
        let launcher = app.join("Contents/MacOS/launcher");
        let archive = dir.path().join("launcher.tar.gz");
        compress_as_tar_gz(&archive, &launcher).await.unwrap();

        let unpacked = dir.path().join("unpacked");
        extract(&archive, &unpacked).await.unwrap();
        assert_same_tree(&launcher, &unpacked.join("launcher"));
    }

    #[tokio::test]
    async fn test_zip_tree_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let app = tree(dir.path());
        let archive = dir.path().join("Demo.zip");
        compress_as_zip(&archive, &app).await.unwrap();

        let unpacked = dir.path().join("unpacked");
        decompress_zip(&archive, &unpacked).await.unwrap();
        assert_same_tree(&app, &unpacked.join("Demo.app"));
    }

    #[tokio::test]
    async fn test_zip_single_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let app = tree(dir.path());
        let launcher = app.join("Contents/MacOS/launcher");
        let archive = dir.path().join("launcher.zip");
        compress(ArchiveFormat::Zip, &archive, &launcher).await.unwrap();

        let unpacked = dir.path().join("unpacked");
        extract(&archive, &unpacked).await.unwrap();
        assert_same_tree(&launcher, &unpacked.join("launcher"));
    }

    #[cfg(unix)]
    fn tree_with_read_only_dir(root: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let tree = root.join("tree");
        std::fs::create_dir_all(tree.join("ro")).unwrap();
        std::fs::write(tree.join("ro/file"), b"locked").unwrap();
        std::fs::set_permissions(tree.join("ro"), std::fs::Permissions::from_mode(0o555)).unwrap();
        tree
    }

    #[cfg(unix)]
    fn make_writable(root: &Path) {
        use std::os::unix::fs::PermissionsExt;
        for entry in WalkDir::new(root).into_iter().flatten() {
            if entry.file_type().is_dir() {
                let _ = std::fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(0o755));
            }
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_only_directory_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let tree = tree_with_read_only_dir(dir.path());

        for format in [ArchiveFormat::Zip, ArchiveFormat::TarGz] {
            let archive = dir.path().join(format!("tree.{}", format.extension()));
            compress(format, &archive, &tree).await.unwrap();

            let unpacked = dir.path().join(format!("unpacked-{}", format.extension()));
            extract(&archive, &unpacked).await.unwrap();

            let restored = unpacked.join("tree/ro");
            assert_eq!(std::fs::read(restored.join("file")).unwrap(), b"locked");
            assert_eq!(unix_mode(&std::fs::metadata(&restored).unwrap()), 0o555);
            make_writable(&unpacked);
        }
        make_writable(&tree);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ArchiveFormat::from_path(Path::new("a/Demo.TAR.GZ")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_path(Path::new("jre.tgz")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_path(Path::new("Demo.exe.zip")), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path(Path::new("Demo.exe")), None);
    }
}
