//! File system utilities for bundling.
//!
//! Every helper attaches the offending path to its error.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Creates all directories of `path`. Existing directories are not an error.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .await
            .fs_context("removing directory", path)
    } else {
        Ok(())
    }
}

/// Removes a file, ignoring one that is already gone.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other.fs_context("removing file", path),
    }
}

/// Copies a regular file byte-for-byte, creating parent directories of the
/// destination and overwriting it if present.
///
/// Fails if the source is a directory or doesn't exist.
pub async fn copy_to_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(Error::Fs {
            context: "copying",
            path: from.to_path_buf(),
            error: io::Error::new(io::ErrorKind::NotFound, "source is not a regular file"),
        });
    }
    if let Some(dest_dir) = to.parent() {
        create_dir_all(dest_dir).await?;
    }
    fs::copy(from, to).await.fs_context("copying file to", to)?;
    Ok(())
}

/// Recursively copies the contents of `from` into `to`, creating `to` if needed.
///
/// Preserves symlinks on platforms that support them.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::Fs {
            context: "copying directory",
            path: from.to_path_buf(),
            error: io::Error::new(io::ErrorKind::NotFound, "source is not a directory"),
        });
    }
    create_dir_all(to).await?;

    for entry in walkdir::WalkDir::new(from) {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path())
                .await
                .fs_context("reading symlink", entry.path())?;
            clear_destination(&dest_path).await?;
            symlink(&target, &dest_path, entry.path().is_dir())
                .fs_context("creating symlink", &dest_path)?;
        } else if entry.file_type().is_dir() {
            create_dir_all(&dest_path).await?;
        } else {
            if is_symlink(&dest_path).await {
                clear_destination(&dest_path).await?;
            }
            fs::copy(entry.path(), &dest_path)
                .await
                .fs_context("copying file to", &dest_path)?;
        }
    }

    Ok(())
}

async fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .is_ok_and(|m| m.file_type().is_symlink())
}

/// Removes whatever sits at `path` without following links.
async fn clear_destination(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await.fs_context("removing existing", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("inspecting", path),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path, _is_dir: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Adds the owner and group execute bits. World bits are left untouched.
///
/// No-op where the platform has no permission bits.
pub async fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .await
            .fs_context("reading permissions of", path)?
            .permissions();
        perms.set_mode(perms.mode() | 0o110);
        fs::set_permissions(path, perms)
            .await
            .fs_context("setting permissions of", path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Unix mode bits of a file, or a conventional default elsewhere.
pub fn unix_mode(metadata: &std::fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o7777
    }
    #[cfg(not(unix))]
    {
        if metadata.is_dir() { 0o755 } else { 0o644 }
    }
}

/// Applies unix mode bits to an extracted file.
pub fn apply_unix_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .fs_context("setting permissions of", path)?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_to_file_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dest = dir.path().join("a/b/c/dest.bin");
        tokio::fs::write(&src, b"\x00\x01payload\xff").await.unwrap();

        copy_to_file(&src, &dest).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"\x00\x01payload\xff");

        tokio::fs::write(&src, b"short").await.unwrap();
        copy_to_file(&src, &dest).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_copy_to_file_rejects_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_to_file(&dir.path().join("nope"), &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fs { .. }));
    }

    #[tokio::test]
    async fn test_create_dir_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("x/y");
        create_dir_all(&nested).await.unwrap();
        create_dir_all(&nested).await.unwrap();
        assert!(nested.is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_set_executable_owner_and_group_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("launcher");
        std::fs::write(&file, b"#!").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o640)).unwrap();

        set_executable(&file).await.unwrap();
        let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    #[tokio::test]
    async fn test_copy_dir_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::write(src.join("nested/file.txt"), b"hi").unwrap();

        let dest = dir.path().join("dest");
        copy_dir(&src, &dest).await.unwrap();
        assert_eq!(std::fs::read(dest.join("nested/file.txt")).unwrap(), b"hi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_dir_twice_with_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = dir.path().join("runtime");
        std::fs::create_dir_all(runtime.join("legal")).unwrap();
        std::fs::write(runtime.join("avian"), b"vm").unwrap();
        std::os::unix::fs::symlink("../avian", runtime.join("legal/LICENSE")).unwrap();

        let out = dir.path().join("out");
        copy_dir(&runtime, &out).await.unwrap();
        copy_dir(&runtime, &out).await.unwrap();

        let link = out.join("legal/LICENSE");
        assert_eq!(std::fs::read_link(&link).unwrap(), Path::new("../avian"));
        assert_eq!(std::fs::read(&link).unwrap(), b"vm");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_dir_replaces_stale_link_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("lib.so"), b"new").unwrap();

        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let elsewhere = dir.path().join("elsewhere.so");
        std::fs::write(&elsewhere, b"old").unwrap();
        std::os::unix::fs::symlink(&elsewhere, out.join("lib.so")).unwrap();

        copy_dir(&src, &out).await.unwrap();
        assert!(!std::fs::symlink_metadata(out.join("lib.so")).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read(out.join("lib.so")).unwrap(), b"new");
        assert_eq!(std::fs::read(&elsewhere).unwrap(), b"old");
    }
}
