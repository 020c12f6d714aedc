//! Launcher metadata trailer.
//!
//! A launcher is a prebuilt stub executable with the application metadata
//! appended to it. The native launcher finds its metadata by walking the file
//! backwards, so the layout is fixed:
//!
//! ```text
//! [stub bytes][metadata bytes][offset as ASCII decimal][1 byte: offset length]
//! ```
//!
//! `offset` is the stub length, i.e. the position of the first metadata byte.
//! The reader takes the last byte as `L`, reads the `L` bytes before it as the
//! decimal offset `N`, and the metadata is `[N, len - L - 1)`.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Largest offset string the one-byte length field can describe.
pub const MAX_OFFSET_LEN: usize = u8::MAX as usize;

/// Builds the suffix appended after a stub of `stub_len` bytes.
pub fn encode_trailer(stub_len: u64, metadata: &[u8]) -> Result<Vec<u8>> {
    let offset = stub_len.to_string();
    let len = offset_length_byte(&offset)?;

    let mut out = Vec::with_capacity(metadata.len() + offset.len() + 1);
    out.extend_from_slice(metadata);
    out.extend_from_slice(offset.as_bytes());
    out.push(len);
    Ok(out)
}

fn offset_length_byte(offset: &str) -> Result<u8> {
    u8::try_from(offset.len()).map_err(|_| Error::TrailerOverflow { len: offset.len() })
}

/// Appends the metadata in `metadata_file` to `launcher` as a trailer.
///
/// The launcher's current length becomes the metadata offset. Returns that offset.
pub async fn append_trailer(launcher: &Path, metadata_file: &Path) -> Result<u64> {
    let metadata = tokio::fs::read(metadata_file)
        .await
        .fs_context("reading launcher metadata", metadata_file)?;
    append_trailer_bytes(launcher, &metadata).await
}

/// Appends `metadata` to `launcher` as a trailer. Returns the metadata offset.
pub async fn append_trailer_bytes(launcher: &Path, metadata: &[u8]) -> Result<u64> {
    let stub_len = tokio::fs::metadata(launcher)
        .await
        .fs_context("reading launcher size", launcher)?
        .len();
    let suffix = encode_trailer(stub_len, metadata)?;

    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(launcher)
        .await
        .fs_context("opening launcher for append", launcher)?;
    file.write_all(&suffix)
        .await
        .fs_context("appending launcher trailer", launcher)?;
    file.flush().await.fs_context("flushing launcher", launcher)?;
    Ok(stub_len)
}

/// Locates the metadata block in an in-memory launcher image.
pub fn parse_trailer(bytes: &[u8]) -> Result<&[u8]> {
    let Some((&last, _)) = bytes.split_last() else {
        return Err(Error::MalformedTrailer("file is empty".into()));
    };
    let offset_len = last as usize;
    let offset_start = offset_start(bytes.len() as u64, offset_len)? as usize;
    let digits = &bytes[offset_start..offset_start + offset_len];
    let meta_start = parse_offset(digits, offset_start as u64)? as usize;
    Ok(&bytes[meta_start..offset_start])
}

/// Reads the metadata block from a launcher file.
pub async fn read_trailer(launcher: &Path) -> Result<Vec<u8>> {
    let image = tokio::fs::read(launcher)
        .await
        .fs_context("reading launcher", launcher)?;
    parse_trailer(&image).map(<[u8]>::to_vec)
}

fn offset_start(file_len: u64, offset_len: usize) -> Result<u64> {
    if offset_len == 0 {
        return Err(Error::MalformedTrailer("offset length byte is zero".into()));
    }
    file_len
        .checked_sub(1 + offset_len as u64)
        .ok_or_else(|| {
            Error::MalformedTrailer(format!(
                "offset length {offset_len} exceeds file size {file_len}"
            ))
        })
}

fn parse_offset(digits: &[u8], limit: u64) -> Result<u64> {
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::MalformedTrailer(
            "offset string is not ASCII decimal".into(),
        ));
    }
    let text = std::str::from_utf8(digits)
        .map_err(|e| Error::MalformedTrailer(e.to_string()))?;
    let offset: u64 = text
        .parse()
        .map_err(|e: std::num::ParseIntError| Error::MalformedTrailer(e.to_string()))?;
    if offset > limit {
        return Err(Error::MalformedTrailer(format!(
            "metadata offset {offset} lies past the trailer at {limit}"
        )));
    }
    Ok(offset)
}
