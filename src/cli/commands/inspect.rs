//! `inspect` command.

use crate::bundler::trailer;
use crate::cli::OutputManager;
use crate::error::Result;
use std::path::Path;

/// Prints the metadata document appended to `launcher`.
pub async fn execute_inspect(launcher: &Path) -> Result<i32> {
    let metadata = trailer::read_trailer(launcher).await?;
    let output = OutputManager::new(false);
    let _ = output.println(&String::from_utf8_lossy(&metadata));
    Ok(0)
}
