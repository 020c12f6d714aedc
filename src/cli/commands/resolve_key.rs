//! `resolve-key` command.

use crate::cli::OutputManager;
use crate::error::Result;
use crate::sign::{KeyConfig, default_provider};

/// Resolves a credential and prints where it came from. Key material is never printed.
pub async fn execute_resolve_key(developer_id: Option<String>, ca_id: Option<String>) -> Result<i32> {
    let mut config = KeyConfig::from_env();
    if let Some(id) = developer_id {
        config = config.with_developer_id(id);
    }
    if let Some(id) = ca_id {
        config = config.with_ca_id(id);
    }
    log::debug!("key config: {config:?}");

    let credential = default_provider(&config)
        .resolve(config.developer_id(), config.ca_id())
        .await?;

    let output = OutputManager::new(false);
    let _ = output.success(&format!(
        "{} credential from '{}'",
        credential.kind(),
        credential.provider()
    ));
    Ok(0)
}
