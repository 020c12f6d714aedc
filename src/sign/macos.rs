//! macOS keychain backend.
//!
//! Queries `security find-identity -v -p codesigning` and picks the first
//! valid identity whose name contains the developer id.

use super::{Credential, KeyMaterial, KeyProvider, Result, capture};
use crate::BoxFuture;
use regex::Regex;
use std::sync::LazyLock;

static IDENTITY_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"^\s*\d+\)\s+([0-9A-Fa-f]{40})\s+"(.+)"\s*$"#).ok());

/// A code signing identity listed by `security`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// SHA-1 hash
    pub hash: String,
    /// Quoted identity name
    pub name: String,
}

/// Backend over the login keychain.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacKeychainProvider;

impl MacKeychainProvider {
    async fn resolve(&self, developer_id: Option<&str>, ca_id: Option<&str>) -> Result<Option<Credential>> {
        if !cfg!(target_os = "macos") {
            return Ok(None);
        }
        let Some(developer_id) = developer_id else {
            return Ok(None);
        };
        if ca_id.is_some() {
            log::debug!("macos-keychain: certificate authority filter is not supported, ignoring");
        }

        let mut command = tokio::process::Command::new("/usr/bin/security");
        command.args(["find-identity", "-v", "-p", "codesigning"]);
        let output = capture("security", &mut command).await?;

        Ok(parse_identities(&output)
            .into_iter()
            .find(|identity| identity.name.contains(developer_id))
            .map(|identity| {
                Credential::new(
                    "macos-keychain",
                    KeyMaterial::KeychainIdentity {
                        hash: identity.hash,
                        name: identity.name,
                    },
                )
            }))
    }
}

impl KeyProvider for MacKeychainProvider {
    fn id(&self) -> &str {
        "macos-keychain"
    }

    fn try_resolve<'a>(
        &'a self,
        developer_id: Option<&'a str>,
        ca_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Credential>>> {
        Box::pin(self.resolve(developer_id, ca_id))
    }
}

/// Parses lines like `  1) 0123ABCD... "Developer ID Application: Acme (TEAM)"`.
pub fn parse_identities(output: &str) -> Vec<Identity> {
    let Some(re) = IDENTITY_LINE.as_ref() else {
        return Vec::new();
    };
    output
        .lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| Identity {
            hash: caps[1].to_string(),
            name: caps[2].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identities() {
        let output = "\
  1) 0123456789ABCDEF0123456789ABCDEF01234567 \"Developer ID Application: Acme Corp (TEAM123)\"
  2) FEDCBA9876543210FEDCBA9876543210FEDCBA98 \"Apple Development: dev@acme.test (XYZ)\"
     2 valid identities found
";
        let identities = parse_identities(output);
        assert_eq!(identities.len(), 2);
        assert_eq!(identities[0].hash, "0123456789ABCDEF0123456789ABCDEF01234567");
        assert_eq!(identities[0].name, "Developer ID Application: Acme Corp (TEAM123)");
    }

    #[test]
    fn test_parse_no_identities() {
        assert!(parse_identities("     0 valid identities found\n").is_empty());
    }
}
