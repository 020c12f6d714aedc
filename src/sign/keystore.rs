//! PKCS#12 keystore file backend.
//!
//! Lists the keystore's bags with the `openssl` CLI and selects the one whose
//! `friendlyName` equals the developer id. The password travels through an
//! environment variable of the child process, never its argument list.

use super::{Credential, KeyMaterial, KeyProvider, Result, capture};
use crate::BoxFuture;
use std::path::PathBuf;

const PASSWORD_ENV: &str = "KODEGEN_PKCS12_PASSIN";

/// One certificate bag from `openssl pkcs12 -info` output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeystoreEntry {
    /// `friendlyName` attribute
    pub friendly_name: String,
    /// `subject=` line
    pub subject: String,
    /// `issuer=` line
    pub issuer: String,
}

impl KeystoreEntry {
    fn matches(&self, developer_id: &str, ca_id: Option<&str>) -> bool {
        self.friendly_name == developer_id && ca_id.is_none_or(|ca| self.issuer.contains(ca))
    }
}

/// Backend over a keystore file.
pub struct KeystoreProvider {
    path: PathBuf,
    password: String,
}

impl std::fmt::Debug for KeystoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreProvider")
            .field("path", &self.path)
            .field("password", &"<hidden>")
            .finish()
    }
}

impl KeystoreProvider {
    /// Backend for the keystore at `path`.
    pub fn new(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            password: password.into(),
        }
    }

    async fn resolve(&self, developer_id: Option<&str>, ca_id: Option<&str>) -> Result<Option<Credential>> {
        let Some(developer_id) = developer_id else {
            return Ok(None);
        };
        let Ok(openssl) = which::which("openssl") else {
            log::debug!("keystore: openssl not found on PATH");
            return Ok(None);
        };

        let mut command = tokio::process::Command::new(openssl);
        command
            .args(["pkcs12", "-info", "-nokeys", "-in"])
            .arg(&self.path)
            .arg("-passin")
            .arg(format!("env:{PASSWORD_ENV}"))
            .env(PASSWORD_ENV, &self.password);
        let output = capture("openssl", &mut command).await?;

        let entry = parse_entries(&output)
            .into_iter()
            .find(|e| e.matches(developer_id, ca_id));
        Ok(entry.map(|e| {
            Credential::new(
                "keystore",
                KeyMaterial::Pkcs12 {
                    path: self.path.clone(),
                    alias: e.friendly_name,
                    password: self.password.clone(),
                },
            )
        }))
    }
}

impl KeyProvider for KeystoreProvider {
    fn id(&self) -> &str {
        "keystore"
    }

    fn try_resolve<'a>(
        &'a self,
        developer_id: Option<&'a str>,
        ca_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Credential>>> {
        Box::pin(self.resolve(developer_id, ca_id))
    }
}

/// Parses the bag listing printed by `openssl pkcs12 -info`.
///
/// Every `Bag Attributes` header starts a new entry; entries without a
/// `friendlyName` are dropped.
pub fn parse_entries(output: &str) -> Vec<KeystoreEntry> {
    let mut entries = Vec::new();
    let mut current: Option<KeystoreEntry> = None;

    for line in output.lines().map(str::trim) {
        if line.starts_with("Bag Attributes") {
            entries.extend(current.take());
            current = Some(KeystoreEntry::default());
        } else if let Some(entry) = current.as_mut() {
            if let Some(name) = line.strip_prefix("friendlyName:") {
                entry.friendly_name = name.trim().to_string();
            } else if let Some(subject) = line.strip_prefix("subject=") {
                entry.subject = subject.trim().to_string();
            } else if let Some(issuer) = line.strip_prefix("issuer=") {
                entry.issuer = issuer.trim().to_string();
            }
        }
    }
    entries.extend(current);
    entries.retain(|e| !e.friendly_name.is_empty());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
MAC: sha256, Iteration 2048
Certificate bag
Bag Attributes
    localKeyID: 01 02 03
    friendlyName: acme-dev
subject=CN = Acme Developer
issuer=CN = Acme Root CA
-----BEGIN CERTIFICATE-----
MIIC
-----END CERTIFICATE-----
Certificate bag
Bag Attributes: <No Attributes>
subject=CN = Acme Root CA
issuer=CN = Acme Root CA
-----BEGIN CERTIFICATE-----
MIID
-----END CERTIFICATE-----
";

    #[test]
    fn test_parse_entries() {
        let entries = parse_entries(LISTING);
        assert_eq!(
            entries,
            vec![KeystoreEntry {
                friendly_name: "acme-dev".into(),
                subject: "CN = Acme Developer".into(),
                issuer: "CN = Acme Root CA".into(),
            }]
        );
    }

    #[test]
    fn test_entry_matching() {
        let entry = &parse_entries(LISTING)[0];
        assert!(entry.matches("acme-dev", None));
        assert!(entry.matches("acme-dev", Some("Acme Root")));
        assert!(!entry.matches("acme-dev", Some("Other CA")));
        assert!(!entry.matches("someone-else", None));
    }

    #[tokio::test]
    async fn test_declines_without_developer_id() {
        let provider = KeystoreProvider::new("/nonexistent.p12", "secret");
        assert!(provider.try_resolve(None, None).await.unwrap().is_none());
        assert!(!format!("{provider:?}").contains("secret"));
    }
}
