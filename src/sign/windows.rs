//! Windows certificate store backend.

use super::{Credential, KeyMaterial, KeyProvider, Result, capture};
use crate::BoxFuture;

const QUERY: &str = r#"Get-ChildItem Cert:\CurrentUser\My -CodeSigningCert | ForEach-Object { "$($_.Thumbprint)|$($_.Subject)|$($_.Issuer)" }"#;

/// A certificate listed from `Cert:\CurrentUser\My`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreCertificate {
    /// Thumbprint
    pub thumbprint: String,
    /// Subject distinguished name
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
}

/// Backend over the current user's certificate store.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsStoreProvider;

impl WindowsStoreProvider {
    async fn resolve(&self, developer_id: Option<&str>, ca_id: Option<&str>) -> Result<Option<Credential>> {
        if !cfg!(windows) {
            return Ok(None);
        }
        let Some(developer_id) = developer_id else {
            return Ok(None);
        };
        let Ok(powershell) = which::which("powershell") else {
            log::debug!("windows-store: powershell not found on PATH");
            return Ok(None);
        };

        let mut command = tokio::process::Command::new(powershell);
        command.args(["-NoProfile", "-NonInteractive", "-Command", QUERY]);
        let output = capture("powershell", &mut command).await?;

        Ok(parse_certificates(&output)
            .into_iter()
            .find(|cert| {
                cert.subject.contains(developer_id) && ca_id.is_none_or(|ca| cert.issuer.contains(ca))
            })
            .map(|cert| {
                Credential::new(
                    "windows-store",
                    KeyMaterial::CertificateStore {
                        thumbprint: cert.thumbprint,
                        subject: cert.subject,
                    },
                )
            }))
    }
}

impl KeyProvider for WindowsStoreProvider {
    fn id(&self) -> &str {
        "windows-store"
    }

    fn try_resolve<'a>(
        &'a self,
        developer_id: Option<&'a str>,
        ca_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Credential>>> {
        Box::pin(self.resolve(developer_id, ca_id))
    }
}

/// Parses `thumbprint|subject|issuer` lines.
pub fn parse_certificates(output: &str) -> Vec<StoreCertificate> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.trim().splitn(3, '|');
            let thumbprint = parts.next().filter(|t| !t.is_empty())?;
            Some(StoreCertificate {
                thumbprint: thumbprint.to_string(),
                subject: parts.next()?.to_string(),
                issuer: parts.next().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_certificates() {
        let output = "A1B2C3|CN=Acme Corp, O=Acme|CN=Acme Issuing CA\r\n\r\nD4E5F6|CN=Other|CN=Other CA\r\n";
        let certs = parse_certificates(output);
        assert_eq!(certs.len(), 2);
        assert_eq!(
            certs[0],
            StoreCertificate {
                thumbprint: "A1B2C3".into(),
                subject: "CN=Acme Corp, O=Acme".into(),
                issuer: "CN=Acme Issuing CA".into(),
            }
        );
    }
}
