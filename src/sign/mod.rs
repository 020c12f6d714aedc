//! Signing credential resolution.
//!
//! A [`CompositeKeyProvider`] holds an ordered list of [`Registration`]s.
//! Each registration pairs a guard predicate with a constructor for one
//! [`KeyProvider`] backend. On [`CompositeKeyProvider::resolve`] the
//! registrations are walked in order: a backend is constructed only if its
//! guard holds, tried exactly once, and the first credential returned wins.
//!
//! A backend either returns a credential, declines (`Ok(None)`), or fails.
//! Failures are logged and treated as declines so one broken backend never
//! hides the ones after it. Only when every backend has declined does
//! resolution fail with [`KeyError::NoCredentialAvailable`].
//!
//! ```no_run
//! use kodegen_bundler_launcher::sign::{KeyConfig, default_provider};
//!
//! # async fn example() -> kodegen_bundler_launcher::sign::Result<()> {
//! let config = KeyConfig::from_env();
//! let credential = default_provider(&config)
//!     .resolve(config.developer_id(), config.ca_id())
//!     .await?;
//! println!("signing with {} ({})", credential.provider(), credential.kind());
//! # Ok(())
//! # }
//! ```

pub mod env;
mod error;
pub mod factory;
pub mod keystore;
pub mod macos;
pub mod windows;

pub use error::{KeyError, Result};
pub use factory::{KeyConfig, default_provider, default_registrations};

use crate::BoxFuture;
use std::{fmt, path::PathBuf};

/// Key material handed to a signing step. Never logged.
#[derive(Clone)]
pub enum KeyMaterial {
    /// PEM private key and certificate chain, leaf first.
    Pem {
        /// PEM encoded private key
        private_key: String,
        /// PEM encoded certificates
        certificate_chain: Vec<String>,
    },
    /// Entry inside a PKCS#12 keystore file.
    Pkcs12 {
        /// Keystore file
        path: PathBuf,
        /// `friendlyName` of the selected entry
        alias: String,
        /// Keystore password
        password: String,
    },
    /// Code signing identity in the macOS keychain.
    KeychainIdentity {
        /// SHA-1 hash of the identity
        hash: String,
        /// Identity name, e.g. `Developer ID Application: ...`
        name: String,
    },
    /// Certificate in the Windows certificate store.
    CertificateStore {
        /// Certificate thumbprint
        thumbprint: String,
        /// Certificate subject
        subject: String,
    },
}

impl KeyMaterial {
    /// Short name of the material kind.
    pub fn kind(&self) -> &'static str {
        match self {
            KeyMaterial::Pem { .. } => "pem",
            KeyMaterial::Pkcs12 { .. } => "pkcs12",
            KeyMaterial::KeychainIdentity { .. } => "keychain-identity",
            KeyMaterial::CertificateStore { .. } => "certificate-store",
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Pem {
                certificate_chain, ..
            } => f
                .debug_struct("Pem")
                .field("private_key", &"<hidden>")
                .field("certificate_chain", &certificate_chain.len())
                .finish(),
            KeyMaterial::Pkcs12 { path, alias, .. } => f
                .debug_struct("Pkcs12")
                .field("path", path)
                .field("alias", alias)
                .field("password", &"<hidden>")
                .finish(),
            KeyMaterial::KeychainIdentity { hash, name } => f
                .debug_struct("KeychainIdentity")
                .field("hash", hash)
                .field("name", name)
                .finish(),
            KeyMaterial::CertificateStore {
                thumbprint,
                subject,
            } => f
                .debug_struct("CertificateStore")
                .field("thumbprint", thumbprint)
                .field("subject", subject)
                .finish(),
        }
    }
}

/// A resolved signing key and the backend it came from.
#[derive(Clone, Debug)]
pub struct Credential {
    provider: String,
    material: KeyMaterial,
}

impl Credential {
    /// Creates a credential.
    pub fn new(provider: impl Into<String>, material: KeyMaterial) -> Self {
        Self {
            provider: provider.into(),
            material,
        }
    }

    /// Id of the backend that produced this credential.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The key material.
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Short name of the material kind.
    pub fn kind(&self) -> &'static str {
        self.material.kind()
    }
}

/// One credential backend.
pub trait KeyProvider: Send + Sync {
    /// Stable backend id, e.g. `env`.
    fn id(&self) -> &str;

    /// Looks up a credential. `Ok(None)` declines.
    fn try_resolve<'a>(
        &'a self,
        developer_id: Option<&'a str>,
        ca_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Credential>>>;
}

type Guard = Box<dyn Fn() -> bool + Send + Sync>;
type Constructor = Box<dyn Fn() -> Box<dyn KeyProvider> + Send + Sync>;

/// A lazily constructed backend behind an activation guard.
pub struct Registration {
    name: String,
    guard: Guard,
    build: Constructor,
}

impl Registration {
    /// Unconditional registration.
    pub fn new<P, F>(name: impl Into<String>, build: F) -> Self
    where
        P: KeyProvider + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            guard: Box::new(|| true),
            build: Box::new(move || Box::new(build())),
        }
    }

    /// Only construct the backend when `guard` holds at resolve time.
    pub fn when(mut self, guard: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.guard = Box::new(guard);
        self
    }

    /// Registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the activation guard.
    pub fn is_active(&self) -> bool {
        (self.guard)()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("name", &self.name).finish()
    }
}

/// Ordered chain of credential backends. Registration order is precedence.
#[derive(Debug, Default)]
pub struct CompositeKeyProvider {
    registrations: Vec<Registration>,
}

impl CompositeKeyProvider {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain over `registrations`, in order.
    pub fn from_registrations(registrations: Vec<Registration>) -> Self {
        Self { registrations }
    }

    /// Appends a registration.
    pub fn register(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Registrations, in precedence order.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Returns the first credential any active backend yields.
    pub async fn resolve(&self, developer_id: Option<&str>, ca_id: Option<&str>) -> Result<Credential> {
        let mut tried = Vec::new();

        for registration in &self.registrations {
            if !registration.is_active() {
                log::debug!("key backend '{}' inactive, skipping", registration.name);
                continue;
            }
            let provider = (registration.build)();
            tried.push(provider.id().to_string());

            match provider.try_resolve(developer_id, ca_id).await {
                Ok(Some(credential)) => {
                    log::info!("using {} credential from '{}'", credential.kind(), provider.id());
                    return Ok(credential);
                }
                Ok(None) => log::debug!("key backend '{}' declined", provider.id()),
                Err(e) => log::warn!("key backend '{}' failed, trying next: {}", provider.id(), e),
            }
        }

        Err(KeyError::NoCredentialAvailable { tried })
    }
}

/// Runs `command` and returns its stdout, failing on a non-zero exit.
pub(crate) async fn capture(program: &str, command: &mut tokio::process::Command) -> Result<String> {
    let output = command.output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KeyError::Command {
            program: program.to_string(),
            message: match stderr.trim() {
                "" => output.status.to_string(),
                msg => msg.to_string(),
            },
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
