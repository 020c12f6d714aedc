//! Default credential chain.
//!
//! Registration order, which is also precedence:
//!
//! 1. `env`: always registered
//! 2. `keystore`: when the keystore file exists and both a developer id and a
//!    keystore password are configured
//! 3. `macos-keychain` / `windows-store`: on the matching OS when a developer
//!    id is configured
//!
//! Guards are evaluated at resolve time, so a keystore created after the chain
//! was built is still picked up.

use super::{
    CompositeKeyProvider, Registration,
    env::{EnvKeyProvider, EnvSource, ProcessEnv},
    keystore::KeystoreProvider,
    macos::MacKeychainProvider,
    windows::WindowsStoreProvider,
};
use std::path::{Path, PathBuf};

/// Keystore file path.
pub const KEYSTORE_VAR: &str = "KODEGEN_KEYSTORE";
/// Developer identity.
pub const DEVELOPER_ID_VAR: &str = "KODEGEN_DEVELOPER_ID";
/// Certificate authority identity.
pub const CA_ID_VAR: &str = "KODEGEN_CA_ID";
/// Keystore password.
pub const KEYSTORE_PASSWORD_VAR: &str = "KODEGEN_KEYSTORE_PASSWORD";

/// Key configuration.
#[derive(Clone, Default)]
pub struct KeyConfig {
    keystore: PathBuf,
    developer_id: Option<String>,
    ca_id: Option<String>,
    keystore_password: Option<String>,
}

impl std::fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyConfig")
            .field("keystore", &self.keystore)
            .field("developer_id", &self.developer_id)
            .field("ca_id", &self.ca_id)
            .field("keystore_password", &self.keystore_password.as_ref().map(|_| "<hidden>"))
            .finish()
    }
}

impl KeyConfig {
    /// Configuration with an explicit keystore path and nothing else.
    pub fn new(keystore: impl Into<PathBuf>) -> Self {
        Self {
            keystore: keystore.into(),
            ..Default::default()
        }
    }

    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_source(&ProcessEnv)
    }

    /// Reads `source`. The keystore defaults to `~/.kodegen/keystore.p12`.
    pub fn from_source(source: &dyn EnvSource) -> Self {
        Self {
            keystore: source
                .var(KEYSTORE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(default_keystore),
            developer_id: source.var(DEVELOPER_ID_VAR),
            ca_id: source.var(CA_ID_VAR),
            keystore_password: source.var(KEYSTORE_PASSWORD_VAR),
        }
    }

    /// Sets the developer identity.
    pub fn with_developer_id(mut self, id: impl Into<String>) -> Self {
        self.developer_id = Some(id.into());
        self
    }

    /// Sets the certificate authority identity.
    pub fn with_ca_id(mut self, id: impl Into<String>) -> Self {
        self.ca_id = Some(id.into());
        self
    }

    /// Sets the keystore password.
    pub fn with_keystore_password(mut self, password: impl Into<String>) -> Self {
        self.keystore_password = Some(password.into());
        self
    }

    /// Keystore file path.
    pub fn keystore(&self) -> &Path {
        &self.keystore
    }

    /// Developer identity.
    pub fn developer_id(&self) -> Option<&str> {
        self.developer_id.as_deref()
    }

    /// Certificate authority identity.
    pub fn ca_id(&self) -> Option<&str> {
        self.ca_id.as_deref()
    }

    /// Keystore password.
    pub fn keystore_password(&self) -> Option<&str> {
        self.keystore_password.as_deref()
    }
}

fn default_keystore() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kodegen")
        .join("keystore.p12")
}

/// Registrations for `config`, in precedence order.
pub fn default_registrations(config: &KeyConfig) -> Vec<Registration> {
    let keystore = config.keystore.clone();
    let password = config.keystore_password.clone().unwrap_or_default();
    let keystore_guard = {
        let keystore = keystore.clone();
        let ready = config.developer_id.is_some() && config.keystore_password.is_some();
        move || ready && keystore.is_file()
    };
    let has_developer = config.developer_id.is_some();

    vec![
        Registration::new("env", || EnvKeyProvider::new(ProcessEnv)),
        Registration::new("keystore", move || KeystoreProvider::new(&keystore, password.as_str()))
            .when(keystore_guard),
        Registration::new("macos-keychain", || MacKeychainProvider)
            .when(move || cfg!(target_os = "macos") && has_developer),
        Registration::new("windows-store", || WindowsStoreProvider)
            .when(move || cfg!(windows) && has_developer),
    ]
}

/// The default chain for `config`.
pub fn default_provider(config: &KeyConfig) -> CompositeKeyProvider {
    CompositeKeyProvider::from_registrations(default_registrations(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn active(config: &KeyConfig) -> Vec<String> {
        default_registrations(config)
            .iter()
            .filter(|r| r.is_active())
            .map(|r| r.name().to_string())
            .collect()
    }

    #[test]
    fn test_env_always_first() {
        let registrations = default_registrations(&KeyConfig::new("/nonexistent.p12"));
        assert_eq!(registrations[0].name(), "env");
        assert_eq!(active(&KeyConfig::new("/nonexistent.p12")), vec!["env"]);
    }

    #[test]
    fn test_keystore_needs_file_identity_and_password() {
        let dir = tempfile::tempdir().unwrap();
        let keystore = dir.path().join("keystore.p12");
        std::fs::write(&keystore, b"p12").unwrap();

        let no_password = KeyConfig::new(&keystore).with_developer_id("acme-dev");
        assert!(!active(&no_password).contains(&"keystore".to_string()));

        let complete = no_password.clone().with_keystore_password("secret");
        assert_eq!(active(&complete)[..2], ["env".to_string(), "keystore".to_string()]);

        let missing_file = KeyConfig::new(dir.path().join("absent.p12"))
            .with_developer_id("acme-dev")
            .with_keystore_password("secret");
        assert!(!active(&missing_file).contains(&"keystore".to_string()));
    }

    #[test]
    fn test_native_store_needs_developer_id() {
        let names = active(&KeyConfig::new("/nonexistent.p12"));
        assert!(!names.contains(&"macos-keychain".to_string()));
        assert!(!names.contains(&"windows-store".to_string()));

        let with_id = active(&KeyConfig::new("/nonexistent.p12").with_developer_id("Acme"));
        assert_eq!(with_id.contains(&"macos-keychain".to_string()), cfg!(target_os = "macos"));
        assert_eq!(with_id.contains(&"windows-store".to_string()), cfg!(windows));
    }

    #[test]
    fn test_from_source() {
        let source: HashMap<String, String> = [
            (KEYSTORE_VAR, "/keys/acme.p12"),
            (DEVELOPER_ID_VAR, "acme-dev"),
            (KEYSTORE_PASSWORD_VAR, "secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config = KeyConfig::from_source(&source);
        assert_eq!(config.keystore(), Path::new("/keys/acme.p12"));
        assert_eq!(config.developer_id(), Some("acme-dev"));
        assert_eq!(config.ca_id(), None);
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_keystore_defaults_under_home() {
        let config = KeyConfig::from_source(&HashMap::<String, String>::new());
        assert!(config.keystore().ends_with(".kodegen/keystore.p12"));
    }
}
