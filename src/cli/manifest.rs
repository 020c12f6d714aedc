//! Application manifest (TOML).
//!
//! ```toml
//! [app]
//! name = "Demo"
//! main_class = "com.example.Main"
//! url = "https://example.com/demo"
//! icons = ["icons/demo.png"]
//!
//! [[jar]]
//! name = "demo.jar"
//! file = "build/demo.jar"
//! main = true
//!
//! [[native]]
//! name = "sdl"
//! dir = "native/sdl"
//! common = ["native/sdl/sdl.jar"]
//!
//! [[association]]
//! extension = "demo"
//! mime_type = "application/x-demo"
//!
//! [properties]
//! "apple.laf.useScreenMenuBar" = "true"
//!
//! [bundle]
//! targets = ["linux", "win"]
//! stubs = "stubs"
//! ```
//!
//! Relative paths are resolved against the manifest's directory.

use crate::bundler::{AppDescription, Arch, DistributionSource, Jar, NativeLib, Os};
use crate::error::{LauncherError, Result};
use crate::runtime::{RuntimeRequest, RuntimeVariant};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Parsed manifest.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Application identity and presentation
    pub app: AppSection,
    /// Jars, in classpath order
    #[serde(default, rename = "jar")]
    pub jars: Vec<JarEntry>,
    /// Native libraries
    #[serde(default, rename = "native")]
    pub natives: Vec<NativeEntry>,
    /// File associations
    #[serde(default, rename = "association")]
    pub associations: Vec<AssociationEntry>,
    /// System properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Bundling defaults
    #[serde(default)]
    pub bundle: BundleSection,
}

/// `[app]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    /// Display name
    pub name: String,
    /// Entry point
    pub main_class: String,
    /// Launch URL
    pub url: Option<String>,
    /// Registry origin
    pub source: Option<SourceSection>,
    /// Allow prerelease versions
    #[serde(default)]
    pub prerelease: bool,
    /// Package is a fork
    #[serde(default)]
    pub fork: bool,
    /// Icon files
    #[serde(default)]
    pub icons: Vec<PathBuf>,
    /// Splash image data URI
    pub splash: Option<String>,
    /// Registry URL
    pub registry_url: Option<String>,
    /// Launcher version recorded in the metadata document
    pub launcher_version: Option<String>,
    /// App version installed on first launch
    pub initial_app_version: Option<String>,
    /// Vendor name
    pub vendor: Option<String>,
    /// Homepage
    pub homepage: Option<String>,
    /// Description
    pub description: Option<String>,
    /// JNLP codebase
    pub codebase: Option<String>,
    /// macOS bundle identifier
    pub mac_bundle_id: Option<String>,
}

/// `[app.source]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    /// Package name
    pub package: String,
    /// Registry
    pub source: Option<String>,
    /// Resolved version
    pub version: Option<String>,
}

/// `[[jar]]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JarEntry {
    /// Logical name
    pub name: String,
    /// Source file
    pub file: PathBuf,
    /// Entry point jar
    #[serde(default)]
    pub main: bool,
    /// Restrict to one OS
    pub os: Option<String>,
}

/// `[[native]]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeEntry {
    /// Library name
    pub name: String,
    /// Directory with one sub-directory per OS
    pub dir: PathBuf,
    /// OS-independent files
    #[serde(default)]
    pub common: Vec<PathBuf>,
}

/// `[[association]]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationEntry {
    /// File extension without the dot
    pub extension: String,
    /// MIME type
    pub mime_type: String,
}

/// `[bundle]`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleSection {
    /// Default targets
    #[serde(default)]
    pub targets: Vec<String>,
    /// Default stub directory
    pub stubs: Option<PathBuf>,
    /// Runtime shipped by webOS bundles
    pub runtime: Option<RuntimeSection>,
}

/// `[bundle.runtime]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Runtime version
    pub version: String,
    /// `jre` or `jdk`
    #[serde(default = "default_variant")]
    pub variant: String,
    /// Include graphics modules
    #[serde(default)]
    pub graphics: bool,
    /// Directory runtimes are installed into
    pub dir: PathBuf,
    /// Directory of cached runtime archives
    pub cache: PathBuf,
}

fn default_variant() -> String {
    "jre".to_string()
}

impl Manifest {
    /// Reads and parses `path`.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LauncherError::Manifest {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(toml::from_str(&text)?)
    }

    /// Builds the application description, resolving paths against `base`.
    pub fn app_description(&self, base: &Path) -> Result<AppDescription> {
        let app = &self.app;
        let mut builder = AppDescription::builder(&app.name, &app.main_class)
            .prerelease(app.prerelease)
            .fork(app.fork);

        if let Some(url) = &app.url {
            builder = builder.url(url);
        }
        if let Some(source) = &app.source {
            let mut dist = DistributionSource::new(&source.package);
            if let Some(registry) = &source.source {
                dist = dist.with_source(registry);
            }
            if let Some(version) = &source.version {
                dist = dist.with_version(version);
            }
            builder = builder.source(dist);
        }
        for icon in &app.icons {
            builder = builder.icon(base.join(icon));
        }
        if let Some(splash) = &app.splash {
            builder = builder.splash_data_uri(splash);
        }
        if let Some(url) = &app.registry_url {
            builder = builder.registry_url(url);
        }
        if let Some(version) = &app.launcher_version {
            builder = builder.launcher_version(version);
        }
        if let Some(version) = &app.initial_app_version {
            builder = builder.initial_app_version(version);
        }
        if let Some(vendor) = &app.vendor {
            builder = builder.vendor(vendor);
        }
        if let Some(homepage) = &app.homepage {
            builder = builder.homepage(homepage);
        }
        if let Some(description) = &app.description {
            builder = builder.description(description);
        }
        if let Some(codebase) = &app.codebase {
            builder = builder.codebase(codebase);
        }
        if let Some(id) = &app.mac_bundle_id {
            builder = builder.mac_bundle_id(id);
        }

        for entry in &self.jars {
            let mut jar = Jar::new(&entry.name, base.join(&entry.file));
            if entry.main {
                jar = jar.main();
            }
            if let Some(os) = &entry.os {
                jar = jar.only_on(os.parse::<Os>()?);
            }
            builder = builder.jar(jar);
        }
        for entry in &self.natives {
            let mut lib = NativeLib::new(&entry.name, base.join(&entry.dir));
            for file in &entry.common {
                lib = lib.with_common_file(base.join(file));
            }
            builder = builder.native_lib(lib);
        }
        for assoc in &self.associations {
            builder = builder.association(&assoc.extension, &assoc.mime_type);
        }
        for (name, value) in &self.properties {
            builder = builder.property(name, value);
        }

        Ok(builder.build()?)
    }

    /// Runtime request from `[bundle.runtime]`.
    pub fn runtime_request(&self) -> Result<Option<RuntimeRequest>> {
        let Some(runtime) = &self.bundle.runtime else {
            return Ok(None);
        };
        let variant = match runtime.variant.as_str() {
            "jre" => RuntimeVariant::Jre,
            "jdk" => RuntimeVariant::Jdk,
            other => {
                return Err(LauncherError::Manifest {
                    path: PathBuf::from("[bundle.runtime]"),
                    reason: format!("unknown runtime variant '{other}'"),
                });
            }
        };
        let mut request = RuntimeRequest::new(&runtime.version, variant, Os::WebOs, Arch::X64);
        request.supports_graphics = runtime.graphics;
        Ok(Some(request))
    }
}
