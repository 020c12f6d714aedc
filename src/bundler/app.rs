//! In-memory description of the application being bundled.
//!
//! An [`AppDescription`] is assembled once per build through
//! [`AppDescriptionBuilder`], validated, and then shared read-only by every
//! platform bundler in the pass.

use crate::bundler::error::{Error, ErrorExt, Result};
use base64::Engine;
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Operating systems a jar or native library directory can be restricted to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Os {
    /// Linux desktops
    Linux,
    /// Windows desktops
    Windows,
    /// macOS
    MacOs,
    /// webOS devices
    WebOs,
}

impl Os {
    /// Name of the per-OS sub-directory inside a native library.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::MacOs => "mac",
            Os::WebOs => "webos",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Os {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Os::Linux),
            "windows" | "win" => Ok(Os::Windows),
            "mac" | "macos" | "osx" => Ok(Os::MacOs),
            "webos" => Ok(Os::WebOs),
            other => Err(Error::GenericError(format!("unknown operating system '{other}'"))),
        }
    }
}

/// A library jar shipped with the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jar {
    name: String,
    file: PathBuf,
    main: bool,
    os: Option<Os>,
}

impl Jar {
    /// A non-main jar available on every OS.
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            main: false,
            os: None,
        }
    }

    /// Marks this jar as the one holding the entry point.
    pub fn main(mut self) -> Self {
        self.main = true;
        self
    }

    /// Restricts this jar to a single OS.
    pub fn only_on(mut self, os: Os) -> Self {
        self.os = Some(os);
        self
    }

    /// Logical name, used as the file name inside bundles.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file on disk.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Whether this jar holds the entry point.
    pub fn is_main(&self) -> bool {
        self.main
    }

    /// OS restriction, if any.
    pub fn os(&self) -> Option<Os> {
        self.os
    }

    /// True unless the jar is restricted to a different OS.
    pub fn matches_os(&self, os: Os) -> bool {
        self.os.is_none_or(|restricted| restricted == os)
    }
}

/// A native dependency laid out as `base_dir/{linux,windows,mac,webos}/...`
/// plus OS-independent supporting jars.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeLib {
    name: String,
    base_dir: PathBuf,
    common_files: Vec<PathBuf>,
}

impl NativeLib {
    /// Creates a native library rooted at `base_dir`.
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            common_files: Vec::new(),
        }
    }

    /// Adds an OS-independent supporting file (usually a jar).
    pub fn with_common_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.common_files.push(file.into());
        self
    }

    /// Library name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root directory holding the per-OS sub-directories.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// OS-independent supporting files.
    pub fn common_files(&self) -> &[PathBuf] {
        &self.common_files
    }

    /// Per-OS sub-directory, whether or not it exists.
    pub fn os_dir(&self, os: Os) -> PathBuf {
        self.base_dir.join(os.dir_name())
    }

    /// Files in the OS sub-directory, sorted by name. Empty when the library
    /// has no directory for `os`.
    pub fn files_for(&self, os: Os) -> Result<Vec<PathBuf>> {
        let dir = self.os_dir(os);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir).fs_context("listing native library directory", &dir)? {
            let entry = entry.fs_context("reading native library entry", &dir)?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Checks that the library root exists.
    pub fn verify(&self) -> Result<()> {
        if self.base_dir.is_dir() {
            Ok(())
        } else {
            Err(Error::MissingNativeDir {
                name: self.name.clone(),
                path: self.base_dir.clone(),
            })
        }
    }
}

/// File extension registered to the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileAssociation {
    /// Extension without the leading dot
    pub extension: String,
    /// MIME type
    pub mime_type: String,
}

/// Registry origin of an application distributed as a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionSource {
    package: String,
    source: Option<String>,
    version: String,
}

impl DistributionSource {
    /// A package resolved at its `latest` version.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            source: None,
            version: "latest".to_string(),
        }
    }

    /// Sets the registry the package comes from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Pins the resolved version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Package name.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Source registry, if not the default one.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Resolved version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Everything a bundler needs to know about the application.
#[derive(Clone, Debug)]
pub struct AppDescription {
    name: String,
    main_class: String,
    url: Option<String>,
    source: Option<DistributionSource>,
    prerelease: bool,
    fork: bool,
    jars: Vec<Jar>,
    native_libs: Vec<NativeLib>,
    icons: Vec<PathBuf>,
    icon_data_uri: Option<String>,
    splash_data_uri: Option<String>,
    registry_url: Option<String>,
    launcher_version: Option<String>,
    initial_app_version: Option<String>,
    associations: Vec<FileAssociation>,
    properties: Vec<(String, String)>,
    vendor: Option<String>,
    homepage: Option<String>,
    description: Option<String>,
    codebase: Option<String>,
    mac_bundle_id: Option<String>,
}

impl AppDescription {
    /// Starts a builder for an application with the given display name and entry point.
    pub fn builder(name: impl Into<String>, main_class: impl Into<String>) -> AppDescriptionBuilder {
        AppDescriptionBuilder::new(name, main_class)
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified entry point.
    pub fn main_class(&self) -> &str {
        &self.main_class
    }

    /// Launch URL for non-registry apps.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Registry origin, if distributed as a package.
    pub fn source(&self) -> Option<&DistributionSource> {
        self.source.as_ref()
    }

    /// Whether prerelease versions may be installed.
    pub fn is_prerelease(&self) -> bool {
        self.prerelease
    }

    /// Whether this is a fork of another package.
    pub fn is_fork(&self) -> bool {
        self.fork
    }

    /// Jars in declaration order.
    pub fn jars(&self) -> &[Jar] {
        &self.jars
    }

    /// Native libraries in declaration order.
    pub fn native_libs(&self) -> &[NativeLib] {
        &self.native_libs
    }

    /// Icon files in declaration order.
    pub fn icons(&self) -> &[PathBuf] {
        &self.icons
    }

    /// PNG icons only.
    pub fn png_icons(&self) -> impl Iterator<Item = &PathBuf> {
        self.icons.iter().filter(|p| is_png(p))
    }

    /// `data:` URI of the application icon, embedded in launcher metadata.
    pub fn icon_data_uri(&self) -> Option<&str> {
        self.icon_data_uri.as_deref()
    }

    /// `data:` URI of the splash image.
    pub fn splash_data_uri(&self) -> Option<&str> {
        self.splash_data_uri.as_deref()
    }

    /// Registry endpoint the launcher should query.
    pub fn registry_url(&self) -> Option<&str> {
        self.registry_url.as_deref()
    }

    /// Version of the launcher the app was bundled for. `None` when unset or empty.
    pub fn launcher_version(&self) -> Option<&str> {
        self.launcher_version.as_deref().filter(|v| !v.is_empty())
    }

    /// App version installed on first launch. `None` when unset or empty.
    pub fn initial_app_version(&self) -> Option<&str> {
        self.initial_app_version.as_deref().filter(|v| !v.is_empty())
    }

    /// File-type associations.
    pub fn associations(&self) -> &[FileAssociation] {
        &self.associations
    }

    /// Runtime properties as name/value pairs.
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Vendor name for descriptors.
    pub fn vendor(&self) -> &str {
        self.vendor.as_deref().unwrap_or("unknown vendor")
    }

    /// Project homepage.
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    /// Base URL the web deployment descriptor is served from.
    pub fn codebase(&self) -> &str {
        self.codebase
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or(".")
    }

    /// macOS bundle identifier, derived from the main class when unset.
    pub fn mac_bundle_id(&self) -> String {
        self.mac_bundle_id
            .clone()
            .unwrap_or_else(|| self.main_class.to_lowercase())
    }

    /// Version string shown to users.
    pub fn display_version(&self) -> &str {
        self.source.as_ref().map_or("1.0.0", |s| s.version())
    }

    /// Returns the single jar marked main.
    ///
    /// Fails with a configuration error when zero or several jars are marked.
    pub fn main_jar(&self) -> Result<&Jar> {
        let mains: Vec<&Jar> = self.jars.iter().filter(|j| j.is_main()).collect();
        match mains.as_slice() {
            [one] => Ok(one),
            [] => Err(Error::NoMainJar {
                app: self.name.clone(),
            }),
            many => Err(Error::MultipleMainJars {
                app: self.name.clone(),
                count: many.len(),
                jars: many.iter().map(|j| j.name()).collect::<Vec<_>>().join(", "),
            }),
        }
    }
}

/// Builder for [`AppDescription`].
#[derive(Debug)]
pub struct AppDescriptionBuilder {
    app: AppDescription,
}

impl AppDescriptionBuilder {
    /// New builder with a display name and entry point.
    pub fn new(name: impl Into<String>, main_class: impl Into<String>) -> Self {
        Self {
            app: AppDescription {
                name: name.into(),
                main_class: main_class.into(),
                url: None,
                source: None,
                prerelease: false,
                fork: false,
                jars: Vec::new(),
                native_libs: Vec::new(),
                icons: Vec::new(),
                icon_data_uri: None,
                splash_data_uri: None,
                registry_url: None,
                launcher_version: None,
                initial_app_version: None,
                associations: Vec::new(),
                properties: Vec::new(),
                vendor: None,
                homepage: None,
                description: None,
                codebase: None,
                mac_bundle_id: None,
            },
        }
    }

    /// Launch URL (`file:`, `http:` or `https:`).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.app.url = Some(url.into());
        self
    }

    /// Registry origin.
    pub fn source(mut self, source: DistributionSource) -> Self {
        self.app.source = Some(source);
        self
    }

    /// Allows prerelease versions.
    pub fn prerelease(mut self, prerelease: bool) -> Self {
        self.app.prerelease = prerelease;
        self
    }

    /// Marks the package as a fork.
    pub fn fork(mut self, fork: bool) -> Self {
        self.app.fork = fork;
        self
    }

    /// Appends a jar.
    pub fn jar(mut self, jar: Jar) -> Self {
        self.app.jars.push(jar);
        self
    }

    /// Appends a native library.
    pub fn native_lib(mut self, lib: NativeLib) -> Self {
        self.app.native_libs.push(lib);
        self
    }

    /// Appends an icon file.
    pub fn icon(mut self, path: impl Into<PathBuf>) -> Self {
        self.app.icons.push(path.into());
        self
    }

    /// Uses a precomputed icon data URI instead of encoding the first PNG icon.
    pub fn icon_data_uri(mut self, uri: impl Into<String>) -> Self {
        self.app.icon_data_uri = Some(uri.into());
        self
    }

    /// Splash image data URI.
    pub fn splash_data_uri(mut self, uri: impl Into<String>) -> Self {
        self.app.splash_data_uri = Some(uri.into());
        self
    }

    /// Registry endpoint.
    pub fn registry_url(mut self, url: impl Into<String>) -> Self {
        self.app.registry_url = Some(url.into());
        self
    }

    /// Launcher version recorded in the metadata document.
    pub fn launcher_version(mut self, version: impl Into<String>) -> Self {
        self.app.launcher_version = Some(version.into());
        self
    }

    /// App version the launcher installs on first run.
    pub fn initial_app_version(mut self, version: impl Into<String>) -> Self {
        self.app.initial_app_version = Some(version.into());
        self
    }

    /// Registers a file extension.
    pub fn association(mut self, extension: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.app.associations.push(FileAssociation {
            extension: extension.into().trim_start_matches('.').to_string(),
            mime_type: mime_type.into(),
        });
        self
    }

    /// Adds a runtime property.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.app.properties.push((name.into(), value.into()));
        self
    }

    /// Vendor name.
    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.app.vendor = Some(vendor.into());
        self
    }

    /// Homepage URL.
    pub fn homepage(mut self, homepage: impl Into<String>) -> Self {
        self.app.homepage = Some(homepage.into());
        self
    }

    /// Description text.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.app.description = Some(description.into());
        self
    }

    /// Web deployment codebase.
    pub fn codebase(mut self, codebase: impl Into<String>) -> Self {
        self.app.codebase = Some(codebase.into());
        self
    }

    /// macOS bundle identifier.
    pub fn mac_bundle_id(mut self, id: impl Into<String>) -> Self {
        self.app.mac_bundle_id = Some(id.into());
        self
    }

    /// Validates the description and derives the icon data URI.
    pub fn build(mut self) -> Result<AppDescription> {
        validate_name(&self.app.name)?;

        match (&self.app.url, &self.app.source) {
            (Some(url), _) => validate_url(url)?,
            (None, Some(_)) => {}
            (None, None) => {
                return Err(Error::InvalidUrl {
                    url: String::new(),
                    reason: "a url is required unless the app has a distribution source".into(),
                });
            }
        }

        for lib in &self.app.native_libs {
            lib.verify()?;
        }

        let first_png = self.app.png_icons().next().cloned();
        if self.app.icon_data_uri.is_none()
            && let Some(icon) = first_png
        {
            let bytes = std::fs::read(&icon).fs_context("reading icon", &icon)?;
            self.app.icon_data_uri = Some(png_data_uri(&bytes));
        }

        Ok(self.app)
    }
}

/// Encodes PNG bytes as a `data:` URI.
pub fn png_data_uri(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// The name becomes a file and directory name in every bundle.
fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        "name is empty"
    } else if name == "." || name == ".." {
        "name is a relative path component"
    } else if name.contains(['/', '\\']) {
        "name contains a path separator"
    } else if name.contains('\0') {
        "name contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(Error::InvalidName {
        name: name.to_string(),
        reason,
    })
}

fn validate_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "file" | "http" | "https" => Ok(()),
        other => Err(Error::InvalidUrl {
            url: raw.to_string(),
            reason: format!("scheme '{other}' is not one of file, http, https"),
        }),
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppDescriptionBuilder {
        AppDescription::builder("Demo", "com.example.Main").url("https://example.com/app")
    }

    #[test]
    fn test_single_main_jar() {
        let app = base()
            .jar(Jar::new("lib.jar", "/tmp/lib.jar"))
            .jar(Jar::new("app.jar", "/tmp/app.jar").main())
            .build()
            .unwrap();
        assert_eq!(app.main_jar().unwrap().name(), "app.jar");
    }

    #[test]
    fn test_no_main_jar() {
        let app = base().jar(Jar::new("lib.jar", "/tmp/lib.jar")).build().unwrap();
        assert!(matches!(app.main_jar(), Err(Error::NoMainJar { .. })));
    }

    #[test]
    fn test_two_main_jars() {
        let app = base()
            .jar(Jar::new("a.jar", "/tmp/a.jar").main())
            .jar(Jar::new("b.jar", "/tmp/b.jar").main())
            .build()
            .unwrap();
        match app.main_jar() {
            Err(Error::MultipleMainJars { count, jars, .. }) => {
                assert_eq!(count, 2);
                assert_eq!(jars, "a.jar, b.jar");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_url_scheme_validation() {
        let err = AppDescription::builder("Demo", "Main")
            .url("ftp://example.com/app")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
        assert!(err.is_configuration());

        let err = AppDescription::builder("Demo", "Main").build().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));

        AppDescription::builder("Demo", "Main")
            .source(DistributionSource::new("demo"))
            .build()
            .unwrap();
    }

    #[test]
    fn test_icon_data_uri_from_first_png() {
        let dir = tempfile::tempdir().unwrap();
        let ico = dir.path().join("icon.ico");
        let png = dir.path().join("icon.png");
        std::fs::write(&ico, b"ico").unwrap();
        std::fs::write(&png, b"\x89PNG").unwrap();

        let app = base().icon(&ico).icon(&png).build().unwrap();
        assert_eq!(app.icon_data_uri(), Some("data:image/png;base64,iVBORw=="));
        assert_eq!(app.png_icons().count(), 1);
    }

    #[test]
    fn test_name_must_be_a_file_name() {
        for bad in ["", "  ", ".", "..", "../escape", "a/b", "a\\b", "nul\0byte"] {
            let err = AppDescription::builder(bad, "demo.Main")
                .url("https://example.com/app")
                .build()
                .unwrap_err();
            assert!(matches!(err, Error::InvalidName { .. }), "{bad:?}: {err}");
            assert!(err.is_configuration());
        }
        AppDescription::builder("My App 2.0", "demo.Main")
            .url("https://example.com/app")
            .build()
            .unwrap();
    }

    #[test]
    fn test_empty_launcher_version_is_unset() {
        let app = base().launcher_version("").initial_app_version("2.1.0").build().unwrap();
        assert_eq!(app.launcher_version(), None);
        assert_eq!(app.initial_app_version(), Some("2.1.0"));
    }

    #[test]
    fn test_missing_native_dir_rejected() {
        let err = base()
            .native_lib(NativeLib::new("sdl", "/no/such/native/dir"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingNativeDir { .. }));
    }

    #[test]
    fn test_jar_os_restriction() {
        let jar = Jar::new("win.jar", "/tmp/win.jar").only_on(Os::Windows);
        assert!(jar.matches_os(Os::Windows));
        assert!(!jar.matches_os(Os::WebOs));
        assert!(Jar::new("any.jar", "/tmp/any.jar").matches_os(Os::WebOs));
    }

    #[test]
    fn test_native_files_sorted_and_filtered_by_os() {
        let dir = tempfile::tempdir().unwrap();
        let linux = dir.path().join("linux");
        std::fs::create_dir_all(&linux).unwrap();
        std::fs::write(linux.join("libz.so"), b"z").unwrap();
        std::fs::write(linux.join("liba.so"), b"a").unwrap();

        let lib = NativeLib::new("foo", dir.path());
        let names: Vec<_> = lib
            .files_for(Os::Linux)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["liba.so", "libz.so"]);
        assert!(lib.files_for(Os::WebOs).unwrap().is_empty());
    }
}
