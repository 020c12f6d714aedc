//! macOS application bundle.
//!
//! Layout under `{dest}/macos-{arch}/`:
//!
//! ```text
//! {name}.app/Contents/
//!   Info.plist
//!   PkgInfo
//!   MacOS/launcher      stub + metadata trailer
//!   Resources/          .icns icons
//! ```
//!
//! The bundle is archived to `{release}/macos-{arch}/{name}.tar.gz`.

use super::{Arch, Platform, PlatformBundler, launcher};
use crate::bundler::{
    AppDescription, BundlerResult, BundlerSettings, Result, metadata,
    error::ErrorExt,
    utils::{archive, fs},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

const EXECUTABLE: &str = "launcher";

const INFO_PLIST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>CFBundleDevelopmentRegion</key>
  <string>English</string>
  <key>CFBundleDisplayName</key>
  <string>{{name}}</string>
  <key>CFBundleExecutable</key>
  <string>{{executable}}</string>
  <key>CFBundleIdentifier</key>
  <string>{{bundle_id}}</string>
  <key>CFBundleName</key>
  <string>{{name}}</string>
  <key>CFBundlePackageType</key>
  <string>APPL</string>
  <key>CFBundleShortVersionString</key>
  <string>{{version}}</string>
  <key>CFBundleVersion</key>
  <string>{{version}}</string>
  <key>CFBundleInfoDictionaryVersion</key>
  <string>6.0</string>
{{#if icon}}
  <key>CFBundleIconFile</key>
  <string>{{icon}}</string>
{{/if}}
{{#if associations}}
  <key>CFBundleDocumentTypes</key>
  <array>
{{#each associations}}
    <dict>
      <key>CFBundleTypeExtensions</key>
      <array><string>{{extension}}</string></array>
      <key>CFBundleTypeMIMETypes</key>
      <array><string>{{mime_type}}</string></array>
      <key>CFBundleTypeRole</key>
      <string>Viewer</string>
    </dict>
{{/each}}
  </array>
{{/if}}
  <key>NSHighResolutionCapable</key>
  <true/>
</dict>
</plist>
"#;

#[derive(Serialize)]
struct InfoPlist<'a> {
    name: &'a str,
    executable: &'a str,
    bundle_id: String,
    version: &'a str,
    icon: Option<String>,
    associations: Vec<PlistAssociation<'a>>,
}

#[derive(Serialize)]
struct PlistAssociation<'a> {
    extension: &'a str,
    mime_type: &'a str,
}

/// Bundler for macOS `.app` bundles.
#[derive(Clone, Copy, Debug)]
pub struct MacBundler {
    arch: Arch,
}

impl MacBundler {
    /// Bundler for the given architecture.
    pub fn new(arch: Arch) -> Self {
        Self { arch }
    }
}

impl PlatformBundler for MacBundler {
    async fn build(
        &self,
        settings: &BundlerSettings,
        app: &AppDescription,
        dest_dir: &Path,
        release_dir: &Path,
        installer: bool,
    ) -> Result<BundlerResult> {
        let platform = Platform::MacOs(self.arch);
        let id = format!("mac-{}", self.arch.as_str());
        let stub = settings
            .stub_dir()
            .join(platform.stub_file_name().unwrap_or_default());
        launcher::preflight(app, &id, &stub)?;
        if installer {
            log::debug!("{id}: no installer variant, building the app bundle");
        }

        let out_dir = dest_dir.join(platform.dir_name());
        let rel_dir = release_dir.join(platform.dir_name());
        let app_dir = out_dir.join(format!("{}.app", app.name()));
        if app_dir.exists() {
            settings.step(format!("deleting existing {}", app_dir.display()));
            fs::remove_dir_all(&app_dir).await?;
        }
        let contents = app_dir.join("Contents");
        fs::create_dir_all(&contents.join("MacOS")).await?;
        fs::create_dir_all(&contents.join("Resources")).await?;
        fs::create_dir_all(&rel_dir).await?;

        let icon = copy_icons(app, &contents.join("Resources")).await?;
        write_info_plist(app, &contents, icon).await?;
        let pkg_info = contents.join("PkgInfo");
        tokio::fs::write(&pkg_info, b"APPL????")
            .await
            .fs_context("writing PkgInfo", &pkg_info)?;

        let exe = contents.join("MacOS").join(EXECUTABLE);
        launcher::write_launcher(settings, app, &stub, &exe).await?;

        let release_file = rel_dir.join(format!("{}.tar.gz", launcher::dotted(app.name())));
        fs::remove_file(&release_file).await?;
        archive::compress_as_tar_gz(&release_file, &app_dir).await?;

        log::info!("{id}: created {}", release_file.display());
        Ok(BundlerResult::new(id, app_dir, vec![release_file]))
    }
}

/// Copies `.icns` icons into Resources. Returns the first icon's file name.
async fn copy_icons(app: &AppDescription, resources: &Path) -> Result<Option<String>> {
    let mut first = None;
    for icon in app.icons() {
        let is_icns = icon
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("icns"));
        let Some(name) = icon.file_name() else {
            continue;
        };
        if !is_icns {
            continue;
        }
        let dest: PathBuf = resources.join(name);
        fs::copy_to_file(icon, &dest).await?;
        first.get_or_insert_with(|| name.to_string_lossy().into_owned());
    }
    Ok(first)
}

async fn write_info_plist(app: &AppDescription, contents: &Path, icon: Option<String>) -> Result<()> {
    let data = InfoPlist {
        name: app.name(),
        executable: EXECUTABLE,
        bundle_id: app.mac_bundle_id(),
        version: app.display_version(),
        icon,
        associations: app
            .associations()
            .iter()
            .map(|a| PlistAssociation {
                extension: &a.extension,
                mime_type: &a.mime_type,
            })
            .collect(),
    };
    let plist = metadata::render_xml("Info.plist", INFO_PLIST_TEMPLATE, &data)?;
    let path = contents.join("Info.plist");
    tokio::fs::write(&path, plist)
        .await
        .fs_context("writing Info.plist", &path)
}
