//! webOS application directory.
//!
//! Produces `{dest}/webos/{name}/` holding the jars, the webOS native files,
//! `appinfo.json` and an executable `runit.sh`. No trailer, no release archive.

use super::PlatformBundler;
use crate::bundler::{
    AppDescription, BundlerResult, BundlerSettings, Os, Result,
    error::ErrorExt,
    utils::fs,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

const RUNTIME: &str = "./avian";

/// `appinfo.json`. Field order is the serialized key order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    /// Application id: the lowercased main class
    pub id: String,
    /// Package version
    pub version: String,
    /// Vendor name
    pub vendor: String,
    /// Package type
    #[serde(rename = "type")]
    pub kind: String,
    /// Script to launch
    pub main: String,
    /// Display title
    pub title: String,
    /// Icon file inside the package
    pub icon: String,
    /// Memory requirement in megabytes
    pub required_memory: u32,
}

impl AppInfo {
    fn for_app(app: &AppDescription) -> Self {
        Self {
            id: app.main_class().to_lowercase(),
            version: "0.0.1".into(),
            vendor: app.vendor().into(),
            kind: "pdk".into(),
            main: "runit.sh".into(),
            title: app.name().into(),
            icon: "icon.png".into(),
            required_memory: 64,
        }
    }
}

/// Bundler for webOS directories.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebOsBundler;

impl PlatformBundler for WebOsBundler {
    async fn build(
        &self,
        settings: &BundlerSettings,
        app: &AppDescription,
        dest_dir: &Path,
        _release_dir: &Path,
        _installer: bool,
    ) -> Result<BundlerResult> {
        app.main_jar()?;

        let app_dir = dest_dir.join("webos").join(app.name());
        fs::create_dir_all(&app_dir).await?;

        let mut classpath = String::new();

        for lib in app.native_libs() {
            settings.step(format!("webos: native library {}", lib.name()));
            for file in lib.files_for(Os::WebOs)? {
                let Some(name) = file.file_name() else { continue };
                fs::copy_to_file(&file, &app_dir.join(name)).await?;
                if name.to_string_lossy().ends_with(".jar") {
                    classpath.push_str(&name.to_string_lossy());
                    classpath.push(':');
                }
            }
            for file in lib.common_files() {
                let Some(name) = file.file_name() else { continue };
                fs::copy_to_file(file, &app_dir.join(name)).await?;
                classpath.push_str(&name.to_string_lossy());
                classpath.push(':');
            }
        }

        for jar in app.jars() {
            if !jar.matches_os(Os::WebOs) {
                settings.step(format!("webos: skipping {} restricted to {:?}", jar.name(), jar.os()));
                continue;
            }
            fs::copy_to_file(jar.file(), &app_dir.join(jar.name())).await?;
            classpath.push_str(jar.name());
            classpath.push(':');
        }

        if let Some(icon) = app.png_icons().next() {
            fs::copy_to_file(icon, &app_dir.join("icon.png")).await?;
        }

        if let Some(runtime) = settings.bundled_runtime() {
            copy_runtime(runtime, &app_dir).await?;
        }

        let appinfo = app_dir.join("appinfo.json");
        let json = serde_json::to_string_pretty(&AppInfo::for_app(app))?;
        tokio::fs::write(&appinfo, json)
            .await
            .fs_context("writing appinfo.json", &appinfo)?;

        let script = app_dir.join("runit.sh");
        tokio::fs::write(&script, run_script(app.main_class(), &classpath))
            .await
            .fs_context("writing runit.sh", &script)?;
        fs::set_executable(&script).await?;

        log::info!("webos: created {}", app_dir.display());
        Ok(BundlerResult::new("webos", app_dir, Vec::<PathBuf>::new()))
    }
}

async fn copy_runtime(runtime: &Path, app_dir: &Path) -> Result<()> {
    if runtime.is_dir() {
        fs::copy_dir(runtime, app_dir).await
    } else {
        let name = runtime.file_name().unwrap_or_default();
        let dest = app_dir.join(name);
        fs::copy_to_file(runtime, &dest).await?;
        fs::set_executable(&dest).await
    }
}

/// POSIX launch script. `classpath` is already colon-terminated per entry.
pub fn run_script(main_class: &str, classpath: &str) -> String {
    let log = format!("/tmp/{main_class}.out");
    format!(
        "#!/bin/sh\n\
         date >> {log}\n\
         echo \"trying to start avian\" >> {log}\n\
         echo $PWD >> {log}\n\
         export LD_LIBRARY_PATH=.\n\
         {RUNTIME} -Dcom.joshondesign.amino.impl=sdl -cp {classpath} {main_class} 1>>{log} 2>>{log}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appinfo_key_order() {
        let app = AppDescription::builder("Particles", "com.Example.Particles")
            .url("file:///tmp/particles")
            .build()
            .unwrap();
        let json = serde_json::to_string(&AppInfo::for_app(&app)).unwrap();
        assert_eq!(
            json,
            r#"{"id":"com.example.particles","version":"0.0.1","vendor":"unknown vendor","type":"pdk","main":"runit.sh","title":"Particles","icon":"icon.png","requiredMemory":64}"#
        );
    }

    #[test]
    fn test_run_script_redirects_to_tmp_log() {
        let script = run_script("demo.Main", "sdl.jar:app.jar:");
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains(
            "./avian -Dcom.joshondesign.amino.impl=sdl -cp sdl.jar:app.jar: demo.Main \
             1>>/tmp/demo.Main.out 2>>/tmp/demo.Main.out\n"
        ));
    }
}
