#[cfg(test)]
mod tests {
    use kodegen_bundler_launcher::bundler::{
        AppDescription, Arch, BundlerSettings, Bundler, Error, Jar, NativeLib, Platform,
        SettingsBuilder, Target, trailer, utils::archive,
    };
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-png";

    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path();
            for (rel, bytes) in [
                ("build/app.jar", b"app-jar".as_slice()),
                ("native/sdl/linux/libfoo.so", b"elf"),
                ("native/sdl/webos/libsdl.so", b"elf"),
                ("native/sdl/webos/sdl.jar", b"sdl-jar"),
                ("native/sdl/amino.jar", b"amino-jar"),
                ("icons/demo.png", PNG),
                ("stubs/launcher-linux-x64", b"LINUX-STUB"),
                ("stubs/launcher-windows-x64.exe", b"MZ-WINDOWS-STUB"),
                ("stubs/launcher-macos-x64", b"MACHO-STUB"),
            ] {
                let path = root.join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, bytes).unwrap();
            }
            Self { dir }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn dest(&self) -> PathBuf {
            self.root().join("dist")
        }

        fn release(&self) -> PathBuf {
            self.root().join("release")
        }

        fn app(&self) -> AppDescription {
            let root = self.root();
            AppDescription::builder("Demo App", "com.example.Demo")
                .url("https://example.com/demo")
                .jar(Jar::new("app.jar", root.join("build/app.jar")).main())
                .native_lib(
                    NativeLib::new("sdl", root.join("native/sdl"))
                        .with_common_file(root.join("native/sdl/amino.jar")),
                )
                .icon(root.join("icons/demo.png"))
                .association("demo", "application/x-demo")
                .build()
                .unwrap()
        }

        fn settings(&self, targets: &[&str]) -> BundlerSettings {
            SettingsBuilder::new()
                .stub_dir(self.root().join("stubs"))
                .targets(Target::parse_list(targets).unwrap())
                .build()
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_linux_launcher_carries_metadata_trailer() {
        let project = Project::new();
        let app = project.app();
        let settings = project.settings(&["linux"]);

        let result = Target::parse("linux")
            .unwrap()
            .build(&settings, &app, &project.dest(), &project.release())
            .await
            .unwrap();

        assert_eq!(result.id(), "linux-x64");
        assert_eq!(result.output_file(), project.dest().join("linux-x64/Demo App"));

        let image = std::fs::read(result.output_file()).unwrap();
        assert!(image.starts_with(b"LINUX-STUB"));
        let xml = String::from_utf8(trailer::parse_trailer(&image).unwrap().to_vec()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"name="Demo App""#));
        assert!(xml.contains(r#"url="https://example.com/demo""#));
        assert!(xml.contains("icon=\"data:image/png;base64,"));
        assert!(!xml.contains("admin="));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(result.output_file()).unwrap().permissions().mode();
            assert_ne!(mode & 0o100, 0);
        }

        assert_eq!(
            result.release_files(),
            &[project.release().join("linux-x64/Demo.App.tar.gz")]
        );
        let unpacked = project.root().join("unpacked");
        archive::extract(&result.release_files()[0], &unpacked).await.unwrap();
        assert_eq!(std::fs::read(unpacked.join("Demo App")).unwrap(), image);
        assert!(!project.dest().join("linux-x64/Demo App.app.xml").exists());
    }

    #[tokio::test]
    async fn test_admin_installer_variant() {
        let project = Project::new();
        let app = project.app();
        let settings = SettingsBuilder::new()
            .stub_dir(project.root().join("stubs"))
            .admin(true)
            .build()
            .unwrap();

        let result = Target::installer(Platform::Linux(Arch::X64))
            .unwrap()
            .build(&settings, &app, &project.dest(), &project.release())
            .await
            .unwrap();

        assert_eq!(result.id(), "linux-x64-installer");
        assert!(result.output_file().ends_with("Demo App Installer.jci"));
        let xml = trailer::read_trailer(result.output_file()).await.unwrap();
        assert!(String::from_utf8_lossy(&xml).contains(r#"admin="true""#));
    }

    #[tokio::test]
    async fn test_windows_launcher_is_zipped() {
        let project = Project::new();
        let app = project.app();
        let settings = project.settings(&["win"]);

        let result = Target::parse("win")
            .unwrap()
            .build(&settings, &app, &project.dest(), &project.release())
            .await
            .unwrap();

        assert_eq!(result.id(), "win-x64");
        assert!(result.output_file().ends_with("windows-x64/Demo App.exe"));
        let zip = project.release().join("windows-x64/Demo App.exe.zip");
        assert_eq!(result.release_files(), &[zip.clone()]);

        let unpacked = project.root().join("unzipped");
        archive::decompress_zip(&zip, &unpacked).await.unwrap();
        let image = std::fs::read(unpacked.join("Demo App.exe")).unwrap();
        assert!(image.starts_with(b"MZ-WINDOWS-STUB"));
        assert!(trailer::parse_trailer(&image).is_ok());
    }

    #[tokio::test]
    async fn test_macos_app_bundle() {
        let project = Project::new();
        let app = project.app();
        let settings = project.settings(&["mac"]);

        let result = Target::parse("mac")
            .unwrap()
            .build(&settings, &app, &project.dest(), &project.release())
            .await
            .unwrap();

        let contents = project.dest().join("macos-x64/Demo App.app/Contents");
        assert_eq!(result.output_file(), contents.parent().unwrap());
        assert_eq!(std::fs::read(contents.join("PkgInfo")).unwrap(), b"APPL????");

        let plist = std::fs::read_to_string(contents.join("Info.plist")).unwrap();
        assert!(plist.contains("<string>com.example.demo</string>"));
        assert!(plist.contains("<string>Demo App</string>"));
        assert!(plist.contains("<string>demo</string>"));

        let launcher = contents.join("MacOS/launcher");
        let xml = trailer::read_trailer(&launcher).await.unwrap();
        assert!(String::from_utf8_lossy(&xml).contains(r#"name="Demo App""#));
        assert!(!contents.join("MacOS/launcher.app.xml").exists());
        assert_eq!(
            result.release_files(),
            &[project.release().join("macos-x64/Demo.App.tar.gz")]
        );
    }

    #[tokio::test]
    async fn test_webos_directory() {
        let project = Project::new();
        let app = project.app();
        let settings = project.settings(&["webos"]);

        let result = Target::parse("webos")
            .unwrap()
            .build(&settings, &app, &project.dest(), &project.release())
            .await
            .unwrap();

        let app_dir = project.dest().join("webos/Demo App");
        assert_eq!(result.output_file(), app_dir);
        assert!(result.release_files().is_empty());

        let info: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(app_dir.join("appinfo.json")).unwrap())
                .unwrap();
        assert_eq!(info["id"], "com.example.demo");
        assert_eq!(info["title"], "Demo App");
        assert_eq!(info["requiredMemory"], 64);

        let script = std::fs::read_to_string(app_dir.join("runit.sh")).unwrap();
        assert!(script.contains(" -cp sdl.jar:amino.jar:app.jar: com.example.Demo "));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(app_dir.join("runit.sh")).unwrap().permissions().mode();
            assert_ne!(mode & 0o100, 0);
        }

        assert_eq!(std::fs::read(app_dir.join("icon.png")).unwrap(), PNG);
        assert!(app_dir.join("libsdl.so").is_file());
        assert!(!app_dir.join("libfoo.so").exists());
    }

    #[tokio::test]
    async fn test_jnlp_descriptor() {
        let project = Project::new();
        let app = project.app();
        let settings = project.settings(&["jnlp"]);

        let result = Target::parse("jnlp")
            .unwrap()
            .build(&settings, &app, &project.dest(), &project.release())
            .await
            .unwrap();

        assert_eq!(result.output_file(), project.dest().join("jnlp/Demo App.jnlp"));
        let xml = std::fs::read_to_string(result.output_file()).unwrap();
        assert!(xml.contains("<jar href='lib/app.jar' main='true'/>"));
        assert!(xml.contains("<application-desc main-class='com.example.Demo'/>"));
        assert!(project.dest().join("jnlp/lib/app.jar").is_file());
        assert!(project.dest().join("jnlp/demo.png").is_file());
    }

    #[tokio::test]
    async fn test_two_main_jars_rejected_before_writing() {
        let project = Project::new();
        let root = project.root();
        let app = AppDescription::builder("Twin", "com.example.Twin")
            .url("https://example.com/twin")
            .jar(Jar::new("a.jar", root.join("build/app.jar")).main())
            .jar(Jar::new("b.jar", root.join("build/app.jar")).main())
            .build()
            .unwrap();

        for name in ["linux", "win-installer", "mac", "webos", "jnlp"] {
            let err = Target::parse(name)
                .unwrap()
                .build(&project.settings(&[name]), &app, &project.dest(), &project.release())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::MultipleMainJars { count: 2, .. }), "{name}: {err}");
            assert!(err.is_configuration());
        }
        assert!(!project.dest().exists());
        assert!(!project.release().exists());
    }

    #[tokio::test]
    async fn test_missing_stub_is_reported() {
        let project = Project::new();
        let err = Target::parse("linux-arm64")
            .unwrap()
            .build(
                &project.settings(&["linux-arm64"]),
                &project.app(),
                &project.dest(),
                &project.release(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingStub { .. }));
        assert!(!project.dest().exists());
    }

    #[tokio::test]
    async fn test_orchestrator_isolates_failures() {
        let project = Project::new();
        let app = project.app();
        let settings = project.settings(&["linux", "linux-arm64", "win", "webos"]);

        let report = Bundler::new(settings)
            .bundle(&app, &project.dest(), &project.release())
            .await;

        assert!(!report.is_success());
        let built: Vec<String> = report.artifacts().iter().map(|a| a.target.id()).collect();
        assert_eq!(built, vec!["linux-x64", "win-x64", "webos"]);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].target.id(), "linux-arm64");

        let linux = &report.artifacts()[0];
        assert_eq!(linux.checksums.len(), 1);
        assert_eq!(linux.checksums[0].1.len(), 64);
        assert!(project.release().join("linux-x64/Demo.App.tar.gz").is_file());
    }
}
