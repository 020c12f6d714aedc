//! Web deployment (JNLP) descriptor.
//!
//! Copies every jar to `{dest}/jnlp/lib/`, PNG icons next to the descriptor,
//! and writes `{dest}/jnlp/{name}.jnlp`.

use super::PlatformBundler;
use crate::bundler::{
    AppDescription, BundlerResult, BundlerSettings, Result,
    error::ErrorExt,
    metadata,
    utils::fs,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

const JNLP_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<jnlp spec='1.0+' codebase='{{codebase}}' href='{{href}}'>
<information>
  <title>{{title}}</title>
  <vendor>{{vendor}}</vendor>
{{#if homepage}}
  <homepage href='{{homepage}}'/>
{{/if}}
  <description>{{description}}</description>
  <offline-allowed/>
{{#each icons}}
  <icon href='{{this}}'/>
{{/each}}
{{#each associations}}
  <association mime-type="{{mime_type}}" extensions="{{extension}}">
    <description>{{extension}} file</description>
  </association>
{{/each}}
  <shortcut online="false"><desktop/></shortcut>
</information>
<security><all-permissions/></security>
<update check='always' policy='prompt-update'/>
<resources>
  <j2se version='1.6+' initial-heap-size='64m' max-heap-size='512m'/>
{{#each jars}}
  <jar href='lib/{{name}}' main='{{main}}'/>
{{/each}}
{{#each properties}}
  <property name='{{name}}' value='{{value}}'/>
{{/each}}
</resources>
<application-desc main-class='{{main_class}}'/>
</jnlp>
"#;

#[derive(Serialize)]
struct Descriptor<'a> {
    codebase: &'a str,
    href: String,
    title: &'a str,
    vendor: &'a str,
    homepage: Option<&'a str>,
    description: &'a str,
    icons: Vec<String>,
    associations: Vec<Association<'a>>,
    jars: Vec<JarRef<'a>>,
    properties: Vec<Property<'a>>,
    main_class: &'a str,
}

#[derive(Serialize)]
struct Association<'a> {
    extension: &'a str,
    mime_type: &'a str,
}

#[derive(Serialize)]
struct JarRef<'a> {
    name: &'a str,
    main: bool,
}

#[derive(Serialize)]
struct Property<'a> {
    name: &'a str,
    value: &'a str,
}

/// Bundler for web deployment descriptors.
#[derive(Clone, Copy, Debug, Default)]
pub struct JnlpBundler;

impl PlatformBundler for JnlpBundler {
    async fn build(
        &self,
        settings: &BundlerSettings,
        app: &AppDescription,
        dest_dir: &Path,
        _release_dir: &Path,
        _installer: bool,
    ) -> Result<BundlerResult> {
        app.main_jar()?;

        let out_dir = dest_dir.join("jnlp");
        let lib_dir = out_dir.join("lib");
        fs::create_dir_all(&lib_dir).await?;

        for jar in app.jars() {
            fs::copy_to_file(jar.file(), &lib_dir.join(jar.name())).await?;
        }

        let mut icons = Vec::new();
        for icon in app.png_icons() {
            let Some(name) = icon.file_name() else { continue };
            settings.step(format!("jnlp: copying icon {}", icon.display()));
            fs::copy_to_file(icon, &out_dir.join(name)).await?;
            icons.push(name.to_string_lossy().into_owned());
        }

        let href = format!("{}.jnlp", app.name());
        let descriptor = render_descriptor(app, &href, icons)?;
        let path: PathBuf = out_dir.join(&href);
        tokio::fs::write(&path, descriptor)
            .await
            .fs_context("writing jnlp descriptor", &path)?;

        log::info!("jnlp: created {}", path.display());
        Ok(BundlerResult::new("jnlp", path, Vec::<PathBuf>::new()))
    }
}

fn render_descriptor(app: &AppDescription, href: &str, icons: Vec<String>) -> Result<String> {
    let data = Descriptor {
        codebase: app.codebase(),
        href: href.to_string(),
        title: app.name(),
        vendor: app.vendor(),
        homepage: app.homepage(),
        description: app.description(),
        icons,
        associations: app
            .associations()
            .iter()
            .map(|a| Association {
                extension: &a.extension,
                mime_type: &a.mime_type,
            })
            .collect(),
        jars: app
            .jars()
            .iter()
            .map(|j| JarRef {
                name: j.name(),
                main: j.is_main(),
            })
            .collect(),
        properties: app
            .properties()
            .iter()
            .map(|(name, value)| Property { name, value })
            .collect(),
        main_class: app.main_class(),
    };
    metadata::render_xml("jnlp", JNLP_TEMPLATE, &data)
}
