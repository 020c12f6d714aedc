//! The `app.xml` document embedded in every launcher trailer.
//!
//! Registry-distributed apps describe the package to resolve; other apps carry
//! the URL to launch. Both carry the icon as a data URI.

use crate::bundler::{
    AppDescription, BundlerSettings,
    error::{ErrorExt, Result},
};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;

const APP_XML_TEMPLATE: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "\n",
    r#"{{#if package}}<app name="{{name}}" package="{{package}}"{{#if source}} source="{{source}}"{{/if}} version="{{version}}"{{#if icon}} icon="{{icon}}"{{/if}}{{#if splash}} splash="{{splash}}"{{/if}} prerelease="{{prerelease}}"{{#if registry_url}} registry-url="{{registry_url}}"{{/if}} fork="{{fork}}"{{#if launcher_version}} launcher-version="{{launcher_version}}"{{/if}}{{#if initial_app_version}} initial-app-version="{{initial_app_version}}"{{/if}}{{#if admin}} admin="true"{{/if}}/>"#,
    r#"{{else}}<app name="{{name}}" url="{{url}}"{{#if icon}} icon="{{icon}}"{{/if}}{{#if splash}} splash="{{splash}}"{{/if}}{{#if launcher_version}} launcher-version="{{launcher_version}}"{{/if}}{{#if initial_app_version}} initial-app-version="{{initial_app_version}}"{{/if}}{{#if admin}} admin="true"{{/if}}/>{{/if}}"#,
    "\n",
);

#[derive(Serialize)]
struct AppXml<'a> {
    name: &'a str,
    package: Option<&'a str>,
    source: Option<&'a str>,
    version: Option<&'a str>,
    url: Option<&'a str>,
    icon: Option<&'a str>,
    splash: Option<&'a str>,
    registry_url: Option<&'a str>,
    launcher_version: Option<&'a str>,
    initial_app_version: Option<&'a str>,
    prerelease: bool,
    fork: bool,
    admin: bool,
}

/// Renders the launcher metadata document.
pub fn render_app_xml(app: &AppDescription, settings: &BundlerSettings) -> Result<String> {
    let source = app.source();
    let data = AppXml {
        name: app.name(),
        package: source.map(|s| s.package()),
        source: source.and_then(|s| s.source()),
        version: source.map(|s| s.version()),
        url: app.url(),
        icon: app.icon_data_uri(),
        splash: app.splash_data_uri(),
        registry_url: app.registry_url(),
        launcher_version: app.launcher_version(),
        initial_app_version: app.initial_app_version(),
        prerelease: app.is_prerelease(),
        fork: app.is_fork(),
        admin: settings.admin(),
    };
    render_xml("app.xml", APP_XML_TEMPLATE, &data)
}

/// Writes the metadata document to `path`.
pub async fn write_app_xml(app: &AppDescription, settings: &BundlerSettings, path: &Path) -> Result<()> {
    let xml = render_app_xml(app, settings)?;
    tokio::fs::write(path, xml)
        .await
        .fs_context("writing app.xml", path)
}

/// Renders a handlebars template with XML escaping of every substitution.
pub(crate) fn render_xml<T: Serialize>(name: &str, template: &str, data: &T) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(escape_xml);
    handlebars.register_template_string(name, template)?;
    Ok(handlebars.render(name, data)?)
}

/// Escapes the five XML special characters.
pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{DistributionSource, SettingsBuilder};

    fn settings(admin: bool) -> BundlerSettings {
        SettingsBuilder::new().stub_dir("stubs").admin(admin).build().unwrap()
    }

    #[test]
    fn test_url_app_document() {
        let app = AppDescription::builder("Tom & Jerry", "com.example.Main")
            .url("https://example.com/app?a=1&b=2")
            .icon_data_uri("data:image/png;base64,AAA=")
            .build()
            .unwrap();
        let xml = render_app_xml(&app, &settings(false)).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <app name=\"Tom &amp; Jerry\" url=\"https://example.com/app?a=1&amp;b=2\" \
             icon=\"data:image/png;base64,AAA=\"/>\n"
        );
    }

    #[test]
    fn test_registry_app_document() {
        let app = AppDescription::builder("Demo", "com.example.Main")
            .source(
                DistributionSource::new("demo-app")
                    .with_source("https://github.com/example/demo")
                    .with_version("1.2.3"),
            )
            .prerelease(true)
            .build()
            .unwrap();
        let xml = render_app_xml(&app, &settings(true)).unwrap();
        assert!(xml.contains(
            "<app name=\"Demo\" package=\"demo-app\" source=\"https://github.com/example/demo\" \
             version=\"1.2.3\" prerelease=\"true\" fork=\"false\" admin=\"true\"/>"
        ));
        assert!(!xml.contains("url="));
    }

    #[test]
    fn test_launcher_versions_only_when_set() {
        let url_app = AppDescription::builder("Demo", "com.example.Main")
            .url("https://example.com/app")
            .launcher_version("5.4.3")
            .initial_app_version("2.1.0")
            .build()
            .unwrap();
        let xml = render_app_xml(&url_app, &settings(false)).unwrap();
        assert!(xml.contains(
            "<app name=\"Demo\" url=\"https://example.com/app\" \
             launcher-version=\"5.4.3\" initial-app-version=\"2.1.0\"/>"
        ));

        let registry_app = AppDescription::builder("Demo", "com.example.Main")
            .source(DistributionSource::new("demo-app").with_version("1.0.0"))
            .launcher_version("5.4.3")
            .initial_app_version("")
            .build()
            .unwrap();
        let xml = render_app_xml(&registry_app, &settings(true)).unwrap();
        assert!(xml.contains(r#"fork="false" launcher-version="5.4.3" admin="true"/>"#));
        assert!(!xml.contains("initial-app-version"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
    }
}
