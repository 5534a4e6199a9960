//! Bundle skeleton: directory tree, icon, and Info.plist.

use crate::bail;
use crate::error::Result;
use crate::freeze::BundleDirs;
use crate::settings::Settings;
use crate::util::{fs, process};
use chrono::Datelike;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;

/// Property list written to `Contents/Info.plist`.
///
/// Keys follow the original freeze pipeline: bundle identity, version,
/// minimum system version, Retina support, and launch environment.
#[derive(Debug, serde::Serialize)]
pub struct InfoPlist {
    #[serde(rename = "CFBundleDevelopmentRegion")]
    pub development_region: String,
    #[serde(rename = "CFBundleDisplayName")]
    pub display_name: String,
    #[serde(rename = "CFBundleName")]
    pub name: String,
    #[serde(rename = "CFBundleIdentifier")]
    pub identifier: String,
    #[serde(rename = "CFBundleVersion")]
    pub version: String,
    #[serde(rename = "CFBundleShortVersionString")]
    pub short_version: String,
    #[serde(rename = "CFBundlePackageType")]
    pub package_type: String,
    #[serde(rename = "CFBundleSignature")]
    pub signature: String,
    #[serde(rename = "CFBundleExecutable")]
    pub executable: String,
    #[serde(rename = "CFBundleIconFile")]
    pub icon_file: String,
    #[serde(rename = "CFBundleGetInfoString")]
    pub info_string: String,
    #[serde(rename = "LSMinimumSystemVersion")]
    pub minimum_system_version: String,
    #[serde(rename = "LSRequiresNativeExecution")]
    pub requires_native_execution: bool,
    #[serde(rename = "LSApplicationCategoryType")]
    pub category: String,
    #[serde(rename = "LSEnvironment")]
    pub environment: HashMap<String, String>,
    #[serde(rename = "NSAppleScriptEnabled")]
    pub applescript_enabled: bool,
    #[serde(rename = "NSHighResolutionCapable")]
    pub high_resolution_capable: bool,
    #[serde(rename = "NSHumanReadableCopyright")]
    pub copyright: String,
}

/// Builds the Info.plist contents from settings.
pub fn build_info_plist(settings: &Settings) -> InfoPlist {
    let package = settings.package_settings();
    let year = chrono::Utc::now().year();
    let copyright = match &package.copyright_holder {
        Some(holder) => format!("Copyright {}, {}", year, holder),
        None => format!("Copyright {}", year),
    };
    let info_string = package
        .info_string
        .clone()
        .unwrap_or_else(|| format!("{} {}", package.product_name, package.version));

    InfoPlist {
        development_region: "English".to_string(),
        display_name: package.product_name.clone(),
        name: package.product_name.clone(),
        identifier: package.identifier.clone(),
        version: package.version.clone(),
        short_version: package.version.clone(),
        package_type: "APPL".to_string(),
        signature: "????".to_string(),
        executable: package.product_name.clone(),
        icon_file: format!("{}.icns", package.product_name),
        info_string,
        minimum_system_version: package.minimum_system_version.clone(),
        requires_native_execution: true,
        category: package.category.clone(),
        environment: package.launch_env.clone(),
        applescript_enabled: false,
        high_resolution_capable: true,
        copyright,
    }
}

/// Creates the `Contents/{MacOS,Resources,Frameworks}` tree, compiles the
/// bundle icon, and writes `Info.plist`.
pub async fn create(settings: &Settings, dirs: &BundleDirs) -> Result<()> {
    for dir in [&dirs.macos, &dirs.resources, &dirs.frameworks] {
        fs::create_dir_all(dir, false).await?;
    }

    if let Some(iconset) = &settings.bundle_settings().iconset {
        build_icns(settings, iconset, &dirs.resources).await?;
    }

    write_info_plist(settings, &dirs.contents)?;
    Ok(())
}

/// Compiles the configured `.iconset` into `Resources/<Product>.icns`.
async fn build_icns(settings: &Settings, iconset: &Path, resources_dir: &Path) -> Result<()> {
    if !iconset.exists() {
        bail!("iconset not found: {}", iconset.display());
    }
    let icns = resources_dir.join(format!("{}.icns", settings.product_name()));
    process::run(
        "iconutil",
        [
            OsStr::new("-c"),
            OsStr::new("icns"),
            iconset.as_os_str(),
            OsStr::new("-o"),
            icns.as_os_str(),
        ],
    )
    .await
}

/// Writes `Contents/Info.plist`.
fn write_info_plist(settings: &Settings, contents_dir: &Path) -> Result<()> {
    let plist_path = contents_dir.join("Info.plist");
    plist::to_file_xml(&plist_path, &build_info_plist(settings))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsBuilder;

    fn settings() -> Settings {
        SettingsBuilder::from_toml(
            r#"
            [package]
            product_name = "kitty"
            version = "0.4.2"
            identifier = "net.kovidgoyal.kitty"
            copyright_holder = "Kovid Goyal"
            launch_env = { KITTY_LAUNCHED_BY_LAUNCH_SERVICES = "1" }

            [runtime]
            framework = "Python.framework"
            prefix_subdir = "python"
            stdlib_version = "2.7"
            "#,
        )
        .unwrap()
        .build()
        .unwrap()
    }

    #[test]
    fn plist_carries_bundle_identity() {
        let pl = build_info_plist(&settings());
        assert_eq!(pl.executable, "kitty");
        assert_eq!(pl.identifier, "net.kovidgoyal.kitty");
        assert_eq!(pl.icon_file, "kitty.icns");
        assert_eq!(pl.version, "0.4.2");
        assert!(pl.copyright.contains("Kovid Goyal"));
        assert_eq!(
            pl.environment.get("KITTY_LAUNCHED_BY_LAUNCH_SERVICES"),
            Some(&"1".to_string())
        );
    }

    #[test]
    fn written_plist_reads_back() {
        let settings = settings();
        let dir = tempfile::tempdir().unwrap();
        write_info_plist(&settings, dir.path()).unwrap();

        let value = plist::Value::from_file(dir.path().join("Info.plist")).unwrap();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(
            dict.get("CFBundleExecutable").and_then(|v| v.as_string()),
            Some("kitty")
        );
        assert_eq!(
            dict.get("CFBundlePackageType").and_then(|v| v.as_string()),
            Some("APPL")
        );
        assert_eq!(
            dict.get("NSHighResolutionCapable").and_then(|v| v.as_boolean()),
            Some(true)
        );
    }

    #[tokio::test]
    async fn missing_iconset_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_icns(
            &settings(),
            Path::new("/nonexistent/logo.iconset"),
            dir.path(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("iconset not found"));
    }
}
