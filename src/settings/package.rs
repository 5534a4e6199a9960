//! Package metadata settings.

use std::collections::HashMap;

fn default_minimum_system_version() -> String {
    "10.9.5".to_string()
}

fn default_category() -> String {
    "public.app-category.utilities".to_string()
}

/// Application metadata written into the bundle's `Info.plist`.
///
/// # Configuration
///
/// ```toml
/// [package]
/// product_name = "kitty"
/// version = "0.4.2"
/// identifier = "net.kovidgoyal.kitty"
/// copyright_holder = "Kovid Goyal"
/// info_string = "kitty, an OpenGL based terminal emulator"
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
pub struct PackageSettings {
    /// Product name. Also the name of the main executable in
    /// `Contents/MacOS` and the `.app` directory stem.
    pub product_name: String,

    /// Version string (CFBundleVersion / CFBundleShortVersionString).
    pub version: String,

    /// Bundle identifier (CFBundleIdentifier).
    pub identifier: String,

    /// Name used in the NSHumanReadableCopyright line.
    #[serde(default)]
    pub copyright_holder: Option<String>,

    /// Free-form description (CFBundleGetInfoString).
    #[serde(default)]
    pub info_string: Option<String>,

    /// Minimum macOS version required (LSMinimumSystemVersion).
    #[serde(default = "default_minimum_system_version")]
    pub minimum_system_version: String,

    /// LSApplicationCategoryType value.
    #[serde(default = "default_category")]
    pub category: String,

    /// Environment variables injected at launch (LSEnvironment).
    #[serde(default)]
    pub launch_env: HashMap<String, String>,
}
