//! Bundle content settings.

use std::path::PathBuf;

/// What gets copied into the `.app` skeleton besides the runtime.
///
/// # Configuration
///
/// ```toml
/// [bundle]
/// iconset = "logo/kitty.iconset"
/// libraries = ["sqlite3.0", "z.1", "glfw.3", "crypto.1.0.0", "ssl.1.0.0"]
/// packages = ["kitty"]
/// ```
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct BundleSettings {
    /// Path to the `.iconset` directory compiled into the bundle icon
    /// with `iconutil`. Relative paths resolve against the working
    /// directory of the freeze invocation.
    #[serde(default)]
    pub iconset: Option<PathBuf>,

    /// Shared library stems copied from `<prefix>/lib` into
    /// `Contents/Frameworks`. A stem `z.1` selects `libz.1.dylib`.
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Application package directories copied into `Contents/Frameworks`.
    /// Only files admitted by the runtime's `bundle_extensions` survive
    /// the copy; native extensions get their load paths rewritten.
    #[serde(default)]
    pub packages: Vec<PathBuf>,
}

impl BundleSettings {
    /// Full dylib file name for a configured library stem.
    pub fn dylib_name(stem: &str) -> String {
        format!("lib{}.dylib", stem)
    }
}
