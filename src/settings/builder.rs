//! Builder for constructing Settings from a configuration file.

use super::{
    BundleSettings, DepsSettings, DmgSettings, MacOsSettings, PackageSettings, PathSettings,
    RuntimeSettings, Settings,
};
use crate::error::{Error, ErrorExt, Result};
use std::path::Path;

/// On-disk shape of `glacier.toml`.
#[derive(Debug, serde::Deserialize)]
struct ConfigFile {
    package: PackageSettings,
    runtime: RuntimeSettings,
    #[serde(default)]
    bundle: BundleSettings,
    #[serde(default)]
    macos: MacOsSettings,
    #[serde(default)]
    dmg: DmgSettings,
    #[serde(default)]
    paths: PathSettings,
    #[serde(default)]
    deps: DepsSettings,
}

/// Builder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    package: Option<PackageSettings>,
    runtime: Option<RuntimeSettings>,
    bundle: BundleSettings,
    macos: MacOsSettings,
    dmg: DmgSettings,
    paths: PathSettings,
    deps: DepsSettings,
}

impl SettingsBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a builder from a `glacier.toml` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).fs_context("reading configuration", path)?;
        Self::from_toml(&raw)
    }

    /// Loads a builder from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: ConfigFile = toml::from_str(raw)?;
        Ok(Self {
            package: Some(config.package),
            runtime: Some(config.runtime),
            bundle: config.bundle,
            macos: config.macos,
            dmg: config.dmg,
            paths: config.paths,
            deps: config.deps,
        })
    }

    /// Sets package metadata.
    pub fn package_settings(mut self, package: PackageSettings) -> Self {
        self.package = Some(package);
        self
    }

    /// Sets runtime framework settings.
    pub fn runtime_settings(mut self, runtime: RuntimeSettings) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Sets bundle content settings.
    pub fn bundle_settings(mut self, bundle: BundleSettings) -> Self {
        self.bundle = bundle;
        self
    }

    /// Sets code signing settings.
    pub fn macos_settings(mut self, macos: MacOsSettings) -> Self {
        self.macos = macos;
        self
    }

    /// Sets disk image settings.
    pub fn dmg_settings(mut self, dmg: DmgSettings) -> Self {
        self.dmg = dmg;
        self
    }

    /// Sets working directories.
    pub fn path_settings(mut self, paths: PathSettings) -> Self {
        self.paths = paths;
        self
    }

    /// Sets dependency recipes.
    pub fn deps_settings(mut self, deps: DepsSettings) -> Self {
        self.deps = deps;
        self
    }

    /// Validates and builds the final [`Settings`].
    pub fn build(self) -> Result<Settings> {
        let package = self
            .package
            .ok_or_else(|| Error::GenericError("missing [package] settings".into()))?;
        let runtime = self
            .runtime
            .ok_or_else(|| Error::GenericError("missing [runtime] settings".into()))?;

        if package.product_name.is_empty() {
            return Err(Error::GenericError("product_name must not be empty".into()));
        }
        if package.version.is_empty() {
            return Err(Error::GenericError("version must not be empty".into()));
        }
        if runtime.framework.is_empty() {
            return Err(Error::GenericError(
                "runtime.framework must not be empty".into(),
            ));
        }

        Ok(Settings::new(
            package,
            self.bundle,
            runtime,
            self.macos,
            self.dmg,
            self.paths,
            self.deps,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [package]
        product_name = "kitty"
        version = "0.4.2"
        identifier = "net.kovidgoyal.kitty"
        copyright_holder = "Kovid Goyal"

        [runtime]
        framework = "Python.framework"
        prefix_subdir = "python"
        stdlib_version = "2.7"
        stdlib_exclude = ["site-packages", "test"]

        [bundle]
        libraries = ["sqlite3.0", "z.1"]
        packages = ["build/kitty"]

        [macos]
        signing_identity = "Developer ID Application: Kovid Goyal"
        keychain = "/Users/build/codesign.keychain"

        [paths]
        sw = "/sw"

        [[deps.recipes]]
        name = "zlib"
        url = "https://zlib.net/zlib-1.2.11.tar.gz"
        sha256 = "deadbeef"
        build = ["./configure --prefix=$GLACIER_OUTPUT", "make install"]
    "#;

    #[test]
    fn full_config_round_trips() {
        let settings = SettingsBuilder::from_toml(SAMPLE).unwrap().build().unwrap();
        assert_eq!(settings.product_name(), "kitty");
        assert_eq!(settings.volume_name(), "kitty-0.4.2");
        assert_eq!(settings.prefix(), std::path::PathBuf::from("/sw/sw"));
        assert_eq!(settings.dist_dir(), std::path::PathBuf::from("/sw/dist"));
        assert_eq!(
            settings.package_path("zlib"),
            std::path::PathBuf::from("/sw/zlib.tar.gz")
        );
        assert_eq!(settings.runtime().stdlib_dir_name(), "python2.7");
        assert_eq!(settings.bundle_settings().libraries.len(), 2);
        assert_eq!(settings.deps().names(), ["zlib"]);
    }

    #[test]
    fn missing_sections_fail_with_clear_message() {
        let err = SettingsBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("[package]"));
    }

    #[test]
    fn empty_product_name_is_rejected() {
        let raw = SAMPLE.replace("product_name = \"kitty\"", "product_name = \"\"");
        let err = SettingsBuilder::from_toml(&raw).unwrap().build().unwrap_err();
        assert!(err.to_string().contains("product_name"));
    }

    #[test]
    fn optional_sections_default() {
        let raw = r#"
            [package]
            product_name = "app"
            version = "1.0"
            identifier = "com.example.app"

            [runtime]
            framework = "Python.framework"
            prefix_subdir = "python"
            stdlib_version = "3.7"
        "#;
        let settings = SettingsBuilder::from_toml(raw).unwrap().build().unwrap();
        assert_eq!(settings.dmg().format, "UDBZ");
        assert!(settings.macos().effective_identity().is_none());
        assert!(settings.deps().recipes.is_empty());
        assert_eq!(settings.sw_dir(), std::path::Path::new("./sw"));
    }
}
