//! Core Settings struct and implementations.

use super::{
    BundleSettings, DepsSettings, DmgSettings, MacOsSettings, PackageSettings, RuntimeSettings,
};
use std::path::{Path, PathBuf};

fn default_sw() -> PathBuf {
    PathBuf::from("./sw")
}

/// Working directories shared by the freezer and the deps driver.
///
/// # Configuration
///
/// ```toml
/// [paths]
/// sw = "/sw"
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
pub struct PathSettings {
    /// Root working directory. Package archives, the dist directory, and
    /// (by default) the install prefix live underneath it.
    #[serde(default = "default_sw")]
    pub sw: PathBuf,

    /// Shared install prefix dependency builds install into and the
    /// freezer reads runtime and libraries from. Default: `<sw>/sw`.
    #[serde(default)]
    pub prefix: Option<PathBuf>,

    /// Cache directory for downloaded source tarballs.
    /// Default: the platform cache dir, falling back to `<sw>/sources`.
    #[serde(default)]
    pub sources: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            sw: default_sw(),
            prefix: None,
            sources: None,
        }
    }
}

/// Main settings for freeze and dependency-build operations.
///
/// Central configuration, constructed via [`super::SettingsBuilder`] from a
/// `glacier.toml` file.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Package metadata.
    package: PackageSettings,

    /// Bundle contents.
    bundle: BundleSettings,

    /// Language runtime framework.
    runtime: RuntimeSettings,

    /// Code signing.
    macos: MacOsSettings,

    /// Disk image.
    dmg: DmgSettings,

    /// Working directories.
    paths: PathSettings,

    /// Dependency recipes.
    deps: DepsSettings,
}

impl Settings {
    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the package metadata.
    pub fn package_settings(&self) -> &PackageSettings {
        &self.package
    }

    /// Returns the bundle content settings.
    pub fn bundle_settings(&self) -> &BundleSettings {
        &self.bundle
    }

    /// Returns the runtime framework settings.
    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    /// Returns the code signing settings.
    pub fn macos(&self) -> &MacOsSettings {
        &self.macos
    }

    /// Returns the disk image settings.
    pub fn dmg(&self) -> &DmgSettings {
        &self.dmg
    }

    /// Returns the dependency recipes.
    pub fn deps(&self) -> &DepsSettings {
        &self.deps
    }

    /// Root working directory.
    pub fn sw_dir(&self) -> &Path {
        &self.paths.sw
    }

    /// Shared install prefix.
    pub fn prefix(&self) -> PathBuf {
        self.paths
            .prefix
            .clone()
            .unwrap_or_else(|| self.paths.sw.join("sw"))
    }

    /// Source tarball cache directory.
    pub fn sources_dir(&self) -> PathBuf {
        if let Some(dir) = &self.paths.sources {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|d| d.join("glacier").join("sources"))
            .unwrap_or_else(|| self.paths.sw.join("sources"))
    }

    /// Directory the finished disk image is placed in.
    pub fn dist_dir(&self) -> PathBuf {
        self.sw_dir().join("dist")
    }

    /// Package archive path for a dependency name.
    pub fn package_path(&self, dep: &str) -> PathBuf {
        self.sw_dir().join(format!("{}.tar.gz", dep))
    }

    /// Volume name of the disk image: `<Product>-<Version>`.
    pub fn volume_name(&self) -> String {
        format!("{}-{}", self.product_name(), self.version_string())
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        package: PackageSettings,
        bundle: BundleSettings,
        runtime: RuntimeSettings,
        macos: MacOsSettings,
        dmg: DmgSettings,
        paths: PathSettings,
        deps: DepsSettings,
    ) -> Self {
        Self {
            package,
            bundle,
            runtime,
            macos,
            dmg,
            paths,
            deps,
        }
    }
}
