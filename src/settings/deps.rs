//! Dependency build recipes.

/// A third-party source dependency built by the deps driver.
///
/// # Configuration
///
/// ```toml
/// [[deps.recipes]]
/// name = "zlib"
/// url = "https://zlib.net/zlib-1.2.11.tar.gz"
/// sha256 = "c3e5e9fdd5004dcb542feda5ee4f0ff0744628baf8ed2dd5d66f8ca1197cb1a1"
/// build = [
///     "./configure --prefix=$GLACIER_OUTPUT",
///     "make -j4",
///     "make install",
/// ]
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Recipe {
    /// Dependency name. Used for the package archive file name and for
    /// selecting builds on the command line.
    pub name: String,

    /// Source tarball URL.
    pub url: String,

    /// Hex-encoded SHA-256 of the source tarball.
    pub sha256: String,

    /// Shell commands run inside the extracted source tree.
    ///
    /// Each command sees `GLACIER_PREFIX` (the shared install prefix with
    /// previously built dependencies) and `GLACIER_OUTPUT` (the isolated
    /// directory whose contents become this dependency's package).
    pub build: Vec<String>,
}

/// Collection of configured dependency recipes.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct DepsSettings {
    /// All known recipes, in build order.
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

impl DepsSettings {
    /// Looks up a recipe by name.
    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    /// Names of all configured recipes, in build order.
    pub fn names(&self) -> Vec<&str> {
        self.recipes.iter().map(|r| r.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipes_parse_from_toml() {
        let deps: DepsSettings = toml::from_str(
            r#"
            [[recipes]]
            name = "zlib"
            url = "https://zlib.net/zlib-1.2.11.tar.gz"
            sha256 = "deadbeef"
            build = ["./configure --prefix=$GLACIER_OUTPUT", "make install"]

            [[recipes]]
            name = "openssl"
            url = "https://www.openssl.org/source/openssl-1.0.2n.tar.gz"
            sha256 = "cafebabe"
            build = ["./Configure darwin64-x86_64-cc", "make install"]
            "#,
        )
        .unwrap();

        assert_eq!(deps.names(), ["zlib", "openssl"]);
        assert_eq!(deps.recipe("zlib").unwrap().build.len(), 2);
        assert!(deps.recipe("libpng").is_none());
    }
}
