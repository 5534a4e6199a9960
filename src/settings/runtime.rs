//! Language runtime framework settings.

fn default_bundle_extensions() -> Vec<String> {
    vec!["py".to_string(), "so".to_string()]
}

/// The embedded language runtime: a macOS framework living under the
/// build prefix whose current version and standard library are copied
/// into the bundle.
///
/// # Configuration
///
/// ```toml
/// [runtime]
/// framework = "Python.framework"
/// prefix_subdir = "python"
/// stdlib_version = "2.7"
/// stdlib_exclude = ["site-packages", "test", "idlelib"]
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
pub struct RuntimeSettings {
    /// Framework directory name, e.g. `Python.framework`.
    pub framework: String,

    /// Subdirectory of the build prefix holding the framework.
    pub prefix_subdir: String,

    /// Version suffix of the standard library directory, e.g. `2.7`
    /// selects `lib/python2.7`.
    pub stdlib_version: String,

    /// Standard library entries skipped when copying into the bundle.
    #[serde(default)]
    pub stdlib_exclude: Vec<String>,

    /// File extensions admitted when copying package directories.
    #[serde(default = "default_bundle_extensions")]
    pub bundle_extensions: Vec<String>,
}

impl RuntimeSettings {
    /// Framework name without the `.framework` extension, e.g. `Python`.
    pub fn name(&self) -> &str {
        self.framework
            .strip_suffix(".framework")
            .unwrap_or(&self.framework)
    }

    /// Standard library directory name, e.g. `python2.7`.
    pub fn stdlib_dir_name(&self) -> String {
        format!("{}{}", self.name().to_lowercase(), self.stdlib_version)
    }

    /// Returns true if a top-level stdlib entry is excluded from the bundle.
    pub fn is_stdlib_excluded(&self, entry: &str) -> bool {
        self.stdlib_exclude.iter().any(|e| e == entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> RuntimeSettings {
        RuntimeSettings {
            framework: "Python.framework".to_string(),
            prefix_subdir: "python".to_string(),
            stdlib_version: "2.7".to_string(),
            stdlib_exclude: vec!["test".to_string(), "site-packages".to_string()],
            bundle_extensions: default_bundle_extensions(),
        }
    }

    #[test]
    fn framework_name_strips_extension() {
        assert_eq!(runtime().name(), "Python");
    }

    #[test]
    fn stdlib_dir_name_is_lowercased_with_version() {
        assert_eq!(runtime().stdlib_dir_name(), "python2.7");
    }

    #[test]
    fn exclusion_list_is_honored() {
        let rt = runtime();
        assert!(rt.is_stdlib_excluded("test"));
        assert!(!rt.is_stdlib_excluded("json"));
    }
}
