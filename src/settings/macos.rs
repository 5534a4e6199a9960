//! Code signing and disk image settings.

use std::path::PathBuf;

fn default_keychain_password_env() -> String {
    "CODESIGN_KEYCHAIN_PASSWORD".to_string()
}

fn default_dmg_format() -> String {
    "UDBZ".to_string()
}

/// macOS code signing configuration.
///
/// # Configuration
///
/// ```toml
/// [macos]
/// signing_identity = "Developer ID Application: Your Name (TEAMID)"
/// keychain = "/Users/build/codesign.keychain"
/// keychain_password_env = "CODESIGN_KEYCHAIN_PASSWORD"
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MacOsSettings {
    /// Code signing identity name.
    ///
    /// Default: None (unsigned)
    #[serde(default)]
    pub signing_identity: Option<String>,

    /// Keychain holding the signing certificate. When set it is unlocked
    /// with `security unlock-keychain` before signing and passed to
    /// `codesign --keychain`.
    #[serde(default)]
    pub keychain: Option<PathBuf>,

    /// Environment variable holding the keychain password.
    #[serde(default = "default_keychain_password_env")]
    pub keychain_password_env: String,
}

impl Default for MacOsSettings {
    fn default() -> Self {
        Self {
            signing_identity: None,
            keychain: None,
            keychain_password_env: default_keychain_password_env(),
        }
    }
}

impl MacOsSettings {
    /// Returns the signing identity unless it is the ad-hoc "-" marker.
    pub fn effective_identity(&self) -> Option<&str> {
        match self.signing_identity.as_deref() {
            Some("-") | None => None,
            Some(identity) => Some(identity),
        }
    }
}

/// macOS disk image configuration.
///
/// # Configuration
///
/// ```toml
/// [dmg]
/// format = "UDBZ"
/// internet_enable = false
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DmgSettings {
    /// hdiutil image format. UDBZ gives bzip2-compressed read-only images.
    #[serde(default = "default_dmg_format")]
    pub format: String,

    /// Run `hdiutil internet-enable -yes` on the finished image.
    /// Only meaningful on macOS versions whose hdiutil still carries the verb.
    #[serde(default)]
    pub internet_enable: bool,
}

impl Default for DmgSettings {
    fn default() -> Self {
        Self {
            format: default_dmg_format(),
            internet_enable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adhoc_identity_is_not_used_for_signing() {
        let settings = MacOsSettings {
            signing_identity: Some("-".to_string()),
            ..Default::default()
        };
        assert!(settings.effective_identity().is_none());

        let settings = MacOsSettings {
            signing_identity: Some("Developer ID Application: X".to_string()),
            ..Default::default()
        };
        assert_eq!(
            settings.effective_identity(),
            Some("Developer ID Application: X")
        );
    }

    #[test]
    fn dmg_defaults_to_compressed_format() {
        let dmg = DmgSettings::default();
        assert_eq!(dmg.format, "UDBZ");
        assert!(!dmg.internet_enable);
    }
}
