//! Code signing.
//!
//! Signs the bundle inside out: everything in `Contents/MacOS` except the
//! main executable, then the Frameworks directory (`.framework` bundles
//! first), then the app itself. The main executable is signed implicitly
//! when codesign signs the bundle. Verification runs `codesign --deep
//! --verify` and a Gatekeeper assessment.

use crate::bail;
use crate::error::{Error, ErrorExt, Result};
use crate::settings::{MacOsSettings, Settings};
use crate::util::{fs, process};
use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Signs and verifies an assembled `.app` bundle.
pub async fn sign_app(app_dir: &Path, settings: &Settings) -> Result<()> {
    let macos = settings.macos();
    let identity = macos.effective_identity().ok_or_else(|| {
        Error::GenericError("no signing identity configured in [macos]".into())
    })?;

    let app_dir = std::fs::canonicalize(app_dir).fs_context("resolving app bundle", app_dir)?;
    log::info!("Signing {}", app_dir.display());

    unlock_keychain(macos).await?;

    let contents = app_dir.join("Contents");
    let main_executable = bundle_executable(&contents.join("Info.plist"))?;

    // Sign everything in MacOS except the main executable, which codesign
    // signs itself when signing the bundle.
    let macos_dir = contents.join("MacOS");
    let items = list_dir(&macos_dir, |name| name != main_executable)?;
    codesign(identity, macos.keychain.as_deref(), &expand_dirs(items)?).await?;

    // Sign Frameworks: .framework bundles first, then the rest.
    let frameworks_dir = contents.join("Frameworks");
    if frameworks_dir.is_dir() {
        let pattern = format!("{}/*.framework", frameworks_dir.to_string_lossy());
        let mut frameworks = Vec::new();
        for entry in glob::glob(&pattern)? {
            frameworks.push(entry?);
        }
        frameworks.sort();
        codesign(identity, macos.keychain.as_deref(), &frameworks).await?;

        let framework_names: BTreeSet<OsString> = frameworks
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_os_string()))
            .collect();
        let rest = list_dir(&frameworks_dir, |name| {
            !framework_names.contains(&OsString::from(name))
        })?;
        codesign(identity, macos.keychain.as_deref(), &expand_dirs(rest)?).await?;
    }

    // Now sign the app bundle itself and verify.
    codesign(
        identity,
        macos.keychain.as_deref(),
        std::slice::from_ref(&app_dir),
    )
    .await?;
    process::run(
        "codesign",
        [
            OsStr::new("--deep"),
            OsStr::new("--verify"),
            OsStr::new("-v"),
            app_dir.as_os_str(),
        ],
    )
    .await?;
    process::run(
        "spctl",
        [
            OsStr::new("--verbose=4"),
            OsStr::new("--assess"),
            OsStr::new("--type"),
            OsStr::new("execute"),
            app_dir.as_os_str(),
        ],
    )
    .await?;

    log::info!("✓ Signed and verified {}", app_dir.display());
    Ok(())
}

/// Unlocks the configured keychain so codesign can use the certificate
/// without prompting. The password comes from the configured environment
/// variable.
async fn unlock_keychain(macos: &MacOsSettings) -> Result<()> {
    let Some(keychain) = &macos.keychain else {
        return Ok(());
    };
    let password = std::env::var(&macos.keychain_password_env).map_err(|_| {
        Error::GenericError(format!(
            "environment variable {} not set (keychain password)",
            macos.keychain_password_env
        ))
    })?;
    process::run(
        "security",
        [
            OsStr::new("unlock-keychain"),
            OsStr::new("-p"),
            OsStr::new(&password),
            keychain.as_os_str(),
        ],
    )
    .await
}

/// Runs codesign over a batch of items. Empty batches are skipped.
async fn codesign(identity: &str, keychain: Option<&Path>, items: &[PathBuf]) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let mut args: Vec<&OsStr> = vec![OsStr::new("-s"), OsStr::new(identity)];
    if let Some(keychain) = keychain {
        args.push(OsStr::new("--keychain"));
        args.push(keychain.as_os_str());
    }
    args.extend(items.iter().map(|p| p.as_os_str()));
    process::run("codesign", args).await
}

/// Directory entries whose file name passes the filter.
fn list_dir(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut items = Vec::new();
    for entry in std::fs::read_dir(dir).fs_context("listing", dir)? {
        let entry = entry.fs_context("listing", dir)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if keep(&name) {
            items.push(entry.path());
        }
    }
    items.sort();
    Ok(items)
}

/// Replaces directories in the list with the files underneath them.
pub(crate) fn expand_dirs(items: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut expanded = BTreeSet::new();
    for item in items {
        if item.is_dir() {
            expanded.extend(fs::walk_files(&item)?);
        } else {
            expanded.insert(item);
        }
    }
    Ok(expanded.into_iter().collect())
}

/// Reads CFBundleExecutable from an Info.plist.
pub(crate) fn bundle_executable(info_path: &Path) -> Result<String> {
    let value = plist::Value::from_file(info_path)?;
    let executable = value
        .as_dictionary()
        .and_then(|d| d.get("CFBundleExecutable"))
        .and_then(|v| v.as_string());
    match executable {
        Some(name) => Ok(name.to_string()),
        None => bail!("no CFBundleExecutable in {}", info_path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_dirs_replaces_directories_with_their_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/inner")).unwrap();
        std::fs::write(dir.path().join("loose"), b"").unwrap();
        std::fs::write(dir.path().join("sub/a"), b"").unwrap();
        std::fs::write(dir.path().join("sub/inner/b"), b"").unwrap();

        let items = vec![dir.path().join("loose"), dir.path().join("sub")];
        let expanded = expand_dirs(items).unwrap();
        assert_eq!(
            expanded,
            vec![
                dir.path().join("loose"),
                dir.path().join("sub/a"),
                dir.path().join("sub/inner/b"),
            ]
        );
    }

    #[test]
    fn bundle_executable_reads_plist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Info.plist");
        let mut dict = plist::Dictionary::new();
        dict.insert(
            "CFBundleExecutable".to_string(),
            plist::Value::String("kitty".to_string()),
        );
        plist::Value::Dictionary(dict).to_file_xml(&path).unwrap();

        assert_eq!(bundle_executable(&path).unwrap(), "kitty");
    }

    #[test]
    fn missing_executable_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Info.plist");
        plist::Value::Dictionary(plist::Dictionary::new())
            .to_file_xml(&path)
            .unwrap();
        assert!(bundle_executable(&path).is_err());
    }
}
