//! Runtime framework and standard library installation.
//!
//! Copies the current version of the configured runtime framework into
//! `Contents/Frameworks`, installs its standard library under
//! `Contents/Resources`, and rewrites load paths of everything copied.

use crate::bail;
use crate::error::{Error, ErrorExt, Result};
use crate::freeze::dylib::{DylibRewriter, FRAMEWORKS_ID};
use crate::freeze::BundleDirs;
use crate::settings::Settings;
use crate::util::fs;
use std::path::Path;

/// Copies the runtime framework's current version into the bundle.
///
/// Only the framework's main dylib and its `Resources/Info.plist` are
/// taken. The `Versions/Current` and top-level symlinks are recreated
/// afterwards; codesign refuses frameworks without them. The main
/// executable's load paths are rewritten here since it links the runtime.
pub async fn add_framework(
    settings: &Settings,
    dirs: &BundleDirs,
    rewriter: &mut DylibRewriter,
) -> Result<()> {
    let runtime = settings.runtime();
    log::info!("Adding {}", runtime.framework);

    let src = settings
        .prefix()
        .join(&runtime.prefix_subdir)
        .join(&runtime.framework);
    let current = tokio::fs::canonicalize(src.join("Versions").join("Current"))
        .await
        .fs_context("resolving current version of", &src)?;
    let version = current
        .file_name()
        .ok_or_else(|| Error::GenericError(format!("no version component in {current:?}")))?
        .to_string_lossy()
        .into_owned();

    let framework_dir = dirs.frameworks.join(&runtime.framework);
    let version_dir = framework_dir.join("Versions").join(&version);
    fs::create_dir_all(&version_dir.join("Resources"), false).await?;

    fs::copy_file(
        &current.join("Resources").join("Info.plist"),
        &version_dir.join("Resources").join("Info.plist"),
    )
    .await?;

    let main_dylib = version_dir.join(runtime.name());
    fs::copy_file(&current.join(runtime.name()), &main_dylib).await?;
    rewriter
        .set_id(
            &main_dylib,
            &format!(
                "{}/{}/Versions/{}/{}",
                FRAMEWORKS_ID,
                runtime.framework,
                version,
                runtime.name()
            ),
        )
        .await?;

    // The main executable links the runtime dylib out of the prefix.
    let main_executable = dirs.macos.join(settings.product_name());
    if !main_executable.exists() {
        bail!(
            "main executable not found at {}",
            main_executable.display()
        );
    }
    rewriter.fix(&main_executable).await?;

    let current_link = framework_dir.join("Versions").join("Current");
    fs::symlink(Path::new(&version), &current_link)
        .fs_context("creating Versions/Current symlink", &current_link)?;
    for name in [runtime.name(), "Resources"] {
        let link = framework_dir.join(name);
        fs::symlink(&Path::new("Versions/Current").join(name), &link)
            .fs_context("creating framework symlink", &link)?;
    }

    Ok(())
}

/// Copies the runtime's standard library into
/// `Contents/Resources/<Runtime>/lib/<stdlib dir>`.
///
/// Top-level entries on the exclusion list are skipped. Package
/// directories get the filtered copy treatment; loose files are admitted
/// by extension, with native extensions rewritten.
pub async fn add_stdlib(
    settings: &Settings,
    dirs: &BundleDirs,
    rewriter: &mut DylibRewriter,
) -> Result<()> {
    let runtime = settings.runtime();
    log::info!("Adding {} stdlib", runtime.name());

    let stdlib_dir = runtime.stdlib_dir_name();
    let src = settings
        .prefix()
        .join(&runtime.prefix_subdir)
        .join(&runtime.framework)
        .join("Versions/Current/lib")
        .join(&stdlib_dir);
    let dest = dirs
        .resources
        .join(runtime.name())
        .join("lib")
        .join(&stdlib_dir);
    fs::create_dir_all(&dest, false).await?;

    let mut entries = tokio::fs::read_dir(&src)
        .await
        .fs_context("reading stdlib from", &src)?;
    while let Some(entry) = entries.next_entry().await.fs_context("reading stdlib from", &src)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if runtime.is_stdlib_excluded(&name) {
            log::debug!("skipping excluded stdlib entry {}", name);
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            add_package_dir(settings, rewriter, &path, &dest).await?;
        } else {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if runtime.bundle_extensions.iter().any(|a| a == ext) {
                let dest_file = dest.join(&name);
                fs::copy_file(&path, &dest_file).await?;
                if ext == "so" {
                    rewriter.fix(&dest_file).await?;
                }
            }
        }
    }

    Ok(())
}

/// Copies one package directory into `dest_root`, admitting only the
/// configured extensions, then rewrites every copied native extension.
pub async fn add_package_dir(
    settings: &Settings,
    rewriter: &mut DylibRewriter,
    src: &Path,
    dest_root: &Path,
) -> Result<()> {
    let name = src
        .file_name()
        .ok_or_else(|| Error::GenericError(format!("invalid package directory {src:?}")))?;
    let dest = dest_root.join(name);

    fs::copy_dir_filtered(
        src,
        &dest,
        Some(settings.runtime().bundle_extensions.clone()),
    )
    .await?;

    for file in fs::walk_files(&dest)? {
        if file.extension().and_then(|e| e.to_str()) == Some("so") {
            rewriter.fix(&file).await?;
        }
    }
    Ok(())
}
