//! Shared libraries and application packages.

use crate::error::Result;
use crate::freeze::dylib::{DylibRewriter, FRAMEWORKS_ID};
use crate::freeze::{runtime, BundleDirs};
use crate::settings::{BundleSettings, Settings};
use crate::util::fs;

/// Copies each configured dylib from `<prefix>/lib` into
/// `Contents/Frameworks`, setting its install id and rewriting its
/// dependencies.
pub async fn add_libraries(
    settings: &Settings,
    dirs: &BundleDirs,
    rewriter: &mut DylibRewriter,
) -> Result<()> {
    for stem in &settings.bundle_settings().libraries {
        let name = BundleSettings::dylib_name(stem);
        log::info!("Adding {}", name);

        let src = settings.prefix().join("lib").join(&name);
        let dest = dirs.frameworks.join(&name);
        fs::copy_file(&src, &dest).await?;
        rewriter
            .set_id(&dest, &format!("{}/{}", FRAMEWORKS_ID, name))
            .await?;
        rewriter.fix(&dest).await?;
    }
    Ok(())
}

/// Copies the application's package directories into
/// `Contents/Frameworks`, then gives every native extension an install id
/// relative to the Frameworks directory and rewrites its dependencies.
pub async fn add_packages(
    settings: &Settings,
    dirs: &BundleDirs,
    rewriter: &mut DylibRewriter,
) -> Result<()> {
    for package in &settings.bundle_settings().packages {
        log::info!("Adding package {}", package.display());
        runtime::add_package_dir(settings, rewriter, package, &dirs.frameworks).await?;

        let name = match package.file_name() {
            Some(name) => name,
            None => continue,
        };
        for file in fs::walk_files(&dirs.frameworks.join(name))? {
            if file.extension().and_then(|e| e.to_str()) == Some("so") {
                let rel = file.strip_prefix(&dirs.frameworks)?;
                rewriter
                    .set_id(
                        &file,
                        &format!("{}/{}", FRAMEWORKS_ID, rel.to_string_lossy()),
                    )
                    .await?;
            }
        }
    }
    Ok(())
}
