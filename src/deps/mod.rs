//! Dependency build driver.
//!
//! Downloads the requested source tarballs, recreates the shared install
//! prefix, seeds it with the archived packages of dependencies that are
//! not being rebuilt, then builds each requested dependency in isolation
//! and installs its package into the prefix before the next build.

pub mod build;
pub mod download;

use crate::bail;
use crate::error::Result;
use crate::settings::{Recipe, Settings};
use crate::util::fs;
use tempfile::Builder as TempDirBuilder;

/// Runs the driver for the named dependencies, or all configured ones
/// when `names` is empty.
pub async fn run(settings: &Settings, names: &[String]) -> Result<()> {
    let deps = settings.deps();
    if deps.recipes.is_empty() {
        bail!("no dependency recipes configured in [deps]");
    }

    let selected: Vec<&Recipe> = if names.is_empty() {
        deps.recipes.iter().collect()
    } else {
        let mut picked = Vec::new();
        for name in names {
            match deps.recipe(name) {
                Some(recipe) => picked.push(recipe),
                None => bail!(
                    "unknown dependency {:?}; configured: {}",
                    name,
                    deps.names().join(", ")
                ),
            }
        }
        picked
    };

    // Fetch everything up front so a bad checksum aborts before any
    // build output is discarded.
    let sources_dir = settings.sources_dir();
    for recipe in &selected {
        download::download(recipe, &sources_dir).await?;
    }

    let prefix = settings.prefix();
    fs::create_dir_all(&prefix, true).await?;

    // Seed the fresh prefix with packages of dependencies not being
    // rebuilt, so builds see their prerequisites.
    for recipe in &deps.recipes {
        if selected.iter().any(|r| r.name == recipe.name) {
            continue;
        }
        let package = settings.package_path(&recipe.name);
        if package.exists() {
            build::install_package(&package, &prefix).await?;
        } else {
            log::debug!("no package archive for {}, skipping", recipe.name);
        }
    }

    for recipe in &selected {
        build_one(settings, recipe).await?;
    }

    Ok(())
}

/// Builds one dependency in an isolated temp directory and installs its
/// package into the prefix.
async fn build_one(settings: &Settings, recipe: &Recipe) -> Result<()> {
    log::info!("Building {}", recipe.name);

    let work = TempDirBuilder::new()
        .prefix(&format!("{}-", recipe.name))
        .tempdir()
        .map_err(|e| {
            crate::error::Error::GenericError(format!(
                "failed to create build directory for {}: {}",
                recipe.name, e
            ))
        })?;
    let src_root = work.path().join("src");
    let output_dir = work.path().join("out");
    fs::create_dir_all(&output_dir, false).await?;

    let tarball = download::source_path(recipe, &settings.sources_dir())?;
    let source_dir = build::extract_source(&tarball, &src_root).await?;

    let prefix = settings.prefix();
    build::run_build(recipe, &source_dir, &prefix, &output_dir).await?;

    let package = settings.package_path(&recipe.name);
    build::create_package(&output_dir, &package).await?;
    build::install_package(&package, &prefix).await?;

    log::info!("✓ Built {}", recipe.name);
    Ok(())
}
