//! Isolated dependency builds and package archives.
//!
//! Each dependency is extracted and built in its own temp directory; the
//! build's output directory is archived as `<name>.tar.gz` and unpacked
//! into the shared prefix for later builds to consume.

use crate::bail;
use crate::error::{Error, Result};
use crate::settings::Recipe;
use crate::util::{fs, process};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::{Path, PathBuf};

fn blocking_err(e: tokio::task::JoinError) -> Error {
    Error::GenericError(format!("archive task panicked: {}", e))
}

/// Unpacks a gzipped source tarball into `dest` and returns the source
/// root: the single top-level directory when the tarball has one, `dest`
/// otherwise.
pub async fn extract_source(tarball: &Path, dest: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dest, false).await?;

    let tarball = tarball.to_path_buf();
    let dest_dir = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&tarball)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive.unpack(&dest_dir)?;
        Ok(())
    })
    .await
    .map_err(blocking_err)??;

    let mut entries = tokio::fs::read_dir(dest).await?;
    let mut dirs = Vec::new();
    let mut files = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        } else {
            files += 1;
        }
    }
    if files == 0 && dirs.len() == 1 {
        Ok(dirs.remove(0))
    } else {
        Ok(dest.to_path_buf())
    }
}

/// Runs a recipe's build commands inside the extracted source tree.
///
/// Every command sees the shared prefix as `GLACIER_PREFIX` and the
/// package output directory as `GLACIER_OUTPUT`.
pub async fn run_build(
    recipe: &Recipe,
    source_dir: &Path,
    prefix: &Path,
    output_dir: &Path,
) -> Result<()> {
    if recipe.build.is_empty() {
        bail!("recipe {} has no build commands", recipe.name);
    }
    for command in &recipe.build {
        process::run_shell(
            command,
            source_dir,
            &[("GLACIER_PREFIX", prefix), ("GLACIER_OUTPUT", output_dir)],
        )
        .await?;
    }
    Ok(())
}

/// Archives the contents of a build output directory as a gzipped
/// package, preserving symlinks.
pub async fn create_package(output_dir: &Path, package_path: &Path) -> Result<()> {
    if let Some(parent) = package_path.parent() {
        fs::create_dir_all(parent, false).await?;
    }

    let output_dir = output_dir.to_path_buf();
    let archive_path = package_path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::create(&archive_path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);
        builder.append_dir_all(".", &output_dir)?;
        builder.into_inner()?.finish()?;
        Ok(())
    })
    .await
    .map_err(blocking_err)??;

    log::info!("✓ Created package {}", package_path.display());
    Ok(())
}

/// Unpacks a package archive into the shared prefix.
pub async fn install_package(package_path: &Path, prefix: &Path) -> Result<()> {
    log::info!(
        "Installing {} into {}",
        package_path.display(),
        prefix.display()
    );
    fs::create_dir_all(prefix, false).await?;

    let package_path = package_path.to_path_buf();
    let prefix = prefix.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&package_path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive.unpack(&prefix)?;
        Ok(())
    })
    .await
    .map_err(blocking_err)??;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn package_round_trip_preserves_tree() {
        let work = tempfile::tempdir().unwrap();
        let output = work.path().join("out");
        std::fs::create_dir_all(output.join("lib")).unwrap();
        std::fs::create_dir_all(output.join("include")).unwrap();
        std::fs::write(output.join("lib/libz.1.dylib"), b"dylib").unwrap();
        std::fs::write(output.join("include/zlib.h"), b"header").unwrap();

        let package = work.path().join("zlib.tar.gz");
        create_package(&output, &package).await.unwrap();
        assert!(package.exists());

        let prefix = work.path().join("prefix");
        install_package(&package, &prefix).await.unwrap();
        assert_eq!(
            std::fs::read(prefix.join("lib/libz.1.dylib")).unwrap(),
            b"dylib"
        );
        assert_eq!(
            std::fs::read(prefix.join("include/zlib.h")).unwrap(),
            b"header"
        );
    }

    #[tokio::test]
    async fn extract_source_returns_single_top_dir() {
        let work = tempfile::tempdir().unwrap();
        let staging = work.path().join("staging");
        let tree = staging.join("zlib-1.2.11");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join("configure"), b"#!/bin/sh").unwrap();

        let tarball = work.path().join("zlib-1.2.11.tar.gz");
        create_package(&staging, &tarball).await.unwrap();

        let dest = work.path().join("src");
        let root = extract_source(&tarball, &dest).await.unwrap();
        assert_eq!(root, dest.join("zlib-1.2.11"));
        assert!(root.join("configure").exists());
    }

    #[tokio::test]
    async fn recipe_without_build_commands_is_rejected() {
        let recipe = Recipe {
            name: "empty".to_string(),
            url: "https://example.com/empty.tar.gz".to_string(),
            sha256: String::new(),
            build: vec![],
        };
        let dir = tempfile::tempdir().unwrap();
        let err = run_build(&recipe, dir.path(), dir.path(), dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no build commands"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn build_commands_see_prefix_and_output() {
        let recipe = Recipe {
            name: "probe".to_string(),
            url: "https://example.com/probe.tar.gz".to_string(),
            sha256: String::new(),
            build: vec!["echo $GLACIER_PREFIX > env.txt && echo $GLACIER_OUTPUT >> env.txt".to_string()],
        };
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("prefix");
        let output = dir.path().join("output");
        run_build(&recipe, dir.path(), &prefix, &output).await.unwrap();

        let recorded = std::fs::read_to_string(dir.path().join("env.txt")).unwrap();
        assert!(recorded.contains(prefix.to_str().unwrap()));
        assert!(recorded.contains(output.to_str().unwrap()));
    }
}
