//! File system utilities for bundle assembly.
//!
//! Provides safe file operations with automatic directory creation,
//! symlink preservation, and filtered recursive copies.

use crate::error::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        // Try removal, ignore NotFound (idempotent)
        match fs::remove_dir_all(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    Ok(fs::create_dir_all(path).await?)
}

/// Makes a symbolic link.
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(not(unix))]
pub fn symlink(_src: &Path, _dst: &Path) -> io::Result<()> {
    Err(io::Error::other("symlinks unsupported on this platform"))
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir).await?;
    }
    fs::copy(from, to).await?;
    Ok(())
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Preserves symlinks. Fails if the source path is not a directory or
/// doesn't exist.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    copy_dir_filtered(from, to, None).await
}

/// Recursively copies a directory, admitting only entries whose extension
/// is in `extensions`. Directories named with a foreign extension
/// (egg-info and friends) are pruned along with their contents;
/// no-extension directories are descended into but materialized only when
/// a file inside them is admitted. Files with no extension are skipped.
/// `None` copies everything.
///
/// Preserves symlinks.
pub async fn copy_dir_filtered(
    from: &Path,
    to: &Path,
    extensions: Option<Vec<String>>,
) -> Result<()> {
    // Validate in async context (cheap, doesn't need spawn_blocking)
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_dir() {
        return Err(Error::GenericError(format!("{from:?} is not a directory")));
    }

    // Clone paths for move into blocking closure
    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Offload blocking work to dedicated thread pool
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&to)?;

        let admits = |path: &Path| -> bool {
            match &extensions {
                None => true,
                Some(allowed) => path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| allowed.iter().any(|a| a == ext)),
            }
        };

        let walker = walkdir::WalkDir::new(&from).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || entry.path().extension().is_none()
                || admits(entry.path())
        });

        for entry in walker {
            let entry = entry?;
            debug_assert!(entry.path().starts_with(&from));
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_dir() {
                if extensions.is_none() {
                    std::fs::create_dir_all(dest_path)?;
                }
                continue;
            }
            if !admits(entry.path()) {
                continue;
            }
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())?;
                symlink(&target, &dest_path)?;
            } else {
                std::fs::copy(entry.path(), dest_path)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("directory copy task panicked: {}", e)))?
}

/// Returns every regular file under `dir`, sorted for deterministic order.
pub fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
