//! Debug symbol stripping.
//!
//! Runs `strip -x -S` over every Mach-O file the rewriter touched,
//! batching paths so a single invocation never exceeds the argv size
//! limit. Read-only files are flipped writable for the duration.

use crate::error::{ErrorExt, Result};
use crate::util::process;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// argv budget per strip invocation.
const ARGV_MAX: usize = 256 * 1024;

/// Fixed arguments of the strip command line.
const STRIP_ARGS: [&str; 3] = ["-x", "-S", "-"];

/// Makes a file writable if it is not, returning the previous mode so it
/// can be restored. Returns None when the file was already writable.
#[cfg(unix)]
pub fn flip_writable(path: &Path) -> Result<Option<u32>> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path).fs_context("reading mode of", path)?;
    let mode = metadata.permissions().mode();
    if mode & 0o200 != 0 {
        return Ok(None);
    }
    let mut perms = metadata.permissions();
    perms.set_mode(mode | 0o200);
    std::fs::set_permissions(path, perms).fs_context("making writable", path)?;
    Ok(Some(mode))
}

/// Restores a mode previously returned by [`flip_writable`].
#[cfg(unix)]
pub fn restore_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .fs_context("restoring mode of", path)
}

#[cfg(not(unix))]
pub fn flip_writable(_path: &Path) -> Result<Option<u32>> {
    Ok(None)
}

#[cfg(not(unix))]
pub fn restore_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Splits the file list into batches whose combined command line stays
/// under `argv_max` bytes. A single oversized path gets its own batch.
pub(crate) fn batch_by_argv(files: &[PathBuf], argv_max: usize) -> Vec<Vec<&Path>> {
    let base: usize =
        "strip".len() + 1 + STRIP_ARGS.iter().map(|a| a.len() + 1).sum::<usize>();

    let mut batches = Vec::new();
    let mut current: Vec<&Path> = Vec::new();
    let mut length = base;

    for file in files {
        let arg_len = file.as_os_str().len() + 1;
        if !current.is_empty() && length + arg_len > argv_max {
            batches.push(std::mem::take(&mut current));
            length = base;
        }
        current.push(file.as_path());
        length += arg_len;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Strips debug symbols from every file in the queue.
///
/// Files that no longer exist are skipped; modes are restored afterwards.
pub async fn strip_files(files: &[PathBuf]) -> Result<()> {
    let existing: Vec<PathBuf> = files.iter().filter(|f| f.exists()).cloned().collect();
    log::info!("Stripping {} files", existing.len());

    let mut flips = Vec::new();
    for file in &existing {
        flips.push((file.clone(), flip_writable(file)?));
    }

    for batch in batch_by_argv(&existing, ARGV_MAX) {
        let mut args: Vec<&OsStr> = STRIP_ARGS.iter().map(OsStr::new).collect();
        args.extend(batch.iter().map(|p| p.as_os_str()));
        process::run("strip", args).await?;
    }

    for (file, mode) in flips {
        if let Some(mode) = mode {
            restore_mode(&file, mode)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_lists_fit_one_batch() {
        let files = vec![PathBuf::from("/a/b.dylib"), PathBuf::from("/c/d.so")];
        let batches = batch_by_argv(&files, ARGV_MAX);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[test]
    fn batches_respect_argv_budget() {
        let files: Vec<PathBuf> = (0..100)
            .map(|i| PathBuf::from(format!("/frameworks/lib-{i:03}.dylib")))
            .collect();
        // Each path is 25 bytes + separator; force a few files per batch.
        let batches = batch_by_argv(&files, 128);
        assert!(batches.len() > 1);
        assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), 100);
        for batch in &batches {
            let length: usize = batch.iter().map(|p| p.as_os_str().len() + 1).sum();
            assert!(length <= 128);
        }
    }

    #[test]
    fn oversized_path_still_gets_a_batch() {
        let files = vec![PathBuf::from(format!("/{}", "x".repeat(300)))];
        let batches = batch_by_argv(&files, 64);
        assert_eq!(batches.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn flip_writable_round_trips() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lib.dylib");
        std::fs::write(&file, b"").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o444)).unwrap();

        let old = flip_writable(&file).unwrap().expect("was read-only");
        assert_eq!(old & 0o777, 0o444);
        assert!(flip_writable(&file).unwrap().is_none());

        restore_mode(&file, old).unwrap();
        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o444);
    }
}
