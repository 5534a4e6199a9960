//! Source tarball downloads with checksum verification.

use crate::bail;
use crate::error::{Error, ErrorExt, Result};
use crate::settings::Recipe;
use crate::util::fs;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// File name a recipe's tarball is cached under: the last path segment
/// of its URL.
pub(crate) fn file_name_for_url(url: &str) -> Result<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or("");
    if name.is_empty() || name.contains(':') {
        bail!("cannot derive a file name from URL {url:?}");
    }
    Ok(name.to_string())
}

/// Cache path of a recipe's source tarball.
pub fn source_path(recipe: &Recipe, sources_dir: &Path) -> Result<PathBuf> {
    Ok(sources_dir.join(file_name_for_url(&recipe.url)?))
}

/// Streaming SHA-256 of a file, hex encoded.
pub(crate) async fn sha256_file(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Fetches a recipe's source tarball into the cache, verifying its
/// checksum. A cached file that still matches is reused; a stale one is
/// replaced.
pub async fn download(recipe: &Recipe, sources_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(sources_dir, false).await?;
    let dest = source_path(recipe, sources_dir)?;

    if dest.exists() {
        let actual = sha256_file(&dest).await?;
        if actual.eq_ignore_ascii_case(&recipe.sha256) {
            log::info!("Using cached {}", dest.display());
            return Ok(dest);
        }
        log::warn!("cached {} has wrong checksum, re-downloading", dest.display());
        tokio::fs::remove_file(&dest)
            .await
            .fs_context("removing stale download", &dest)?;
    }

    log::info!("Downloading {}", recipe.url);
    let response = reqwest::get(&recipe.url).await?.error_for_status()?;
    let bytes = response.bytes().await?;
    tokio::fs::write(&dest, &bytes)
        .await
        .fs_context("writing download to", &dest)?;

    let actual = sha256_file(&dest).await?;
    if !actual.eq_ignore_ascii_case(&recipe.sha256) {
        tokio::fs::remove_file(&dest)
            .await
            .fs_context("removing corrupt download", &dest)?;
        return Err(Error::ChecksumMismatch {
            file: recipe.url.clone(),
            expected: recipe.sha256.clone(),
            actual,
        });
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_file_names() {
        assert_eq!(
            file_name_for_url("https://zlib.net/zlib-1.2.11.tar.gz").unwrap(),
            "zlib-1.2.11.tar.gz"
        );
        assert_eq!(
            file_name_for_url("https://example.com/dl/openssl-1.0.2n.tar.gz?mirror=1").unwrap(),
            "openssl-1.0.2n.tar.gz"
        );
        assert!(file_name_for_url("https://example.com/").is_err());
    }

    #[tokio::test]
    async fn sha256_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        tokio::fs::write(&path, b"abc").await.unwrap();
        assert_eq!(
            sha256_file(&path).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn cached_file_with_matching_checksum_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = Recipe {
            name: "abc".to_string(),
            // Unfetchable URL proves the cache hit short-circuits.
            url: "http://127.0.0.1:1/abc.tar.gz".to_string(),
            sha256: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
                .to_string(),
            build: vec![],
        };
        tokio::fs::write(dir.path().join("abc.tar.gz"), b"abc")
            .await
            .unwrap();

        let path = download(&recipe, dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("abc.tar.gz"));
    }
}
