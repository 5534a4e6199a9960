//! Disk image creation using hdiutil.
//!
//! Stages the assembled bundle in a temp directory with an Applications
//! symlink, optionally signs the staged copy, and produces a compressed
//! image in the dist directory. Carries the workaround for hdiutil's
//! resize failure on source folders near 200MB.

use crate::error::{Context, Error, ErrorExt, Result};
use crate::freeze::sign;
use crate::settings::Settings;
use crate::util::{fs, process};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// First whitespace-separated token of `du -s -k` output, in KiB.
pub(crate) fn parse_du_kib(output: &str) -> Result<u64> {
    let token = output.split_whitespace().next().unwrap_or("");
    token
        .parse()
        .map_err(|_| Error::GenericError(format!("unexpected du output: {output:?}")))
}

/// Extra `hdiutil create` arguments for the staged size.
///
/// When the source folder is close to 200MB hdiutil fails with
/// "resize request is above maximum size allowed", so an explicit
/// 255m image size is requested in that band.
pub(crate) fn hdiutil_size_args(size_kib: u64) -> Option<[&'static str; 2]> {
    let lower = 190 * 1024;
    let upper = 250 * 1024;
    (size_kib > lower && size_kib < upper).then_some(["-size", "255m"])
}

/// Full `hdiutil create` argument list for a staged bundle.
pub(crate) fn hdiutil_create_args<'a>(
    staging: &'a Path,
    volume_name: &'a str,
    format: &'a str,
    size_kib: u64,
    dmg_path: &'a Path,
) -> Vec<&'a OsStr> {
    let mut args: Vec<&OsStr> = vec![
        OsStr::new("create"),
        OsStr::new("-srcfolder"),
        staging.as_os_str(),
        OsStr::new("-volname"),
        OsStr::new(volume_name),
        OsStr::new("-format"),
        OsStr::new(format),
    ];
    if let Some(size_args) = hdiutil_size_args(size_kib) {
        args.extend(size_args.into_iter().map(OsStr::new));
    }
    args.push(dmg_path.as_os_str());
    args
}

/// Copies the bundle into a disk image named `<Product>-<Version>.dmg`
/// in the dist directory, signing the staged copy first when requested.
pub async fn make_dmg(settings: &Settings, build_dir: &Path, sign_installer: bool) -> Result<PathBuf> {
    let dist_dir = settings.dist_dir();
    fs::create_dir_all(&dist_dir, true).await?;

    let volume_name = settings.volume_name();
    let dmg_path = dist_dir.join(format!("{}.dmg", volume_name));
    if dmg_path.exists() {
        tokio::fs::remove_file(&dmg_path)
            .await
            .fs_context("removing stale dmg", &dmg_path)?;
    }

    let staging = tempfile::tempdir().map_err(|e| {
        Error::GenericError(format!("failed to create dmg staging directory: {}", e))
    })?;
    let app_name = build_dir
        .file_name()
        .ok_or_else(|| Error::GenericError(format!("invalid bundle path {build_dir:?}")))?;
    let staged_app = staging.path().join(app_name);

    log::debug!("staging bundle at {}", staged_app.display());
    fs::copy_dir(build_dir, &staged_app)
        .await
        .with_context(|| format!("staging bundle for dmg: {}", staged_app.display()))?;

    if sign_installer {
        let started = Instant::now();
        sign::sign_app(&staged_app, settings).await?;
        log::info!("Signing completed in {:.0?}", started.elapsed());
    }

    let applications_link = staging.path().join("Applications");
    fs::symlink(Path::new("/Applications"), &applications_link)
        .fs_context("creating Applications symlink", &applications_link)?;

    let du_out = process::capture(
        "du",
        [OsStr::new("-s"), OsStr::new("-k"), staging.path().as_os_str()],
    )
    .await?;
    let size_kib = parse_du_kib(&du_out)?;

    let dmg = settings.dmg();
    let args = hdiutil_create_args(staging.path(), &volume_name, &dmg.format, size_kib, &dmg_path);

    log::info!("Creating dmg...");
    let started = Instant::now();
    process::run("hdiutil", args).await?;
    if dmg.internet_enable {
        process::run(
            "hdiutil",
            [
                OsStr::new("internet-enable"),
                OsStr::new("-yes"),
                dmg_path.as_os_str(),
            ],
        )
        .await?;
    }
    log::info!("dmg created in {:.0?}", started.elapsed());

    let size = tokio::fs::metadata(&dmg_path)
        .await
        .fs_context("reading dmg size", &dmg_path)?
        .len() as f64
        / (1024.0 * 1024.0);
    log::info!("✓ Installer size: {:.2}MB at {}", size, dmg_path.display());

    Ok(dmg_path)
}
