//! macOS application bundle freezer.
//!
//! Sequentially assembles a self-contained `.app`: skeleton and
//! Info.plist, runtime framework, standard library, shared libraries,
//! application packages, symbol stripping, and finally the disk image.
//! Every step shells out to the platform tools and aborts on the first
//! failure.

pub mod dmg;
pub mod dylib;
pub mod libraries;
pub mod runtime;
pub mod sign;
pub mod skeleton;
pub mod strip;

use crate::error::Result;
use crate::settings::Settings;
use crate::util::process;
use dylib::DylibRewriter;
use std::path::{Path, PathBuf};

/// Directory layout of the `.app` under assembly.
pub struct BundleDirs {
    /// The `.app` directory itself.
    pub build: PathBuf,
    /// `Contents`.
    pub contents: PathBuf,
    /// `Contents/MacOS`.
    pub macos: PathBuf,
    /// `Contents/Resources`.
    pub resources: PathBuf,
    /// `Contents/Frameworks`.
    pub frameworks: PathBuf,
}

impl BundleDirs {
    /// Lays out the standard bundle directories under `build_dir`.
    pub fn new(build_dir: &Path) -> Self {
        let contents = build_dir.join("Contents");
        Self {
            build: build_dir.to_path_buf(),
            macos: contents.join("MacOS"),
            resources: contents.join("Resources"),
            frameworks: contents.join("Frameworks"),
            contents,
        }
    }
}

/// Options of a single freeze run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreezeOptions {
    /// Leave debug symbols in place.
    pub dont_strip: bool,
    /// Sign the staged bundle before the disk image is created.
    pub sign_installer: bool,
}

/// The freeze pipeline.
pub struct Freeze<'a> {
    settings: &'a Settings,
    dirs: BundleDirs,
    options: FreezeOptions,
    rewriter: DylibRewriter,
}

/// Platform tools the pipeline shells out to.
const REQUIRED_TOOLS: &[&str] = &[
    "otool",
    "install_name_tool",
    "strip",
    "iconutil",
    "du",
    "hdiutil",
];

impl<'a> Freeze<'a> {
    /// Creates a pipeline for the `.app` directory at `build_dir`.
    pub fn new(settings: &'a Settings, build_dir: &Path, options: FreezeOptions) -> Self {
        Self {
            settings,
            dirs: BundleDirs::new(build_dir),
            options,
            rewriter: DylibRewriter::new(settings),
        }
    }

    /// Runs the whole pipeline and returns the path of the disk image.
    pub async fn run(mut self) -> Result<PathBuf> {
        process::require_tools(REQUIRED_TOOLS)?;
        if self.options.sign_installer {
            process::require_tools(&["codesign", "security", "spctl"])?;
        }

        skeleton::create(self.settings, &self.dirs).await?;
        runtime::add_framework(self.settings, &self.dirs, &mut self.rewriter).await?;
        runtime::add_stdlib(self.settings, &self.dirs, &mut self.rewriter).await?;
        libraries::add_libraries(self.settings, &self.dirs, &mut self.rewriter).await?;
        libraries::add_packages(self.settings, &self.dirs, &mut self.rewriter).await?;

        if self.options.dont_strip {
            log::info!("Skipping symbol stripping");
        } else {
            let queue = self.rewriter.take_strip_queue();
            strip::strip_files(&queue).await?;
        }

        dmg::make_dmg(self.settings, &self.dirs.build, self.options.sign_installer).await
    }
}
