//! Error types for freeze and dependency-build operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for glacier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for all glacier operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors without path context
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// IO errors carrying the action and path that failed
    #[error("{action} {path}: {source}")]
    FsError {
        /// What was being attempted
        action: String,
        /// Path involved in the failure
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },

    /// An external tool exited with a non-zero status
    #[error("{tool} failed: {stderr}")]
    ToolFailed {
        /// Tool name (otool, install_name_tool, codesign, hdiutil, ...)
        tool: String,
        /// Captured standard error output
        stderr: String,
    },

    /// Downloaded file did not match its recorded checksum
    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// File that failed verification
        file: String,
        /// Expected hex-encoded SHA-256
        expected: String,
        /// Actual hex-encoded SHA-256
        actual: String,
    },

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Info.plist serialization errors
    #[error("plist error: {0}")]
    Plist(#[from] plist::Error),

    /// Source tarball download errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Directory traversal errors
    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping errors
    #[error("path error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Invalid glob pattern
    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Glob iteration errors
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// Generic errors
    #[error("{0}")]
    GenericError(String),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Extension trait attaching path context to IO results
pub trait ErrorExt<T> {
    /// Wrap an IO error with the action attempted and the path involved
    fn fs_context(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::FsError {
            action: action.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Extension trait attaching free-form context to glacier results
pub trait Context<T> {
    /// Prefix the error message with lazily-built context
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {}", f(), e)))
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::GenericError(format!($($arg)*)))
    };
}
