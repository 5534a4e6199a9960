//! macOS application freeze, code-sign, and disk-image pipeline.
//!
//! Two pieces:
//! - The bundle freezer assembles a self-contained `.app`: runtime
//!   framework, standard library, shared libraries, and application
//!   packages, with load paths rewritten to resolve under
//!   `Contents/Frameworks`, symbols stripped, the bundle signed, and the
//!   result packaged into a disk image.
//! - The dependency build driver downloads third-party sources, builds
//!   each in isolation, and installs the archived outputs into a shared
//!   prefix for subsequent builds.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod deps;
pub mod error;
pub mod freeze;
pub mod settings;
pub mod util;

// Re-export commonly used types
pub use error::{Error, Result};
