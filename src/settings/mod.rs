//! Configuration structures for freeze and dependency-build operations.
//!
//! Settings are loaded from a `glacier.toml` file and grouped by concern:
//! package metadata, bundle contents, runtime framework, signing, disk
//! image, and dependency recipes.

mod builder;
mod bundle;
mod core;
mod deps;
mod macos;
mod package;
mod runtime;

// Re-export all public types
pub use builder::SettingsBuilder;
pub use bundle::BundleSettings;
pub use core::{PathSettings, Settings};
pub use deps::{DepsSettings, Recipe};
pub use macos::{DmgSettings, MacOsSettings};
pub use package::PackageSettings;
pub use runtime::RuntimeSettings;
