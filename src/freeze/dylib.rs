//! Shared-library load-command rewriting.
//!
//! Discovers a Mach-O file's dependencies with `otool -L`, classifies the
//! ones living under the build prefix, and rewrites them with
//! `install_name_tool` so they resolve against the bundle's Frameworks
//! directory. Per the original pipeline this shells out to the platform
//! tools rather than parsing Mach-O load commands itself.

use crate::bail;
use crate::error::Result;
use crate::freeze::strip::{flip_writable, restore_mode};
use crate::settings::Settings;
use crate::util::process;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Install-name root every bundled library is rewritten to resolve under.
pub const FRAMEWORKS_ID: &str = "@executable_path/../Frameworks";

/// One load command reported by `otool -L`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Referenced path as embedded in the Mach-O file.
    pub path: String,
    /// True when the path is the library's own install id.
    pub is_id: bool,
}

/// A dependency living under the build prefix, with the bundle-relative
/// tail it must be rewritten to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDependency {
    /// Referenced path as embedded in the Mach-O file.
    pub path: String,
    /// Path relative to the Frameworks directory after rewriting.
    pub tail: String,
    /// True when the path is the library's own install id.
    pub is_id: bool,
}

impl LocalDependency {
    /// Classifies a load command against the local roots, materializing
    /// its bundle-relative tail.
    pub(crate) fn classify(dep: Dependency, roots: &[(String, String)]) -> Option<Self> {
        let tail = local_tail(&dep.path, roots)?.to_string();
        Some(Self {
            tail,
            path: dep.path,
            is_id: dep.is_id,
        })
    }
}

/// Rewrites load commands of everything copied into the bundle and keeps
/// the queue of files to strip afterwards.
pub struct DylibRewriter {
    /// (match prefix, strip prefix) pairs identifying local dependencies.
    roots: Vec<(String, String)>,
    to_strip: Vec<PathBuf>,
}

impl DylibRewriter {
    /// Builds a rewriter for the configured prefix and runtime framework.
    pub fn new(settings: &Settings) -> Self {
        let prefix = settings.prefix();
        let prefix = prefix.to_string_lossy();
        let runtime = settings.runtime();
        let lib_root = format!("{}/lib/", prefix);
        // Framework dependencies keep the framework directory in their
        // bundle-relative tail, so only the prefix subdir is stripped.
        let framework_root = format!(
            "{}/{}/{}/",
            prefix, runtime.prefix_subdir, runtime.framework
        );
        let framework_strip = format!("{}/{}/", prefix, runtime.prefix_subdir);
        Self {
            roots: vec![(lib_root.clone(), lib_root), (framework_root, framework_strip)],
            to_strip: Vec::new(),
        }
    }

    /// Hands over the accumulated strip queue, emptying it.
    pub fn take_strip_queue(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.to_strip)
    }

    /// All load commands of a Mach-O file.
    pub async fn dependencies(&self, lib: &Path) -> Result<Vec<Dependency>> {
        let id_out = process::capture("otool", [OsStr::new("-D"), lib.as_os_str()]).await?;
        let install_id = parse_install_id(&id_out);
        let out = process::capture("otool", [OsStr::new("-L"), lib.as_os_str()]).await?;
        Ok(parse_load_paths(&out)
            .into_iter()
            .map(|path| Dependency {
                is_id: Some(path.as_str()) == install_id.as_deref(),
                path,
            })
            .collect())
    }

    /// Load commands pointing into the build prefix.
    pub async fn local_dependencies(&self, lib: &Path) -> Result<Vec<LocalDependency>> {
        Ok(self
            .dependencies(lib)
            .await?
            .into_iter()
            .filter_map(|dep| LocalDependency::classify(dep, &self.roots))
            .collect())
    }

    /// Sets a library's install id, flipping it writable if needed.
    pub async fn set_id(&self, lib: &Path, new_id: &str) -> Result<()> {
        let old_mode = flip_writable(lib)?;
        process::run(
            "install_name_tool",
            [OsStr::new("-id"), OsStr::new(new_id), lib.as_os_str()],
        )
        .await?;
        if let Some(mode) = old_mode {
            restore_mode(lib, mode)?;
        }
        Ok(())
    }

    /// Rewrites every local dependency of `lib` to resolve under
    /// [`FRAMEWORKS_ID`] and queues the file for stripping.
    ///
    /// Re-scans after rewriting; a load command still pointing into the
    /// prefix aborts the run.
    pub async fn fix(&mut self, lib: &Path) -> Result<()> {
        self.to_strip.push(lib.to_path_buf());
        let old_mode = flip_writable(lib)?;

        for dep in self.local_dependencies(lib).await? {
            let new_ref = format!("{}/{}", FRAMEWORKS_ID, dep.tail);
            if dep.is_id {
                process::run(
                    "install_name_tool",
                    [OsStr::new("-id"), OsStr::new(&new_ref), lib.as_os_str()],
                )
                .await?;
            } else {
                process::run(
                    "install_name_tool",
                    [
                        OsStr::new("-change"),
                        OsStr::new(&dep.path),
                        OsStr::new(&new_ref),
                        lib.as_os_str(),
                    ],
                )
                .await?;
            }
        }

        let remaining = self.local_dependencies(lib).await?;
        if !remaining.is_empty() {
            bail!(
                "failed to rewrite local dependencies in {}: {:?} still point into the prefix",
                lib.display(),
                remaining.iter().map(|d| d.path.as_str()).collect::<Vec<_>>()
            );
        }

        if let Some(mode) = old_mode {
            restore_mode(lib, mode)?;
        }
        Ok(())
    }
}

/// Extracts the install id from `otool -D` output.
///
/// The output is the queried path followed by the id on its own line;
/// files without an install id (executables) print only the header.
pub(crate) fn parse_install_id(output: &str) -> Option<String> {
    let last = output.lines().last()?.trim();
    if last.is_empty() || last.ends_with(':') {
        return None;
    }
    Some(last.to_string())
}

/// Extracts referenced paths from `otool -L` output.
///
/// Load lines carry a "(compatibility version ...)" suffix; the header
/// line ends with a colon.
pub(crate) fn parse_load_paths(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.contains("compatibility") && !line.trim_end().ends_with(':'))
        .filter_map(|line| {
            let idx = line.find('(')?;
            let path = line[..idx].trim();
            (!path.is_empty()).then(|| path.to_string())
        })
        .collect()
}

/// Returns the bundle-relative tail of a path under one of the local
/// roots, or None for system and already-relative references.
pub(crate) fn local_tail<'a>(path: &'a str, roots: &[(String, String)]) -> Option<&'a str> {
    for (matches, strip) in roots {
        if path.starts_with(matches.as_str()) {
            return Some(&path[strip.len()..]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const OTOOL_L: &str = "\
/sw/sw/lib/libz.1.dylib:
\t/sw/sw/lib/libz.1.dylib (compatibility version 1.0.0, current version 1.2.11)
\t/sw/sw/python/Python.framework/Versions/2.7/Python (compatibility version 2.7.0, current version 2.7.0)
\t/usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1252.0.0)
";

    #[test]
    fn load_paths_skip_header_and_keep_order() {
        let paths = parse_load_paths(OTOOL_L);
        assert_eq!(
            paths,
            [
                "/sw/sw/lib/libz.1.dylib",
                "/sw/sw/python/Python.framework/Versions/2.7/Python",
                "/usr/lib/libSystem.B.dylib",
            ]
        );
    }

    #[test]
    fn install_id_is_last_line() {
        let out = "/sw/sw/lib/libz.1.dylib:\n/sw/sw/lib/libz.1.dylib\n";
        assert_eq!(
            parse_install_id(out).as_deref(),
            Some("/sw/sw/lib/libz.1.dylib")
        );
    }

    #[test]
    fn executables_have_no_install_id() {
        assert_eq!(parse_install_id("/sw/build/kitty.app/Contents/MacOS/kitty:\n"), None);
        assert_eq!(parse_install_id(""), None);
    }

    fn roots() -> Vec<(String, String)> {
        vec![
            ("/sw/sw/lib/".to_string(), "/sw/sw/lib/".to_string()),
            (
                "/sw/sw/python/Python.framework/".to_string(),
                "/sw/sw/python/".to_string(),
            ),
        ]
    }

    #[test]
    fn prefix_lib_tail_is_basename() {
        assert_eq!(
            local_tail("/sw/sw/lib/libz.1.dylib", &roots()),
            Some("libz.1.dylib")
        );
    }

    #[test]
    fn framework_tail_keeps_framework_dir() {
        assert_eq!(
            local_tail("/sw/sw/python/Python.framework/Versions/2.7/Python", &roots()),
            Some("Python.framework/Versions/2.7/Python")
        );
    }

    #[test]
    fn classify_keeps_referenced_path_and_tail() {
        let dep = Dependency {
            path: "/sw/sw/lib/libz.1.dylib".to_string(),
            is_id: true,
        };
        let local = LocalDependency::classify(dep, &roots()).unwrap();
        assert_eq!(local.path, "/sw/sw/lib/libz.1.dylib");
        assert_eq!(local.tail, "libz.1.dylib");
        assert!(local.is_id);

        let system = Dependency {
            path: "/usr/lib/libSystem.B.dylib".to_string(),
            is_id: false,
        };
        assert_eq!(LocalDependency::classify(system, &roots()), None);
    }

    #[test]
    fn system_libraries_are_not_local() {
        assert_eq!(local_tail("/usr/lib/libSystem.B.dylib", &roots()), None);
        assert_eq!(
            local_tail("@executable_path/../Frameworks/libz.1.dylib", &roots()),
            None
        );
    }
}
