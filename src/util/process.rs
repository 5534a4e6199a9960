//! External tool invocation.
//!
//! Every platform tool (otool, install_name_tool, strip, codesign, hdiutil,
//! iconutil, du) is run through these helpers so a non-zero exit always
//! aborts the pipeline with the tool's stderr attached.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;

/// Runs a tool to completion, capturing its output.
async fn output<I, S>(tool: &str, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = tokio::process::Command::new(tool);
    cmd.args(args);
    cmd.output().await.map_err(|e| {
        Error::GenericError(format!("failed to execute {}: {}", tool, e))
    })
}

fn check(tool: &str, out: Output) -> Result<Output> {
    if out.status.success() {
        Ok(out)
    } else {
        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
        Err(Error::ToolFailed {
            tool: tool.to_string(),
            stderr: if stderr.is_empty() {
                format!("exit code {:?}", out.status.code())
            } else {
                stderr
            },
        })
    }
}

/// Runs a tool and fails on non-zero exit.
pub async fn run<I, S>(tool: &str, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    log::debug!("running {}", tool);
    check(tool, output(tool, args).await?)?;
    Ok(())
}

/// Runs a tool and returns its stdout as a UTF-8 string.
pub async fn capture<I, S>(tool: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let out = check(tool, output(tool, args).await?)?;
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Runs a shell command line with extra environment variables, failing on
/// non-zero exit. Used by dependency build recipes; stdio is inherited so
/// configure and make output stays visible on the console.
pub async fn run_shell(command: &str, cwd: &Path, envs: &[(&str, &Path)]) -> Result<()> {
    log::info!("+ {}", command);
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(command).current_dir(cwd);
    for (key, value) in envs {
        cmd.env(key, value);
    }
    let status = cmd.status().await.map_err(|e| {
        Error::GenericError(format!("failed to execute shell command {:?}: {}", command, e))
    })?;
    if !status.success() {
        return Err(Error::ToolFailed {
            tool: command.to_string(),
            stderr: format!("exit code {:?}", status.code()),
        });
    }
    Ok(())
}

/// Verifies that every named tool is reachable on PATH.
///
/// Probing up front keeps failures at the start of the run instead of
/// halfway through assembling the bundle.
pub fn require_tools(tools: &[&str]) -> Result<()> {
    let mut missing = Vec::new();
    for tool in tools {
        match which::which(tool) {
            Ok(path) => log::debug!("found {} at {}", tool, path.display()),
            Err(_) => missing.push(*tool),
        }
    }
    if !missing.is_empty() {
        return Err(Error::GenericError(format!(
            "required tools not found on PATH: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}
