//! Command line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// macOS application freeze and dependency-build pipeline
#[derive(Parser, Debug)]
#[command(
    name = "glacier",
    version,
    about = "macOS application freeze, code-sign, and disk-image pipeline",
    long_about = "Assembles a built application into a self-contained .app bundle,
rewrites shared-library load paths, strips symbols, code-signs the result,
and packages it into a distributable disk image. The deps subcommand
downloads and builds third-party source dependencies into the shared prefix
the freezer reads from.

Usage:
  glacier freeze build/kitty.app --sign
  glacier deps zlib openssl
  glacier --config release.toml freeze build/kitty.app"
)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH", default_value = "glacier.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Freeze a built .app directory and produce the disk image
    Freeze {
        /// The .app directory produced by the application build
        build_dir: PathBuf,

        /// Leave debug symbols in place
        #[arg(long)]
        dont_strip: bool,

        /// Code-sign the staged bundle before creating the disk image
        #[arg(long)]
        sign: bool,
    },

    /// Download and build third-party dependencies into the shared prefix
    Deps {
        /// Which dependencies to build (default: all configured)
        names: Vec<String>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_arguments_parse() {
        let args = Args::try_parse_from([
            "glacier",
            "freeze",
            "build/kitty.app",
            "--sign",
            "--dont-strip",
        ])
        .unwrap();
        match args.command {
            Command::Freeze {
                build_dir,
                dont_strip,
                sign,
            } => {
                assert_eq!(build_dir, PathBuf::from("build/kitty.app"));
                assert!(dont_strip);
                assert!(sign);
            }
            _ => panic!("expected freeze"),
        }
        assert_eq!(args.config, PathBuf::from("glacier.toml"));
    }

    #[test]
    fn deps_names_are_positional() {
        let args =
            Args::try_parse_from(["glacier", "--config", "rel.toml", "deps", "zlib", "openssl"])
                .unwrap();
        assert_eq!(args.config, PathBuf::from("rel.toml"));
        match args.command {
            Command::Deps { names } => assert_eq!(names, ["zlib", "openssl"]),
            _ => panic!("expected deps"),
        }
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["glacier"]).is_err());
    }
}
