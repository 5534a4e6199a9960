//! Command line interface.

mod args;

pub use args::{Args, Command};

use crate::error::Result;
use crate::freeze::{Freeze, FreezeOptions};
use crate::settings::SettingsBuilder;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let settings = SettingsBuilder::from_file(&args.config)?.build()?;

    match args.command {
        Command::Freeze {
            build_dir,
            dont_strip,
            sign,
        } => {
            let options = FreezeOptions {
                dont_strip,
                sign_installer: sign,
            };
            let dmg = Freeze::new(&settings, &build_dir, options).run().await?;
            log::info!("✓ Wrote {}", dmg.display());
        }
        Command::Deps { names } => {
            crate::deps::run(&settings, &names).await?;
        }
    }

    Ok(0)
}
