//! glacier - macOS application freeze and dependency-build pipeline.
//!
//! This binary freezes a built application into a signed, distributable
//! `.app` bundle and disk image, and drives isolated builds of
//! third-party source dependencies.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match glacier::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
