//! Binary crate for the `tokyoweather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Loading `.env` and logging setup
//! - Human-friendly output and exit codes

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();
    logging::init(cmd.verbose);

    if let Ok(dir) = std::env::current_dir() {
        cli::load_env_file(&dir);
    }

    cmd.run().await.into()
}
