//! CLI entry point.
//!
//! Parses arguments, configures logging, and examines the configuration at
//! the given path or folder, printing one slug per runnable tool.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use automate_cli::cli::{Cli, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}
