//! Command-line interface for examining tool configurations.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::configuration::Loader;
use crate::core::LoadError;
use crate::variable::ViewRegistry;

/// Examine a tool configuration and print the slug of every runnable tool.
#[derive(Parser, Debug)]
#[command(name = "automate", version, about)]
pub struct Cli {
    /// Configuration path or folder
    #[arg(default_value = ".")]
    pub path_or_folder: PathBuf,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub async fn execute(&self) -> Result<(), LoadError> {
        let loader = Loader::new(ViewRegistry::with_defaults());
        let configuration = loader.load_configuration(&self.path_or_folder).await?;
        for tool_definition in configuration.runnable_tools() {
            println!("{}", tool_definition.slug);
        }
        Ok(())
    }
}

/// Initialize tracing from `RUST_LOG`, falling back to a level chosen by the
/// verbosity flags.
pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
