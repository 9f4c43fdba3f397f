//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{init, scan_cmd, tui};
use crate::config::Config;

#[derive(Parser)]
#[command(name = "tagscan")]
#[command(author, version, about = "Find TODO/FIX/NOTE annotations across directory trees")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter tagscan.toml
    Init {
        /// Directory to place the config in (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Scan every configured directory once and print the result
    Scan,

    /// Scan, then watch for changes and keep the display current
    Watch {
        /// Print each update to stdout instead of opening the viewer
        #[arg(long)]
        plain: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    init_tracing(cli.verbose, matches!(cli.command, Commands::Watch { plain: false }));

    match cli.command {
        Commands::Init { path } => init::run(&output, &path),
        Commands::Scan => {
            let config = Config::load(cli.config.as_deref())?;
            scan_cmd::run(&output, &config)
        }
        Commands::Watch { plain } => {
            let config = Config::load(cli.config.as_deref())?;
            tui::run(&output, &config, plain)
        }
    }
}

/// Console tracing setup. While the TUI owns the terminal only warnings get
/// through; everything else would scramble the display.
fn init_tracing(verbose: bool, tui_mode: bool) {
    let filter = if verbose {
        EnvFilter::new("tagscan=debug")
    } else if tui_mode {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tagscan=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
