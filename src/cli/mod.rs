pub mod format;
pub mod toml_config;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lintlayers", version, about = "Resolve effective lint rules per file")]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the effective rules for files and directories
    Resolve {
        /// Files or directories to resolve
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Path to the config file
        #[arg(short, long, default_value = "lintlayers.toml")]
        config: PathBuf,

        /// Directory that patterns are relative to (defaults to the config's directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Assemble the config and report diagnostics
    Check {
        /// Path to the config file
        #[arg(short, long, default_value = "lintlayers.toml")]
        config: PathBuf,

        /// Exit with status 1 if any warning is reported
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}
