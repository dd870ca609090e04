//! CLI module - Command line interface definitions and handlers

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// extguard - Upload-time file extension policy enforcement
///
/// Checks files against a per-customer extension blacklist, using magic
/// bytes to catch files whose name lies about their content.
#[derive(Parser, Debug)]
#[command(name = "extguard")]
#[command(version)]
#[command(about = "Upload-time file extension policy enforcement", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Output format for machine parsing
    #[arg(long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Config file (default: ~/.extguard/config.toml)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check files against a literal blacklist, without storing anything
    Check(CheckArgs),

    /// Run files through the full upload pipeline against a policy fixture
    Upload(UploadArgs),

    /// Show the magic-byte signature table
    Signatures,

    /// Show the file types advertised to upload clients
    AllowedTypes,

    /// Create or show the configuration file
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    /// Files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Blacklisted extensions (e.g., exe,sh,js)
    #[arg(long, short, value_delimiter = ',')]
    pub block: Vec<String>,
}

#[derive(Debug, Clone, Parser)]
pub struct UploadArgs {
    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// TOML fixture describing customers and their policies
    #[arg(long, short)]
    pub policy: PathBuf,

    /// User id to upload as
    #[arg(long, short)]
    pub user: String,
}

#[derive(Debug, Clone, Parser)]
pub struct ConfigArgs {
    /// Write a commented default config if none exists
    #[arg(long, conflicts_with = "show")]
    pub init: bool,

    /// Print the effective configuration
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}
