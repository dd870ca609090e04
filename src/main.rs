//! extguard - Upload-time file extension policy enforcement
//!
//! Checks files against a customer's extension blacklist and flags files
//! whose content does not match their name.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use extguard::cli::{commands, Cli, Commands};
use extguard::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        Config::default()
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    let filter = EnvFilter::from_default_env().add_directive(format!("extguard={level}").parse()?);
    let (compact, json) = if cli.log_json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (
            Some(
                fmt::layer()
                    .with_target(false)
                    .compact()
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    };
    tracing_subscriber::registry()
        .with(compact)
        .with(json)
        .with(filter)
        .init();

    let clean = match &cli.command {
        Commands::Check(args) => commands::run_check(args, &config, cli.output).await?,
        Commands::Upload(args) => commands::run_upload(args, &config, cli.output).await?,
        Commands::Signatures => commands::print_signatures(cli.output)?,
        Commands::AllowedTypes => commands::print_allowed_types(&config, cli.output)?,
        Commands::Config(args) => commands::run_config(args, &config_path, &config, cli.output)?,
    };

    if !clean {
        std::process::exit(1);
    }

    Ok(())
}
