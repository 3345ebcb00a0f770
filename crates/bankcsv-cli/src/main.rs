//! BankCSV CLI - Bank statement converter
//!
//! Usage:
//!   bankcsv analyze --file statement.pdf            Print the analysis
//!   bankcsv convert --file statement.pdf -o out.csv  Export transactions
//!   bankcsv categorize "ALBERT HEIJN 1403"           Show a category
//!   bankcsv serve --port 3000                       Start the web server

mod cli;
mod commands;


use anyhow::{Context, Result};
use bankcsv_core::Settings;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let (settings, source) = Settings::load_with_source(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Analyze {
            file,
            as_of,
            json,
            strict,
        } => {
            let as_of = commands::parse_as_of(as_of.as_deref())?;
            commands::cmd_analyze(&settings, &file, as_of, json, strict)
        }
        Commands::Convert {
            file,
            output,
            format,
            strict,
        } => commands::cmd_convert(&settings, &file, &output, format.as_deref(), strict),
        Commands::Categorize { description } => commands::cmd_categorize(&settings, &description),
        Commands::Lines { file } => commands::cmd_lines(&settings, &file),
        Commands::Config { show } => commands::cmd_config(&settings, &source, show),
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => commands::cmd_serve(&settings, &host, port, no_auth, static_dir.as_deref()).await,
    }
}
