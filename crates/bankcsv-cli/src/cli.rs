//! CLI argument definitions using clap
//!
//! This module contains the clap structs for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// BankCSV - Turn bank statements into transactions and insights
#[derive(Parser)]
#[command(name = "bankcsv")]
#[command(about = "Bank statement converter and spending analyzer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/bankcsv/bankcsv.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a statement and print the analysis
    Analyze {
        /// Statement file (PDF, text-layer JSON or plain text)
        #[arg(short, long)]
        file: PathBuf,

        /// Reference date for month-over-month (YYYY-MM-DD, defaults to the
        /// latest transaction)
        #[arg(long)]
        as_of: Option<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Fail instead of substituting sample data when nothing parses
        #[arg(long)]
        strict: bool,
    },

    /// Convert a statement to CSV, Excel, JSON or a PDF report
    Convert {
        /// Statement file (PDF, text-layer JSON or plain text)
        #[arg(short, long)]
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: csv, xls, json, pdf (inferred from the output
        /// extension if not specified)
        #[arg(long)]
        format: Option<String>,

        /// Fail instead of substituting sample data when nothing parses
        #[arg(long)]
        strict: bool,
    },

    /// Show the category for a transaction description
    Categorize {
        /// Transaction description
        description: String,
    },

    /// Print the reconstructed lines of a statement
    Lines {
        /// Statement file (PDF, text-layer JSON or plain text)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show where configuration is loaded from
    Config {
        /// Print the effective settings as TOML
        #[arg(long)]
        show: bool,
    },

    /// Start the conversion server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        #[arg(long)]
        no_auth: bool,

        /// Directory with the front end to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}
