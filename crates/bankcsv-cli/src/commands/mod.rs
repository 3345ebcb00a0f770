//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Parse a statement and print the analysis
//! - `convert` - Export a statement to CSV, Excel, JSON or PDF
//! - `diagnostics` - Categorizer and line reconstruction checks
//! - `config` - Configuration location and effective settings
//! - `serve` - Web server command

pub mod analyze;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use bankcsv_core::{Extraction, Extractor, Settings, StatementDocument};
use chrono::NaiveDate;
use tracing::warn;

// Re-export command functions for main.rs
pub use analyze::*;
pub use config::*;
pub use convert::*;
pub use diagnostics::*;
pub use serve::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse an optional `--as-of` date
pub fn parse_as_of(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --as-of date format (use YYYY-MM-DD)")
}

/// Read and validate a statement file
pub fn load_document(settings: &Settings, file: &Path) -> Result<StatementDocument> {
    StatementDocument::load(file, settings.parsing.max_document_bytes)
        .with_context(|| format!("Failed to read statement: {}", file.display()))
}

/// Extract transactions, refusing sample data when `strict`
pub fn extract_transactions(
    settings: &Settings,
    document: &StatementDocument,
    strict: bool,
) -> Result<Extraction> {
    let extractor = Extractor::from_settings(settings).context("Invalid category keywords")?;

    if strict {
        return extractor
            .extract(document)
            .map_err(|failure| anyhow::anyhow!("Could not parse statement: {}", failure));
    }

    let extraction = extractor.extract_or_synthesize(document, chrono::Local::now().date_naive());
    if extraction.is_synthetic() {
        warn!("Results below are sample data, not your transactions");
    }
    Ok(extraction)
}
