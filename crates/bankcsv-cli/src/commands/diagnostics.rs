//! Diagnostic commands: categorizer lookups and reconstructed lines

use std::path::Path;

use anyhow::{Context, Result};
use bankcsv_core::extract::{detect_dialect, extract_merchant};
use bankcsv_core::Settings;

use super::load_document;

pub fn cmd_categorize(settings: &Settings, description: &str) -> Result<()> {
    let categorizer = settings
        .categorizer()
        .context("Invalid category keywords")?;

    println!("{}", categorizer.categorize(description));
    println!("   Merchant: {}", extract_merchant(description));
    Ok(())
}

pub fn cmd_lines(settings: &Settings, file: &Path) -> Result<()> {
    let document = load_document(settings, file)?;
    let lines = document.lines(settings.parsing.line_tolerance);

    println!(
        "📄 {} page(s), {} line(s), {} layout",
        document.page_count(),
        lines.len(),
        detect_dialect(&document.first_page_text())
    );
    for (index, line) in lines.iter().enumerate() {
        println!("{:>5}  {}", index + 1, line);
    }
    Ok(())
}
