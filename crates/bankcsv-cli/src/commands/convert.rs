//! Convert command implementation

use std::path::Path;

use anyhow::{Context, Result};
use bankcsv_core::export::{render, ExportFormat};
use bankcsv_core::Settings;

use super::analyze_file;

/// Format from `--format`, else from the output extension
pub fn resolve_format(format: Option<&str>, output: &Path) -> Result<ExportFormat> {
    match format {
        Some(value) => value.parse().map_err(|e: String| anyhow::anyhow!(e)),
        None => ExportFormat::from_path(output).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot infer the output format from {}.\n\
                 Specify --format with one of: csv, xls, json, pdf",
                output.display()
            )
        }),
    }
}

pub fn cmd_convert(
    settings: &Settings,
    file: &Path,
    output: &Path,
    format: Option<&str>,
    strict: bool,
) -> Result<()> {
    let format = resolve_format(format, output)?;

    println!("📥 Converting {}...", file.display());
    let (extraction, report) = analyze_file(settings, file, None, strict)?;

    let bytes = render(&report, format)
        .with_context(|| format!("Failed to render {} output", format))?;
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "   Found {} transactions ({}, {} layout)",
        report.transactions.len(),
        report.source,
        extraction.dialect
    );
    if report.synthetic {
        println!("   ⚠️  Nothing could be parsed; the output contains SAMPLE DATA");
    }
    println!("✅ Wrote {} ({} bytes)", output.display(), bytes.len());

    Ok(())
}
