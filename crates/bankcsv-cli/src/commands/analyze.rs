//! Analyze command implementation

use std::path::Path;

use anyhow::{Context, Result};
use bankcsv_core::{AnalysisReport, Analyzer, Extraction, Settings};
use chrono::NaiveDate;

use super::{extract_transactions, load_document, truncate};

/// Load, extract and analyze one statement file
pub fn analyze_file(
    settings: &Settings,
    file: &Path,
    as_of: Option<NaiveDate>,
    strict: bool,
) -> Result<(Extraction, AnalysisReport)> {
    let document = load_document(settings, file)?;
    let extraction = extract_transactions(settings, &document, strict)?;
    let report = Analyzer::from_settings(settings)
        .with_as_of(as_of)
        .analyze(&extraction.transactions, extraction.source);
    Ok((extraction, report))
}

pub fn cmd_analyze(
    settings: &Settings,
    file: &Path,
    as_of: Option<NaiveDate>,
    json: bool,
    strict: bool,
) -> Result<()> {
    let (extraction, report) = analyze_file(settings, file, as_of, strict)?;

    if json {
        let output =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", output);
        return Ok(());
    }

    print_report(&extraction, &report);
    Ok(())
}

fn print_report(extraction: &Extraction, report: &AnalysisReport) {
    let overview = &report.overview;

    println!("📊 Statement analysis");
    println!(
        "   Parsed: {} ({} layout, {} lines scanned)",
        report.source, extraction.dialect, extraction.lines_scanned
    );
    if let (Some(first), Some(last)) = (overview.first_date, overview.last_date) {
        println!(
            "   Period: {} to {} ({} transactions)",
            first, last, overview.transaction_count
        );
    }
    if let Some(failure) = &extraction.failure {
        println!();
        println!("   ⚠️  {}", failure);
        println!("   ⚠️  The figures below are SAMPLE DATA, not your transactions.");
    }

    println!();
    println!("   Money in:   {:>12.2}", overview.total_credits);
    println!("   Money out:  {:>12.2}", overview.total_debits);
    println!("   Net:        {:>12.2}", overview.net);
    println!("   Per month:  {:>12.2}", overview.monthly_average);
    if let Some(month) = &overview.reference_month {
        println!(
            "   {} vs previous month: {:+.1}%",
            month, overview.month_over_month_change
        );
    }

    if !report.categories.is_empty() {
        println!();
        println!("📂 Spending by category:");
        for entry in &report.categories {
            println!(
                "   {:<16} {:>10.2} {:>6.1}%  ({} txns)",
                entry.category.as_str(),
                entry.total,
                entry.percentage,
                entry.count
            );
        }
    }

    if !report.merchants.is_empty() {
        println!();
        println!("🏪 Top merchants:");
        for entry in &report.merchants {
            println!(
                "   {:<30} {:>10.2}  ({} × {:.2})",
                truncate(&entry.merchant, 30),
                entry.total,
                entry.count,
                entry.average
            );
        }
    }

    if !report.recurring.is_empty() {
        println!();
        println!("🔁 Recurring payments:");
        for payment in &report.recurring {
            println!(
                "   {:<30} {:>10.2}  {:<10} next {}",
                truncate(&payment.merchant, 30),
                payment.amount,
                payment.frequency.as_str(),
                payment.next_date
            );
        }
    }

    if !report.anomalies.is_empty() {
        println!();
        println!("🚨 Unusual activity:");
        for anomaly in &report.anomalies {
            println!("   [{:<6}] {}", anomaly.severity.as_str(), anomaly.summary());
        }
    }

    if !report.savings.is_empty() {
        println!();
        println!("💡 Ways to save:");
        for opportunity in &report.savings {
            println!(
                "   {} (about {:.2})",
                opportunity.title, opportunity.potential_savings
            );
            println!("      {}", opportunity.description);
        }
    }
}
