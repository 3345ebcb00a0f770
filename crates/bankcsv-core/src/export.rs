//! Export of analysis results
//!
//! Supports:
//! - Transaction CSV with a trailing `Source` column
//! - Excel-compatible HTML table
//! - Full JSON report
//! - PDF report (feature `pdf-report`)
//!
//! Synthetic sample data is labelled in every format.

use std::path::Path;

use crate::analyze::AnalysisReport;
use crate::error::{Error, Result};

/// Header row of the transaction CSV
pub const CSV_HEADER: [&str; 7] = [
    "Date",
    "Description",
    "Amount",
    "Category",
    "Merchant",
    "Type",
    "Source",
];

/// Banner shown above synthetic results in human-facing formats
pub const SYNTHETIC_BANNER: &str =
    "Sample data: no transactions could be read from this statement";

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    /// HTML table that spreadsheet programs open as a workbook
    Xls,
    Json,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xls => "xls",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xls => "application/vnd.ms-excel",
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Infer the format from an output file name
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xls" | "excel" => Ok(Self::Xls),
            "json" => Ok(Self::Json),
            "pdf" => Ok(Self::Pdf),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Render a report in the requested format
pub fn render(report: &AnalysisReport, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(report),
        ExportFormat::Xls => Ok(to_excel_html(report).into_bytes()),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(report)?),
        ExportFormat::Pdf => render_pdf(report),
    }
}

#[cfg(feature = "pdf-report")]
fn render_pdf(report: &AnalysisReport) -> Result<Vec<u8>> {
    crate::pdf_report::render_report(report)
}

#[cfg(not(feature = "pdf-report"))]
fn render_pdf(_report: &AnalysisReport) -> Result<Vec<u8>> {
    Err(Error::UnsupportedFormat(
        "PDF reports require the 'pdf-report' feature".to_string(),
    ))
}

/// Transactions as CSV, one row per transaction
pub fn to_csv(report: &AnalysisReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    let source = report.source.as_str();
    for t in &report.transactions {
        writer.write_record([
            t.date.format("%Y-%m-%d").to_string().as_str(),
            t.description.as_str(),
            format!("{:.2}", t.amount()).as_str(),
            t.category.as_str(),
            t.merchant.as_str(),
            t.transaction_type().as_str(),
            source,
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Export(e.to_string()))
}

/// Transactions as an HTML table spreadsheet programs can open
pub fn to_excel_html(report: &AnalysisReport) -> String {
    let mut html = String::from(
        "<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n",
    );

    if report.synthetic {
        html.push_str(&format!("<p><b>{}</b></p>\n", escape_html(SYNTHETIC_BANNER)));
    }

    html.push_str("<table border=\"1\">\n<tr>");
    for column in CSV_HEADER {
        html.push_str(&format!("<th>{}</th>", column));
    }
    html.push_str("</tr>\n");

    let source = report.source.as_str();
    for t in &report.transactions {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            t.date.format("%Y-%m-%d"),
            escape_html(&t.description),
            t.amount(),
            escape_html(t.category.as_str()),
            escape_html(&t.merchant),
            t.transaction_type(),
            source
        ));
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
