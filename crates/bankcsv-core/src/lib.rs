//! BankCSV Core Library
//!
//! Statement analysis pipeline shared by the CLI and the HTTP server:
//! - Document ingestion (text-layer JSON, plain text, PDF)
//! - Line reconstruction from positioned text fragments
//! - Amount and date normalization across bank locales
//! - Transaction extraction with structured, line-based and sample fallbacks
//! - Keyword categorization
//! - Aggregate analysis (overview, breakdowns, recurring payments, anomalies,
//!   savings suggestions)
//! - Export to CSV, Excel-compatible HTML, JSON and PDF

pub mod analyze;
pub mod categorize;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod extract;
pub mod layout;
pub mod models;
pub mod normalize;
#[cfg(feature = "pdf-report")]
pub mod pdf_report;
pub mod sample;

pub use analyze::{AnalysisReport, Analyzer};
pub use categorize::{categorize, Categorizer};
pub use config::{ConfigSource, Settings};
pub use document::{content_id, validate, DocumentKind, StatementDocument};
pub use error::{Error, Result};
pub use export::{render, ExportFormat};
pub use extract::{extract, extract_or_synthesize, Extraction, Extractor, ParseFailure};
pub use models::{
    Category, Frequency, PositionedTextFragment, StatementDialect, TextLine, TextPage,
    Transaction, TransactionSource, TransactionType,
};
pub use normalize::{parse_amount, parse_date};
