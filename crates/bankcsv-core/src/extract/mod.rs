//! Transaction extraction from statement documents
//!
//! Extraction runs an ordered list of strategies with a bank-specific
//! parser:
//! 1. Structured: lines rebuilt from the text layer (or the document's own
//!    line breaks) fed to the parser
//! 2. Line-based: the whole document flattened and cut at every date
//!
//! When neither finds a transaction the result is a [`ParseFailure`]. The
//! caller decides whether to stop there or to turn it into clearly labelled
//! sample data with [`ParseFailure::into_synthetic`].

mod generic;
mod ing;
mod patterns;

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::categorize::Categorizer;
use crate::config::{ParsingConfig, Settings};
use crate::document::StatementDocument;
use crate::models::{StatementDialect, Transaction, TransactionSource};
use crate::sample;

pub use generic::GenericParser;
pub use ing::IngParser;
pub use patterns::extract_merchant;

/// A transaction candidate as read by a parser, before filtering and
/// categorization
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    /// Counterparty named explicitly by the statement, if any
    pub merchant: Option<String>,
}

/// A statement layout parser
pub trait StatementParser: Send + Sync {
    fn dialect(&self) -> StatementDialect;

    /// Parse candidate records from lines in reading order
    fn parse_lines(&self, lines: &[String]) -> Vec<ParsedRecord>;
}

/// Parser for a statement layout
pub fn parser_for(dialect: StatementDialect) -> Box<dyn StatementParser> {
    match dialect {
        StatementDialect::Generic => Box::new(GenericParser),
        StatementDialect::Ing => Box::new(IngParser),
    }
}

fn ing_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bing\s+bank\b|\bINGBNL2A\b|\bmijn\s+ing\b").expect("valid regex")
    })
}

/// Detect the statement layout from the first page's text
pub fn detect_dialect(first_page: &str) -> StatementDialect {
    if ing_marker_regex().is_match(first_page) {
        StatementDialect::Ing
    } else {
        StatementDialect::Generic
    }
}

/// Extraction strategies, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Structured,
    LineBased,
}

impl Strategy {
    pub const ORDER: [Strategy; 2] = [Strategy::Structured, Strategy::LineBased];

    pub fn as_str(&self) -> &'static str {
        self.source().as_str()
    }

    pub fn source(&self) -> TransactionSource {
        match self {
            Self::Structured => TransactionSource::Structured,
            Self::LineBased => TransactionSource::LineBased,
        }
    }

    /// Lines this strategy feeds to the parser
    pub fn lines(&self, document: &StatementDocument, tolerance: f64) -> Vec<String> {
        match self {
            Self::Structured => document.lines(tolerance),
            Self::LineBased => segment_at_dates(&document.flattened_text()),
        }
    }
}

/// Cut flattened text into date-anchored records
pub fn segment_at_dates(text: &str) -> Vec<String> {
    let starts: Vec<usize> = patterns::find_all_dates(text)
        .iter()
        .map(|m| m.range.start)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim().to_string()
        })
        .collect()
}

/// Transactions extracted from one document
#[derive(Debug, Clone)]
pub struct Extraction {
    pub transactions: Vec<Transaction>,
    /// Strategy that produced the transactions
    pub source: TransactionSource,
    pub dialect: StatementDialect,
    /// Lines (or segments) examined across all strategies tried
    pub lines_scanned: usize,
    /// Why parsing failed, when the transactions are synthetic
    pub failure: Option<ParseFailure>,
}

impl Extraction {
    pub fn is_synthetic(&self) -> bool {
        self.source.is_synthetic()
    }
}

/// Nothing could be parsed from a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseFailure {
    #[error("document contains no text")]
    EmptyDocument,

    #[error("no transactions found in {lines_scanned} lines ({dialect} layout)")]
    NoTransactions {
        dialect: StatementDialect,
        lines_scanned: usize,
    },
}

impl ParseFailure {
    pub fn dialect(&self) -> StatementDialect {
        match self {
            Self::EmptyDocument => StatementDialect::Generic,
            Self::NoTransactions { dialect, .. } => *dialect,
        }
    }

    /// Replace the failure with sample data covering the 90 days before
    /// `anchor`, labelled [`TransactionSource::Synthetic`]
    pub fn into_synthetic(self, anchor: NaiveDate) -> Extraction {
        let lines_scanned = match &self {
            Self::EmptyDocument => 0,
            Self::NoTransactions { lines_scanned, .. } => *lines_scanned,
        };
        Extraction {
            transactions: sample::synthesize(anchor),
            source: TransactionSource::Synthetic,
            dialect: self.dialect(),
            lines_scanned,
            failure: Some(self),
        }
    }
}

/// Runs the strategy list and turns parsed records into transactions
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ParsingConfig,
    categorizer: Categorizer,
}

impl Extractor {
    pub fn new(config: ParsingConfig, categorizer: Categorizer) -> Self {
        Self {
            config,
            categorizer,
        }
    }

    /// Extractor using configured limits and category keywords
    pub fn from_settings(settings: &Settings) -> crate::Result<Self> {
        Ok(Self::new(settings.parsing.clone(), settings.categorizer()?))
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    /// Extract transactions, reporting failure instead of inventing data
    pub fn extract(&self, document: &StatementDocument) -> Result<Extraction, ParseFailure> {
        if document.is_blank() {
            return Err(ParseFailure::EmptyDocument);
        }

        let dialect = detect_dialect(&document.first_page_text());
        let parser = parser_for(dialect);
        debug!("Using {} statement parser", parser.dialect());

        let mut lines_scanned = 0;
        for strategy in Strategy::ORDER {
            let lines = strategy.lines(document, self.config.line_tolerance);
            lines_scanned += lines.len();

            let records = parser.parse_lines(&lines);
            let candidates = records.len();
            let transactions = self.build_transactions(records);
            debug!(
                strategy = strategy.as_str(),
                lines = lines.len(),
                candidates,
                accepted = transactions.len(),
                "Extraction strategy finished"
            );

            if !transactions.is_empty() {
                info!(
                    "Extracted {} transactions ({} strategy, {} layout)",
                    transactions.len(),
                    strategy.as_str(),
                    dialect
                );
                return Ok(Extraction {
                    transactions,
                    source: strategy.source(),
                    dialect,
                    lines_scanned,
                    failure: None,
                });
            }
        }

        Err(ParseFailure::NoTransactions {
            dialect,
            lines_scanned,
        })
    }

    /// Extract transactions, falling back to labelled sample data
    pub fn extract_or_synthesize(
        &self,
        document: &StatementDocument,
        anchor: NaiveDate,
    ) -> Extraction {
        self.extract(document).unwrap_or_else(|failure| {
            warn!(
                "Statement parsing failed ({}); substituting synthetic sample data",
                failure
            );
            failure.into_synthetic(anchor)
        })
    }

    fn build_transactions(&self, records: Vec<ParsedRecord>) -> Vec<Transaction> {
        records
            .into_iter()
            .filter(|r| {
                let plausible = r.amount != 0.0 && r.amount.abs() <= self.config.max_abs_amount;
                if !plausible {
                    debug!("Discarding implausible amount {} on {}", r.amount, r.date);
                }
                plausible
            })
            .map(|r| {
                let description = if r.description.is_empty() {
                    "Unknown".to_string()
                } else {
                    r.description
                };
                let merchant = r
                    .merchant
                    .unwrap_or_else(|| extract_merchant(&description));
                let category = self.categorizer.categorize(&description);
                Transaction::new(r.date, description, r.amount, category, merchant)
            })
            .collect()
    }
}

/// Extract with default limits and keywords
pub fn extract(document: &StatementDocument) -> Result<Extraction, ParseFailure> {
    Extractor::default().extract(document)
}

/// Extract with defaults, falling back to labelled sample data
pub fn extract_or_synthesize(document: &StatementDocument, anchor: NaiveDate) -> Extraction {
    Extractor::default().extract_or_synthesize(document, anchor)
}
