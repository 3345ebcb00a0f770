//! Bank-agnostic line parser

use crate::models::StatementDialect;

use super::patterns::{
    clean_description, cut, find_amount, find_date, is_summary_line, signed_amount, strip_dates,
    take_amount,
};
use super::{ParsedRecord, StatementParser};

/// One transaction per line: first date, first amount, the rest is the
/// description
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericParser;

impl StatementParser for GenericParser {
    fn dialect(&self) -> StatementDialect {
        StatementDialect::Generic
    }

    fn parse_lines(&self, lines: &[String]) -> Vec<ParsedRecord> {
        lines.iter().filter_map(|line| parse_line(line)).collect()
    }
}

fn parse_line(line: &str) -> Option<ParsedRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let date = find_date(line)?;
    let rest = cut(line, date.range.clone());
    if is_summary_line(&strip_dates(&rest)) {
        return None;
    }
    let amount = find_amount(&rest)?;
    let (marker, remainder) = take_amount(&rest, &amount);

    Some(ParsedRecord {
        date: date.date,
        amount: signed_amount(&amount, marker, None),
        description: clean_description(&strip_dates(&remainder)),
        merchant: None,
    })
}
