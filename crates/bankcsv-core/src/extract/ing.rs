//! ING (Netherlands) statement layout
//!
//! Records start with the booking date. Amounts are unsigned and carry an
//! `Af` (debit) or `Bij` (credit) column marker. Longer records wrap onto a
//! second line, which may hold the amount and a `Naam:` field naming the
//! counterparty.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::StatementDialect;

use super::patterns::{
    clean_description, cut, find_amount, find_leading_date, is_summary_line, signed_amount,
    strip_dates, take_amount, AmountMatch, Marker,
};
use super::{ParsedRecord, StatementParser};

fn naam_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\bNaam:\s*(.+?)\s*(?:\b(?:Omschrijving|IBAN|Kenmerk|Machtiging|Incassant|Datum/Tijd|Pasvolgnr|Transactie|Term|Valutadatum)\s*:|$)",
        )
        .expect("valid regex")
    })
}

fn naam_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bNaam:").expect("valid regex"))
}

/// ING dialect parser with one-line lookahead
#[derive(Debug, Default, Clone, Copy)]
pub struct IngParser;

impl StatementParser for IngParser {
    fn dialect(&self) -> StatementDialect {
        StatementDialect::Ing
    }

    fn parse_lines(&self, lines: &[String]) -> Vec<ParsedRecord> {
        let mut records = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].trim();
            i += 1;

            if line.is_empty() {
                continue;
            }
            let Some(date) = find_leading_date(line) else {
                continue;
            };
            let rest = cut(line, date.range.clone());
            if is_summary_line(&strip_dates(&rest)) {
                continue;
            }

            let (amount, marker, remainder) = match find_amount(&rest) {
                Some(amount) => {
                    let (marker, remainder) = take_amount(&rest, &amount);
                    (amount, marker, remainder)
                }
                None => match continuation(lines.get(i).map(|l| l.trim())) {
                    Some((amount, marker, next_rest)) => {
                        i += 1;
                        (amount, marker, format!("{} {}", rest, next_rest))
                    }
                    None => continue,
                },
            };

            let merchant = naam_regex()
                .captures(&remainder)
                .and_then(|caps| caps.get(1))
                .map(|m| clean_description(m.as_str()))
                .filter(|m| !m.is_empty());
            let description =
                clean_description(&strip_dates(&naam_label_regex().replace_all(&remainder, " ")));

            records.push(ParsedRecord {
                date: date.date,
                amount: signed_amount(&amount, marker, Some(Marker::Debit)),
                description,
                merchant,
            });
        }

        records
    }
}

/// Amount, marker and leftover text from the line after a date line, if
/// that line continues the record
fn continuation(next: Option<&str>) -> Option<(AmountMatch, Option<Marker>, String)> {
    let next = next?;
    if next.is_empty() || is_summary_line(next) || find_leading_date(next).is_some() {
        return None;
    }
    let amount = find_amount(next)?;
    let (marker, rest) = take_amount(next, &amount);
    Some((amount, marker, rest))
}
