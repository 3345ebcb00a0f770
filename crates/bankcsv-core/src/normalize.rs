//! Amount and date normalization for localized statement text
//!
//! Statements mix European (`1.234,56`, `15-06-2024`, `15 juni 2024`) and
//! US (`1,234.56`, `June 15, 2024`) conventions. Nothing in here fails loudly:
//! unparseable amounts come back as `0.0` and unparseable dates as `None`,
//! and callers drop those candidates.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// Month names (English and Dutch, full and abbreviated), longest first so
/// regex alternation prefers the full spelling.
pub(crate) const MONTH_NAME_PATTERN: &str = "januari|january|februari|february|maart|march|april|mei|may|juni|june|juli|july|augustus|august|september|oktober|october|november|december|sept|jan|feb|mrt|mar|apr|jun|jul|aug|sep|okt|oct|nov|dec";

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("januari", 1),
    ("jan", 1),
    ("february", 2),
    ("februari", 2),
    ("feb", 2),
    ("march", 3),
    ("maart", 3),
    ("mar", 3),
    ("mrt", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("mei", 5),
    ("june", 6),
    ("juni", 6),
    ("jun", 6),
    ("july", 7),
    ("juli", 7),
    ("jul", 7),
    ("august", 8),
    ("augustus", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oktober", 10),
    ("oct", 10),
    ("okt", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

/// Date shapes in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateShape {
    /// DD-MM-YYYY, DD/MM/YYYY, DD.MM.YYYY (two-digit years allowed)
    NumericDayFirst,
    /// YYYY-MM-DD
    Iso,
    /// 15 juni 2024
    DayMonthName,
    /// June 15, 2024
    MonthNameDay,
}

/// Ordered date patterns shared with the transaction extractor
pub(crate) fn date_patterns() -> &'static [(DateShape, Regex)] {
    static PATTERNS: OnceLock<Vec<(DateShape, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (
                DateShape::NumericDayFirst,
                Regex::new(r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})\b").expect("valid regex"),
            ),
            (
                DateShape::Iso,
                Regex::new(r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b").expect("valid regex"),
            ),
            (
                DateShape::DayMonthName,
                Regex::new(&format!(
                    r"(?i)\b(\d{{1,2}})\.?\s+({})\.?,?\s+(\d{{4}})\b",
                    MONTH_NAME_PATTERN
                ))
                .expect("valid regex"),
            ),
            (
                DateShape::MonthNameDay,
                Regex::new(&format!(
                    r"(?i)\b({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b",
                    MONTH_NAME_PATTERN
                ))
                .expect("valid regex"),
            ),
        ]
    })
}

/// Parse a localized amount string
///
/// Returns `0.0` when nothing numeric can be recovered.
pub fn parse_amount(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let negative = is_negative(trimmed);

    let numeric: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let numeric = numeric.trim_matches(|c: char| c == ',' || c == '.');
    if numeric.is_empty() {
        return 0.0;
    }

    let Some(canonical) = canonical_decimal(numeric) else {
        return 0.0;
    };

    match canonical.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if negative {
                -value.abs()
            } else {
                value.abs()
            }
        }
        _ => 0.0,
    }
}

/// Leading minus (before the first digit), trailing minus (after the last
/// digit), or parentheses mark a negative amount.
fn is_negative(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let is_minus = |c: char| c == '-' || c == '\u{2212}';

    if compact.contains('(') && compact.contains(')') {
        return true;
    }

    let Some(first_digit) = compact.find(|c: char| c.is_ascii_digit()) else {
        return false;
    };
    if compact[..first_digit].contains(is_minus) {
        return true;
    }

    match compact.rfind(|c: char| c.is_ascii_digit()) {
        Some(last_digit) => compact[last_digit + 1..].contains(is_minus),
        None => false,
    }
}

/// Rewrite a digits-and-separators string into `1234.56` form
fn canonical_decimal(numeric: &str) -> Option<String> {
    let commas = numeric.matches(',').count();
    let dots = numeric.matches('.').count();

    let canonical = match (commas, dots) {
        (0, 0) => numeric.to_string(),
        (_, 0) => {
            let tail_len = numeric.len() - numeric.rfind(',')? - 1;
            if commas == 1 && (1..=2).contains(&tail_len) {
                numeric.replace(',', ".")
            } else {
                numeric.replace(',', "")
            }
        }
        (0, _) => {
            if dots == 1 {
                numeric.to_string()
            } else {
                numeric.replace('.', "")
            }
        }
        _ => {
            let last_comma = numeric.rfind(',')?;
            let last_dot = numeric.rfind('.')?;
            if last_comma > last_dot {
                // European: 1.234,56
                numeric.replace('.', "").replace(',', ".")
            } else {
                // US: 1,234.56
                numeric.replace(',', "")
            }
        }
    };

    Some(canonical)
}

/// Parse a date in any of the supported numeric or month-name shapes
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    date_patterns()
        .iter()
        .find_map(|(shape, re)| re.captures(text).and_then(|caps| date_from_captures(*shape, &caps)))
}

pub(crate) fn date_from_captures(shape: DateShape, caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    match shape {
        DateShape::NumericDayFirst => {
            let year_text = caps.get(3)?.as_str();
            let year = expand_year(year_text.parse().ok()?, year_text.len());
            day_first(year, num(2)?, num(1)?)
        }
        DateShape::Iso => NaiveDate::from_ymd_opt(num(1)? as i32, num(2)?, num(3)?),
        DateShape::DayMonthName => {
            let month = month_from_name(caps.get(2)?.as_str())?;
            NaiveDate::from_ymd_opt(num(3)? as i32, month, num(1)?)
        }
        DateShape::MonthNameDay => {
            let month = month_from_name(caps.get(1)?.as_str())?;
            NaiveDate::from_ymd_opt(num(3)? as i32, month, num(2)?)
        }
    }
}

/// Day-first date, reading it month-first only when the middle field cannot
/// be a month (e.g. `06/15/2024`)
fn day_first(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        if month > 12 && day <= 12 {
            NaiveDate::from_ymd_opt(year, day, month)
        } else {
            None
        }
    })
}

/// Two-digit years pivot at 50
fn expand_year(year: i32, digits: usize) -> i32 {
    if digits > 2 {
        year
    } else if year < 50 {
        2000 + year
    } else {
        1900 + year
    }
}

/// Look up an English or Dutch month name or abbreviation
pub fn month_from_name(name: &str) -> Option<u32> {
    let name = name.trim().trim_end_matches('.').to_lowercase();
    MONTHS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, month)| *month)
}
