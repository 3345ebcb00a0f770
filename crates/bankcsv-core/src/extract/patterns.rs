//! Date, amount and noise patterns shared by the statement parsers

use std::ops::Range;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::normalize::{date_from_captures, date_patterns, parse_amount};

/// Decimal amount with optional thousands grouping and exactly two decimals
const AMOUNT_CORE: &str = r"(?:\d{1,3}(?:[.,]\d{3})+|\d+)[.,]\d{2}";

/// Amount must not run into more digits (account numbers, long references)
const AMOUNT_END: &str = r"(?:$|[^\d.,]|[.,](?:$|\D))";

const CURRENCY: &str = r"(?:[€$£]|\b(?:EUR|USD|GBP)\b)";

const DEBIT_MARKERS: &[&str] = &["af", "debet", "debit", "dr"];
const CREDIT_MARKERS: &[&str] = &["bij", "credit", "cr"];

/// Words that open a balance, total or page-footer line
const SUMMARY_KEYWORDS: &[&str] = &[
    "saldo", "beginsaldo", "eindsaldo", "tussensaldo", "balance", "totaal", "total",
    "subtotaal", "subtotal", "page", "pagina",
];

/// Words allowed before a summary keyword
const SUMMARY_QUALIFIERS: &[&str] = &[
    "nieuw", "oud", "vorig", "begin", "eind", "huidig", "beschikbaar", "opening", "closing",
    "new", "old", "previous", "current", "available",
];

/// Words allowed after a summary keyword
const SUMMARY_FILLER: &[&str] = &[
    "per", "op", "van", "tot", "en", "uw", "voor", "in", "of", "on", "at", "as", "the", "from",
    "to", "and", "your", "for", "this", "brought", "carried", "forward", "af", "bij", "debet",
    "debit", "debits", "credit", "credits", "dr", "cr", "eur", "usd", "gbp", "bedrag", "amount",
    "uitgaven", "inkomsten", "transacties", "transactions", "rekening", "account", "periode",
    "period", "maand", "month",
];

/// A date found in a line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DateMatch {
    pub date: NaiveDate,
    pub range: Range<usize>,
}

/// An amount found in a line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AmountMatch {
    pub value: f64,
    pub range: Range<usize>,
    /// The matched text carried its own sign (`-`, `+`, parentheses)
    pub explicit_sign: bool,
}

fn amount_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let bodies = [
            // (45,32)
            format!(r"(?P<amt>\(\s*{CURRENCY}?\s*{AMOUNT_CORE}\s*\))"),
            // -45,32  +12,50  -€ 45,32
            format!(r"(?:^|\s)(?P<amt>[-+\x{{2212}}]\s?(?:{CURRENCY}\s?)?{AMOUNT_CORE})"),
            // € 45,32  45,32 EUR
            format!(r"(?P<amt>{CURRENCY}\s?{AMOUNT_CORE}|{AMOUNT_CORE}\s?{CURRENCY})"),
            // 45,32-
            format!(r"(?:^|[^\d.,])(?P<amt>{AMOUNT_CORE}-)"),
            // 45,32
            format!(r"(?:^|[^\d.,])(?P<amt>{AMOUNT_CORE})"),
        ];
        bodies
            .iter()
            .map(|body| Regex::new(&format!("{}{}", body, AMOUNT_END)).expect("valid regex"))
            .collect()
    })
}

fn noise_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\bSEPA(?:\s+(?:overboeking|incasso(?:\s+algemeen\s+doorlopend)?|periodieke\s+overb\.?|direct\s+debit|credit\s+transfer))?\b",
            r"(?i)\b(?:BEA|GEA)\b,?",
            r"(?i)\biDEAL\b",
            r"(?i)\bBetaalautomaat\b",
            r"\bPOS\b",
            r"(?i)\b[A-Z]{2}\d{2}[A-Z]{4}\d{6,10}\b",
            r"(?i)\bPas(?:nr|volgnr)\.?\s*:?\s*\S+",
            r"(?i)\b(?:Ref(?:erentie)?|Kenmerk|Machtiging|Incassant(?:\s+ID)?|Transactie|Term)\s*:\s*\S+",
            r"(?i)\b(?:Omschrijving|IBAN|Datum/Tijd|Valutadatum)\s*:",
            r"\b\d{1,2}:\d{2}(?::\d{2})?\b",
            r"(?i)\b\d{1,2}[.:]\d{2}\s*uur\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

fn marker_after_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(af|bij|debet|debit|credit|dr|cr)\b\.?").expect("valid regex")
    })
}

fn marker_before_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(af|bij|debet|debit|credit|dr|cr)\.?\s*$").expect("valid regex")
    })
}

/// Balance, total and page-footer text never holds a transaction
///
/// Expects the text with dates removed. It must open with a summary keyword
/// (optionally qualified, as in "Nieuw saldo") and hold no other words than
/// filler, so merchants such as "TOTAL Tankstation" or "Balance Yoga Studio"
/// are kept.
pub(crate) fn is_summary_line(text: &str) -> bool {
    let lowered = text.to_lowercase();
    let mut words = lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .skip_while(|w| SUMMARY_QUALIFIERS.contains(w));

    match words.next() {
        Some(first) if SUMMARY_KEYWORDS.contains(&first) => words.all(|w| {
            SUMMARY_KEYWORDS.contains(&w)
                || SUMMARY_QUALIFIERS.contains(&w)
                || SUMMARY_FILLER.contains(&w)
        }),
        _ => false,
    }
}

/// First parseable date in the line, trying patterns in order
pub(crate) fn find_date(line: &str) -> Option<DateMatch> {
    date_patterns().iter().find_map(|(shape, re)| {
        re.captures_iter(line).find_map(|caps| {
            let whole = caps.get(0)?;
            date_from_captures(*shape, &caps).map(|date| DateMatch {
                date,
                range: whole.range(),
            })
        })
    })
}

/// Every parseable date in the text, ordered by position, non-overlapping
pub(crate) fn find_all_dates(text: &str) -> Vec<DateMatch> {
    let mut found: Vec<DateMatch> = date_patterns()
        .iter()
        .flat_map(|(shape, re)| {
            re.captures_iter(text).filter_map(move |caps| {
                let whole = caps.get(0)?;
                date_from_captures(*shape, &caps).map(|date| DateMatch {
                    date,
                    range: whole.range(),
                })
            })
        })
        .collect();

    found.sort_by_key(|m| (m.range.start, std::cmp::Reverse(m.range.end)));

    let mut result: Vec<DateMatch> = Vec::with_capacity(found.len());
    for m in found {
        if result.last().map_or(true, |prev| m.range.start >= prev.range.end) {
            result.push(m);
        }
    }
    result
}

/// Date at the very start of the line
pub(crate) fn find_leading_date(line: &str) -> Option<DateMatch> {
    find_all_dates(line)
        .into_iter()
        .next()
        .filter(|m| m.range.start == 0)
}

/// Remove every date occurrence from the text
pub(crate) fn strip_dates(text: &str) -> String {
    find_all_dates(text)
        .into_iter()
        .rev()
        .fold(text.to_string(), |acc, m| cut(&acc, m.range))
}

/// First amount in the line, trying patterns in order
pub(crate) fn find_amount(text: &str) -> Option<AmountMatch> {
    amount_patterns().iter().find_map(|re| {
        re.captures_iter(text).find_map(|caps| {
            let amt = caps.name("amt")?;
            let value = parse_amount(amt.as_str());
            if value == 0.0 {
                return None;
            }
            let explicit_sign = amt
                .as_str()
                .contains(|c: char| matches!(c, '-' | '+' | '(' | '\u{2212}'));
            Some(AmountMatch {
                value,
                range: amt.range(),
                explicit_sign,
            })
        })
    })
}

/// Sign implied by debit/credit marker words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Debit,
    Credit,
}

fn marker_for(word: &str) -> Option<Marker> {
    let word = word.to_lowercase();
    if DEBIT_MARKERS.contains(&word.as_str()) {
        Some(Marker::Debit)
    } else if CREDIT_MARKERS.contains(&word.as_str()) {
        Some(Marker::Credit)
    } else {
        None
    }
}

/// Cut an amount out of its line, together with a debit/credit marker word
/// directly after or before it
///
/// Marker words anywhere else ("Credit Agricole", "Dr Oetker") stay in the
/// description and carry no sign.
pub(crate) fn take_amount(text: &str, amount: &AmountMatch) -> (Option<Marker>, String) {
    let Range { start, end } = amount.range.clone();

    let after = marker_after_regex().captures(&text[end..]).and_then(|caps| {
        let marker = marker_for(caps.get(1)?.as_str())?;
        Some((marker, start..end + caps.get(0)?.end()))
    });
    let adjacent = after.or_else(|| {
        marker_before_regex().captures(&text[..start]).and_then(|caps| {
            let marker = marker_for(caps.get(1)?.as_str())?;
            Some((marker, caps.get(0)?.start()..end))
        })
    });

    match adjacent {
        Some((marker, range)) => (Some(marker), cut(text, range)),
        None => (None, cut(text, start..end)),
    }
}

/// Apply an explicit sign or marker to a parsed amount
pub(crate) fn signed_amount(amount: &AmountMatch, marker: Option<Marker>, default: Option<Marker>) -> f64 {
    if amount.explicit_sign {
        return amount.value;
    }
    match marker.or(default) {
        Some(Marker::Debit) => -amount.value.abs(),
        Some(Marker::Credit) => amount.value.abs(),
        None => amount.value,
    }
}

/// Replace a byte range with a space
pub(crate) fn cut(text: &str, range: Range<usize>) -> String {
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..range.start]);
    out.push(' ');
    out.push_str(&text[range.end..]);
    out
}

/// Strip transaction-type prefixes, reference codes, IBANs and time
/// stamps, then collapse whitespace
pub(crate) fn clean_description(text: &str) -> String {
    let mut cleaned = text.to_string();
    for re in noise_patterns() {
        cleaned = re.replace_all(&cleaned, " ").into_owned();
    }

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, ',' | ';' | '-' | '/' | ':' | '|'))
        .trim()
        .to_string()
}

/// Merchant name from a cleaned description
///
/// Takes up to three words before the first mostly-numeric token, after
/// dropping `*` and `#` decorations.
pub fn extract_merchant(description: &str) -> String {
    let decorated = description.replace(|c: char| c == '*' || c == '#', " ");
    let words: Vec<&str> = decorated
        .split_whitespace()
        .take_while(|w| !is_mostly_digits(w))
        .take(3)
        .collect();

    if words.is_empty() {
        "Unknown".to_string()
    } else {
        words.join(" ")
    }
}

fn is_mostly_digits(word: &str) -> bool {
    let alnum = word.chars().filter(|c| c.is_alphanumeric()).count();
    let digits = word.chars().filter(|c| c.is_ascii_digit()).count();
    alnum > 0 && digits * 2 > alnum
}
