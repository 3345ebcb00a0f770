//! Deterministic sample statement data
//!
//! Used only when nothing could be parsed from a document. Output depends on
//! the anchor date alone, and every result built from it is labelled
//! synthetic.

use chrono::{Duration, NaiveDate};

use crate::models::{Category, Transaction};

/// Days covered by a synthetic statement (ending at the anchor)
pub const SAMPLE_WINDOW_DAYS: i64 = 90;

/// A sample merchant repeated at a fixed interval
struct SampleTxn {
    /// Days after the window start of the first occurrence
    first_day: i64,
    /// Days between occurrences (`None` = once)
    every: Option<i64>,
    description: &'static str,
    merchant: &'static str,
    category: Category,
    amount: f64,
}

const SAMPLES: &[SampleTxn] = &[
    SampleTxn { first_day: 0, every: Some(30), description: "SALARIS ACME BV", merchant: "ACME BV", category: Category::Income, amount: 3250.00 },
    SampleTxn { first_day: 1, every: Some(30), description: "Huur Woonstichting De Key", merchant: "Woonstichting De Key", category: Category::Housing, amount: -1150.00 },
    SampleTxn { first_day: 2, every: Some(7), description: "Albert Heijn 1403", merchant: "Albert Heijn", category: Category::Groceries, amount: -67.45 },
    SampleTxn { first_day: 5, every: Some(14), description: "Jumbo Supermarkten", merchant: "Jumbo Supermarkten", category: Category::Groceries, amount: -38.90 },
    SampleTxn { first_day: 3, every: Some(9), description: "Starbucks Centraal", merchant: "Starbucks Centraal", category: Category::Dining, amount: -5.75 },
    SampleTxn { first_day: 10, every: Some(21), description: "Restaurant De Kas", merchant: "Restaurant De Kas", category: Category::Dining, amount: -84.50 },
    SampleTxn { first_day: 8, every: Some(30), description: "NETFLIX.COM", merchant: "NETFLIX.COM", category: Category::Entertainment, amount: -13.99 },
    SampleTxn { first_day: 12, every: Some(30), description: "Spotify AB", merchant: "Spotify AB", category: Category::Entertainment, amount: -10.99 },
    SampleTxn { first_day: 15, every: Some(30), description: "Vattenfall Energie", merchant: "Vattenfall Energie", category: Category::Utilities, amount: -96.00 },
    SampleTxn { first_day: 18, every: Some(30), description: "Ziggo Services", merchant: "Ziggo Services", category: Category::Utilities, amount: -52.50 },
    SampleTxn { first_day: 4, every: Some(11), description: "NS Reizigers", merchant: "NS Reizigers", category: Category::Transportation, amount: -23.40 },
    SampleTxn { first_day: 20, every: Some(25), description: "Shell Tankstation A2", merchant: "Shell Tankstation A2", category: Category::Transportation, amount: -71.20 },
    SampleTxn { first_day: 33, every: None, description: "bol.com bestelling", merchant: "bol.com bestelling", category: Category::Shopping, amount: -49.99 },
    SampleTxn { first_day: 70, every: None, description: "Coolblue Rotterdam", merchant: "Coolblue Rotterdam", category: Category::Shopping, amount: -129.00 },
    SampleTxn { first_day: 27, every: Some(30), description: "Kosten betaalpakket", merchant: "Kosten betaalpakket", category: Category::BankFees, amount: -3.25 },
];

/// Fabricate a statement covering the 90 days ending at `anchor`
///
/// Always non-empty, sorted by date, identical for identical anchors.
pub fn synthesize(anchor: NaiveDate) -> Vec<Transaction> {
    let start = anchor - Duration::days(SAMPLE_WINDOW_DAYS - 1);
    let mut transactions = Vec::new();

    for sample in SAMPLES {
        let mut day = sample.first_day;
        while day < SAMPLE_WINDOW_DAYS {
            transactions.push(Transaction::new(
                start + Duration::days(day),
                sample.description,
                sample.amount,
                sample.category,
                sample.merchant,
            ));
            match sample.every {
                Some(step) => day += step,
                None => break,
            }
        }
    }

    transactions.sort_by_key(|t| t.date);
    transactions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(synthesize(anchor()), synthesize(anchor()));
    }

    #[test]
    fn test_spans_window_ending_at_anchor() {
        let txs = synthesize(anchor());
        assert!(!txs.is_empty());

        let first = txs.first().unwrap().date;
        let last = txs.last().unwrap().date;
        assert!(last <= anchor());
        assert!(first >= anchor() - Duration::days(SAMPLE_WINDOW_DAYS - 1));
        assert!((last - first).num_days() >= 80);
    }

    #[test]
    fn test_sorted_and_mixed() {
        let txs = synthesize(anchor());
        assert!(txs.windows(2).all(|w| w[0].date <= w[1].date));
        assert!(txs.iter().any(|t| t.is_credit()));
        assert!(txs.iter().any(|t| t.is_debit()));
        assert!(txs.iter().any(|t| t.category == Category::BankFees));
    }

    #[test]
    fn test_shifts_with_anchor() {
        let later = anchor() + Duration::days(10);
        let a = synthesize(anchor());
        let b = synthesize(later);
        assert_eq!(a.len(), b.len());
        assert_eq!(b[0].date - a[0].date, Duration::days(10));
    }
}
