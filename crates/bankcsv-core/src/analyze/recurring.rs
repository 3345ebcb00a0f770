//! Recurring payment detection
//!
//! Transactions are grouped by merchant and rounded amount. A group with at
//! least two occurrences whose mean interval falls in a known cadence window
//! is reported; everything else is `Variable` and dropped.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Category, Frequency, Transaction};

/// Inclusive mean-interval windows, in days
const FREQUENCY_WINDOWS: &[(Frequency, f64, f64)] = &[
    (Frequency::Weekly, 6.0, 8.0),
    (Frequency::BiWeekly, 13.0, 15.0),
    (Frequency::Monthly, 28.0, 32.0),
    (Frequency::Quarterly, 84.0, 92.0),
    (Frequency::Annual, 360.0, 370.0),
];

/// A payment that repeats on a regular cadence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringPayment {
    pub merchant: String,
    /// Mean absolute amount of the occurrences
    pub amount: f64,
    pub category: Category,
    /// Money going out rather than coming in
    pub is_debit: bool,
    pub frequency: Frequency,
    pub occurrences: usize,
    pub average_interval_days: f64,
    pub last_date: NaiveDate,
    /// `last_date` plus the rounded mean interval
    pub next_date: NaiveDate,
}

/// Bucket a mean interval into a cadence
pub fn classify_interval(days: f64) -> Frequency {
    FREQUENCY_WINDOWS
        .iter()
        .find(|(_, min, max)| days >= *min && days <= *max)
        .map(|(frequency, _, _)| *frequency)
        .unwrap_or(Frequency::Variable)
}

/// Find recurring payments, soonest next payment first
pub fn detect_recurring(transactions: &[Transaction]) -> Vec<RecurringPayment> {
    let mut groups: BTreeMap<(String, i64), Vec<&Transaction>> = BTreeMap::new();
    for t in transactions {
        let key = (t.merchant.to_lowercase(), t.amount().abs().round() as i64);
        groups.entry(key).or_default().push(t);
    }

    let mut payments: Vec<RecurringPayment> = groups
        .into_values()
        .filter(|group| group.len() >= 2)
        .filter_map(|mut group| {
            group.sort_by_key(|t| t.date);

            let intervals: Vec<i64> = group
                .windows(2)
                .map(|w| (w[1].date - w[0].date).num_days())
                .collect();
            let mean_interval = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

            let frequency = classify_interval(mean_interval);
            if frequency == Frequency::Variable {
                return None;
            }

            let last = group.last()?;
            let mean_amount =
                group.iter().map(|t| t.amount().abs()).sum::<f64>() / group.len() as f64;

            Some(RecurringPayment {
                merchant: last.merchant.clone(),
                amount: (mean_amount * 100.0).round() / 100.0,
                category: last.category,
                is_debit: last.is_debit(),
                frequency,
                occurrences: group.len(),
                average_interval_days: mean_interval,
                last_date: last.date,
                next_date: last.date + Duration::days(mean_interval.round() as i64),
            })
        })
        .collect();

    payments.sort_by(|a, b| a.next_date.cmp(&b.next_date).then_with(|| a.merchant.cmp(&b.merchant)));
    payments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: NaiveDate, merchant: &str, amount: f64) -> Transaction {
        Transaction::new(date, merchant, amount, Category::Entertainment, merchant)
    }

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify_interval(6.0), Frequency::Weekly);
        assert_eq!(classify_interval(8.0), Frequency::Weekly);
        assert_eq!(classify_interval(9.0), Frequency::Variable);
        assert_eq!(classify_interval(14.0), Frequency::BiWeekly);
        assert_eq!(classify_interval(28.0), Frequency::Monthly);
        assert_eq!(classify_interval(32.0), Frequency::Monthly);
        assert_eq!(classify_interval(33.0), Frequency::Variable);
        assert_eq!(classify_interval(91.0), Frequency::Quarterly);
        assert_eq!(classify_interval(365.0), Frequency::Annual);
        assert_eq!(classify_interval(20.0), Frequency::Variable);
    }

    #[test]
    fn test_thirty_days_is_monthly() {
        let txs = vec![tx(day(0), "Netflix", -13.99), tx(day(30), "Netflix", -13.99)];
        let found = detect_recurring(&txs);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].frequency, Frequency::Monthly);
        assert_eq!(found[0].occurrences, 2);
        assert_eq!(found[0].last_date, day(30));
        assert_eq!(found[0].next_date, day(60));
        assert_eq!(found[0].amount, 13.99);
        assert!(found[0].is_debit);
    }

    #[test]
    fn test_twenty_days_is_excluded() {
        let txs = vec![tx(day(0), "Netflix", -13.99), tx(day(20), "Netflix", -13.99)];
        assert!(detect_recurring(&txs).is_empty());
    }

    #[test]
    fn test_groups_by_rounded_amount() {
        // 13.99 and 14.20 both round to 14; 20.00 is a different group
        let txs = vec![
            tx(day(0), "Gym", -13.99),
            tx(day(7), "Gym", -14.20),
            tx(day(14), "Gym", -20.00),
        ];
        let found = detect_recurring(&txs);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].frequency, Frequency::Weekly);
        assert_eq!(found[0].occurrences, 2);
    }

    #[test]
    fn test_single_occurrence_ignored() {
        assert!(detect_recurring(&[tx(day(0), "Once", -10.0)]).is_empty());
    }
}
