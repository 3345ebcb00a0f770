//! Headline totals

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Category, Transaction};

/// Statement-wide totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    /// Sum of debit magnitudes
    pub total_debits: f64,
    pub total_credits: f64,
    /// Credits minus debits
    pub net: f64,
    pub transaction_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Distinct calendar days with at least one transaction
    pub distinct_days: usize,
    /// Debits per distinct day, scaled to 30 days
    pub monthly_average: f64,
    /// Category with the largest debit total
    pub top_category: Option<Category>,
    /// `YYYY-MM` compared against the month before it
    pub reference_month: Option<String>,
    /// Percent change of debits versus the previous month (0 when the
    /// previous month has none)
    pub month_over_month_change: f64,
}

/// Compute the overview; `as_of` picks the reference month and defaults to
/// the latest transaction date
pub fn overview(transactions: &[Transaction], as_of: Option<NaiveDate>) -> Overview {
    let total_debits: f64 = transactions
        .iter()
        .filter(|t| t.is_debit())
        .map(|t| t.amount().abs())
        .sum();
    let total_credits: f64 = transactions
        .iter()
        .filter(|t| t.is_credit())
        .map(|t| t.amount())
        .sum();

    let days: BTreeSet<NaiveDate> = transactions.iter().map(|t| t.date).collect();
    let first_date = days.iter().next().copied();
    let last_date = days.iter().next_back().copied();

    let monthly_average = if days.is_empty() {
        0.0
    } else {
        total_debits / days.len() as f64 * 30.0
    };

    let reference = as_of.or(last_date);
    let month_over_month_change = reference
        .map(|date| month_over_month(transactions, date.year(), date.month()))
        .unwrap_or(0.0);

    Overview {
        total_debits,
        total_credits,
        net: total_credits - total_debits,
        transaction_count: transactions.len(),
        first_date,
        last_date,
        distinct_days: days.len(),
        monthly_average,
        top_category: top_debit_category(transactions),
        reference_month: reference.map(|d| d.format("%Y-%m").to_string()),
        month_over_month_change,
    }
}

fn top_debit_category(transactions: &[Transaction]) -> Option<Category> {
    let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_debit()) {
        *totals.entry(t.category).or_insert(0.0) += t.amount().abs();
    }

    // Ties go to the category listed first
    let mut best: Option<(Category, f64)> = None;
    for (category, total) in totals {
        if best.map_or(true, |(_, b)| total > b) {
            best = Some((category, total));
        }
    }
    best.map(|(category, _)| category)
}

fn month_over_month(transactions: &[Transaction], year: i32, month: u32) -> f64 {
    let (prev_year, prev_month) = previous_month(year, month);
    let current = debits_in_month(transactions, year, month);
    let previous = debits_in_month(transactions, prev_year, prev_month);

    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

fn debits_in_month(transactions: &[Transaction], year: i32, month: u32) -> f64 {
    transactions
        .iter()
        .filter(|t| t.is_debit() && t.date.year() == year && t.date.month() == month)
        .map(|t| t.amount().abs())
        .sum()
}

pub(crate) fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: (i32, u32, u32), amount: f64, category: Category) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            "test",
            amount,
            category,
            "test",
        )
    }

    #[test]
    fn test_totals() {
        let txs = vec![
            tx((2024, 1, 5), -100.0, Category::Groceries),
            tx((2024, 1, 5), -50.0, Category::Dining),
            tx((2024, 1, 20), 2000.0, Category::Income),
        ];

        let o = overview(&txs, None);
        assert_eq!(o.total_debits, 150.0);
        assert_eq!(o.total_credits, 2000.0);
        assert_eq!(o.net, 1850.0);
        assert_eq!(o.transaction_count, 3);
        assert_eq!(o.distinct_days, 2);
        // 150 over 2 distinct days, scaled to 30
        assert_eq!(o.monthly_average, 2250.0);
        assert_eq!(o.top_category, Some(Category::Groceries));
    }

    #[test]
    fn test_month_over_month() {
        let txs = vec![
            tx((2024, 1, 10), -100.0, Category::Groceries),
            tx((2024, 2, 10), -150.0, Category::Groceries),
        ];

        let o = overview(&txs, None);
        assert_eq!(o.reference_month.as_deref(), Some("2024-02"));
        assert_eq!(o.month_over_month_change, 50.0);

        // Reference January: December has no debits
        let o = overview(&txs, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(o.month_over_month_change, 0.0);
    }

    #[test]
    fn test_year_boundary() {
        assert_eq!(previous_month(2024, 1), (2023, 12));
        assert_eq!(previous_month(2024, 7), (2024, 6));

        let txs = vec![
            tx((2023, 12, 10), -200.0, Category::Groceries),
            tx((2024, 1, 10), -100.0, Category::Groceries),
        ];
        assert_eq!(overview(&txs, None).month_over_month_change, -50.0);
    }

    #[test]
    fn test_empty() {
        let o = overview(&[], None);
        assert_eq!(o.monthly_average, 0.0);
        assert_eq!(o.month_over_month_change, 0.0);
        assert_eq!(o.top_category, None);
        assert_eq!(o.first_date, None);
    }
}
