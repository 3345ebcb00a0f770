//! Category, merchant and monthly breakdowns

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Category, Transaction};

/// Spending grouped by category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdownEntry {
    pub category: Category,
    /// Sum of absolute amounts
    pub total: f64,
    pub count: usize,
    pub transactions: Vec<Transaction>,
    /// Share of all non-income totals (always 0 for Income)
    pub percentage: f64,
}

/// Debit spending grouped by merchant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantBreakdownEntry {
    pub merchant: String,
    pub total: f64,
    pub count: usize,
    pub average: f64,
}

/// Income and expenses for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCashFlow {
    /// `YYYY-MM`
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

/// Group by category, largest total first
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryBreakdownEntry> {
    let mut groups: BTreeMap<Category, Vec<Transaction>> = BTreeMap::new();
    for t in transactions {
        groups.entry(t.category).or_default().push(t.clone());
    }

    let mut entries: Vec<CategoryBreakdownEntry> = groups
        .into_iter()
        .map(|(category, txs)| CategoryBreakdownEntry {
            category,
            total: txs.iter().map(|t| t.amount().abs()).sum(),
            count: txs.len(),
            transactions: txs,
            percentage: 0.0,
        })
        .collect();

    let denominator: f64 = entries
        .iter()
        .filter(|e| e.category != Category::Income)
        .map(|e| e.total)
        .sum();

    if denominator > 0.0 {
        for entry in entries.iter_mut().filter(|e| e.category != Category::Income) {
            entry.percentage = entry.total / denominator * 100.0;
        }
    }

    entries.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

/// Top `limit` merchants by debit total
pub fn merchant_breakdown(transactions: &[Transaction], limit: usize) -> Vec<MerchantBreakdownEntry> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_debit()) {
        let entry = groups.entry(t.merchant.as_str()).or_insert((0.0, 0));
        entry.0 += t.amount().abs();
        entry.1 += 1;
    }

    let mut entries: Vec<MerchantBreakdownEntry> = groups
        .into_iter()
        .map(|(merchant, (total, count))| MerchantBreakdownEntry {
            merchant: merchant.to_string(),
            total,
            count,
            average: total / count as f64,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries.truncate(limit);
    entries
}

/// Per-month income, expenses and net, oldest month first
pub fn monthly_cash_flow(transactions: &[Transaction]) -> Vec<MonthlyCashFlow> {
    let mut months: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for t in transactions {
        let entry = months
            .entry((t.date.year(), t.date.month()))
            .or_insert((0.0, 0.0));
        if t.is_credit() {
            entry.0 += t.amount();
        } else {
            entry.1 += t.amount().abs();
        }
    }

    months
        .into_iter()
        .map(|((year, month), (income, expenses))| MonthlyCashFlow {
            month: format!("{:04}-{:02}", year, month),
            income,
            expenses,
            net: income - expenses,
        })
        .collect()
}
