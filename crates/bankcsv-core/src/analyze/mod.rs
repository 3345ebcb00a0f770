//! Aggregate statement analysis
//!
//! Every section is recomputed from the full transaction list on each run.

mod anomaly;
mod breakdown;
mod overview;
mod recurring;
mod savings;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::config::{AnalysisConfig, SavingsConfig, Settings};
use crate::models::{Transaction, TransactionSource};

pub use anomaly::{detect_anomalies, Anomaly, AnomalyKind, Severity};
pub use breakdown::{
    category_breakdown, merchant_breakdown, monthly_cash_flow, CategoryBreakdownEntry,
    MerchantBreakdownEntry, MonthlyCashFlow,
};
pub use overview::{overview, Overview};
pub use recurring::{classify_interval, detect_recurring, RecurringPayment};
pub use savings::{savings_opportunities, SavingsKind, SavingsOpportunity};

/// Everything computed for one statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Strategy that produced the transactions
    pub source: TransactionSource,
    /// True when the transactions are fabricated sample data
    pub synthetic: bool,
    pub overview: Overview,
    pub categories: Vec<CategoryBreakdownEntry>,
    pub merchants: Vec<MerchantBreakdownEntry>,
    pub monthly_cash_flow: Vec<MonthlyCashFlow>,
    pub recurring: Vec<RecurringPayment>,
    pub anomalies: Vec<Anomaly>,
    pub savings: Vec<SavingsOpportunity>,
    pub transactions: Vec<Transaction>,
}

/// Runs every analysis section with one set of thresholds
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
    savings: SavingsConfig,
    as_of: Option<NaiveDate>,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig, savings: SavingsConfig) -> Self {
        Self {
            config,
            savings,
            as_of: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.analysis.clone(), settings.savings.clone())
    }

    /// Reference date for month-over-month (defaults to the latest
    /// transaction)
    pub fn with_as_of(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn analyze(&self, transactions: &[Transaction], source: TransactionSource) -> AnalysisReport {
        let overview = overview(transactions, self.as_of);
        let categories = category_breakdown(transactions);
        let merchants = merchant_breakdown(transactions, self.config.top_merchants);
        let monthly_cash_flow = monthly_cash_flow(transactions);
        let recurring = detect_recurring(transactions);
        let anomalies = detect_anomalies(transactions, &self.config);
        let savings = savings_opportunities(&categories, &recurring, &self.savings);

        info!(
            "Analyzed {} transactions ({}): {} recurring, {} anomalies, {} savings suggestions",
            transactions.len(),
            source,
            recurring.len(),
            anomalies.len(),
            savings.len()
        );

        AnalysisReport {
            source,
            synthetic: source.is_synthetic(),
            overview,
            categories,
            merchants,
            monthly_cash_flow,
            recurring,
            anomalies,
            savings,
            transactions: transactions.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Frequency};
    use crate::sample::synthesize;

    #[test]
    fn test_report_carries_source() {
        let anchor = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let txs = synthesize(anchor);

        let report = Analyzer::default().analyze(&txs, TransactionSource::Synthetic);
        assert!(report.synthetic);
        assert_eq!(report.source, TransactionSource::Synthetic);
        assert_eq!(report.transactions.len(), txs.len());

        let report = Analyzer::default().analyze(&txs, TransactionSource::Structured);
        assert!(!report.synthetic);
    }

    #[test]
    fn test_sample_statement_sections() {
        let anchor = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let report = Analyzer::default().analyze(&synthesize(anchor), TransactionSource::Synthetic);

        assert!(report.overview.total_debits > 0.0);
        assert!(report.overview.total_credits > 0.0);
        assert!(report.merchants.len() <= 10);
        assert!(report
            .recurring
            .iter()
            .any(|r| r.merchant == "NETFLIX.COM" && r.frequency == Frequency::Monthly));
        assert!(report
            .savings
            .iter()
            .any(|s| s.kind == SavingsKind::AvoidBankFees));
        assert!(report
            .categories
            .iter()
            .any(|c| c.category == Category::Income && c.percentage == 0.0));
    }

    #[test]
    fn test_as_of_selects_reference_month() {
        let anchor = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let report = Analyzer::default()
            .with_as_of(NaiveDate::from_ymd_opt(2024, 5, 15))
            .analyze(&synthesize(anchor), TransactionSource::Synthetic);
        assert_eq!(report.overview.reference_month.as_deref(), Some("2024-05"));
    }

    #[test]
    fn test_report_serializes() {
        let anchor = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let report = Analyzer::default().analyze(&synthesize(anchor), TransactionSource::Synthetic);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["synthetic"], true);
        assert_eq!(json["source"], "synthetic");
        assert!(json["transactions"].as_array().unwrap().len() > 10);
    }
}
