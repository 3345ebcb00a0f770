//! Anomaly detection
//!
//! Detects:
//! - Unusual amounts: per-merchant z-score over debit amounts
//! - Duplicate charges: same merchant and amount within a few days
//! - Spending spikes: days whose debit total is far above the daily mean

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::AnalysisConfig;
use crate::models::Transaction;

/// Anomaly severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What was unusual
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyKind {
    HighAmount {
        transaction: Transaction,
        expected_mean: f64,
        actual_amount: f64,
        z_score: f64,
    },
    DuplicateCharge {
        transaction: Transaction,
        related_transaction: Transaction,
        days_between: i64,
    },
    SpendingSpike {
        date: NaiveDate,
        amount: f64,
        expected_mean: f64,
        z_score: f64,
    },
}

/// A flagged transaction or day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: AnomalyKind,
}

impl Anomaly {
    /// Duplicates are always high; z-score findings are high above
    /// `high_z`, medium otherwise
    pub fn new(kind: AnomalyKind, high_z: f64) -> Self {
        let severity = match &kind {
            AnomalyKind::DuplicateCharge { .. } => Severity::High,
            AnomalyKind::HighAmount { z_score, .. } | AnomalyKind::SpendingSpike { z_score, .. } => {
                if z_score.abs() > high_z {
                    Severity::High
                } else {
                    Severity::Medium
                }
            }
        };
        Self { severity, kind }
    }

    /// One-line human description
    pub fn summary(&self) -> String {
        match &self.kind {
            AnomalyKind::HighAmount {
                transaction,
                expected_mean,
                actual_amount,
                ..
            } => format!(
                "Unusual amount at {}: {:.2} (usually {:.2})",
                transaction.merchant, actual_amount, expected_mean
            ),
            AnomalyKind::DuplicateCharge {
                transaction,
                days_between,
                ..
            } => format!(
                "Possible duplicate charge at {}: {:.2} twice within {} day(s)",
                transaction.merchant,
                transaction.amount().abs(),
                days_between
            ),
            AnomalyKind::SpendingSpike {
                date,
                amount,
                expected_mean,
                ..
            } => format!(
                "Spending spike on {}: {:.2} (daily average {:.2})",
                date, amount, expected_mean
            ),
        }
    }
}

/// Mean and population standard deviation
pub(crate) fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Run all scans, most severe first, capped at `max_anomalies`
pub fn detect_anomalies(transactions: &[Transaction], config: &AnalysisConfig) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    anomalies.extend(unusual_amounts(transactions, config));
    anomalies.extend(duplicate_charges(transactions, config));
    anomalies.extend(spending_spikes(transactions, config));

    // Stable: equal severities keep scan order
    anomalies.sort_by(|a, b| b.severity.priority().cmp(&a.severity.priority()));
    anomalies.truncate(config.max_anomalies);
    anomalies
}

fn unusual_amounts(transactions: &[Transaction], config: &AnalysisConfig) -> Vec<Anomaly> {
    let mut by_merchant: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_debit()) {
        by_merchant.entry(t.merchant.as_str()).or_default().push(t);
    }

    let mut found = Vec::new();
    for txs in by_merchant.values() {
        if txs.len() < config.min_merchant_observations {
            continue;
        }

        let amounts: Vec<f64> = txs.iter().map(|t| t.amount().abs()).collect();
        let (mean, std_dev) = mean_and_std(&amounts);
        if std_dev == 0.0 {
            continue;
        }

        for (t, amount) in txs.iter().zip(&amounts) {
            let z_score = (amount - mean) / std_dev;
            if z_score.abs() > config.z_score_threshold {
                found.push(Anomaly::new(
                    AnomalyKind::HighAmount {
                        transaction: (*t).clone(),
                        expected_mean: mean,
                        actual_amount: *amount,
                        z_score,
                    },
                    config.high_z_score,
                ));
            }
        }
    }
    found
}

fn duplicate_charges(transactions: &[Transaction], config: &AnalysisConfig) -> Vec<Anomaly> {
    let mut debits: Vec<&Transaction> = transactions.iter().filter(|t| t.is_debit()).collect();
    debits.sort_by_key(|t| t.date);

    let cents = |t: &Transaction| (t.amount().abs() * 100.0).round() as i64;

    let mut found = Vec::new();
    for (i, t) in debits.iter().enumerate() {
        let related = debits
            .iter()
            .skip(i + 1)
            .take(config.duplicate_window)
            .find(|other| {
                other.merchant == t.merchant
                    && cents(other) == cents(t)
                    && (other.date - t.date).num_days() <= config.duplicate_max_days
            });

        if let Some(other) = related {
            found.push(Anomaly::new(
                AnomalyKind::DuplicateCharge {
                    transaction: (*other).clone(),
                    related_transaction: (*t).clone(),
                    days_between: (other.date - t.date).num_days(),
                },
                config.high_z_score,
            ));
        }
    }
    found
}

fn spending_spikes(transactions: &[Transaction], config: &AnalysisConfig) -> Vec<Anomaly> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_debit()) {
        *daily.entry(t.date).or_insert(0.0) += t.amount().abs();
    }

    let totals: Vec<f64> = daily.values().copied().collect();
    let (mean, std_dev) = mean_and_std(&totals);
    if std_dev == 0.0 {
        return Vec::new();
    }

    let threshold = mean + config.spike_std_multiplier * std_dev;
    daily
        .into_iter()
        .filter(|(_, amount)| *amount > threshold)
        .map(|(date, amount)| {
            Anomaly::new(
                AnomalyKind::SpendingSpike {
                    date,
                    amount,
                    expected_mean: mean,
                    z_score: (amount - mean) / std_dev,
                },
                config.high_z_score,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(n)
    }

    fn tx(n: i64, merchant: &str, amount: f64) -> Transaction {
        Transaction::new(day(n), merchant, amount, Category::Shopping, merchant)
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn test_mean_and_std() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
        assert_eq!(mean_and_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_high_z_score_is_high_severity() {
        // Ten charges of 50 and one of 600: mean 100, population sd ~158, z ~3.16
        let mut txs: Vec<Transaction> = (0..10).map(|i| tx(i * 7, "Shop", -50.0)).collect();
        txs.push(tx(80, "Shop", -600.0));

        let found = unusual_amounts(&txs, &config());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::High);
        match &found[0].kind {
            AnomalyKind::HighAmount {
                actual_amount,
                expected_mean,
                z_score,
                ..
            } => {
                assert_eq!(*actual_amount, 600.0);
                assert_eq!(*expected_mean, 100.0);
                assert!(*z_score > 3.0 && *z_score < 3.2);
            }
            other => panic!("unexpected anomaly: {:?}", other),
        }
    }

    #[test]
    fn test_moderate_z_score_is_medium() {
        // Seven charges of 50 and one of 150: z ~2.65
        let mut txs: Vec<Transaction> = (0..7).map(|i| tx(i * 7, "Shop", -50.0)).collect();
        txs.push(tx(60, "Shop", -150.0));

        let found = unusual_amounts(&txs, &config());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn test_needs_minimum_observations() {
        let txs = vec![tx(0, "Shop", -10.0), tx(7, "Shop", -500.0)];
        assert!(unusual_amounts(&txs, &config()).is_empty());
    }

    #[test]
    fn test_duplicate_within_window() {
        let txs = vec![
            tx(0, "Coolblue", -129.00),
            tx(2, "Coolblue", -129.00),
            tx(10, "Coolblue", -129.00),
        ];

        let found = duplicate_charges(&txs, &config());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::High);
        match &found[0].kind {
            AnomalyKind::DuplicateCharge { days_between, .. } => assert_eq!(*days_between, 2),
            other => panic!("unexpected anomaly: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_scan_is_bounded() {
        // Ten other charges on the same day push the repeat out of reach
        let mut txs = vec![tx(0, "Coolblue", -129.00)];
        txs.extend((0..10).map(|i| tx(0, &format!("Other {}", i), -1.0 - i as f64)));
        txs.push(tx(1, "Coolblue", -129.00));

        assert!(duplicate_charges(&txs, &config()).is_empty());
    }

    #[test]
    fn test_spending_spike() {
        let mut txs: Vec<Transaction> = (0..10).map(|i| tx(i, "Daily", -20.0)).collect();
        txs.push(tx(10, "Big", -500.0));

        let found = spending_spikes(&txs, &config());
        assert_eq!(found.len(), 1);
        match &found[0].kind {
            AnomalyKind::SpendingSpike { date, amount, .. } => {
                assert_eq!(*date, day(10));
                assert_eq!(*amount, 500.0);
            }
            other => panic!("unexpected anomaly: {:?}", other),
        }
    }

    #[test]
    fn test_sorted_by_severity_and_truncated() {
        let mut txs: Vec<Transaction> = (0..10).map(|i| tx(i * 7, "Shop", -50.0)).collect();
        txs.push(tx(80, "Shop", -600.0));
        txs.push(tx(81, "Dup", -10.0));
        txs.push(tx(81, "Dup", -10.0));

        let config = AnalysisConfig {
            max_anomalies: 2,
            ..AnalysisConfig::default()
        };
        let found = detect_anomalies(&txs, &config);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.severity == Severity::High));
        assert!(found
            .windows(2)
            .all(|w| w[0].severity.priority() >= w[1].severity.priority()));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let anomaly = Anomaly::new(
            AnomalyKind::SpendingSpike {
                date: day(0),
                amount: 500.0,
                expected_mean: 20.0,
                z_score: 3.5,
            },
            3.0,
        );
        let json = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(json["kind"], "spending_spike");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["amount"], 500.0);
    }
}
