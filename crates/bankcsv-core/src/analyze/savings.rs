//! Rule-based savings suggestions

use serde::Serialize;

use crate::config::SavingsConfig;
use crate::models::{Category, Frequency};

use super::breakdown::CategoryBreakdownEntry;
use super::recurring::RecurringPayment;

/// Which rule produced a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsKind {
    ReduceDining,
    ReviewSubscriptions,
    AvoidBankFees,
}

/// A suggested way to spend less
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsOpportunity {
    pub kind: SavingsKind,
    pub title: String,
    pub description: String,
    /// Spend the rule looked at
    pub current_spend: f64,
    pub potential_savings: f64,
}

/// Apply the dining, subscription and bank-fee rules
pub fn savings_opportunities(
    categories: &[CategoryBreakdownEntry],
    recurring: &[RecurringPayment],
    config: &SavingsConfig,
) -> Vec<SavingsOpportunity> {
    let mut opportunities = Vec::new();

    if let Some(dining) = categories.iter().find(|e| e.category == Category::Dining) {
        if dining.percentage > config.dining_share_threshold {
            opportunities.push(SavingsOpportunity {
                kind: SavingsKind::ReduceDining,
                title: "Cut back on dining out".to_string(),
                description: format!(
                    "Dining is {:.1}% of your spending. Cooking at home more often could save about {:.0}% of it.",
                    dining.percentage,
                    config.dining_savings_rate * 100.0
                ),
                current_spend: dining.total,
                potential_savings: dining.total * config.dining_savings_rate,
            });
        }
    }

    let subscriptions: Vec<&RecurringPayment> = recurring
        .iter()
        .filter(|r| r.is_debit && r.frequency == Frequency::Monthly)
        .collect();
    if subscriptions.len() > config.subscription_count_threshold {
        let monthly_total: f64 = subscriptions.iter().map(|r| r.amount).sum();
        opportunities.push(SavingsOpportunity {
            kind: SavingsKind::ReviewSubscriptions,
            title: "Review your subscriptions".to_string(),
            description: format!(
                "You have {} monthly subscriptions totalling {:.2} per month. Cancelling the ones you rarely use could save about {:.0}%.",
                subscriptions.len(),
                monthly_total,
                config.subscription_savings_rate * 100.0
            ),
            current_spend: monthly_total,
            potential_savings: monthly_total * config.subscription_savings_rate,
        });
    }

    if let Some(fees) = categories
        .iter()
        .find(|e| e.category == Category::BankFees && e.total > 0.0)
    {
        opportunities.push(SavingsOpportunity {
            kind: SavingsKind::AvoidBankFees,
            title: "Avoid bank fees".to_string(),
            description: format!(
                "You paid {:.2} in bank fees across {} charge(s). A fee-free account or plan could remove them.",
                fees.total, fees.count
            ),
            current_spend: fees.total,
            potential_savings: fees.total * config.fee_savings_rate,
        });
    }

    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(category: Category, total: f64, percentage: f64) -> CategoryBreakdownEntry {
        CategoryBreakdownEntry {
            category,
            total,
            count: 2,
            transactions: Vec::new(),
            percentage,
        }
    }

    fn monthly(merchant: &str, amount: f64) -> RecurringPayment {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        RecurringPayment {
            merchant: merchant.to_string(),
            amount,
            category: Category::Entertainment,
            is_debit: true,
            frequency: Frequency::Monthly,
            occurrences: 3,
            average_interval_days: 30.0,
            last_date: date,
            next_date: date,
        }
    }

    #[test]
    fn test_dining_rule() {
        let config = SavingsConfig::default();

        let found = savings_opportunities(&[entry(Category::Dining, 200.0, 20.0)], &[], &config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, SavingsKind::ReduceDining);
        assert_eq!(found[0].potential_savings, 80.0);

        let found = savings_opportunities(&[entry(Category::Dining, 200.0, 15.0)], &[], &config);
        assert!(found.is_empty());
    }

    #[test]
    fn test_subscription_rule_needs_more_than_three() {
        let config = SavingsConfig::default();
        let three = vec![monthly("A", 10.0), monthly("B", 10.0), monthly("C", 10.0)];
        assert!(savings_opportunities(&[], &three, &config).is_empty());

        let mut four = three.clone();
        four.push(monthly("D", 10.0));
        let found = savings_opportunities(&[], &four, &config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, SavingsKind::ReviewSubscriptions);
        assert_eq!(found[0].current_spend, 40.0);
        assert_eq!(found[0].potential_savings, 12.0);
    }

    #[test]
    fn test_credits_are_not_subscriptions() {
        let mut payments: Vec<RecurringPayment> =
            ["A", "B", "C", "D"].iter().map(|m| monthly(m, 10.0)).collect();
        payments[0].is_debit = false;
        assert!(savings_opportunities(&[], &payments, &SavingsConfig::default()).is_empty());
    }

    #[test]
    fn test_fee_rule() {
        let found = savings_opportunities(
            &[entry(Category::BankFees, 6.5, 1.0)],
            &[],
            &SavingsConfig::default(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, SavingsKind::AvoidBankFees);
        assert_eq!(found[0].potential_savings, 6.5);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let config = SavingsConfig {
            dining_share_threshold: 10.0,
            dining_savings_rate: 0.5,
            ..SavingsConfig::default()
        };
        let found = savings_opportunities(&[entry(Category::Dining, 100.0, 12.0)], &[], &config);
        assert_eq!(found[0].potential_savings, 50.0);
    }
}
