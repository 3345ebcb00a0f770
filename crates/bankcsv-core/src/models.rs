//! Domain models for BankCSV

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// A single statement transaction
///
/// The debit/credit type is never stored: it is derived from the sign of
/// `amount` every time it is read, so it cannot disagree with the amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    amount: f64,
    pub category: Category,
    pub merchant: String,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        category: Category,
        merchant: impl Into<String>,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            category,
            merchant: merchant.into(),
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.amount = amount;
    }

    /// Negative amounts are debits, everything else is a credit
    pub fn transaction_type(&self) -> TransactionType {
        if self.amount < 0.0 {
            TransactionType::Debit
        } else {
            TransactionType::Credit
        }
    }

    pub fn is_debit(&self) -> bool {
        self.transaction_type() == TransactionType::Debit
    }

    pub fn is_credit(&self) -> bool {
        self.transaction_type() == TransactionType::Credit
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Transaction", 6)?;
        state.serialize_field("date", &self.date)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("amount", &self.amount)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("merchant", &self.merchant)?;
        state.serialize_field("type", &self.transaction_type())?;
        state.end()
    }
}

/// Debit or credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending category labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Groceries,
    Dining,
    Transportation,
    Shopping,
    Entertainment,
    Utilities,
    Housing,
    Healthcare,
    Insurance,
    Education,
    Travel,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[serde(rename = "Bank Fees")]
    BankFees,
    Cash,
    Transfers,
    Income,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "Groceries",
            Self::Dining => "Dining",
            Self::Transportation => "Transportation",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::Utilities => "Utilities",
            Self::Housing => "Housing",
            Self::Healthcare => "Healthcare",
            Self::Insurance => "Insurance",
            Self::Education => "Education",
            Self::Travel => "Travel",
            Self::PersonalCare => "Personal Care",
            Self::BankFees => "Bank Fees",
            Self::Cash => "Cash",
            Self::Transfers => "Transfers",
            Self::Income => "Income",
            Self::Other => "Other",
        }
    }

    /// Get all categories
    pub fn all() -> &'static [Category] {
        &[
            Self::Groceries,
            Self::Dining,
            Self::Transportation,
            Self::Shopping,
            Self::Entertainment,
            Self::Utilities,
            Self::Housing,
            Self::Healthcare,
            Self::Insurance,
            Self::Education,
            Self::Travel,
            Self::PersonalCare,
            Self::BankFees,
            Self::Cash,
            Self::Transfers,
            Self::Income,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|c| {
                c.as_str()
                    .chars()
                    .filter(|ch| ch.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
                    == wanted
            })
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which extraction strategy produced a transaction list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Parsed from reconstructed statement lines
    Structured,
    /// Parsed from flattened text segmented at dates
    LineBased,
    /// Fabricated sample data; nothing could be parsed
    Synthetic,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::LineBased => "line_based",
            Self::Synthetic => "synthetic",
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic)
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Statement layouts with a dedicated parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementDialect {
    /// Any bank; ordered date/amount pattern cascade
    Generic,
    /// ING Netherlands (Af/Bij columns, two-line records)
    Ing,
}

impl StatementDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Ing => "ing",
        }
    }
}

impl std::fmt::Display for StatementDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurring payment cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    Annual,
    Variable,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::BiWeekly => "Bi-weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Annual => "Annual",
            Self::Variable => "Variable",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One positioned item from a document text layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedTextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl PositionedTextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// A page of positioned text fragments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextPage {
    #[serde(default)]
    pub number: u32,
    #[serde(alias = "items", default)]
    pub fragments: Vec<PositionedTextFragment>,
}

/// A reconstructed logical line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    /// Reference Y of the cluster the line was built from
    pub y: f64,
    pub text: String,
}
