//! Configuration loading
//!
//! Resolution order:
//! 1. Explicit path (`--config`)
//! 2. `~/.config/bankcsv/bankcsv.toml` (platform config dir)
//! 3. Defaults embedded at compile time from `config/bankcsv.toml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::categorize::Categorizer;
use crate::document::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::error::{Error, Result};
use crate::layout::DEFAULT_LINE_TOLERANCE;
use crate::models::Category;

/// Embedded default configuration
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/bankcsv.toml");

/// Statement parsing limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Y tolerance for line reconstruction
    pub line_tolerance: f64,
    /// Sanity limit for extracted amounts
    pub max_abs_amount: f64,
    /// Largest document accepted for parsing
    pub max_document_bytes: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            max_abs_amount: 50_000.0,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

/// Aggregate analysis thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Merchants kept in the merchant breakdown
    pub top_merchants: usize,
    /// Anomalies kept after severity sort
    pub max_anomalies: usize,
    /// |z| above which a merchant amount is unusual
    pub z_score_threshold: f64,
    /// |z| above which an unusual amount is high severity
    pub high_z_score: f64,
    /// Observations a merchant needs before z-scores apply
    pub min_merchant_observations: usize,
    /// Following transactions compared for duplicates
    pub duplicate_window: usize,
    /// Maximum days between duplicate charges
    pub duplicate_max_days: i64,
    /// Spike threshold in standard deviations above the daily mean
    pub spike_std_multiplier: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_merchants: 10,
            max_anomalies: 10,
            z_score_threshold: 2.0,
            high_z_score: 3.0,
            min_merchant_observations: 3,
            duplicate_window: 9,
            duplicate_max_days: 3,
            spike_std_multiplier: 2.5,
        }
    }
}

/// Savings suggestion rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavingsConfig {
    /// Dining percentage of spend that triggers a suggestion
    pub dining_share_threshold: f64,
    /// Fraction of dining spend offered as savings
    pub dining_savings_rate: f64,
    /// Monthly subscription count above which a review is suggested
    pub subscription_count_threshold: usize,
    /// Fraction of monthly subscription spend offered as savings
    pub subscription_savings_rate: f64,
    /// Fraction of bank fees offered as savings
    pub fee_savings_rate: f64,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            dining_share_threshold: 15.0,
            dining_savings_rate: 0.40,
            subscription_count_threshold: 3,
            subscription_savings_rate: 0.30,
            fee_savings_rate: 1.0,
        }
    }
}

/// Conversion server limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub max_upload_bytes: usize,
    pub convert_timeout_secs: u64,
    pub store_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            convert_timeout_secs: 60,
            store_capacity: 100,
        }
    }
}

/// Effective settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub parsing: ParsingConfig,
    pub analysis: AnalysisConfig,
    pub savings: SavingsConfig,
    /// Extra categorizer keywords keyed by category label
    pub categories: BTreeMap<String, Vec<String>>,
    pub server: ServerConfig,
}

/// Where the effective settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Embedded => write!(f, "built-in defaults"),
        }
    }
}

/// Get the default override location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bankcsv").join("bankcsv.toml"))
}

impl Settings {
    /// Load settings (explicit path, then user override, then embedded)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        Self::load_with_source(override_path).map(|(settings, _)| settings)
    }

    /// Load settings and report which file they came from
    pub fn load_with_source(override_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = override_path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
            return Ok((Self::from_toml(&content)?, ConfigSource::File(path.to_path_buf())));
        }

        if let Some(default_path) = default_config_path() {
            if default_path.exists() {
                debug!("Loading config override from {}", default_path.display());
                let content = fs::read_to_string(&default_path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
                return Ok((Self::from_toml(&content)?, ConfigSource::File(default_path)));
            }
        }

        Ok((Self::from_toml(DEFAULT_CONFIG)?, ConfigSource::Embedded))
    }

    /// Parse settings from TOML, validating category labels
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
    }

    fn validate(&self) -> Result<()> {
        if self.parsing.line_tolerance < 0.0 {
            return Err(Error::Config("parsing.line_tolerance must not be negative".into()));
        }
        if self.parsing.max_abs_amount <= 0.0 {
            return Err(Error::Config("parsing.max_abs_amount must be positive".into()));
        }
        if self.server.store_capacity == 0 {
            return Err(Error::Config("server.store_capacity must be at least 1".into()));
        }
        self.extra_keywords().map(|_| ())
    }

    /// Extra categorizer keywords with parsed category labels
    pub fn extra_keywords(&self) -> Result<Vec<(Category, Vec<String>)>> {
        self.categories
            .iter()
            .map(|(label, keywords)| {
                label
                    .parse::<Category>()
                    .map(|category| (category, keywords.clone()))
                    .map_err(|e| Error::Config(format!("[categories] {}", e)))
            })
            .collect()
    }

    /// Categorizer with built-in keywords plus configured extras
    pub fn categorizer(&self) -> Result<Categorizer> {
        Ok(Categorizer::new().with_extra_keywords(self.extra_keywords()?))
    }
}
