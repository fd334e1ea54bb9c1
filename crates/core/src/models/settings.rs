use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;

/// Explicit configuration for a tracker instance.
///
/// Everything the loader and the sources need (column names, API keys,
/// timeouts, symbol remapping) lives here rather than in globals. All fields
/// have defaults, so a partial JSON document is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Currency of the report totals (e.g., "EUR", "USD", "PLN").
    pub reporting_currency: String,

    /// Currency assumed for holdings whose input row and source give none.
    pub default_currency: String,

    /// Tax rate in percent for holdings without a tax column value.
    pub default_tax_rate_pct: f64,

    /// Recognized header names per logical portfolio column.
    pub columns: ColumnAliases,

    /// Ticker → symbol used by fallback sources only (e.g., "JEN.DE" → "JEN").
    pub fallback_symbols: HashMap<String, String>,

    /// Optional API keys for sources that require them.
    /// Keys: source name (e.g., "alphavantage").
    pub api_keys: HashMap<String, String>,

    /// Per-request timeout for every network call.
    pub request_timeout_secs: u64,

    /// How many years of dividend history to request from online sources.
    pub history_years: u32,

    /// Currency assumed for Alpha Vantage amounts, which carry none.
    pub fallback_source_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reporting_currency: "EUR".to_string(),
            default_currency: "EUR".to_string(),
            default_tax_rate_pct: 0.0,
            columns: ColumnAliases::default(),
            fallback_symbols: HashMap::new(),
            api_keys: HashMap::new(),
            request_timeout_secs: 30,
            history_years: 5,
            fallback_source_currency: "USD".to_string(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file on disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every field for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, code) in [
            ("reporting_currency", &self.reporting_currency),
            ("default_currency", &self.default_currency),
            ("fallback_source_currency", &self.fallback_source_currency),
        ] {
            if !is_currency_code(code) {
                return Err(CoreError::Configuration(format!(
                    "{field} '{code}' must be exactly 3 ASCII letters (e.g., USD, EUR, PLN)"
                )));
            }
        }
        if !self.default_tax_rate_pct.is_finite()
            || !(0.0..=100.0).contains(&self.default_tax_rate_pct)
        {
            return Err(CoreError::Configuration(format!(
                "default_tax_rate_pct must be between 0 and 100, got {}",
                self.default_tax_rate_pct
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Configuration(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.history_years == 0 {
            return Err(CoreError::Configuration(
                "history_years must be at least 1".into(),
            ));
        }
        self.columns.validate()
    }

    /// Set the reporting currency after validating the code.
    pub fn set_reporting_currency(&mut self, currency: &str) -> Result<(), CoreError> {
        let trimmed = currency.trim().to_uppercase();
        if !is_currency_code(&trimmed) {
            return Err(CoreError::Configuration(format!(
                "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., USD, EUR, PLN)"
            )));
        }
        self.reporting_currency = trimmed;
        Ok(())
    }

    fn normalize(&mut self) {
        self.reporting_currency = self.reporting_currency.trim().to_uppercase();
        self.default_currency = self.default_currency.trim().to_uppercase();
        self.fallback_source_currency = self.fallback_source_currency.trim().to_uppercase();
        self.fallback_symbols = self
            .fallback_symbols
            .drain()
            .map(|(k, v)| (k.trim().to_uppercase(), v.trim().to_string()))
            .collect();
    }
}

/// Header names accepted for each logical column, matched case-insensitively.
///
/// Defaults cover English headers and the German `portfolio.csv` layout
/// (`Aktie,Stückzahl,Monat,Jahr,Dividende`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub ticker: Vec<String>,
    pub shares: Vec<String>,
    pub tax_rate: Vec<String>,
    pub currency: Vec<String>,
    pub month: Vec<String>,
    pub year: Vec<String>,
    pub dividend: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            ticker: names(&["ticker", "symbol", "aktie"]),
            shares: names(&["shares", "quantity", "stückzahl", "stueckzahl", "anzahl"]),
            tax_rate: names(&["tax_rate", "tax", "tax_rate_pct", "steuer", "steuersatz"]),
            currency: names(&["currency", "währung", "waehrung"]),
            month: names(&["month", "monat"]),
            year: names(&["year", "jahr"]),
            dividend: names(&["dividend", "dividende", "dividend_per_share", "amount"]),
        }
    }
}

impl ColumnAliases {
    fn validate(&self) -> Result<(), CoreError> {
        if self.ticker.is_empty() || self.shares.is_empty() {
            return Err(CoreError::Configuration(
                "column aliases for ticker and shares must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
