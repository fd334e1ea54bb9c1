use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// One portfolio line: a ticker, how many shares are held, and the
/// withholding tax applied to its dividends.
///
/// Holdings are built by the portfolio loader and never mutated afterwards.
/// `tax_rate_pct` and `currency` are per-holding; the loader fills them from
/// `Settings::default_tax_rate_pct` / `Settings::default_currency` when the
/// input has no such column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol, trimmed and uppercased (e.g., "AAPL", "O", "JEN.DE")
    pub ticker: String,

    /// Number of shares held (always positive)
    pub shares: f64,

    /// Withholding tax in percent, 0..=100
    #[serde(default)]
    pub tax_rate_pct: f64,

    /// Native dividend currency, if known. Sources that report a currency win.
    #[serde(default)]
    pub currency: Option<String>,
}

impl Holding {
    /// Create a validated holding with no tax and no currency hint.
    pub fn new(ticker: impl Into<String>, shares: f64) -> Result<Self, CoreError> {
        Self::with_details(ticker, shares, 0.0, None)
    }

    /// Create a validated holding with every field given explicitly.
    pub fn with_details(
        ticker: impl Into<String>,
        shares: f64,
        tax_rate_pct: f64,
        currency: Option<String>,
    ) -> Result<Self, CoreError> {
        let ticker = ticker.into().trim().to_uppercase();
        if ticker.is_empty() {
            return Err(CoreError::Configuration("ticker must not be empty".into()));
        }
        if !shares.is_finite() || shares <= 0.0 {
            return Err(CoreError::Configuration(format!(
                "share count for {ticker} must be a positive number, got {shares}"
            )));
        }
        if !tax_rate_pct.is_finite() || !(0.0..=100.0).contains(&tax_rate_pct) {
            return Err(CoreError::Configuration(format!(
                "tax rate for {ticker} must be between 0 and 100, got {tax_rate_pct}"
            )));
        }
        let currency = currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty());

        Ok(Self {
            ticker,
            shares,
            tax_rate_pct,
            currency,
        })
    }

    /// Fraction of the gross amount kept after tax, e.g. 0.7363 for 26.375 %.
    #[must_use]
    pub fn net_factor(&self) -> f64 {
        1.0 - self.tax_rate_pct / 100.0
    }
}
