use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::dividend::DividendPayment;

/// Anything that can deliver the dividend history of a ticker.
///
/// Implementations return payments with timezone-naive dates. Ordering and
/// failure handling are the registry's job: a source just reports what it
/// got, or an error.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait DividendSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch all known dividend payments for `ticker`.
    async fn fetch_dividends(&self, ticker: &str) -> Result<Vec<DividendPayment>, CoreError>;
}

/// Anything that can quote an exchange rate between two fiat currencies.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Units of `to` per one unit of `from`, latest available.
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, CoreError>;
}
