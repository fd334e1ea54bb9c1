use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::dividend::DividendPayment;
use crate::models::fx::{FxRate, RateCache};
use crate::providers::traits::RateProvider;

/// Converted amount plus the rate that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub amount: f64,
    pub rate: FxRate,
}

/// Currency normalizer: looks up rates and never fails.
///
/// - Same currency → 1.0, no lookup.
/// - Lookup error, no provider, or a nonsensical rate → 1.0 with
///   `fx_ok = false` and a warning.
///
/// Successful lookups are cached for the day they were fetched.
/// `fresh_rate` bypasses the cache and `clear_cache` drops it.
pub struct CurrencyService {
    provider: Option<Box<dyn RateProvider>>,
    cache: RateCache,
}

impl CurrencyService {
    pub fn new(provider: Box<dyn RateProvider>) -> Self {
        Self {
            provider: Some(provider),
            cache: RateCache::new(),
        }
    }

    /// A normalizer with no rate source. Every cross-currency rate is the
    /// flagged identity fallback.
    pub fn offline() -> Self {
        Self {
            provider: None,
            cache: RateCache::new(),
        }
    }

    /// Rate from `from` into `to`, served from today's cache when possible.
    pub async fn rate(&mut self, from: &str, to: &str) -> FxRate {
        self.lookup(from, to, false).await
    }

    /// Rate from `from` into `to`, always asking the provider.
    pub async fn fresh_rate(&mut self, from: &str, to: &str) -> FxRate {
        self.lookup(from, to, true).await
    }

    /// Convert `amount` from `from` into `to`.
    pub async fn convert(&mut self, amount: f64, from: &str, to: &str) -> Converted {
        let rate = self.rate(from, to).await;
        Converted {
            amount: rate.apply(amount),
            rate,
        }
    }

    /// Restate every payment in `to`, one rate per payout currency.
    ///
    /// The flag is false if any of those rates was the identity fallback.
    pub async fn convert_payments(
        &mut self,
        payments: &[DividendPayment],
        to: &str,
    ) -> (Vec<DividendPayment>, bool) {
        let mut all_ok = true;
        let mut converted = Vec::with_capacity(payments.len());
        for p in payments {
            let rate = self.rate(&p.currency, to).await;
            all_ok &= rate.fx_ok;
            converted.push(DividendPayment {
                amount_per_share: rate.apply(p.amount_per_share),
                currency: rate.to,
                ..p.clone()
            });
        }
        (converted, all_ok)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached_rates(&self) -> usize {
        self.cache.len()
    }

    async fn lookup(&mut self, from: &str, to: &str, bypass_cache: bool) -> FxRate {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();
        if from == to {
            return FxRate::identity(&from);
        }

        let today: NaiveDate = chrono::Utc::now().date_naive();
        if !bypass_cache {
            if let Some(rate) = self.cache.get_fresh(&from, &to, today) {
                return FxRate { from, to, rate, fx_ok: true };
            }
        }

        match self.fetch(&from, &to).await {
            Ok(rate) => {
                self.cache.set(&from, &to, rate, today);
                FxRate { from, to, rate, fx_ok: true }
            }
            Err(e) => {
                log::warn!("Using identity rate for {from} → {to}: {e}");
                FxRate::fallback(&from, &to)
            }
        }
    }

    async fn fetch(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        let provider = self.provider.as_ref().ok_or_else(|| CoreError::Conversion {
            from: from.to_string(),
            to: to.to_string(),
            message: "no rate provider configured".into(),
        })?;

        let rate = provider
            .get_rate(from, to)
            .await
            .map_err(|e| CoreError::Conversion {
                from: from.to_string(),
                to: to.to_string(),
                message: format!("{}: {e}", provider.name()),
            })?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::Conversion {
                from: from.to_string(),
                to: to.to_string(),
                message: format!("{} returned invalid rate {rate}", provider.name()),
            });
        }
        Ok(rate)
    }
}
