use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An exchange rate together with whether it came from a real lookup.
///
/// `fx_ok == false` means the rate is the 1.0 identity fallback and any
/// amount converted with it is NOT currency-adjusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub fx_ok: bool,
}

impl FxRate {
    /// Same-currency rate. Always exact.
    pub fn identity(currency: &str) -> Self {
        let code = currency.to_uppercase();
        Self {
            from: code.clone(),
            to: code,
            rate: 1.0,
            fx_ok: true,
        }
    }

    /// Identity rate used when the real lookup failed.
    pub fn fallback(from: &str, to: &str) -> Self {
        Self {
            from: from.to_uppercase(),
            to: to.to_uppercase(),
            rate: 1.0,
            fx_ok: false,
        }
    }

    pub fn apply(&self, amount: f64) -> f64 {
        amount * self.rate
    }
}

/// Cache key: (from_currency, to_currency) e.g., ("USD", "EUR")
pub type RateCacheKey = (String, String);

/// Rates looked up during the current process, with the day they were fetched.
///
/// Only successful lookups are stored. The owner decides when entries are too
/// old; nothing here expires on its own.
#[derive(Debug, Clone, Default)]
pub struct RateCache {
    entries: HashMap<RateCacheKey, (f64, NaiveDate)>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached rate if it was fetched on `today`.
    pub fn get_fresh(&self, from: &str, to: &str, today: NaiveDate) -> Option<f64> {
        let key = (from.to_uppercase(), to.to_uppercase());
        self.entries
            .get(&key)
            .filter(|(_, fetched_on)| *fetched_on == today)
            .map(|(rate, _)| *rate)
    }

    pub fn set(&mut self, from: &str, to: &str, rate: f64, fetched_on: NaiveDate) {
        let key = (from.to_uppercase(), to.to_uppercase());
        self.entries.insert(key, (rate, fetched_on));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
