use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::RateProvider;

const LATEST_URL: &str = "https://api.frankfurter.dev/v1/latest";

/// ECB reference rates from the Frankfurter API.
///
/// No API key. Only the latest fixing is requested: projections are forward
/// estimates and are converted at the current rate. Same-currency pairs never
/// reach this provider; `CurrencyService` answers those itself.
pub struct FrankfurterProvider {
    client: Client,
}

impl FrankfurterProvider {
    pub fn new(timeout_secs: u64) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(timeout_secs));
        #[cfg(target_arch = "wasm32")]
        let _ = timeout_secs;
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }

    fn api_error(message: String) -> CoreError {
        CoreError::Api {
            provider: "Frankfurter".into(),
            message,
        }
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new(30)
    }
}

#[derive(Deserialize)]
struct LatestRates {
    /// Fixing date, e.g. "2025-01-15"
    date: String,
    rates: HashMap<String, f64>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        "Frankfurter"
    }

    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        // Unsupported codes come back as 404, which is a lookup failure too.
        let latest: LatestRates = self
            .client
            .get(LATEST_URL)
            .query(&[("base", from), ("symbols", to)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("unreadable rates for {from}/{to}: {e}")))?;

        let rate = latest
            .rates
            .get(to)
            .copied()
            .ok_or_else(|| Self::api_error(format!("{to} missing from {from} fixing")))?;
        log::debug!("{from} → {to} = {rate} (ECB fixing {})", latest.date);
        Ok(rate)
    }
}
