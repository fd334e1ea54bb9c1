use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::dividend::DividendPayment;
use crate::models::settings::Settings;
use super::traits::DividendSource;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage `DIVIDENDS` endpoint as a fallback dividend source.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (set via settings as "alphavantage").
/// - **Coverage**: Mostly US listings; symbols have no exchange suffix,
///   which is what `Settings::fallback_symbols` is for.
///
/// The response carries no currency, so every payment is tagged with
/// `Settings::fallback_source_currency`.
pub struct AlphaVantageSource {
    client: Client,
    api_key: String,
    currency: String,
}

impl AlphaVantageSource {
    pub fn new(api_key: String, settings: &Settings) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.request_timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
            currency: settings.fallback_source_currency.clone(),
        }
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct DividendsResponse {
    data: Option<Vec<DividendRecord>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct DividendRecord {
    ex_dividend_date: String,
    amount: String,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DividendSource for AlphaVantageSource {
    fn name(&self) -> &str {
        "Alpha Vantage"
    }

    async fn fetch_dividends(&self, ticker: &str) -> Result<Vec<DividendPayment>, CoreError> {
        let symbol = ticker.trim().to_uppercase();
        let resp: DividendsResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "DIVIDENDS"),
                ("symbol", symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Alpha Vantage".into(),
                message: format!("Failed to parse dividends for {symbol}: {e}"),
            })?;

        let records = match resp.data {
            Some(records) => records,
            None => {
                let reason = resp
                    .note
                    .or(resp.information)
                    .unwrap_or_else(|| "API limit may be exceeded.".to_string());
                return Err(CoreError::Api {
                    provider: "Alpha Vantage".into(),
                    message: format!("No dividend data for {symbol}. {reason}"),
                });
            }
        };

        // Rows with "None" dates or amounts are announcements without data yet.
        let payments = records
            .iter()
            .filter_map(|r| {
                let date = NaiveDate::parse_from_str(&r.ex_dividend_date, "%Y-%m-%d").ok()?;
                let amount: f64 = r.amount.parse().ok()?;
                Some(DividendPayment::new(&symbol, date, amount, self.currency.as_str()))
            })
            .collect();

        Ok(payments)
    }
}
