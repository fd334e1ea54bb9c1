use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration as StdDuration;

use crate::errors::CoreError;
use crate::models::dividend::DividendPayment;
use crate::models::settings::Settings;
use super::traits::DividendSource;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) dividend-tracker";

/// Yahoo Finance chart API as a dividend source.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities and ETFs, using Yahoo symbols ("JEN.DE", "O").
/// - **Data**: `events=div` on the chart endpoint; one entry per ex-dividend date.
///
/// Amounts are in the listing currency reported by the chart metadata.
/// London listings quoted in pence (`GBp`) are converted to pounds.
pub struct YahooFinanceSource {
    client: Client,
    history_years: u32,
    default_currency: String,
}

impl YahooFinanceSource {
    pub fn new(settings: &Settings) -> Self {
        let builder = Client::builder().user_agent(USER_AGENT);
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(StdDuration::from_secs(settings.request_timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            history_years: settings.history_years,
            default_currency: settings.default_currency.clone(),
        }
    }

    fn api_error(message: String) -> CoreError {
        CoreError::Api {
            provider: "Yahoo Finance".into(),
            message,
        }
    }
}

// ── Yahoo chart response types ──────────────────────────────────────

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    events: Option<ChartEvents>,
}

#[derive(Deserialize)]
struct ChartMeta {
    currency: Option<String>,
}

#[derive(Deserialize)]
struct ChartEvents {
    dividends: Option<HashMap<String, DividendEvent>>,
}

#[derive(Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

/// Map Yahoo's sub-unit quote currencies to the ISO currency and a divisor.
fn normalize_currency(raw: &str) -> (String, f64) {
    match raw {
        "GBp" | "GBX" => ("GBP".to_string(), 100.0),
        "ZAc" => ("ZAR".to_string(), 100.0),
        other => (other.to_uppercase(), 1.0),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DividendSource for YahooFinanceSource {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch_dividends(&self, ticker: &str) -> Result<Vec<DividendPayment>, CoreError> {
        let symbol = ticker.trim().to_uppercase();
        let now = Utc::now();
        let start = now - Duration::days(365 * i64::from(self.history_years));
        let url = format!("{BASE_URL}/{symbol}");

        let resp: ChartResponse = self
            .client
            .get(&url)
            .query(&[
                ("period1", start.timestamp().to_string()),
                ("period2", now.timestamp().to_string()),
                ("interval", "1mo".to_string()),
                ("events", "div".to_string()),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse chart for {symbol}: {e}")))?;

        if let Some(err) = resp.chart.error {
            return Err(Self::api_error(format!(
                "{symbol}: {} ({})",
                err.description.unwrap_or_default(),
                err.code.unwrap_or_default()
            )));
        }

        let result = resp
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| Self::api_error(format!("No chart data for {symbol}")))?;

        let (currency, divisor) = normalize_currency(
            result
                .meta
                .currency
                .as_deref()
                .unwrap_or(&self.default_currency),
        );

        let dividends = result
            .events
            .and_then(|e| e.dividends)
            .unwrap_or_default();

        let payments = dividends
            .values()
            .filter_map(|event| {
                // Drop the UTC offset: only the calendar date matters downstream.
                let date = chrono::DateTime::from_timestamp(event.date, 0)?.date_naive();
                Some(DividendPayment::new(
                    &symbol,
                    date,
                    event.amount / divisor,
                    currency.as_str(),
                ))
            })
            .collect();

        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pence_are_converted_to_pounds() {
        assert_eq!(normalize_currency("GBp"), ("GBP".to_string(), 100.0));
        assert_eq!(normalize_currency("USD"), ("USD".to_string(), 1.0));
    }

    #[test]
    fn parses_chart_dividend_events() {
        let json = r#"{"chart":{"result":[{"meta":{"currency":"USD"},
            "events":{"dividends":{"1705276800":{"amount":0.5,"date":1705276800}}}}],
            "error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let result = resp.chart.result.unwrap();
        let divs = result[0].events.as_ref().unwrap().dividends.as_ref().unwrap();
        assert_eq!(divs.len(), 1);
        assert_eq!(result[0].meta.currency.as_deref(), Some("USD"));
    }
}
