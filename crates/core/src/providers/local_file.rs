use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Read;

use crate::errors::CoreError;
use crate::models::dividend::DividendPayment;
use crate::services::portfolio_loader::{find_column, parse_number};
use super::traits::DividendSource;

const DATE_COLUMNS: &[&str] = &["date", "datum", "ex_date", "ex_dividend_date", "payment_date"];
const TICKER_COLUMNS: &[&str] = &["ticker", "symbol", "aktie"];
const AMOUNT_COLUMNS: &[&str] = &["amount", "dividend", "dividende", "dividend_per_share"];
const CURRENCY_COLUMNS: &[&str] = &["currency", "währung", "waehrung"];

/// Dividend history held in memory, read from a CSV file or handed over
/// by the portfolio loader for pre-tabulated portfolios.
///
/// History CSV layout: header row with `ticker`, `date`, `amount` and an
/// optional `currency` column. Dates may be `YYYY-MM-DD`, `DD.MM.YYYY` or
/// RFC 3339 timestamps (the offset is dropped).
#[derive(Debug, Clone, Default)]
pub struct LocalFileSource {
    payments: HashMap<String, Vec<DividendPayment>>,
}

impl LocalFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_payments(payments: Vec<DividendPayment>) -> Self {
        let mut source = Self::new();
        source.extend(payments);
        source
    }

    /// Parse a dividend history CSV. `default_currency` tags rows without one.
    pub fn from_csv_reader<R: Read>(reader: R, default_currency: &str) -> Result<Self, CoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let ticker_idx = find_column(&headers, TICKER_COLUMNS);
        let date_idx = find_column(&headers, DATE_COLUMNS);
        let amount_idx = find_column(&headers, AMOUNT_COLUMNS);
        let currency_idx = find_column(&headers, CURRENCY_COLUMNS);

        let (ticker_idx, date_idx, amount_idx) = match (ticker_idx, date_idx, amount_idx) {
            (Some(t), Some(d), Some(a)) => (t, d, a),
            _ => {
                let missing = [("ticker", ticker_idx), ("date", date_idx), ("amount", amount_idx)]
                    .iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect();
                return Err(CoreError::Schema { missing });
            }
        };

        let mut payments = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let line = i + 2;
            let ticker = record.get(ticker_idx).unwrap_or("").trim();
            if ticker.is_empty() {
                return Err(CoreError::InvalidRow {
                    line,
                    message: "empty ticker".into(),
                });
            }
            let raw_date = record.get(date_idx).unwrap_or("");
            let date = parse_date(raw_date).ok_or_else(|| CoreError::InvalidRow {
                line,
                message: format!("unrecognized date '{raw_date}'"),
            })?;
            let raw_amount = record.get(amount_idx).unwrap_or("");
            let amount = parse_number(raw_amount).ok_or_else(|| CoreError::InvalidRow {
                line,
                message: format!("invalid dividend amount '{raw_amount}'"),
            })?;
            let currency = currency_idx
                .and_then(|idx| record.get(idx))
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(default_currency);

            payments.push(DividendPayment::new(ticker, date, amount, currency));
        }

        log::debug!("Loaded {} dividend payments from history file", payments.len());
        Ok(Self::from_payments(payments))
    }

    /// Read a dividend history CSV from disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(
        path: impl AsRef<std::path::Path>,
        default_currency: &str,
    ) -> Result<Self, CoreError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, default_currency)
    }

    pub fn extend(&mut self, payments: impl IntoIterator<Item = DividendPayment>) {
        for payment in payments {
            self.payments
                .entry(payment.ticker.clone())
                .or_default()
                .push(payment);
        }
    }

    /// Take over every payment of `other`.
    pub fn merge(&mut self, other: LocalFileSource) {
        self.extend(other.payments.into_values().flatten());
    }

    /// Number of distinct tickers with at least one payment.
    pub fn ticker_count(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

/// Parse a date, dropping any timezone annotation.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%d.%m.%Y") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local().date());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DividendSource for LocalFileSource {
    fn name(&self) -> &str {
        "Local file"
    }

    async fn fetch_dividends(&self, ticker: &str) -> Result<Vec<DividendPayment>, CoreError> {
        Ok(self
            .payments
            .get(&ticker.trim().to_uppercase())
            .cloned()
            .unwrap_or_default())
    }
}
