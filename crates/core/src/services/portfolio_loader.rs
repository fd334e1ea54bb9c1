use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;

use crate::errors::CoreError;
use crate::models::dividend::DividendPayment;
use crate::models::holding::Holding;
use crate::models::settings::{ColumnAliases, Settings};
use crate::providers::local_file::LocalFileSource;

/// Output of the loader: holdings in file order, plus the payments of a
/// pre-tabulated portfolio (empty for a plain holdings file).
#[derive(Debug, Clone, Default)]
pub struct LoadedPortfolio {
    pub holdings: Vec<Holding>,
    pub payments: Vec<DividendPayment>,
}

impl LoadedPortfolio {
    /// True if the file carried month/year/dividend columns.
    #[must_use]
    pub fn is_pretabulated(&self) -> bool {
        !self.payments.is_empty()
    }

    /// The pre-tabulated payments as a dividend source, if there are any.
    #[must_use]
    pub fn local_source(&self) -> Option<LocalFileSource> {
        if self.payments.is_empty() {
            None
        } else {
            Some(LocalFileSource::from_payments(self.payments.clone()))
        }
    }
}

/// Column positions resolved from the header row.
struct Layout {
    ticker: usize,
    shares: usize,
    tax_rate: Option<usize>,
    currency: Option<usize>,
    /// (month, year, dividend) when the file is pre-tabulated
    payment: Option<(usize, usize, usize)>,
}

/// Parses a portfolio CSV into validated holdings.
///
/// Pure parsing: no network, no global state. Header names come from
/// `Settings::columns`; tax rate and currency fall back to the settings'
/// defaults when the file has no such column or the cell is empty.
pub struct PortfolioLoader {
    columns: ColumnAliases,
    default_tax_rate_pct: f64,
    default_currency: String,
}

impl PortfolioLoader {
    pub fn new(settings: &Settings) -> Self {
        Self {
            columns: settings.columns.clone(),
            default_tax_rate_pct: settings.default_tax_rate_pct,
            default_currency: settings.default_currency.clone(),
        }
    }

    /// Read a portfolio file from disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<LoadedPortfolio, CoreError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            CoreError::FileIO(format!("Cannot open portfolio file {}: {e}", path.display()))
        })?;
        self.load_from_reader(file)
    }

    pub fn load_from_reader<R: Read>(&self, mut reader: R) -> Result<LoadedPortfolio, CoreError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.load_from_str(&content)
    }

    /// Parse CSV text. Both `,` and `;` separated files are accepted.
    pub fn load_from_str(&self, content: &str) -> Result<LoadedPortfolio, CoreError> {
        // Excel exports may start with a BOM, which would break header matching.
        let content = content.trim_start_matches('\u{feff}');
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(detect_delimiter(content))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = rdr.headers()?.clone();
        let layout = self.resolve_layout(&headers)?;

        let mut loaded = LoadedPortfolio::default();
        let mut index_by_ticker: HashMap<String, usize> = HashMap::new();

        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            // +1 for the header row, +1 for 1-based line numbers
            let line = i + 2;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }

            let holding = self.parse_holding(&record, &layout, line)?;

            if let Some((month_idx, year_idx, dividend_idx)) = layout.payment {
                let payment = parse_payment(
                    &record,
                    &holding,
                    (month_idx, year_idx, dividend_idx),
                    &self.default_currency,
                    line,
                )?;
                loaded.payments.push(payment);
            }

            match index_by_ticker.get(&holding.ticker) {
                Some(&idx) => {
                    let existing = &loaded.holdings[idx];
                    if (existing.shares - holding.shares).abs() > f64::EPSILON {
                        log::warn!(
                            "Line {line}: {} listed again with {} shares; all of its payments are computed with {} shares from its first row",
                            holding.ticker,
                            holding.shares,
                            existing.shares
                        );
                    }
                }
                None => {
                    index_by_ticker.insert(holding.ticker.clone(), loaded.holdings.len());
                    loaded.holdings.push(holding);
                }
            }
        }

        log::info!(
            "Loaded {} holdings ({} pre-tabulated payments)",
            loaded.holdings.len(),
            loaded.payments.len()
        );
        Ok(loaded)
    }

    fn resolve_layout(&self, headers: &csv::StringRecord) -> Result<Layout, CoreError> {
        let ticker = find_column(headers, &self.columns.ticker);
        let shares = find_column(headers, &self.columns.shares);
        let month = find_column(headers, &self.columns.month);
        let year = find_column(headers, &self.columns.year);
        let dividend = find_column(headers, &self.columns.dividend);

        let mut missing = Vec::new();
        if ticker.is_none() {
            missing.push("ticker".to_string());
        }
        if shares.is_none() {
            missing.push("shares".to_string());
        }
        // Month, year and dividend come as a set: a half pre-tabulated file
        // cannot be aggregated.
        let payment_columns = [("month", month), ("year", year), ("dividend", dividend)];
        let present = payment_columns.iter().filter(|(_, idx)| idx.is_some()).count();
        if present > 0 && present < payment_columns.len() {
            missing.extend(
                payment_columns
                    .iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(name, _)| name.to_string()),
            );
        }

        match (ticker, shares) {
            (Some(ticker), Some(shares)) if missing.is_empty() => Ok(Layout {
                ticker,
                shares,
                tax_rate: find_column(headers, &self.columns.tax_rate),
                currency: find_column(headers, &self.columns.currency),
                payment: match (month, year, dividend) {
                    (Some(m), Some(y), Some(d)) => Some((m, y, d)),
                    _ => None,
                },
            }),
            _ => Err(CoreError::Schema { missing }),
        }
    }

    fn parse_holding(
        &self,
        record: &csv::StringRecord,
        layout: &Layout,
        line: usize,
    ) -> Result<Holding, CoreError> {
        let invalid = |message: String| CoreError::InvalidRow { line, message };

        let ticker = record.get(layout.ticker).unwrap_or("");
        if ticker.is_empty() {
            return Err(invalid("empty ticker".into()));
        }

        let raw_shares = record.get(layout.shares).unwrap_or("");
        let shares = parse_number(raw_shares)
            .filter(|s| *s > 0.0)
            .ok_or_else(|| invalid(format!("share count '{raw_shares}' is not a positive number")))?;

        let tax_rate_pct = match layout.tax_rate.and_then(|idx| record.get(idx)) {
            Some(raw) if !raw.is_empty() => parse_number(raw)
                .filter(|t| (0.0..=100.0).contains(t))
                .ok_or_else(|| invalid(format!("tax rate '{raw}' must be between 0 and 100")))?,
            _ => self.default_tax_rate_pct,
        };

        let currency = layout
            .currency
            .and_then(|idx| record.get(idx))
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Holding::with_details(ticker, shares, tax_rate_pct, currency)
            .map_err(|e| invalid(e.to_string()))
    }
}

fn parse_payment(
    record: &csv::StringRecord,
    holding: &Holding,
    (month_idx, year_idx, dividend_idx): (usize, usize, usize),
    default_currency: &str,
    line: usize,
) -> Result<DividendPayment, CoreError> {
    let invalid = |message: String| CoreError::InvalidRow { line, message };

    let raw_month = record.get(month_idx).unwrap_or("");
    let month = parse_month(raw_month).ok_or_else(|| invalid(format!("unknown month '{raw_month}'")))?;

    let raw_year = record.get(year_idx).unwrap_or("");
    let year: i32 = raw_year
        .parse()
        .map_err(|_| invalid(format!("invalid year '{raw_year}'")))?;

    let raw_dividend = record.get(dividend_idx).unwrap_or("");
    let amount = parse_number(raw_dividend)
        .ok_or_else(|| invalid(format!("invalid dividend '{raw_dividend}'")))?;

    // Pre-tabulated rows only know the month; pin them to its first day.
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| invalid(format!("invalid date {year}-{month}")))?;

    let currency = holding.currency.as_deref().unwrap_or(default_currency);
    Ok(DividendPayment::new(&holding.ticker, date, amount, currency))
}

/// Index of the first header matching any alias (case-insensitive, trimmed).
pub(crate) fn find_column<S: AsRef<str>>(headers: &csv::StringRecord, aliases: &[S]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().to_lowercase();
        aliases.iter().any(|a| a.as_ref().trim().to_lowercase() == h)
    })
}

/// Parse a number written with either decimal point or decimal comma.
/// Currency and percent signs are ignored.
///
/// With both separators present the last one is the decimal mark
/// (`1.234,5` and `1,234.5` are both 1234.5). A single separator that
/// occurs once is the decimal mark (`0,30`); repeated, it groups
/// thousands (`1.234.567`).
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '%' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => {
            if commas > 1 {
                return None;
            }
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => {
            if dots > 1 {
                return None;
            }
            cleaned.replace(',', "")
        }
        (Some(_), None) if commas == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        (None, Some(_)) if dots > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Month number from `1`–`12`, or an English or German month name.
pub fn parse_month(raw: &str) -> Option<u32> {
    let lower = raw.trim().to_lowercase();
    if let Ok(n) = lower.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let month = match lower.trim_end_matches('.') {
        "january" | "januar" | "jan" | "jänner" => 1,
        "february" | "februar" | "feb" => 2,
        "march" | "märz" | "maerz" | "mar" | "mär" => 3,
        "april" | "apr" => 4,
        "may" | "mai" => 5,
        "june" | "juni" | "jun" => 6,
        "july" | "juli" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oktober" | "oct" | "okt" => 10,
        "november" | "nov" => 11,
        "december" | "dezember" | "dec" | "dez" => 12,
        _ => return None,
    };
    Some(month)
}

fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}
