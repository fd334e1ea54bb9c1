use crate::errors::CoreError;
use crate::models::dividend::{sort_chronologically, DividendPayment};
use crate::models::settings::Settings;

use super::alphavantage::AlphaVantageSource;
use super::local_file::LocalFileSource;
use super::traits::DividendSource;
use super::yahoo_finance::YahooFinanceSource;

/// Position of a source in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// Queried with the portfolio ticker as-is
    Primary,
    /// Queried with `Settings::fallback_symbols` applied
    Fallback,
}

/// Result of asking the chain for one ticker. Never an error: failures are
/// listed in `failures` and the payments are simply empty.
#[derive(Debug, Default)]
pub struct SourceOutcome {
    /// Payments from the winning source, ascending by date
    pub payments: Vec<DividendPayment>,
    /// Name of the source that delivered `payments`
    pub source: Option<String>,
    /// Errors from sources tried before (or instead of) the winner
    pub failures: Vec<CoreError>,
}

struct RegisteredSource {
    source: Box<dyn DividendSource>,
    role: SourceRole,
}

/// Ordered chain of dividend sources.
///
/// Sources are tried in registration order; the first non-empty history
/// wins. A failing source is logged per ticker and skipped, so one bad
/// ticker or one dead API never aborts a report.
pub struct DividendSourceRegistry {
    sources: Vec<RegisteredSource>,
    fallback_symbols: std::collections::HashMap<String, String>,
}

impl DividendSourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            fallback_symbols: std::collections::HashMap::new(),
        }
    }

    /// Create a registry with the online sources configured by `settings`.
    ///
    /// `local` (if any) goes first so hand-maintained histories override
    /// online data.
    pub fn new_with_defaults(settings: &Settings, local: Option<LocalFileSource>) -> Self {
        let mut registry = Self::new();
        registry.set_fallback_symbols(settings.fallback_symbols.clone());

        if let Some(local) = local {
            registry.register(Box::new(local), SourceRole::Primary);
        }

        // Yahoo Finance: global coverage, no API key needed
        registry.register(Box::new(YahooFinanceSource::new(settings)), SourceRole::Primary);

        // Alpha Vantage: requires an API key
        if let Some(key) = settings.api_keys.get("alphavantage") {
            registry.register(
                Box::new(AlphaVantageSource::new(key.clone(), settings)),
                SourceRole::Fallback,
            );
        }

        registry
    }

    /// Create a registry that never touches the network.
    pub fn offline(settings: &Settings, local: LocalFileSource) -> Self {
        let mut registry = Self::new();
        registry.set_fallback_symbols(settings.fallback_symbols.clone());
        registry.register(Box::new(local), SourceRole::Primary);
        registry
    }

    /// Append a source to the chain.
    pub fn register(&mut self, source: Box<dyn DividendSource>, role: SourceRole) {
        self.sources.push(RegisteredSource { source, role });
    }

    /// Replace the fallback symbol table.
    pub fn set_fallback_symbols(&mut self, map: std::collections::HashMap<String, String>) {
        self.fallback_symbols = map
            .into_iter()
            .map(|(k, v)| (k.trim().to_uppercase(), v.trim().to_string()))
            .collect();
    }

    /// Names of all registered sources, in priority order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.source.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Fetch the dividend history of `ticker` from the first source that has one.
    pub async fn fetch(&self, ticker: &str) -> SourceOutcome {
        let ticker = ticker.trim().to_uppercase();
        let mut outcome = SourceOutcome::default();

        for entry in &self.sources {
            let name = entry.source.name();
            let symbol = match entry.role {
                SourceRole::Primary => ticker.as_str(),
                SourceRole::Fallback => self
                    .fallback_symbols
                    .get(&ticker)
                    .map(String::as_str)
                    .unwrap_or(ticker.as_str()),
            };

            log::debug!("Fetching dividends for {ticker} from {name} as '{symbol}'");

            match entry.source.fetch_dividends(symbol).await {
                Ok(payments) if !payments.is_empty() => {
                    let mut payments: Vec<DividendPayment> = payments
                        .into_iter()
                        .map(|p| DividendPayment { ticker: ticker.clone(), ..p })
                        .collect();
                    sort_chronologically(&mut payments);
                    log::debug!("{name} returned {} payments for {ticker}", payments.len());
                    outcome.payments = payments;
                    outcome.source = Some(name.to_string());
                    return outcome;
                }
                Ok(_) => {
                    log::debug!("{name} has no dividends for {ticker}");
                }
                Err(e) => {
                    log::warn!("Dividend fetch from {name} failed for {ticker}: {e}");
                    outcome.failures.push(CoreError::SourceFetch {
                        source_name: name.to_string(),
                        ticker: ticker.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

impl Default for DividendSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
