pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::NaiveDate;
use models::{
    holding::Holding, period::PeriodAggregate, report::PortfolioReport, settings::Settings,
};
use providers::{
    frankfurter::FrankfurterProvider,
    local_file::LocalFileSource,
    registry::{DividendSourceRegistry, SourceOutcome},
};
use services::{
    aggregation_service::AggregationService,
    currency_service::CurrencyService,
    portfolio_loader::{LoadedPortfolio, PortfolioLoader},
    report_service::{projection_currency, ReportService},
};

use errors::CoreError;

/// Main entry point for the Dividend Tracker core library.
/// Holds the configuration, the dividend source chain and the currency
/// normalizer, and runs one report at a time.
#[must_use]
pub struct DividendTracker {
    settings: Settings,
    registry: DividendSourceRegistry,
    currency_service: CurrencyService,
    report_service: ReportService,
    aggregation_service: AggregationService,
}

impl std::fmt::Debug for DividendTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DividendTracker")
            .field("settings", &self.settings)
            .field("sources", &self.registry.source_names())
            .field("cached_rates", &self.currency_service.cached_rates())
            .finish()
    }
}

impl DividendTracker {
    /// Online tracker: Yahoo Finance, Alpha Vantage (if keyed) and Frankfurter.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        Self::with_local_history(settings, None)
    }

    /// Online tracker that consults `local` before any network source.
    pub fn with_local_history(
        settings: Settings,
        local: Option<LocalFileSource>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let registry = DividendSourceRegistry::new_with_defaults(&settings, local);
        let currency_service = CurrencyService::new(Box::new(FrankfurterProvider::new(
            settings.request_timeout_secs,
        )));
        Ok(Self::build(settings, registry, currency_service))
    }

    /// Tracker that never touches the network. Cross-currency rows are
    /// reported with the identity rate and `fx_ok = false`.
    pub fn offline(settings: Settings, local: LocalFileSource) -> Result<Self, CoreError> {
        settings.validate()?;
        let registry = DividendSourceRegistry::offline(&settings, local);
        Ok(Self::build(settings, registry, CurrencyService::offline()))
    }

    /// Tracker with caller-supplied sources and rate lookup.
    pub fn with_components(
        settings: Settings,
        registry: DividendSourceRegistry,
        currency_service: CurrencyService,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self::build(settings, registry, currency_service))
    }

    // ── Portfolio input ─────────────────────────────────────────────

    /// A loader configured with this tracker's column aliases and defaults.
    pub fn loader(&self) -> PortfolioLoader {
        PortfolioLoader::new(&self.settings)
    }

    /// Load a portfolio CSV from disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_portfolio(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<LoadedPortfolio, CoreError> {
        self.loader().load_from_path(path)
    }

    /// Load a portfolio from CSV text.
    pub fn load_portfolio_from_str(&self, csv: &str) -> Result<LoadedPortfolio, CoreError> {
        self.loader().load_from_str(csv)
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Fetch the dividend history of one holding through the source chain.
    pub async fn fetch_history(&self, holding: &Holding) -> SourceOutcome {
        self.registry.fetch(&holding.ticker).await
    }

    /// Generate a report projected from today's date.
    pub async fn generate_report(
        &mut self,
        holdings: &[Holding],
    ) -> Result<PortfolioReport, CoreError> {
        let today = chrono::Utc::now().date_naive();
        self.generate_report_at(holdings, today).await
    }

    /// Generate a report with every projection evaluated against `now`.
    ///
    /// Holdings are processed one at a time in input order. A ticker whose
    /// sources all fail still gets a `NoData` row; only an empty portfolio
    /// aborts the run.
    pub async fn generate_report_at(
        &mut self,
        holdings: &[Holding],
        now: NaiveDate,
    ) -> Result<PortfolioReport, CoreError> {
        if holdings.is_empty() {
            return Err(CoreError::EmptyPortfolio);
        }

        let mut histories = Vec::with_capacity(holdings.len());
        for holding in holdings {
            histories.push(self.registry.fetch(&holding.ticker).await);
        }

        self.report_service
            .assemble(
                holdings,
                histories,
                &mut self.currency_service,
                &self.settings.reporting_currency,
                &self.settings.default_currency,
                now,
            )
            .await
    }

    /// Zero-filled January–December totals of one holding for `year`.
    ///
    /// Gross of tax, in the payout currency, or in the reporting currency
    /// when the holding pays in several.
    pub async fn dividend_calendar(
        &mut self,
        holding: &Holding,
        year: i32,
    ) -> Vec<PeriodAggregate> {
        let outcome = self.fetch_history(holding).await;
        let currency = projection_currency(
            &outcome.payments,
            holding,
            &self.settings.default_currency,
            &self.settings.reporting_currency,
        );
        let (payments, _) = self
            .currency_service
            .convert_payments(&outcome.payments, &currency)
            .await;
        self.aggregation_service.dense_monthly_totals(
            &holding.ticker,
            &payments,
            holding.shares,
            year,
            &currency,
        )
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Get current settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Set the reporting currency (e.g., "EUR", "USD", "PLN").
    pub fn set_reporting_currency(&mut self, currency: &str) -> Result<(), CoreError> {
        self.settings.set_reporting_currency(currency)
    }

    /// Forget all cached exchange rates so the next report looks them up again.
    pub fn refresh_rates(&mut self) {
        self.currency_service.clear_cache();
    }

    /// Names of the dividend sources, in the order they are tried.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.registry.source_names()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(
        settings: Settings,
        registry: DividendSourceRegistry,
        currency_service: CurrencyService,
    ) -> Self {
        Self {
            settings,
            registry,
            currency_service,
            report_service: ReportService::new(),
            aggregation_service: AggregationService::new(),
        }
    }
}
