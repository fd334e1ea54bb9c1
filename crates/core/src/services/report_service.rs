use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::errors::CoreError;
use crate::models::dividend::{common_currency, DividendPayment};
use crate::models::holding::Holding;
use crate::models::period::Period;
use crate::models::projection::ProjectionMethod;
use crate::models::report::{PortfolioReport, ReportRow, ReportWarning, WarningKind};
use crate::providers::registry::SourceOutcome;
use crate::services::aggregation_service::AggregationService;
use crate::services::currency_service::CurrencyService;
use crate::services::projection_service::ProjectionService;

/// Builds a `PortfolioReport` from holdings and their fetched histories.
///
/// Computes per holding:
/// - Monthly and yearly gross totals (payment currency)
/// - Projected annual gross amount and the method used
/// - Net amount = gross × (1 − tax/100) × FX rate into the reporting currency
///
/// and portfolio-wide: the sum of all net amounts and net monthly/yearly tables.
/// Rows keep the holdings' order; holdings without data are kept as `NoData` rows.
///
/// A history paid in more than one currency is projected in the reporting
/// currency, each payment converted at its own rate.
pub struct ReportService {
    aggregation: AggregationService,
    projection: ProjectionService,
}

impl ReportService {
    pub fn new() -> Self {
        Self {
            aggregation: AggregationService::new(),
            projection: ProjectionService::new(),
        }
    }

    /// Assemble the report. `histories[i]` belongs to `holdings[i]`.
    pub async fn assemble(
        &self,
        holdings: &[Holding],
        histories: Vec<SourceOutcome>,
        currency_service: &mut CurrencyService,
        reporting_currency: &str,
        default_currency: &str,
        now: NaiveDate,
    ) -> Result<PortfolioReport, CoreError> {
        if holdings.is_empty() {
            return Err(CoreError::EmptyPortfolio);
        }
        if holdings.len() != histories.len() {
            return Err(CoreError::Configuration(format!(
                "{} holdings but {} dividend histories",
                holdings.len(),
                histories.len()
            )));
        }

        let reporting_currency = reporting_currency.to_uppercase();
        let mut rows = Vec::with_capacity(holdings.len());
        let mut warnings = Vec::new();
        let mut total_net = 0.0;
        let mut monthly_table: BTreeMap<Period, f64> = BTreeMap::new();
        let mut yearly_table: BTreeMap<Period, f64> = BTreeMap::new();

        for (holding, history) in holdings.iter().zip(histories) {
            let ticker = holding.ticker.clone();
            let payments = history.payments;

            for failure in &history.failures {
                warnings.push(ReportWarning {
                    ticker: ticker.clone(),
                    kind: WarningKind::SourceFetch,
                    message: failure.to_string(),
                });
            }
            if payments.is_empty() {
                log::warn!("No dividend data for {ticker}");
                warnings.push(ReportWarning {
                    ticker: ticker.clone(),
                    kind: WarningKind::NoData,
                    message: format!("No dividend payments found for {ticker}"),
                });
            }

            let currency =
                projection_currency(&payments, holding, default_currency, &reporting_currency);

            let monthly_totals =
                self.aggregation
                    .monthly_totals(&ticker, &payments, holding.shares);
            let yearly_totals = self
                .aggregation
                .yearly_totals(&ticker, &payments, holding.shares);

            // A no-op for single-currency histories; mixed ones are restated in
            // the reporting currency so the projection never adds across currencies.
            let (basis, basis_ok) = currency_service
                .convert_payments(&payments, &currency)
                .await;
            if !basis_ok {
                warnings.push(ReportWarning {
                    ticker: ticker.clone(),
                    kind: WarningKind::Conversion,
                    message: format!(
                        "Missing exchange rate for part of the {currency} history; projection is not fully currency-adjusted"
                    ),
                });
            }
            let projection = self
                .projection
                .project(&ticker, &basis, holding.shares, now);

            let fx = currency_service.rate(&currency, &reporting_currency).await;
            if !fx.fx_ok {
                warnings.push(ReportWarning {
                    ticker: ticker.clone(),
                    kind: WarningKind::Conversion,
                    message: format!(
                        "No exchange rate for {currency} → {reporting_currency}; amount is not currency-adjusted"
                    ),
                });
            }

            let gross_amount = projection.projected_annual_amount;
            let net_amount = fx.apply(gross_amount * holding.net_factor());
            total_net += net_amount;

            // Per-currency factors for the portfolio-wide tables.
            let mut factors: HashMap<String, f64> = HashMap::new();
            for agg in monthly_totals.iter() {
                if !factors.contains_key(&agg.currency) {
                    let rate = if agg.currency == currency {
                        fx.rate
                    } else {
                        currency_service
                            .rate(&agg.currency, &reporting_currency)
                            .await
                            .rate
                    };
                    factors.insert(agg.currency.clone(), rate * holding.net_factor());
                }
            }
            let factor = |c: &str| factors.get(c).copied().unwrap_or(0.0);
            self.aggregation
                .accumulate(&mut monthly_table, &monthly_totals, factor);
            self.aggregation
                .accumulate(&mut yearly_table, &yearly_totals, factor);

            if projection.method != ProjectionMethod::NoData {
                log::debug!(
                    "{ticker}: {gross_amount:.2} {currency} gross via {}, {net_amount:.2} {reporting_currency} net",
                    projection.method
                );
            }

            rows.push(ReportRow {
                ticker,
                shares: holding.shares,
                tax_rate_pct: holding.tax_rate_pct,
                gross_amount,
                currency,
                fx_rate: fx.rate,
                fx_ok: fx.fx_ok && basis_ok,
                net_amount,
                method: projection.method,
                payment_count: payments.len(),
                source: history.source,
                monthly_totals,
                yearly_totals,
            });
        }

        log::info!(
            "Report for {} holdings: {total_net:.2} {reporting_currency} projected net, {} warnings",
            rows.len(),
            warnings.len()
        );

        Ok(PortfolioReport {
            generated_on: now,
            reporting_currency,
            rows,
            total_net,
            monthly_net: self.aggregation.into_period_totals(monthly_table),
            yearly_net: self.aggregation.into_period_totals(yearly_table),
            warnings,
        })
    }
}

/// Currency a holding's projection is expressed in.
///
/// The payout currency when every payment shares one, the holding's own
/// currency (or `default_currency`) when there are no payments, and the
/// reporting currency for a mixed history.
pub fn projection_currency(
    payments: &[DividendPayment],
    holding: &Holding,
    default_currency: &str,
    reporting_currency: &str,
) -> String {
    if payments.is_empty() {
        return holding
            .currency
            .clone()
            .unwrap_or_else(|| default_currency.to_uppercase());
    }
    common_currency(payments)
        .unwrap_or(reporting_currency)
        .to_uppercase()
}

impl Default for ReportService {
    fn default() -> Self {
        Self::new()
    }
}
