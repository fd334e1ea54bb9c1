use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::period::{Period, PeriodAggregate, PeriodTotal};
use super::projection::ProjectionMethod;

/// The full dividend report for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// The single "now" every projection in this report was computed against
    pub generated_on: NaiveDate,

    /// Currency of `net_amount`, `total_net` and the portfolio-wide period totals
    pub reporting_currency: String,

    /// One row per holding, in portfolio input order
    pub rows: Vec<ReportRow>,

    /// Sum of all rows' `net_amount`
    pub total_net: f64,

    /// Portfolio-wide monthly totals, net of tax, in the reporting currency
    pub monthly_net: Vec<PeriodTotal>,

    /// Portfolio-wide yearly totals, net of tax, in the reporting currency
    pub yearly_net: Vec<PeriodTotal>,

    /// Per-ticker problems that did not abort the run
    pub warnings: Vec<ReportWarning>,
}

impl PortfolioReport {
    #[must_use]
    pub fn row(&self, ticker: &str) -> Option<&ReportRow> {
        let upper = ticker.to_uppercase();
        self.rows.iter().find(|r| r.ticker == upper)
    }

    /// True if any row's conversion used the identity fallback.
    #[must_use]
    pub fn has_estimated_fx(&self) -> bool {
        self.rows.iter().any(|r| !r.fx_ok)
    }

    /// Net portfolio totals for January–December of `year`, zero where
    /// nothing was paid.
    #[must_use]
    pub fn calendar(&self, year: i32) -> Vec<PeriodTotal> {
        (1..=12u32)
            .map(|month| {
                let period = Period::Month { year, month };
                let net_amount = self
                    .monthly_net
                    .iter()
                    .find(|t| t.period == period)
                    .map_or(0.0, |t| t.net_amount);
                PeriodTotal { period, net_amount }
            })
            .collect()
    }

    #[must_use]
    pub fn warnings_for(&self, ticker: &str) -> Vec<&ReportWarning> {
        let upper = ticker.to_uppercase();
        self.warnings.iter().filter(|w| w.ticker == upper).collect()
    }
}

/// One holding's projected income.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub ticker: String,
    pub shares: f64,
    pub tax_rate_pct: f64,

    /// Projected annual dividends before tax, in `currency`
    pub gross_amount: f64,

    /// Native dividend currency
    pub currency: String,

    /// Rate from `currency` into the reporting currency
    pub fx_rate: f64,

    /// False when `fx_rate` is the identity fallback
    pub fx_ok: bool,

    /// Projected annual dividends after tax, in the reporting currency
    pub net_amount: f64,

    pub method: ProjectionMethod,

    /// Payments found for this ticker
    pub payment_count: usize,

    /// Name of the source that delivered the payments, if any
    pub source: Option<String>,

    /// Gross monthly totals in `currency`
    pub monthly_totals: Vec<PeriodAggregate>,

    /// Gross yearly totals in `currency`
    pub yearly_totals: Vec<PeriodAggregate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A source errored or timed out
    SourceFetch,
    /// Every source came back empty
    NoData,
    /// FX lookup failed, identity rate used
    Conversion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWarning {
    pub ticker: String,
    pub kind: WarningKind,
    pub message: String,
}
