use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::models::dividend::DividendPayment;
use crate::models::period::{Period, PeriodAggregate, PeriodTotal};

/// Groups dividend payments into monthly and yearly totals.
///
/// Pure business logic, no I/O. Totals are
/// `amount_per_share × shares` summed per period; payments in the same period
/// add up, and the result does not depend on input order. Only periods that
/// actually contain payments are emitted, oldest first.
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    /// One row per (year, month) present in `payments`.
    pub fn monthly_totals(
        &self,
        ticker: &str,
        payments: &[DividendPayment],
        shares: f64,
    ) -> Vec<PeriodAggregate> {
        Self::group_by(ticker, payments, shares, Period::month_of)
    }

    /// One row per year present in `payments`.
    pub fn yearly_totals(
        &self,
        ticker: &str,
        payments: &[DividendPayment],
        shares: f64,
    ) -> Vec<PeriodAggregate> {
        Self::group_by(ticker, payments, shares, Period::year_of)
    }

    /// Twelve rows for `year`, months without payments set to zero.
    ///
    /// A display helper for single-year calendars. Payments outside `year`
    /// are ignored.
    pub fn dense_monthly_totals(
        &self,
        ticker: &str,
        payments: &[DividendPayment],
        shares: f64,
        year: i32,
        currency: &str,
    ) -> Vec<PeriodAggregate> {
        let mut by_month = [0.0_f64; 12];
        for p in payments.iter().filter(|p| p.date.year() == year) {
            by_month[p.date.month0() as usize] += p.total_for(shares);
        }

        (1..=12u32)
            .map(|month| PeriodAggregate {
                ticker: ticker.to_uppercase(),
                period: Period::Month { year, month },
                total_amount: by_month[(month - 1) as usize],
                currency: currency.to_uppercase(),
            })
            .collect()
    }

    /// Sum of payments dated within `from..=to`.
    pub fn window_total(
        &self,
        payments: &[DividendPayment],
        shares: f64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> f64 {
        payments
            .iter()
            .filter(|p| p.date >= from && p.date <= to)
            .map(|p| p.total_for(shares))
            .sum()
    }

    /// Add `aggregates` into a running portfolio-wide table keyed by period.
    /// `factor` maps an aggregate's currency to the multiplier (tax × FX)
    /// that brings it into the table's terms.
    pub fn accumulate(
        &self,
        table: &mut BTreeMap<Period, f64>,
        aggregates: &[PeriodAggregate],
        factor: impl Fn(&str) -> f64,
    ) {
        for agg in aggregates {
            *table.entry(agg.period).or_insert(0.0) += agg.total_amount * factor(&agg.currency);
        }
    }

    /// Flatten a running table into ordered period totals.
    pub fn into_period_totals(&self, table: BTreeMap<Period, f64>) -> Vec<PeriodTotal> {
        table
            .into_iter()
            .map(|(period, net_amount)| PeriodTotal { period, net_amount })
            .collect()
    }

    // Key includes the currency so a ticker whose payout currency changed
    // never sums across currencies.
    fn group_by(
        ticker: &str,
        payments: &[DividendPayment],
        shares: f64,
        key: fn(NaiveDate) -> Period,
    ) -> Vec<PeriodAggregate> {
        let mut groups: BTreeMap<(Period, String), f64> = BTreeMap::new();
        for p in payments {
            *groups
                .entry((key(p.date), p.currency.clone()))
                .or_insert(0.0) += p.total_for(shares);
        }

        groups
            .into_iter()
            .map(|((period, currency), total_amount)| PeriodAggregate {
                ticker: ticker.to_uppercase(),
                period,
                total_amount,
                currency,
            })
            .collect()
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}
