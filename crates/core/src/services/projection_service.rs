use chrono::{Duration, NaiveDate};

use crate::models::dividend::DividendPayment;
use crate::models::projection::{Projection, ProjectionMethod};

/// Length of the trailing window, in days.
pub const TRAILING_WINDOW_DAYS: i64 = 365;

/// Payments per year assumed when the history is too sparse for a
/// trailing-window sum.
pub const PAYMENTS_PER_YEAR: usize = 4;

/// Estimates next year's dividend income from a payment history.
///
/// Fallback ladder, first match wins:
/// 1. payments within the trailing 365 days → their sum
/// 2. at least four payments → sum of the four latest
/// 3. at least one payment → mean × 4
/// 4. nothing → zero, `NoData`
///
/// `now` is a parameter, not a clock read, so every ticker in one report is
/// projected against the same day.
pub struct ProjectionService;

impl ProjectionService {
    pub fn new() -> Self {
        Self
    }

    /// First day (inclusive) of the trailing window ending at `now`.
    #[must_use]
    pub fn window_start(now: NaiveDate) -> NaiveDate {
        now - Duration::days(TRAILING_WINDOW_DAYS)
    }

    /// Project the annual amount for `shares` shares. `payments` may be in any order.
    pub fn project(
        &self,
        ticker: &str,
        payments: &[DividendPayment],
        shares: f64,
        now: NaiveDate,
    ) -> Projection {
        let ticker = ticker.to_uppercase();
        let start = Self::window_start(now);

        // A payment dated after `now` is an announcement, not trailing history.
        let trailing: Vec<&DividendPayment> = payments
            .iter()
            .filter(|p| p.date >= start && p.date <= now)
            .collect();
        if !trailing.is_empty() {
            return Projection {
                ticker,
                projected_annual_amount: trailing.iter().map(|p| p.total_for(shares)).sum(),
                method: ProjectionMethod::SumLast12Months,
                payments_used: trailing.len(),
            };
        }

        if payments.len() >= PAYMENTS_PER_YEAR {
            let mut latest: Vec<&DividendPayment> = payments.iter().collect();
            latest.sort_by(|a, b| b.date.cmp(&a.date));
            latest.truncate(PAYMENTS_PER_YEAR);
            return Projection {
                ticker,
                projected_annual_amount: latest.iter().map(|p| p.total_for(shares)).sum(),
                method: ProjectionMethod::SumLast4Payments,
                payments_used: PAYMENTS_PER_YEAR,
            };
        }

        if !payments.is_empty() {
            let mean = payments.iter().map(|p| p.amount_per_share).sum::<f64>()
                / payments.len() as f64;
            return Projection {
                ticker,
                projected_annual_amount: mean * PAYMENTS_PER_YEAR as f64 * shares,
                method: ProjectionMethod::AverageTimes4,
                payments_used: payments.len(),
            };
        }

        Projection::no_data(ticker)
    }
}

impl Default for ProjectionService {
    fn default() -> Self {
        Self::new()
    }
}
