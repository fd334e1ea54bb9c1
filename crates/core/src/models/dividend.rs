use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dividend distribution for one ticker.
///
/// Dates are timezone-naive: sources strip any offset before building a
/// payment so that window comparisons are plain calendar arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendPayment {
    pub ticker: String,
    pub date: NaiveDate,
    pub amount_per_share: f64,
    pub currency: String,
}

impl DividendPayment {
    pub fn new(
        ticker: impl Into<String>,
        date: NaiveDate,
        amount_per_share: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into().trim().to_uppercase(),
            date,
            amount_per_share,
            currency: currency.into().trim().to_uppercase(),
        }
    }

    /// Cash received for `shares` shares.
    #[must_use]
    pub fn total_for(&self, shares: f64) -> f64 {
        self.amount_per_share * shares
    }
}

/// Sort payments ascending by date, keeping input order for equal dates.
pub fn sort_chronologically(payments: &mut [DividendPayment]) {
    payments.sort_by_key(|p| p.date);
}

/// The currency every payment shares, or `None` for an empty or mixed list.
pub fn common_currency(payments: &[DividendPayment]) -> Option<&str> {
    let first = payments.first()?;
    payments
        .iter()
        .all(|p| p.currency == first.currency)
        .then_some(first.currency.as_str())
}
