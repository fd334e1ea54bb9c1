use serde::{Deserialize, Serialize};

/// Which rung of the projection ladder produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionMethod {
    /// Sum of all payments in the trailing 365 days
    #[serde(rename = "sum_last_12_months")]
    SumLast12Months,
    /// Sum of the four latest payments (quarterly schedule assumed)
    #[serde(rename = "sum_last_4_payments")]
    SumLast4Payments,
    /// Mean payment × 4
    #[serde(rename = "average_times_4")]
    AverageTimes4,
    /// No payment history at all
    #[serde(rename = "no_data")]
    NoData,
}

impl std::fmt::Display for ProjectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionMethod::SumLast12Months => write!(f, "sum_last_12_months"),
            ProjectionMethod::SumLast4Payments => write!(f, "sum_last_4_payments"),
            ProjectionMethod::AverageTimes4 => write!(f, "average_times_4"),
            ProjectionMethod::NoData => write!(f, "no_data"),
        }
    }
}

/// Forward annual dividend estimate for one holding, in the payment currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub ticker: String,
    pub projected_annual_amount: f64,
    pub method: ProjectionMethod,
    /// Number of payments the chosen rung summed or averaged
    pub payments_used: usize,
}

impl Projection {
    pub fn no_data(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            projected_annual_amount: 0.0,
            method: ProjectionMethod::NoData,
            payments_used: 0,
        }
    }
}
