use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Aggregation period. Months always carry their year so that
/// January 2023 and January 2024 never collide.
///
/// The derived ordering is chronological within a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Period {
    Year { year: i32 },
    Month { year: i32, month: u32 },
}

impl Period {
    pub fn year_of(date: NaiveDate) -> Self {
        Period::Year { year: date.year() }
    }

    pub fn month_of(date: NaiveDate) -> Self {
        Period::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        match self {
            Period::Year { year } | Period::Month { year, .. } => *year,
        }
    }

    #[must_use]
    pub fn month(&self) -> Option<u32> {
        match self {
            Period::Year { .. } => None,
            Period::Month { month, .. } => Some(*month),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Year { year } => write!(f, "{year}"),
            Period::Month { year, month } => write!(f, "{year}-{month:02}"),
        }
    }
}

/// Summed dividends of one ticker over one period, in the payment currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAggregate {
    pub ticker: String,
    pub period: Period,
    pub total_amount: f64,
    pub currency: String,
}

/// Portfolio-wide total for one period, already net of tax and converted
/// to the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotal {
    pub period: Period,
    pub net_amount: f64,
}
