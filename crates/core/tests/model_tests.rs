// ═══════════════════════════════════════════════════════════════════
// Model Tests — Holding, DividendPayment, Period, ProjectionMethod,
// FxRate, RateCache, PortfolioReport, Settings
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;

use dividend_tracker_core::errors::CoreError;
use dividend_tracker_core::models::dividend::{common_currency, sort_chronologically, DividendPayment};
use dividend_tracker_core::models::fx::{FxRate, RateCache};
use dividend_tracker_core::models::holding::Holding;
use dividend_tracker_core::models::period::{Period, PeriodTotal};
use dividend_tracker_core::models::projection::{Projection, ProjectionMethod};
use dividend_tracker_core::models::report::PortfolioReport;
use dividend_tracker_core::models::settings::Settings;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ── Holding ─────────────────────────────────────────────────────────

mod holding {
    use super::*;

    #[test]
    fn ticker_is_trimmed_and_uppercased() {
        let h = Holding::new("  jen.de ", 10.0).unwrap();
        assert_eq!(h.ticker, "JEN.DE");
        assert_eq!(h.tax_rate_pct, 0.0);
        assert!(h.currency.is_none());
    }

    #[test]
    fn empty_ticker_rejected() {
        assert!(matches!(
            Holding::new("   ", 1.0),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn non_positive_shares_rejected() {
        assert!(Holding::new("O", 0.0).is_err());
        assert!(Holding::new("O", -3.0).is_err());
        assert!(Holding::new("O", f64::NAN).is_err());
    }

    #[test]
    fn fractional_shares_allowed() {
        let h = Holding::new("O", 0.25).unwrap();
        assert_eq!(h.shares, 0.25);
    }

    #[test]
    fn tax_rate_bounds() {
        assert!(Holding::with_details("O", 1.0, 100.0, None).is_ok());
        assert!(Holding::with_details("O", 1.0, 100.5, None).is_err());
        assert!(Holding::with_details("O", 1.0, -1.0, None).is_err());
    }

    #[test]
    fn blank_currency_dropped() {
        let h = Holding::with_details("O", 1.0, 15.0, Some("  ".into())).unwrap();
        assert!(h.currency.is_none());
        let h = Holding::with_details("O", 1.0, 15.0, Some("usd".into())).unwrap();
        assert_eq!(h.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn net_factor() {
        let h = Holding::with_details("ALV.DE", 1.0, 25.0, None).unwrap();
        assert!((h.net_factor() - 0.75).abs() < 1e-12);
        assert_eq!(Holding::new("O", 1.0).unwrap().net_factor(), 1.0);
    }
}

// ── DividendPayment ─────────────────────────────────────────────────

mod dividend {
    use super::*;

    #[test]
    fn new_normalizes_codes() {
        let p = DividendPayment::new("o", d(2024, 3, 15), 0.26, "usd");
        assert_eq!(p.ticker, "O");
        assert_eq!(p.currency, "USD");
    }

    #[test]
    fn total_for_shares() {
        let p = DividendPayment::new("T", d(2024, 1, 1), 0.5, "EUR");
        assert!((p.total_for(10.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn common_currency_only_when_uniform() {
        let eur = DividendPayment::new("T", d(2024, 1, 1), 1.0, "EUR");
        let usd = DividendPayment::new("T", d(2024, 2, 1), 1.0, "USD");
        assert_eq!(common_currency(&[]), None);
        assert_eq!(common_currency(&[eur.clone(), eur.clone()]), Some("EUR"));
        assert_eq!(common_currency(&[eur, usd]), None);
    }

    #[test]
    fn sort_is_stable_for_equal_dates() {
        let mut payments = vec![
            DividendPayment::new("T", d(2024, 6, 1), 2.0, "EUR"),
            DividendPayment::new("T", d(2024, 1, 1), 1.0, "EUR"),
            DividendPayment::new("T", d(2024, 6, 1), 3.0, "EUR"),
        ];
        sort_chronologically(&mut payments);
        let amounts: Vec<f64> = payments.iter().map(|p| p.amount_per_share).collect();
        assert_eq!(amounts, vec![1.0, 2.0, 3.0]);
    }
}

// ── Period ──────────────────────────────────────────────────────────

mod period {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Period::Year { year: 2024 }.to_string(), "2024");
        assert_eq!(Period::Month { year: 2024, month: 3 }.to_string(), "2024-03");
    }

    #[test]
    fn from_date() {
        let date = d(2023, 11, 30);
        assert_eq!(Period::year_of(date), Period::Year { year: 2023 });
        assert_eq!(Period::month_of(date), Period::Month { year: 2023, month: 11 });
        assert_eq!(Period::month_of(date).month(), Some(11));
        assert_eq!(Period::year_of(date).month(), None);
        assert_eq!(Period::month_of(date).year(), 2023);
    }

    #[test]
    fn months_order_chronologically_across_years() {
        let mut periods = vec![
            Period::Month { year: 2024, month: 1 },
            Period::Month { year: 2023, month: 12 },
            Period::Month { year: 2023, month: 2 },
        ];
        periods.sort();
        assert_eq!(
            periods,
            vec![
                Period::Month { year: 2023, month: 2 },
                Period::Month { year: 2023, month: 12 },
                Period::Month { year: 2024, month: 1 },
            ]
        );
    }

    #[test]
    fn same_month_different_year_not_equal() {
        assert_ne!(
            Period::Month { year: 2023, month: 1 },
            Period::Month { year: 2024, month: 1 }
        );
    }

    #[test]
    fn serde_tagged() {
        let json = serde_json::to_string(&Period::Month { year: 2024, month: 5 }).unwrap();
        assert_eq!(json, r#"{"kind":"month","year":2024,"month":5}"#);
        let back: Period = serde_json::from_str(r#"{"kind":"year","year":2022}"#).unwrap();
        assert_eq!(back, Period::Year { year: 2022 });
    }
}

// ── Projection ──────────────────────────────────────────────────────

mod projection {
    use super::*;

    #[test]
    fn method_display_matches_serde() {
        for (method, name) in [
            (ProjectionMethod::SumLast12Months, "sum_last_12_months"),
            (ProjectionMethod::SumLast4Payments, "sum_last_4_payments"),
            (ProjectionMethod::AverageTimes4, "average_times_4"),
            (ProjectionMethod::NoData, "no_data"),
        ] {
            assert_eq!(method.to_string(), name);
            assert_eq!(serde_json::to_string(&method).unwrap(), format!("\"{name}\""));
        }
    }

    #[test]
    fn no_data_is_zero() {
        let p = Projection::no_data("XYZ");
        assert_eq!(p.projected_annual_amount, 0.0);
        assert_eq!(p.method, ProjectionMethod::NoData);
        assert_eq!(p.payments_used, 0);
    }
}

// ── FX ──────────────────────────────────────────────────────────────

mod fx {
    use super::*;

    #[test]
    fn identity_is_ok() {
        let r = FxRate::identity("eur");
        assert_eq!(r.rate, 1.0);
        assert!(r.fx_ok);
        assert_eq!(r.from, "EUR");
        assert_eq!(r.to, "EUR");
    }

    #[test]
    fn fallback_is_flagged() {
        let r = FxRate::fallback("usd", "eur");
        assert_eq!(r.rate, 1.0);
        assert!(!r.fx_ok);
        assert_eq!(r.apply(42.0), 42.0);
    }

    #[test]
    fn cache_serves_same_day_only() {
        let mut cache = RateCache::new();
        assert!(cache.is_empty());
        cache.set("usd", "eur", 0.92, d(2025, 1, 15));

        assert_eq!(cache.get_fresh("USD", "EUR", d(2025, 1, 15)), Some(0.92));
        assert_eq!(cache.get_fresh("USD", "EUR", d(2025, 1, 16)), None);
        assert_eq!(cache.get_fresh("EUR", "USD", d(2025, 1, 15)), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}

// ── PortfolioReport ─────────────────────────────────────────────────

mod report {
    use super::*;

    fn report_with_monthly(monthly: Vec<PeriodTotal>) -> PortfolioReport {
        PortfolioReport {
            generated_on: d(2025, 1, 1),
            reporting_currency: "EUR".into(),
            rows: vec![],
            total_net: 0.0,
            monthly_net: monthly,
            yearly_net: vec![],
            warnings: vec![],
        }
    }

    #[test]
    fn calendar_is_zero_filled() {
        let report = report_with_monthly(vec![
            PeriodTotal {
                period: Period::Month { year: 2023, month: 3 },
                net_amount: 99.0,
            },
            PeriodTotal {
                period: Period::Month { year: 2024, month: 3 },
                net_amount: 5.0,
            },
        ]);

        let calendar = report.calendar(2024);
        assert_eq!(calendar.len(), 12);
        assert_eq!(calendar[0].period, Period::Month { year: 2024, month: 1 });
        assert_eq!(calendar[2].net_amount, 5.0);
        let rest: f64 = calendar.iter().map(|t| t.net_amount).sum();
        assert_eq!(rest, 5.0);
    }

    #[test]
    fn empty_report_has_no_estimates() {
        let report = report_with_monthly(vec![]);
        assert!(!report.has_estimated_fx());
        assert!(report.row("O").is_none());
        assert!(report.warnings_for("O").is_empty());
    }
}

// ── Settings ────────────────────────────────────────────────────────

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.reporting_currency, "EUR");
        assert_eq!(s.default_currency, "EUR");
        assert_eq!(s.default_tax_rate_pct, 0.0);
        assert_eq!(s.request_timeout_secs, 30);
        assert_eq!(s.fallback_source_currency, "USD");
        assert!(s.columns.ticker.iter().any(|c| c == "aktie"));
        assert!(s.columns.shares.iter().any(|c| c == "stückzahl"));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = Settings::from_json_str(
            r#"{ "reporting_currency": "usd", "fallback_symbols": { "jen.de": "JEN" } }"#,
        )
        .unwrap();
        assert_eq!(s.reporting_currency, "USD");
        assert_eq!(s.default_currency, "EUR");
        assert_eq!(s.fallback_symbols.get("JEN.DE").map(String::as_str), Some("JEN"));
        assert_eq!(s.history_years, 5);
    }

    #[test]
    fn invalid_currency_rejected() {
        let err = Settings::from_json_str(r#"{ "reporting_currency": "EURO" }"#).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn invalid_tax_rejected() {
        let err = Settings::from_json_str(r#"{ "default_tax_rate_pct": 120 }"#).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(Settings::from_json_str(r#"{ "request_timeout_secs": 0 }"#).is_err());
    }

    #[test]
    fn empty_ticker_aliases_rejected() {
        assert!(Settings::from_json_str(r#"{ "columns": { "ticker": [] } }"#).is_err());
    }

    #[test]
    fn malformed_json_is_deserialization_error() {
        let err = Settings::from_json_str("{ reporting_currency").unwrap_err();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn set_reporting_currency() {
        let mut s = Settings::default();
        s.set_reporting_currency(" pln ").unwrap();
        assert_eq!(s.reporting_currency, "PLN");
        assert!(s.set_reporting_currency("ZŁ").is_err());
        assert_eq!(s.reporting_currency, "PLN");
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "default_tax_rate_pct": 26.375 }"#).unwrap();
        let s = Settings::from_json_file(&path).unwrap();
        assert!((s.default_tax_rate_pct - 26.375).abs() < 1e-12);
    }
}
