// ═══════════════════════════════════════════════════════════════════
// Loader Tests — PortfolioLoader: headers, delimiters, pre-tabulated
// files, validation, month names
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;

use dividend_tracker_core::errors::CoreError;
use dividend_tracker_core::models::settings::Settings;
use dividend_tracker_core::services::portfolio_loader::{parse_month, PortfolioLoader};

fn loader() -> PortfolioLoader {
    PortfolioLoader::new(&Settings::default())
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ── Plain holdings files ────────────────────────────────────────────

mod holdings {
    use super::*;

    #[test]
    fn keeps_input_order() {
        let loaded = loader()
            .load_from_str("ticker,shares\nmsft,5\nO,120\nJEN.DE,40\n")
            .unwrap();
        let tickers: Vec<&str> = loaded.holdings.iter().map(|h| h.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["MSFT", "O", "JEN.DE"]);
        assert!(!loaded.is_pretabulated());
        assert!(loaded.local_source().is_none());
    }

    #[test]
    fn tax_and_currency_columns() {
        let loaded = loader()
            .load_from_str("ticker,shares,tax_rate,currency\nO,10,15,usd\nALV.DE,3,,\n")
            .unwrap();
        assert_eq!(loaded.holdings[0].tax_rate_pct, 15.0);
        assert_eq!(loaded.holdings[0].currency.as_deref(), Some("USD"));
        assert_eq!(loaded.holdings[1].tax_rate_pct, 0.0);
        assert!(loaded.holdings[1].currency.is_none());
    }

    #[test]
    fn default_tax_rate_from_settings() {
        let settings = Settings {
            default_tax_rate_pct: 26.375,
            ..Settings::default()
        };
        let loaded = PortfolioLoader::new(&settings)
            .load_from_str("ticker,shares\nALV.DE,3\n")
            .unwrap();
        assert_eq!(loaded.holdings[0].tax_rate_pct, 26.375);
    }

    #[test]
    fn semicolon_and_decimal_comma() {
        let loaded = loader()
            .load_from_str("Symbol;Quantity;Steuer\nO;12,5;26,375 %\n")
            .unwrap();
        assert_eq!(loaded.holdings[0].shares, 12.5);
        assert!((loaded.holdings[0].tax_rate_pct - 26.375).abs() < 1e-12);
    }

    #[test]
    fn thousands_separators() {
        let loaded = loader()
            .load_from_str("ticker;shares\nA;1.234,5\nB;1,234.5\nC;1.234.567\nD;2,5\n")
            .unwrap();
        let shares: Vec<f64> = loaded.holdings.iter().map(|h| h.shares).collect();
        assert_eq!(shares, vec![1234.5, 1234.5, 1234567.0, 2.5]);
    }

    #[test]
    fn conflicting_separators_rejected() {
        let err = loader()
            .load_from_str("ticker;shares\nA;1.234,5.6\n")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn headers_case_insensitive_with_bom() {
        let loaded = loader().load_from_str("\u{feff}TICKER, Shares \nO,1\n").unwrap();
        assert_eq!(loaded.holdings.len(), 1);
    }

    #[test]
    fn blank_rows_skipped() {
        let loaded = loader().load_from_str("ticker,shares\nO,1\n,\nMSFT,2\n").unwrap();
        assert_eq!(loaded.holdings.len(), 2);
    }

    #[test]
    fn duplicate_ticker_keeps_first_row() {
        let loaded = loader().load_from_str("ticker,shares\nO,10\nMSFT,1\no,99\n").unwrap();
        assert_eq!(loaded.holdings.len(), 2);
        assert_eq!(loaded.holdings[0].shares, 10.0);
    }

    #[test]
    fn empty_file_yields_no_holdings() {
        let loaded = loader().load_from_str("ticker,shares\n").unwrap();
        assert!(loaded.holdings.is_empty());
    }

    #[test]
    fn load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.csv");
        std::fs::write(&path, "ticker,shares\nO,10\n").unwrap();
        let loaded = loader().load_from_path(&path).unwrap();
        assert_eq!(loaded.holdings[0].ticker, "O");
    }

    #[test]
    fn missing_file_is_file_io() {
        let err = loader().load_from_path("/no/such/portfolio.csv").unwrap_err();
        assert!(matches!(err, CoreError::FileIO(ref m) if m.contains("portfolio.csv")));
    }
}

// ── Schema and row errors ───────────────────────────────────────────

mod validation {
    use super::*;

    #[test]
    fn missing_required_columns_named() {
        let err = loader().load_from_str("name,count\nO,1\n").unwrap_err();
        match err {
            CoreError::Schema { missing } => assert_eq!(missing, vec!["ticker", "shares"]),
            other => panic!("expected Schema, got {other:?}"),
        }
    }

    #[test]
    fn partial_payment_columns_rejected() {
        let err = loader()
            .load_from_str("Aktie,Stückzahl,Monat,Dividende\nO,1,Januar,0.25\n")
            .unwrap_err();
        match err {
            CoreError::Schema { missing } => assert_eq!(missing, vec!["year"]),
            other => panic!("expected Schema, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_shares_reports_line() {
        let err = loader()
            .load_from_str("ticker,shares\nO,10\nMSFT,lots\n")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRow { line: 3, .. }));
    }

    #[test]
    fn zero_shares_rejected() {
        let err = loader().load_from_str("ticker,shares\nO,0\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn tax_out_of_range_rejected() {
        let err = loader()
            .load_from_str("ticker,shares,tax\nO,1,150\n")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRow { .. }));
    }

    #[test]
    fn empty_ticker_rejected() {
        let err = loader().load_from_str("ticker,shares\n,5\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidRow { line: 2, .. }));
    }
}

// ── Pre-tabulated files ─────────────────────────────────────────────

mod pretabulated {
    use super::*;

    const GERMAN: &str = "Aktie,Stückzahl,Monat,Jahr,Dividende\n\
                          Allianz,10,Mai,2024,13.80\n\
                          BASF,20,April,2024,3.40\n\
                          Allianz,10,März,2023,11.40\n";

    #[test]
    fn german_headers_and_month_names() {
        let loaded = loader().load_from_str(GERMAN).unwrap();
        assert!(loaded.is_pretabulated());

        let tickers: Vec<&str> = loaded.holdings.iter().map(|h| h.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["ALLIANZ", "BASF"]);

        assert_eq!(loaded.payments.len(), 3);
        assert_eq!(loaded.payments[0].date, d(2024, 5, 1));
        assert_eq!(loaded.payments[0].amount_per_share, 13.80);
        assert_eq!(loaded.payments[0].currency, "EUR");
        assert_eq!(loaded.payments[2].date, d(2023, 3, 1));
    }

    #[test]
    fn local_source_carries_payments() {
        let loaded = loader().load_from_str(GERMAN).unwrap();
        let source = loaded.local_source().unwrap();
        assert_eq!(source.ticker_count(), 2);
    }

    #[test]
    fn later_share_counts_use_first_row() {
        let loaded = loader()
            .load_from_str("Aktie;Stückzahl;Monat;Jahr;Dividende\nO;10;1;2024;1,0\nO;25;2;2024;1,0\n")
            .unwrap();
        assert_eq!(loaded.holdings.len(), 1);
        assert_eq!(loaded.holdings[0].shares, 10.0);
        assert_eq!(loaded.payments.len(), 2);
    }

    #[test]
    fn numeric_months_and_currency_column() {
        let loaded = loader()
            .load_from_str("ticker,shares,currency,month,year,dividend\nO,10,USD,3,2024,0.2565\n")
            .unwrap();
        assert_eq!(loaded.payments[0].date, d(2024, 3, 1));
        assert_eq!(loaded.payments[0].currency, "USD");
    }

    #[test]
    fn unknown_month_rejected() {
        let err = loader()
            .load_from_str("Aktie,Stückzahl,Monat,Jahr,Dividende\nO,1,Smarch,2024,1\n")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRow { line: 2, .. }));
    }
}

// ── Month parsing ───────────────────────────────────────────────────

mod months {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(parse_month("1"), Some(1));
        assert_eq!(parse_month("12"), Some(12));
        assert_eq!(parse_month("0"), None);
        assert_eq!(parse_month("13"), None);
    }

    #[test]
    fn names() {
        assert_eq!(parse_month("März"), Some(3));
        assert_eq!(parse_month("maerz"), Some(3));
        assert_eq!(parse_month("Okt."), Some(10));
        assert_eq!(parse_month("December"), Some(12));
        assert_eq!(parse_month("Dezember"), Some(12));
        assert_eq!(parse_month("Brumaire"), None);
    }
}
