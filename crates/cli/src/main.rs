use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use dividend_tracker_core::models::report::PortfolioReport;
use dividend_tracker_core::models::settings::Settings;
use dividend_tracker_core::providers::local_file::LocalFileSource;
use dividend_tracker_core::services::portfolio_loader::PortfolioLoader;
use dividend_tracker_core::DividendTracker;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "dividend-tracker", about = "Projects annual dividend income for a portfolio")]
struct Args {
    /// Portfolio CSV (ticker, shares, optional tax rate / currency).
    #[arg(long, short)]
    portfolio: String,

    /// Dividend history CSV (ticker, date, amount, optional currency).
    #[arg(long)]
    payments: Option<String>,

    /// Settings JSON file.
    #[arg(long, short)]
    config: Option<String>,

    /// Project as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<String>,

    /// Reporting currency, overrides the settings file.
    #[arg(long)]
    currency: Option<String>,

    /// Use only local data: no dividend APIs, no exchange-rate lookups.
    #[arg(long)]
    offline: bool,

    /// Also print a January–December net calendar for this year.
    #[arg(long)]
    year: Option<i32>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = load_settings(&args)?;
    let now = resolve_as_of(args.as_of.as_deref())?;

    let loaded = PortfolioLoader::new(&settings)
        .load_from_path(&args.portfolio)
        .with_context(|| format!("loading portfolio {}", args.portfolio))?;

    // Pre-tabulated rows and an explicit history file both act as a local source.
    let mut local = loaded.local_source().unwrap_or_default();
    if let Some(path) = &args.payments {
        let history = LocalFileSource::from_path(path, &settings.default_currency)
            .with_context(|| format!("loading dividend history {path}"))?;
        local.merge(history);
    }

    let mut tracker = if args.offline {
        DividendTracker::offline(settings, local)?
    } else if local.is_empty() {
        DividendTracker::new(settings)?
    } else {
        DividendTracker::with_local_history(settings, Some(local))?
    };
    tracing::debug!(sources = ?tracker.source_names(), "dividend sources");

    let report = tracker
        .generate_report_at(&loaded.holdings, now)
        .await
        .context("generating dividend report")?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report, args.year),
    }

    Ok(())
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("reading settings {path}"))?,
        None => Settings::default(),
    };
    if let Ok(key) = std::env::var("ALPHAVANTAGE_API_KEY") {
        settings.api_keys.entry("alphavantage".into()).or_insert(key);
    }
    if let Some(currency) = &args.currency {
        settings.set_reporting_currency(currency)?;
    }
    Ok(settings)
}

fn resolve_as_of(raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of date '{s}', expected YYYY-MM-DD")),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}

fn print_table(report: &PortfolioReport, year: Option<i32>) {
    let cur = &report.reporting_currency;
    println!("Dividend projection as of {}", report.generated_on);
    println!();
    println!(
        "{:<10} {:>10} {:>6} {:>12} {:>4} {:>9} {:>12}  {}",
        "Ticker", "Shares", "Tax%", "Gross", "Cur", "FX", format!("Net {cur}"), "Method"
    );
    for row in &report.rows {
        let fx_mark = if row.fx_ok { "" } else { "*" };
        println!(
            "{:<10} {:>10.2} {:>6.2} {:>12.2} {:>4} {:>8.4}{:<1} {:>12.2}  {}",
            row.ticker,
            row.shares,
            row.tax_rate_pct,
            row.gross_amount,
            row.currency,
            row.fx_rate,
            fx_mark,
            row.net_amount,
            row.method
        );
    }
    println!();
    println!("Total projected net income: {:.2} {cur}", report.total_net);
    if report.has_estimated_fx() {
        println!("* exchange rate unavailable, amount not currency-adjusted");
    }

    if !report.yearly_net.is_empty() {
        println!();
        println!("Net dividends per year ({cur}):");
        for total in &report.yearly_net {
            println!("  {:<8} {:>12.2}", total.period.to_string(), total.net_amount);
        }
    }

    if let Some(year) = year {
        println!();
        println!("Net dividends per month in {year} ({cur}):");
        for total in report.calendar(year) {
            println!("  {:<8} {:>12.2}", total.period.to_string(), total.net_amount);
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            println!("  {:<10} {}", w.ticker, w.message);
        }
    }
}
