use anyhow::Context;
use clap::Parser;
use movers_core::config::Settings;
use movers_core::ingest::provider::QuoteSource;
use movers_core::ingest::sample::SampleQuoteSource;
use movers_core::pipeline::{self, PipelineOptions};
use movers_core::storage::snapshot;
use movers_core::time::us_market;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "movers_worker")]
struct Args {
    /// Trading date (YYYY-MM-DD). Defaults to TRADING_DATE_POLICY applied to the New York clock.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Build and log the report without writing the snapshot.
    #[arg(long)]
    dry_run: bool,

    /// Snapshot path. Overrides OUTPUT_PATH.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of gainers and losers. Overrides MOVERS_LIMIT.
    #[arg(long)]
    limit: Option<usize>,

    /// Leave bars closing under this price out of the movers. Overrides MOVERS_MIN_PRICE.
    #[arg(long)]
    min_price: Option<f64>,

    /// Use built-in sample quotes instead of calling the provider.
    #[arg(long)]
    sample: bool,

    /// Also write the raw market-wide provider payload here.
    #[arg(long)]
    raw_dump: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    // Sentry comes up before settings are validated so configuration errors are captured too.
    let sentry_dsn = std::env::var("SENTRY_DSN").ok().filter(|s| !s.trim().is_empty());
    let _sentry_guard = init_sentry(sentry_dsn.as_deref());

    let result = match load_settings(&args) {
        Ok(settings) => run(&settings, &args).await,
        Err(err) => Err(err),
    };
    report_outcome(result)
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = Settings::from_env().context("loading configuration")?;
    apply_overrides(&mut settings, args);
    Ok(settings)
}

fn report_outcome(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "movers run failed; previous snapshot left in place");
    }
    result
}

async fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    let holidays = us_market::configured_holidays();
    let as_of_date = us_market::resolve_as_of_date(
        args.as_of_date.as_deref(),
        settings.date_policy,
        chrono::Utc::now(),
        &holidays,
    )?;

    let source: Box<dyn QuoteSource> = if args.sample {
        Box::new(SampleQuoteSource)
    } else {
        movers_core::ingest::provider::source_from_settings(settings)?
    };

    tracing::info!(
        %as_of_date,
        provider = source.provider_name(),
        limit = settings.limit,
        min_price = ?settings.min_price,
        watchlist = settings.watchlist.len(),
        "starting movers run"
    );

    let opts = PipelineOptions::from_settings(settings);
    let out = pipeline::run(source.as_ref(), &opts, as_of_date, chrono::Utc::now()).await;

    if args.dry_run {
        let doc = snapshot::SnapshotDocument::from(&out.report);
        tracing::info!(
            %as_of_date,
            dry_run = true,
            snapshot = %serde_json::to_string(&doc)?,
            "movers report (dry-run)"
        );
        return Ok(());
    }

    if let Some(path) = &args.raw_dump {
        // Raw dumps are diagnostics; a failed dump does not block the snapshot.
        match snapshot::write_json_atomic(path, &out.raw_market) {
            Ok(()) => tracing::info!(path = %path.display(), "wrote raw provider payload"),
            Err(err) => tracing::warn!(path = %path.display(), error = %format!("{err:#}"), "raw dump failed"),
        }
    }

    snapshot::write_snapshot(&settings.output_path, &out.report)
        .with_context(|| format!("writing snapshot to {}", settings.output_path.display()))?;

    tracing::info!(
        %as_of_date,
        path = %settings.output_path.display(),
        market_bars = out.market_bars,
        gainers = out.report.gainers.len(),
        losers = out.report.losers.len(),
        tech = out.report.watchlist.len(),
        missing = ?out.watchlist_missing,
        "wrote movers snapshot"
    );

    Ok(())
}

fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(path) = &args.output {
        settings.output_path = path.clone();
    }
    if let Some(limit) = args.limit {
        settings.limit = limit;
    }
    if let Some(min_price) = args.min_price {
        settings.min_price = Some(min_price).filter(|p| *p > 0.0);
    }
}

fn init_sentry(dsn: Option<&str>) -> Option<sentry::ClientInitGuard> {
    let dsn = dsn?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_settings() {
        let args = Args::parse_from([
            "movers_worker",
            "--output",
            "site/data.json",
            "--limit",
            "3",
            "--min-price",
            "2.00",
            "--sample",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &args);
        assert_eq!(settings.output_path, PathBuf::from("site/data.json"));
        assert_eq!(settings.limit, 3);
        assert_eq!(settings.min_price, Some(2.0));
        assert!(args.sample);
        assert!(!args.dry_run);
    }

    #[test]
    fn failures_pass_through_with_context() {
        let err = anyhow::anyhow!("unknown quote provider: yahoo").context("loading configuration");
        let out = report_outcome(Err(err)).unwrap_err();
        assert_eq!(
            format!("{out:#}"),
            "loading configuration: unknown quote provider: yahoo"
        );
        assert!(report_outcome(Ok(())).is_ok());
    }

    #[test]
    fn no_dsn_means_no_sentry() {
        assert!(init_sentry(None).is_none());
    }

    #[test]
    fn zero_min_price_disables_floor() {
        let args = Args::parse_from(["movers_worker", "--min-price", "0"]);
        let mut settings = Settings {
            min_price: Some(5.0),
            ..Settings::default()
        };
        apply_overrides(&mut settings, &args);
        assert_eq!(settings.min_price, None);
    }
}
