use crate::classify::{build_report, ClassifyOptions};
use crate::config::Settings;
use crate::domain::bar::RawBar;
use crate::domain::report::Report;
use crate::ingest::provider::QuoteSource;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub classify: ClassifyOptions,
    pub watchlist: Vec<String>,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            classify: ClassifyOptions {
                limit: settings.limit,
                min_price: settings.min_price,
                policy: settings.recommendation_policy,
            },
            watchlist: settings.watchlist.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub as_of_date: NaiveDate,
    pub report: Report,
    /// Raw market-wide payload, `Value::Null` when the call failed.
    pub raw_market: Value,
    pub market_bars: usize,
    pub watchlist_missing: Vec<String>,
}

/// One market-wide call. Any failure is logged and becomes an empty bar list.
pub async fn fetch_market(source: &dyn QuoteSource, as_of_date: NaiveDate) -> (Vec<RawBar>, Value) {
    match source.fetch_market_bars(as_of_date).await {
        Ok(res) => res,
        Err(err) => {
            tracing::warn!(
                provider = source.provider_name(),
                %as_of_date,
                kind = err.kind(),
                error = %err,
                "market bars unavailable; continuing with no movers"
            );
            (Vec::new(), Value::Null)
        }
    }
}

/// One lookup per symbol, in configured order. Symbols without valid data are dropped
/// and reported back as missing.
pub async fn resolve_watchlist(
    source: &dyn QuoteSource,
    symbols: &[String],
    as_of_date: NaiveDate,
) -> (Vec<RawBar>, Vec<String>) {
    let mut found = Vec::with_capacity(symbols.len());
    let mut missing = Vec::new();

    for symbol in symbols {
        match source.fetch_symbol_bar(symbol, as_of_date).await {
            Ok(Some(bar)) if bar.validate().is_some() => found.push(bar),
            Ok(Some(bar)) => {
                tracing::warn!(%symbol, open = ?bar.open, close = ?bar.close, "watchlist bar invalid; skipping");
                missing.push(symbol.clone());
            }
            Ok(None) => {
                tracing::warn!(%symbol, %as_of_date, "no watchlist data; skipping");
                missing.push(symbol.clone());
            }
            Err(err) => {
                tracing::warn!(%symbol, kind = err.kind(), error = %err, "watchlist fetch failed; skipping");
                missing.push(symbol.clone());
            }
        }
    }

    (found, missing)
}

pub async fn run(
    source: &dyn QuoteSource,
    opts: &PipelineOptions,
    as_of_date: NaiveDate,
    generated_at: DateTime<Utc>,
) -> RunOutput {
    let (market, raw_market) = fetch_market(source, as_of_date).await;
    let (watch, watchlist_missing) = resolve_watchlist(source, &opts.watchlist, as_of_date).await;

    let report = build_report(&market, &watch, &opts.classify, generated_at);

    tracing::info!(
        provider = source.provider_name(),
        %as_of_date,
        market_bars = market.len(),
        gainers = report.gainers.len(),
        losers = report.losers.len(),
        watchlist = report.watchlist.len(),
        watchlist_missing = watchlist_missing.len(),
        "built movers report"
    );

    RunOutput {
        as_of_date,
        report,
        raw_market,
        market_bars: market.len(),
        watchlist_missing,
    }
}
