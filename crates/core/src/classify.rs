use crate::domain::bar::{RawBar, ValidBar};
use crate::domain::recommendation::{reason_for, ListKind, RecommendationPolicy};
use crate::domain::report::{ClassifiedEntry, Report};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Maximum length of the gainers and losers lists.
    pub limit: usize,

    /// Bars closing below this price are left out of the movers ranking.
    pub min_price: Option<f64>,

    pub policy: RecommendationPolicy,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            min_price: None,
            policy: RecommendationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedMovers {
    pub gainers: Vec<ValidBar>,
    pub losers: Vec<ValidBar>,
}

/// Keeps valid bars at or above the price floor, in input order.
pub fn filter_bars(bars: &[RawBar], min_price: Option<f64>) -> Vec<ValidBar> {
    let mut out = Vec::with_capacity(bars.len());
    let mut invalid: usize = 0;
    let mut below_floor: usize = 0;

    for bar in bars {
        let Some(valid) = bar.validate() else {
            invalid += 1;
            tracing::debug!(symbol = %bar.symbol, open = ?bar.open, close = ?bar.close, "excluding invalid bar");
            continue;
        };
        if let Some(floor) = min_price {
            if valid.close < floor {
                below_floor += 1;
                continue;
            }
        }
        out.push(valid);
    }

    if invalid > 0 || below_floor > 0 {
        tracing::info!(
            total = bars.len(),
            kept = out.len(),
            invalid,
            below_floor,
            "filtered market bars"
        );
    }

    out
}

/// Ranks bars by percent change. Both sorts are stable so equal changes keep input order.
/// Losers are the bottom `limit` bars, most negative first.
pub fn rank_movers(bars: &[RawBar], limit: usize, min_price: Option<f64>) -> RankedMovers {
    let valid = filter_bars(bars, min_price);

    let mut desc = valid.clone();
    desc.sort_by(|a, b| {
        b.percent_change
            .partial_cmp(&a.percent_change)
            .unwrap_or(Ordering::Equal)
    });
    desc.truncate(limit);

    let mut asc = valid;
    asc.sort_by(|a, b| {
        a.percent_change
            .partial_cmp(&b.percent_change)
            .unwrap_or(Ordering::Equal)
    });
    asc.truncate(limit);

    RankedMovers {
        gainers: desc,
        losers: asc,
    }
}

pub fn classify_bar(bar: &ValidBar, list: ListKind, policy: RecommendationPolicy) -> ClassifiedEntry {
    let recommendation = policy.recommend(list, bar.percent_change);
    let reason = reason_for(&bar.symbol, bar.percent_change);
    ClassifiedEntry::new(bar, recommendation, reason)
}

fn classify_all(bars: &[ValidBar], list: ListKind, policy: RecommendationPolicy) -> Vec<ClassifiedEntry> {
    bars.iter().map(|b| classify_bar(b, list, policy)).collect()
}

/// Builds a report from the market-wide bars and the already-resolved watchlist bars.
/// Invalid watchlist bars are dropped; watchlist order is preserved.
pub fn build_report(
    market: &[RawBar],
    watchlist: &[RawBar],
    opts: &ClassifyOptions,
    generated_at: DateTime<Utc>,
) -> Report {
    let ranked = rank_movers(market, opts.limit, opts.min_price);

    let watch: Vec<ValidBar> = watchlist.iter().filter_map(RawBar::validate).collect();

    Report {
        gainers: classify_all(&ranked.gainers, ListKind::Gainers, opts.policy),
        losers: classify_all(&ranked.losers, ListKind::Losers, opts.policy),
        watchlist: classify_all(&watch, ListKind::Watchlist, opts.policy),
        generated_at,
    }
}
