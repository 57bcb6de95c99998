//! Provider payload shapes and the single normalization step into [`RawBar`].
//!
//! Envelopes are typed; individual bars are kept as raw JSON so that one malformed entry only
//! drops that entry instead of failing the whole response.

use crate::domain::bar::RawBar;
use serde::Deserialize;
use serde_json::Value;

const SYMBOL_KEYS: &[&str] = &["T", "ticker", "symbol"];
const OPEN_KEYS: &[&str] = &["o", "open"];
const CLOSE_KEYS: &[&str] = &["c", "close"];
const CHANGE_KEYS: &[&str] = &[
    "changePercent",
    "todaysChangePerc",
    "percentChange",
    "change_percent",
];

/// `GET /v2/aggs/grouped/locale/us/market/stocks/{date}`
#[derive(Debug, Clone, Deserialize)]
pub struct GroupedDailyResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub results: Vec<Value>,
}

/// `GET /v2/snapshot/locale/us/markets/stocks/{gainers|losers}`
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotMoversResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tickers: Vec<Value>,
}

/// `GET /v2/snapshot/locale/us/markets/stocks/tickers/{symbol}`
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotTickerResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ticker: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBars {
    pub bars: Vec<RawBar>,
    /// Entries that had no usable symbol.
    pub dropped: usize,
}

/// Maps one provider bar (`T`/`o`/`c`, `open`/`close`, or a snapshot ticker with a nested
/// `day` aggregate) to a [`RawBar`]. Returns `None` when no symbol can be found. Prices that
/// are absent or non-numeric come through as `None` and are rejected later by validation.
pub fn normalize_bar(v: &Value) -> Option<RawBar> {
    let symbol = lookup(v, SYMBOL_KEYS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_ascii_uppercase();

    let (open, close) = match v.get("day").filter(|d| d.is_object()) {
        Some(day) => {
            let open = lookup(day, OPEN_KEYS).and_then(number);
            // Snapshot day aggregates read 0 before the session has traded.
            let close = lookup(day, CLOSE_KEYS)
                .and_then(number)
                .filter(|c| *c > 0.0)
                .or_else(|| v.pointer("/lastTrade/p").and_then(number));
            (open, close)
        }
        None => (
            lookup(v, OPEN_KEYS).and_then(number),
            lookup(v, CLOSE_KEYS).and_then(number),
        ),
    };

    let percent_change = lookup(v, CHANGE_KEYS).and_then(number);

    Some(RawBar::new(symbol, open, close).with_percent_change(percent_change))
}

pub fn normalize_bars(items: &[Value]) -> NormalizedBars {
    let mut out = NormalizedBars::default();
    for item in items {
        match normalize_bar(item) {
            Some(bar) => out.bars.push(bar),
            None => {
                out.dropped += 1;
                tracing::debug!(item = %item, "dropping provider bar without symbol");
            }
        }
    }
    out
}

fn lookup<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| v.get(*k)).filter(|x| !x.is_null())
}

fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim().trim_end_matches('%');
            if t.is_empty() {
                return None;
            }
            t.parse::<f64>().ok()
        }
        _ => None,
    };
    n.filter(|n| n.is_finite())
}
