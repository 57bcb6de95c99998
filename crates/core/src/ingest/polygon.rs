use crate::domain::bar::RawBar;
use crate::ingest::error::QuoteError;
use crate::ingest::provider::{HttpJson, QuoteSource};
use crate::ingest::types::{
    normalize_bar, normalize_bars, GroupedDailyResponse, SnapshotMoversResponse,
    SnapshotTickerResponse,
};
use chrono::NaiveDate;
use serde_json::Value;

const GROUPED_PATH: &str = "/v2/aggs/grouped/locale/us/market/stocks";
const OPEN_CLOSE_PATH: &str = "/v1/open-close";
const SNAPSHOT_PATH: &str = "/v2/snapshot/locale/us/markets/stocks";

/// Grouped daily aggregates for the whole market, `open-close` for single symbols.
#[derive(Debug, Clone)]
pub struct PolygonGroupedSource {
    http: HttpJson,
}

impl PolygonGroupedSource {
    pub fn new(http: HttpJson) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl QuoteSource for PolygonGroupedSource {
    fn provider_name(&self) -> &'static str {
        "polygon_grouped"
    }

    async fn fetch_market_bars(
        &self,
        as_of_date: NaiveDate,
    ) -> Result<(Vec<RawBar>, Value), QuoteError> {
        let path = format!("{GROUPED_PATH}/{as_of_date}");
        let (body, raw) = self
            .http
            .get::<GroupedDailyResponse>("grouped_daily", &path, &[("adjusted", "true")])
            .await?;

        let normalized = normalize_bars(&body.results);
        tracing::info!(
            %as_of_date,
            status = body.status.as_deref().unwrap_or("unknown"),
            results = body.results.len(),
            bars = normalized.bars.len(),
            dropped = normalized.dropped,
            "fetched grouped daily bars"
        );

        Ok((normalized.bars, raw))
    }

    async fn fetch_symbol_bar(
        &self,
        symbol: &str,
        as_of_date: NaiveDate,
    ) -> Result<Option<RawBar>, QuoteError> {
        let path = format!("{OPEN_CLOSE_PATH}/{symbol}/{as_of_date}");
        let (raw, _) = self
            .http
            .get::<Value>("open_close", &path, &[("adjusted", "true")])
            .await?;

        if !status_ok(&raw) {
            tracing::debug!(%symbol, %as_of_date, body = %raw, "open-close returned no data");
            return Ok(None);
        }

        Ok(normalize_bar(&raw))
    }
}

/// Live snapshot movers lists. The provider decides the trading session, so `as_of_date` is
/// informational only.
#[derive(Debug, Clone)]
pub struct PolygonSnapshotSource {
    http: HttpJson,
}

impl PolygonSnapshotSource {
    pub fn new(http: HttpJson) -> Self {
        Self { http }
    }

    async fn fetch_direction(&self, direction: &str) -> Result<(Vec<RawBar>, Value), QuoteError> {
        let path = format!("{SNAPSHOT_PATH}/{direction}");
        let (body, raw) = self
            .http
            .get::<SnapshotMoversResponse>(direction, &path, &[])
            .await?;
        let normalized = normalize_bars(&body.tickers);
        tracing::info!(
            direction,
            tickers = body.tickers.len(),
            dropped = normalized.dropped,
            "fetched snapshot movers"
        );
        Ok((normalized.bars, raw))
    }
}

#[async_trait::async_trait]
impl QuoteSource for PolygonSnapshotSource {
    fn provider_name(&self) -> &'static str {
        "polygon_snapshot"
    }

    async fn fetch_market_bars(
        &self,
        as_of_date: NaiveDate,
    ) -> Result<(Vec<RawBar>, Value), QuoteError> {
        tracing::debug!(%as_of_date, "snapshot provider ignores as_of_date");

        let gainers = self.fetch_direction("gainers").await;
        let losers = self.fetch_direction("losers").await;

        merge_movers(gainers, losers)
    }

    async fn fetch_symbol_bar(
        &self,
        symbol: &str,
        _as_of_date: NaiveDate,
    ) -> Result<Option<RawBar>, QuoteError> {
        let path = format!("{SNAPSHOT_PATH}/tickers/{symbol}");
        let (body, _) = self
            .http
            .get::<SnapshotTickerResponse>("snapshot_ticker", &path, &[])
            .await?;

        Ok(body.ticker.as_ref().and_then(normalize_bar))
    }
}

type MoversResult = Result<(Vec<RawBar>, Value), QuoteError>;

/// Combines the gainers and losers lists, first occurrence of a symbol wins. One failed side is
/// tolerated; the call fails only when both sides do.
fn merge_movers(gainers: MoversResult, losers: MoversResult) -> MoversResult {
    let (mut bars, mut raw) = (Vec::new(), serde_json::Map::new());
    let mut last_err: Option<QuoteError> = None;
    for (direction, res) in [("gainers", gainers), ("losers", losers)] {
        match res {
            Ok((b, r)) => {
                for bar in b {
                    if !bars.iter().any(|x: &RawBar| x.symbol == bar.symbol) {
                        bars.push(bar);
                    }
                }
                raw.insert(direction.to_string(), r);
            }
            Err(err) => {
                tracing::warn!(direction, error = %err, "snapshot movers fetch failed");
                last_err = Some(err);
            }
        }
    }

    match last_err {
        Some(err) if raw.is_empty() => Err(err),
        _ => Ok((bars, Value::Object(raw))),
    }
}

fn status_ok(v: &Value) -> bool {
    match v.get("status").and_then(Value::as_str) {
        Some(s) => s.eq_ignore_ascii_case("OK"),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bar(sym: &str, open: f64, close: f64) -> RawBar {
        RawBar::new(sym, Some(open), Some(close))
    }

    fn side(bars: Vec<RawBar>) -> MoversResult {
        let raw = json!({"status": "OK", "tickers": bars.len()});
        Ok((bars, raw))
    }

    fn failed(call: &str) -> MoversResult {
        Err(QuoteError::transport(call, "HTTP 500 Internal Server Error"))
    }

    fn symbols(bars: &[RawBar]) -> Vec<&str> {
        bars.iter().map(|b| b.symbol.as_str()).collect()
    }

    #[test]
    fn merges_both_lists_without_repeats() {
        let (bars, raw) = merge_movers(
            side(vec![bar("UP", 10.0, 12.0), bar("BOTH", 10.0, 10.5)]),
            side(vec![bar("BOTH", 10.0, 10.5), bar("DOWN", 10.0, 8.0)]),
        )
        .unwrap();
        assert_eq!(symbols(&bars), vec!["UP", "BOTH", "DOWN"]);
        assert_eq!(raw["gainers"]["tickers"], json!(2));
        assert_eq!(raw["losers"]["tickers"], json!(2));
    }

    #[test]
    fn keeps_losers_when_gainers_fail() {
        let (bars, raw) =
            merge_movers(failed("gainers"), side(vec![bar("DOWN", 10.0, 8.0)])).unwrap();
        assert_eq!(symbols(&bars), vec!["DOWN"]);
        assert!(raw.get("gainers").is_none());
        assert!(raw.get("losers").is_some());
    }

    #[test]
    fn keeps_gainers_when_losers_fail() {
        let (bars, raw) =
            merge_movers(side(vec![bar("UP", 10.0, 12.0)]), failed("losers")).unwrap();
        assert_eq!(symbols(&bars), vec!["UP"]);
        assert!(raw.get("losers").is_none());
    }

    #[test]
    fn fails_when_both_lists_fail() {
        let err = merge_movers(failed("gainers"), failed("losers")).unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().contains("losers"));
    }

    #[test]
    fn empty_lists_are_not_a_failure() {
        let (bars, _) = merge_movers(side(vec![]), side(vec![])).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn open_close_status_gate() {
        assert!(status_ok(&json!({"status": "OK", "open": 1.0})));
        assert!(status_ok(&json!({"open": 1.0})));
        assert!(!status_ok(&json!({"status": "NOT_FOUND"})));
    }

    #[test]
    fn snapshot_ticker_body_normalizes() {
        let body: SnapshotTickerResponse = serde_json::from_value(json!({
            "status": "OK",
            "ticker": {
                "ticker": "AAPL",
                "todaysChangePerc": -1.25,
                "day": {"o": 190.0, "c": 187.6}
            }
        }))
        .unwrap();
        let bar = body.ticker.as_ref().and_then(normalize_bar).unwrap();
        assert_eq!(bar.symbol, "AAPL");
        assert_eq!(bar.close, Some(187.6));
        assert_eq!(bar.percent_change, Some(-1.25));
    }
}
