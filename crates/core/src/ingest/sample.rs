use crate::domain::bar::RawBar;
use crate::ingest::error::QuoteError;
use crate::ingest::provider::QuoteSource;
use chrono::NaiveDate;
use serde_json::{json, Value};

// (symbol, open, close)
const SAMPLE_BARS: &[(&str, f64, f64)] = &[
    ("AAPL", 189.30, 192.53),
    ("MSFT", 415.10, 409.72),
    ("NVDA", 121.40, 128.96),
    ("GOOGL", 171.20, 172.05),
    ("AMZN", 183.75, 186.40),
    ("TSLA", 248.10, 233.22),
    ("META", 502.00, 514.87),
    ("AMD", 156.30, 149.61),
    ("INTC", 30.85, 29.20),
    ("NFLX", 640.00, 662.40),
    ("PLTR", 24.10, 25.70),
    ("SOFI", 7.40, 7.05),
];

/// Fixed in-memory quotes for offline runs.
#[derive(Debug, Clone, Default)]
pub struct SampleQuoteSource;

impl SampleQuoteSource {
    pub fn bars() -> Vec<RawBar> {
        SAMPLE_BARS
            .iter()
            .map(|(sym, o, c)| RawBar::new(*sym, Some(*o), Some(*c)))
            .collect()
    }
}

#[async_trait::async_trait]
impl QuoteSource for SampleQuoteSource {
    fn provider_name(&self) -> &'static str {
        "sample"
    }

    async fn fetch_market_bars(
        &self,
        as_of_date: NaiveDate,
    ) -> Result<(Vec<RawBar>, Value), QuoteError> {
        let bars = Self::bars();
        let raw = json!({
            "source": "sample",
            "as_of_date": as_of_date,
            "results": bars,
        });
        Ok((bars, raw))
    }

    async fn fetch_symbol_bar(
        &self,
        symbol: &str,
        _as_of_date: NaiveDate,
    ) -> Result<Option<RawBar>, QuoteError> {
        Ok(Self::bars()
            .into_iter()
            .find(|b| b.symbol.eq_ignore_ascii_case(symbol)))
    }
}
