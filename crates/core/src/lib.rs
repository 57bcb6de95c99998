pub mod classify;
pub mod domain;
pub mod ingest;
pub mod pipeline;
pub mod storage;
pub mod time;

pub mod config {
    use crate::domain::recommendation::RecommendationPolicy;
    use crate::ingest::provider::QuoteProvider;
    use crate::time::us_market::DatePolicy;
    use anyhow::Context;
    use std::path::PathBuf;

    pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

    // Polygon's public demo key. Real requests with it fail with 401/403, which the quote
    // sources report as a transport failure like any other.
    pub const DEFAULT_API_KEY: &str = "DEMO_KEY";

    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_LIMIT: usize = 5;
    pub const DEFAULT_OUTPUT_PATH: &str = "data.json";
    pub const DEFAULT_WATCHLIST: [&str; 5] = ["AAPL", "MSFT", "NVDA", "GOOGL", "AMZN"];

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_key: String,
        pub base_url: String,
        pub provider: QuoteProvider,
        pub timeout_secs: u64,
        pub limit: usize,
        pub min_price: Option<f64>,
        pub recommendation_policy: RecommendationPolicy,
        pub watchlist: Vec<String>,
        pub date_policy: DatePolicy,
        pub output_path: PathBuf,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                api_key: DEFAULT_API_KEY.to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                provider: QuoteProvider::default(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                limit: DEFAULT_LIMIT,
                min_price: None,
                recommendation_policy: RecommendationPolicy::default(),
                watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
                date_policy: DatePolicy::default(),
                output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let mut out = Self::default();

            if let Some(key) = non_empty_var("POLYGON_API_KEY") {
                out.api_key = key;
            } else {
                tracing::warn!("POLYGON_API_KEY not set; falling back to {DEFAULT_API_KEY}");
            }

            if let Some(url) = non_empty_var("QUOTE_BASE_URL") {
                out.base_url = url;
            }

            if let Some(s) = non_empty_var("QUOTE_PROVIDER") {
                out.provider = s.parse().context("invalid QUOTE_PROVIDER")?;
            }

            if let Some(n) = parsed_var::<u64>("QUOTE_TIMEOUT_SECS") {
                out.timeout_secs = n;
            }

            if let Some(n) = parsed_var::<usize>("MOVERS_LIMIT") {
                out.limit = n;
            }

            out.min_price = parsed_var::<f64>("MOVERS_MIN_PRICE").filter(|p| *p > 0.0);

            if let Some(s) = non_empty_var("MOVERS_RECOMMENDATION") {
                out.recommendation_policy = s.parse().context("invalid MOVERS_RECOMMENDATION")?;
            }

            if let Some(s) = non_empty_var("WATCHLIST_SYMBOLS") {
                out.watchlist = parse_symbol_list(&s);
            }

            if let Some(s) = non_empty_var("TRADING_DATE_POLICY") {
                out.date_policy = s.parse().context("invalid TRADING_DATE_POLICY")?;
            }

            if let Some(p) = non_empty_var("OUTPUT_PATH") {
                out.output_path = PathBuf::from(p);
            }

            Ok(out)
        }
    }

    /// Splits a comma-separated ticker list, upper-casing and dropping blanks and repeats.
    pub fn parse_symbol_list(s: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for part in s.split(',') {
            let sym = part.trim().to_ascii_uppercase();
            if sym.is_empty() || out.contains(&sym) {
                continue;
            }
            out.push(sym);
        }
        out
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
        non_empty_var(key).and_then(|s| s.parse::<T>().ok())
    }

}
