use crate::config::Settings;
use crate::domain::bar::RawBar;
use crate::ingest::error::QuoteError;
use crate::ingest::polygon::{PolygonGroupedSource, PolygonSnapshotSource};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// All symbols' bars for one trading date, plus the raw payload for dumping.
    async fn fetch_market_bars(&self, as_of_date: NaiveDate)
        -> Result<(Vec<RawBar>, Value), QuoteError>;

    /// One symbol's bar for one trading date. `Ok(None)` means the provider had nothing.
    async fn fetch_symbol_bar(
        &self,
        symbol: &str,
        as_of_date: NaiveDate,
    ) -> Result<Option<RawBar>, QuoteError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteProvider {
    /// Grouped daily aggregates plus per-symbol open/close.
    #[default]
    Grouped,
    /// Live snapshot gainers/losers lists plus per-ticker snapshots.
    Snapshot,
}

impl FromStr for QuoteProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grouped" | "aggs" => Ok(Self::Grouped),
            "snapshot" => Ok(Self::Snapshot),
            other => anyhow::bail!("unknown quote provider: {other}"),
        }
    }
}

pub fn source_from_settings(settings: &Settings) -> Result<Box<dyn QuoteSource>> {
    let http = HttpJson::from_settings(settings)?;
    Ok(match settings.provider {
        QuoteProvider::Grouped => Box::new(PolygonGroupedSource::new(http)),
        QuoteProvider::Snapshot => Box::new(PolygonSnapshotSource::new(http)),
    })
}

/// Thin JSON-over-HTTP client shared by the Polygon sources. One attempt per call, bounded by
/// the client timeout; the API key travels as the `apiKey` query parameter.
#[derive(Debug, Clone)]
pub struct HttpJson {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpJson {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build quote http client")?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GETs `path` and returns both the typed body and the raw JSON.
    pub async fn get<T: DeserializeOwned>(
        &self,
        call: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(T, Value), QuoteError> {
        let url = self.url(path);
        tracing::debug!(call, %url, "quote request");

        // Errors are stripped of the URL: it carries the API key.
        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| QuoteError::transport(call, e.without_url()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| QuoteError::transport(call, e.without_url()))?;

        if !status.is_success() {
            return Err(QuoteError::transport(
                call,
                format!("HTTP {status}: {}", truncate(&text, 200)),
            ));
        }

        let raw = serde_json::from_str::<Value>(&text)
            .map_err(|e| QuoteError::format(call, format!("body is not JSON: {e}")))?;
        let parsed = serde_json::from_value::<T>(raw.clone())
            .map_err(|e| QuoteError::format(call, e))?;
        Ok((parsed, raw))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
