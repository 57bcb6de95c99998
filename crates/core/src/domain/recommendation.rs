use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Put Option")]
    PutOption,
    Sell,
    Hold,
    Buy,
    #[serde(rename = "Strong Buy")]
    StrongBuy,
}

impl Recommendation {
    /// Maps a signed percent change onto one of five bands split at -5, -2, 2 and 5.
    /// Boundary values go to the higher band. NaN falls through to the lowest band.
    pub fn for_change(percent_change: f64) -> Self {
        if percent_change >= 5.0 {
            Self::StrongBuy
        } else if percent_change >= 2.0 {
            Self::Buy
        } else if percent_change >= -2.0 {
            Self::Hold
        } else if percent_change >= -5.0 {
            Self::Sell
        } else {
            Self::PutOption
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Sell => "Sell",
            Self::PutOption => "Put Option",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which list an entry is being labelled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Gainers,
    Losers,
    Watchlist,
}

/// How the gainers/losers lists are labelled. The watchlist is always banded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecommendationPolicy {
    /// Gainers are `Buy`, losers are `Sell`.
    #[default]
    Directional,
    Banded,
}

impl RecommendationPolicy {
    pub fn recommend(self, list: ListKind, percent_change: f64) -> Recommendation {
        match (self, list) {
            (Self::Directional, ListKind::Gainers) => Recommendation::Buy,
            (Self::Directional, ListKind::Losers) => Recommendation::Sell,
            _ => Recommendation::for_change(percent_change),
        }
    }
}

impl FromStr for RecommendationPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directional" => Ok(Self::Directional),
            "banded" | "bands" => Ok(Self::Banded),
            other => anyhow::bail!("unknown recommendation policy: {other}"),
        }
    }
}

// Editorial copy for frequently watched names. Anything else gets the templated sentence.
const REASONS: &[(&str, &str)] = &[
    (
        "AAPL",
        "iPhone demand and services growth keep Apple at the center of large-cap tech flows.",
    ),
    (
        "MSFT",
        "Azure and enterprise AI adoption continue to drive Microsoft's cloud momentum.",
    ),
    (
        "NVDA",
        "Data-center GPU demand from AI workloads remains the main driver for Nvidia.",
    ),
    (
        "GOOGL",
        "Search advertising strength and Google Cloud growth support Alphabet's outlook.",
    ),
    (
        "AMZN",
        "AWS margins and retail efficiency gains are in focus for Amazon.",
    ),
    (
        "META",
        "Ad revenue recovery and AI-driven engagement lift Meta's core platforms.",
    ),
    (
        "TSLA",
        "Delivery numbers and pricing moves keep Tesla volatile around EV sentiment.",
    ),
    (
        "AMD",
        "Share gains in data-center CPUs and new accelerators support AMD.",
    ),
];

pub fn canned_reason(symbol: &str) -> Option<&'static str> {
    REASONS
        .iter()
        .find(|(sym, _)| sym.eq_ignore_ascii_case(symbol))
        .map(|(_, reason)| *reason)
}

pub fn reason_for(symbol: &str, percent_change: f64) -> String {
    match canned_reason(symbol) {
        Some(reason) => reason.to_string(),
        None => format!("Stock moved {percent_change:+.2}% on the most recent trading day."),
    }
}
