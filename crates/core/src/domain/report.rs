use crate::domain::bar::ValidBar;
use crate::domain::recommendation::Recommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedEntry {
    pub symbol: String,
    pub price: String,
    pub percent_change: String,
    pub recommendation: Recommendation,
    pub reason: String,
}

impl ClassifiedEntry {
    pub fn new(bar: &ValidBar, recommendation: Recommendation, reason: String) -> Self {
        Self {
            symbol: bar.symbol.clone(),
            price: format_price(bar.close),
            percent_change: format_change(bar.percent_change),
            recommendation,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub gainers: Vec<ClassifiedEntry>,
    pub losers: Vec<ClassifiedEntry>,
    pub watchlist: Vec<ClassifiedEntry>,
    pub generated_at: DateTime<Utc>,
}

pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

pub fn format_change(percent_change: f64) -> String {
    format!("{percent_change:+.2}")
}
