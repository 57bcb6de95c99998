use serde::{Deserialize, Serialize};

/// One symbol's daily price data, already normalized from whatever the provider sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub symbol: String,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub percent_change: Option<f64>,
}

/// A bar that passed validation, carrying the change used for ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBar {
    pub symbol: String,
    pub open: f64,
    pub close: f64,
    pub percent_change: f64,
}

impl RawBar {
    pub fn new(symbol: impl Into<String>, open: Option<f64>, close: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            open,
            close,
            percent_change: None,
        }
    }

    pub fn with_percent_change(mut self, percent_change: Option<f64>) -> Self {
        self.percent_change = percent_change;
        self
    }

    /// Percent change for this bar, or `None` when the bar is invalid.
    ///
    /// A finite precomputed change is trusted. Otherwise the change is derived from open/close.
    /// Missing, non-finite or non-positive prices never produce a value.
    pub fn percent_change(&self) -> Option<f64> {
        let (open, close) = self.prices()?;
        match self.percent_change {
            Some(pc) if pc.is_finite() => Some(pc),
            _ => Some((close - open) / open * 100.0),
        }
    }

    pub fn validate(&self) -> Option<ValidBar> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return None;
        }
        let (open, close) = self.prices()?;
        let percent_change = self.percent_change()?;
        Some(ValidBar {
            symbol: symbol.to_string(),
            open,
            close,
            percent_change,
        })
    }

    fn prices(&self) -> Option<(f64, f64)> {
        let open = self.open.filter(|p| p.is_finite() && *p > 0.0)?;
        let close = self.close.filter(|p| p.is_finite() && *p > 0.0)?;
        Some((open, close))
    }
}
