use thiserror::Error;

/// Failure of a single quote-source call. Callers treat either kind as "no data".
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The call did not complete with a success status, or no usable body came back.
    #[error("transport failure ({call}): {detail}")]
    Transport { call: String, detail: String },

    /// The body arrived but is not the shape the provider promises.
    #[error("format failure ({call}): {detail}")]
    Format { call: String, detail: String },
}

impl QuoteError {
    pub fn transport(call: impl Into<String>, detail: impl ToString) -> Self {
        Self::Transport {
            call: call.into(),
            detail: detail.to_string(),
        }
    }

    pub fn format(call: impl Into<String>, detail: impl ToString) -> Self {
        Self::Format {
            call: call.into(),
            detail: detail.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Format { .. } => "format",
        }
    }
}
