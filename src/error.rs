use thiserror::Error;

/// Failures of a single indicator computation. None of them are retried.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("price data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("insufficient history: got {got} samples, need {need}")]
    InsufficientHistory { got: usize, need: usize },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Failures reported by the price source adapter.
#[derive(Error, Debug)]
pub enum PriceSourceError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<PriceSourceError> for IndicatorError {
    fn from(err: PriceSourceError) -> Self {
        IndicatorError::DataSourceUnavailable(err.to_string())
    }
}

/// Failures reported by the message transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The message did not go out (network error, rate limit, server error).
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The recipient refuses messages for good: the bot was blocked or the chat is gone.
    #[error("recipient unreachable: {0}")]
    Unreachable(String),

    /// The rich-formatted body was rejected; the same text may still go out as plain.
    #[error("formatting rejected: {0}")]
    Formatting(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Delivery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_source_error_maps_to_unavailable() {
        let err: IndicatorError = PriceSourceError::Status {
            status: 429,
            body: "rate limited".to_string(),
        }
        .into();
        assert!(matches!(err, IndicatorError::DataSourceUnavailable(_)));
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_insufficient_history_message() {
        let err = IndicatorError::InsufficientHistory { got: 150, need: 200 };
        assert_eq!(
            err.to_string(),
            "insufficient history: got 150 samples, need 200"
        );
    }
}
