use thiserror::Error;

/// All errors generated in `crypto-chart-tui`.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to deserialise tick payload: {0}")]
    Deserialise(#[from] serde_json::Error),

    #[error("unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    #[error("invalid value for {key}: {value}")]
    Config { key: &'static str, value: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl ChartError {
    /// Determine if the error came from the transport rather than the payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, ChartError::WebSocket(_))
    }
}
