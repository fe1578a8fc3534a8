use thiserror::Error;

// Errors end up in signals, hence `Clone + PartialEq` and string payloads.

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    #[error("measurement service unreachable for {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("malformed measurement response for {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}

impl MeasureError {
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::MalformedResponse { url, .. } => url,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("document (de)serialization error: {err}"))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("measurement failed for {url}: {source}")]
    Partial { url: String, source: MeasureError },
    #[error("both measurements failed: {first}; {second}")]
    Total {
        first: MeasureError,
        second: MeasureError,
    },
    #[error(transparent)]
    Storage(#[from] StoreError),
}
