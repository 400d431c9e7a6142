use std::sync::Arc;

use thiserror::Error;

/// Failures of the pure analysis functions. Always scoped to one
/// instrument and one sub-path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient history: need {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("degenerate fit: {0}")]
    DegenerateFit(String),
}

/// Cloneable so a failed fetch can be reported by every sub-path that
/// shares it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Market data unavailable for {symbol}: {reason}")]
    UpstreamDataUnavailable { symbol: String, reason: String },

    #[error("Invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Webhook delivery failed: {0}")]
    Webhook(String),

    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
}

impl Error {
    /// True when the failure only means "not enough bars yet".
    pub fn is_insufficient_history(&self) -> bool {
        matches!(
            self,
            Error::Analysis(AnalysisError::InsufficientHistory { .. })
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(Arc::new(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
