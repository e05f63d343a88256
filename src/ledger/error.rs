//! Error types for ledger reads.

use thiserror::Error;

/// Failure of a single view request. Callers in this crate never propagate
/// these past [`LedgerQueryClient`](super::LedgerQueryClient); they degrade
/// to empty results.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("endpoint error {code}: {message}")]
    Endpoint { code: String, message: String },

    #[error("response is not json: {0}")]
    Decode(#[from] serde_json::Error),
}
