//! Errors raised by the recommendation ranker.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// The underlying query or aggregation failed; carries its message.
    #[error("recommendation fetch failed: {0}")]
    FetchFailed(String),
}

impl From<docstore::StoreError> for RecommendError {
    fn from(err: docstore::StoreError) -> Self {
        RecommendError::FetchFailed(err.to_string())
    }
}
