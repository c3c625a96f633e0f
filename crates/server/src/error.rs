//! Errors surfaced by the catalog service.

use docstore::StoreError;
use ranking::RecommendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error("Listing not found: {0}")]
    ListingNotFound(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
