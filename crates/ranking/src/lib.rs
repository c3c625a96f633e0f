//! Pagination and ranking of pet listings.
//!
//! This crate provides:
//! - `paginate` for offset pages with cursor clamping
//! - `Recommender` for basic (recency) and advanced (scored) ranking
//! - `ListingScorer` computing location and freshness scores
//!
//! Both components are stateless over an injected `Collection`, so one
//! instance can serve concurrent requests.
//!
//! ## Example Usage
//! ```ignore
//! use ranking::{paginate, PageRequest, Limits, Recommender, RecommendRequest, RankMode};
//!
//! let request = PageRequest::parse(Some("6"), Some("12"), &Limits::PAGE);
//! let page = paginate(pets.as_ref(), &Filter::eq("adopted", false), request, &FindOptions::new()).await?;
//!
//! let recommender = Recommender::new(pets.clone());
//! let ranked = recommender
//!     .recommend(&RecommendRequest::new(["dog"], "Dhaka", 12), RankMode::Advanced)
//!     .await?;
//! ```

pub mod error;
pub mod paginate;
pub mod recommend;
pub mod scoring;

// Re-export main types
pub use error::RecommendError;
pub use paginate::{effective_cursor, paginate, Limits, Page, PageRequest};
pub use recommend::{RankMode, RecommendRequest, Recommender, PUBLIC_LISTER_FIELDS};
pub use scoring::{Clock, FixedClock, ListingScorer, SystemClock};
