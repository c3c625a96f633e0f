//! # Docstore Crate
//!
//! The document-store capability behind pet listings.
//!
//! ## Main Components
//!
//! - **types**: `Document` and dotted field-path helpers
//! - **filter**: `Filter` predicates
//! - **query**: projections, sort specs and find options
//! - **pipeline**: multi-stage aggregation (`Pipeline`, `Stage`)
//! - **collection**: the abstract `Collection` trait
//! - **memory**: an in-memory implementation for tests and local runs
//! - **loader**: JSON seed files into a `MemoryDatabase`
//! - **error**: error types
//!
//! ## Example Usage
//!
//! ```ignore
//! use docstore::{Collection, Filter, FindOptions, MemoryDatabase};
//! use std::path::Path;
//!
//! let db = MemoryDatabase::load_from_dir(Path::new("data"))?;
//! let pets = db.collection("pets")?;
//!
//! let available = pets.count(&Filter::eq("adopted", false)).await?;
//! let first = pets.find(&Filter::All, &FindOptions::new().with_limit(6)).await?;
//! ```

pub mod collection;
pub mod error;
pub mod filter;
pub mod loader;
pub mod memory;
pub mod pipeline;
pub mod query;
pub mod types;

// Re-export commonly used types for convenience
pub use collection::Collection;
pub use error::{Result, StoreError};
pub use filter::Filter;
pub use loader::{PETS, USERS};
pub use memory::{MemoryCollection, MemoryDatabase};
pub use pipeline::{FieldComputer, LookupSource, Pipeline, Stage};
pub use query::{FindOptions, Projection, SortOrder, SortSpec};
pub use types::Document;
