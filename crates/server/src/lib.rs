//! Service crate for the pet adoption catalog.
//!
//! This crate wires the paginator and recommendation ranker to injected
//! collections, with limits taken from the environment.

pub mod catalog;
pub mod config;
pub mod error;

pub use catalog::{ListingQuery, PetCatalog};
pub use config::Config;
pub use error::{CatalogError, Result};
