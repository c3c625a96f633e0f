//! Test harness for the pet catalog.
//!
//! Loads the seed data, then logs the first page of available pets and
//! a basic and advanced recommendation for a sample request.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docstore::{Document, MemoryDatabase};
use ranking::{RankMode, RecommendRequest};
use server::{Config, ListingQuery, PetCatalog};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,ranking=debug")),
        )
        .init();

    info!("Starting pet catalog harness");

    let config = Config::load();
    let db = MemoryDatabase::load_from_dir(&config.data_dir)
        .with_context(|| format!("Failed to load seed data from {:?}", config.data_dir))?;
    for (name, count) in db.counts()? {
        info!("Collection {}: {} documents", name, count);
    }

    let catalog = PetCatalog::from_database(&db, &config)?;

    let page = catalog
        .available_pets(&ListingQuery::default(), None, None)
        .await?;
    info!(
        "First page: {} of {} (next: {:?})",
        page.items.len(),
        page.total,
        page.next_id
    );
    for pet in &page.items {
        info!("   {} [{}]", text(pet, "name"), text(pet, "category"));
    }

    let request = RecommendRequest::new(["dog", "cat"], "Dhaka", config.recommend_limits.default);
    for mode in [RankMode::Basic, RankMode::Advanced] {
        let ranked = catalog.recommend(&request, mode).await?;
        info!("{:?} recommendations: {}", mode, ranked.len());
        for (i, pet) in ranked.iter().enumerate() {
            info!(
                "{}. {} ({}) - {}",
                i + 1,
                text(pet, "name"),
                text(pet, "location"),
                serde_json::to_string(&pet.get("added_by"))?
            );
        }
    }

    Ok(())
}

fn text<'a>(doc: &'a Document, field: &str) -> &'a str {
    doc.get(field).and_then(|v| v.as_str()).unwrap_or("-")
}
