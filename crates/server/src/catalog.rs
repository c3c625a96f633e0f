//! # Pet catalog service
//!
//! Wires the paginator and the ranker to concrete collections:
//! 1. Resolve raw paging parameters against the configured limits
//! 2. Build the base filter for the call
//! 3. Delegate to `ranking`
//! 4. Log the elapsed time
//!
//! Collections are injected; the catalog holds no global handles and can
//! be cloned freely across tasks.

use std::sync::Arc;
use std::time::Instant;

use docstore::{
    Collection, Document, Filter, FindOptions, MemoryDatabase, Pipeline, Projection, SortSpec,
    Stage, PETS, USERS,
};
use ranking::{
    paginate, Clock, Limits, Page, PageRequest, RankMode, RecommendRequest, Recommender,
    PUBLIC_LISTER_FIELDS,
};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{CatalogError, Result};

/// Optional narrowing of the available-listings page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub category: Option<String>,
    /// Case-insensitive substring of the pet's name
    pub search: Option<String>,
    /// Only listings added by this user id
    pub lister: Option<String>,
}

impl ListingQuery {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn lister(mut self, lister: impl Into<String>) -> Self {
        self.lister = Some(lister.into());
        self
    }

    fn filter(&self) -> Filter {
        let mut filter = Filter::eq("adopted", false);
        if let Some(category) = non_empty(&self.category) {
            filter = filter.and(Filter::eq("category", category));
        }
        if let Some(search) = non_empty(&self.search) {
            filter = filter.and(Filter::contains_ignore_case("name", search));
        }
        if let Some(lister) = non_empty(&self.lister) {
            filter = filter.and(Filter::eq("added_by._id", lister));
        }
        filter
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct PetCatalog {
    pets: Arc<dyn Collection>,
    recommender: Recommender,
    users_collection: String,
    page_limits: Limits,
    recommend_limits: Limits,
}

impl PetCatalog {
    pub fn new(pets: Arc<dyn Collection>) -> Self {
        Self {
            recommender: Recommender::new(pets.clone()),
            pets,
            users_collection: USERS.to_string(),
            page_limits: Limits::PAGE,
            recommend_limits: Limits::RECOMMEND,
        }
    }

    /// Catalog over the `pets` and `users` collections of a memory store.
    pub fn from_database(db: &MemoryDatabase, config: &Config) -> Result<Self> {
        db.collection(USERS)?;
        let pets = Arc::new(db.collection(PETS)?);
        Ok(Self::new(pets).with_limits(config.page_limits, config.recommend_limits))
    }

    pub fn with_limits(mut self, page: Limits, recommend: Limits) -> Self {
        self.page_limits = page;
        self.recommend_limits = recommend;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.recommender = self.recommender.with_clock(clock);
        self
    }

    pub fn with_users_collection(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.recommender = self.recommender.with_users_collection(name.clone());
        self.users_collection = name;
        self
    }

    pub fn page_limits(&self) -> Limits {
        self.page_limits
    }

    pub fn recommend_limits(&self) -> Limits {
        self.recommend_limits
    }

    /// One page of un-adopted listings, newest first.
    #[instrument(skip(self))]
    pub async fn available_pets(
        &self,
        query: &ListingQuery,
        limit: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Page> {
        let start = Instant::now();
        let request = PageRequest::parse(limit, cursor, &self.page_limits);

        let page = paginate(self.pets.as_ref(), &query.filter(), request, &listing_options()).await?;

        info!(
            "Listed {} of {} available pets at cursor {} in {:.2?}",
            page.items.len(),
            page.total,
            page.cursor,
            start.elapsed()
        );
        Ok(page)
    }

    /// One page of a lister's own listings, adopted ones included.
    #[instrument(skip(self))]
    pub async fn listings_by(
        &self,
        lister_id: &str,
        limit: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Page> {
        let start = Instant::now();
        let request = PageRequest::parse(limit, cursor, &self.page_limits);
        let filter = Filter::eq("added_by._id", lister_id);

        let page = paginate(self.pets.as_ref(), &filter, request, &listing_options()).await?;

        info!(
            "Listed {} of {} pets added by {} in {:.2?}",
            page.items.len(),
            page.total,
            lister_id,
            start.elapsed()
        );
        Ok(page)
    }

    /// Ranked recommendations, with the limit capped at the configured
    /// ceiling.
    #[instrument(skip(self, request), fields(location = %request.location_hint))]
    pub async fn recommend(
        &self,
        request: &RecommendRequest,
        mode: RankMode,
    ) -> Result<Vec<Document>> {
        let start = Instant::now();
        let limit = self.recommend_limits.cap(request.limit);
        if limit != request.limit {
            debug!("Capped recommendation limit {} to {}", request.limit, limit);
        }
        let request = RecommendRequest {
            limit,
            ..request.clone()
        };

        let ranked = self.recommender.recommend(&request, mode).await?;

        info!(
            "Recommended {} pets ({:?}) in {:.2?}",
            ranked.len(),
            mode,
            start.elapsed()
        );
        Ok(ranked)
    }

    /// A single listing with its lister joined and reduced to public fields.
    #[instrument(skip(self))]
    pub async fn listing(&self, id: &str) -> Result<Document> {
        let start = Instant::now();
        let pipeline = Pipeline::new()
            .add_stage(Stage::Match(Filter::eq("_id", id)))
            .add_stage(Stage::Limit(1))
            .add_stage(Stage::lookup(
                self.users_collection.clone(),
                "added_by._id",
                "_id",
                "added_by",
            ))
            .add_stage(Stage::unwind("added_by", true))
            .add_stage(Stage::restrict("added_by", PUBLIC_LISTER_FIELDS));

        let listing = self
            .pets
            .aggregate(&pipeline)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::ListingNotFound(id.to_string()))?;

        info!("Fetched listing {} in {:.2?}", id, start.elapsed());
        Ok(listing)
    }
}

fn listing_options() -> FindOptions {
    FindOptions::new()
        .with_sort(SortSpec::desc("created_at").then_asc("_id"))
        .with_projection(Projection::restrict("added_by", PUBLIC_LISTER_FIELDS))
}
