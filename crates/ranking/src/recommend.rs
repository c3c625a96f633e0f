//! Recommendation ranking over pet listings.
//!
//! ## Basic mode
//! Un-adopted listings in the requested categories whose location contains
//! the hint, newest first.
//!
//! ## Advanced mode
//! Same categories, but listings without a location stay eligible, and the
//! order comes from `totalScore` (location + freshness), newest first on
//! ties. Score fields never leave the ranker.
//!
//! In both modes the lister is joined from the users collection and reduced
//! to `PUBLIC_LISTER_FIELDS`. The result never exceeds the request limit.

use crate::error::RecommendError;
use crate::scoring::{Clock, ListingScorer, SystemClock, SCORE_FIELDS, TOTAL_SCORE};
use docstore::{Collection, Document, Filter, Pipeline, SortSpec, Stage, USERS};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Lister fields that may appear in a recommendation.
pub const PUBLIC_LISTER_FIELDS: [&str; 3] = ["_id", "name", "photo"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankMode {
    /// Location must match; newest first
    #[default]
    Basic,
    /// Location matches or is absent; ordered by score
    Advanced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    pub categories: Vec<String>,
    pub location_hint: String,
    pub limit: usize,
}

impl RecommendRequest {
    pub fn new<I, S>(categories: I, location_hint: impl Into<String>, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            location_hint: location_hint.into(),
            limit,
        }
    }

    fn category_filter(&self) -> Filter {
        Filter::any_of("category", self.categories.iter().cloned())
            .and(Filter::eq("adopted", false))
    }
}

/// Ranks listings from one collection.
#[derive(Clone)]
pub struct Recommender {
    listings: Arc<dyn Collection>,
    users_collection: String,
    clock: Arc<dyn Clock>,
}

impl Recommender {
    pub fn new(listings: Arc<dyn Collection>) -> Self {
        Self {
            listings,
            users_collection: USERS.to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Configure the collection listers are joined from (default: "users")
    pub fn with_users_collection(mut self, name: impl Into<String>) -> Self {
        self.users_collection = name.into();
        self
    }

    /// Configure the clock used for freshness decay (default: system time)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Rank listings for the request.
    #[instrument(skip(self, request), fields(categories = request.categories.len(), limit = request.limit))]
    pub async fn recommend(
        &self,
        request: &RecommendRequest,
        mode: RankMode,
    ) -> Result<Vec<Document>, RecommendError> {
        let start = Instant::now();
        let pipeline = match mode {
            RankMode::Basic => self.basic_pipeline(request),
            RankMode::Advanced => self.advanced_pipeline(request, self.clock.now_millis()),
        };
        debug!("Running {:?} pipeline with {} stages", mode, pipeline.stages().len());

        let docs = self.listings.aggregate(&pipeline).await?;

        info!(
            "Ranked {} listings ({:?}) in {:.2?}",
            docs.len(),
            mode,
            start.elapsed()
        );
        Ok(docs)
    }

    /// Filter, newest first, truncate, then join the lister.
    pub fn basic_pipeline(&self, request: &RecommendRequest) -> Pipeline {
        let filter = request.category_filter().and(Filter::contains_ignore_case(
            "location",
            request.location_hint.clone(),
        ));

        let pipeline = Pipeline::new()
            .add_stage(Stage::Match(filter))
            .add_stage(Stage::Sort(SortSpec::desc("created_at")))
            .add_stage(Stage::Limit(request.limit));
        self.with_public_lister(pipeline, request.limit)
    }

    /// Filter, score, order by score then recency, truncate, strip scores,
    /// then join the lister.
    pub fn advanced_pipeline(&self, request: &RecommendRequest, now_ms: i64) -> Pipeline {
        let location = Filter::contains_ignore_case("location", request.location_hint.clone())
            .or(Filter::missing("location"));
        let filter = request.category_filter().and(location);
        let scorer = ListingScorer::new(request.location_hint.clone(), now_ms);

        let pipeline = Pipeline::new()
            .add_stage(Stage::Match(filter))
            .add_stage(Stage::AddFields(Arc::new(scorer)))
            .add_stage(Stage::Sort(SortSpec::desc(TOTAL_SCORE).then_desc("created_at")))
            .add_stage(Stage::Limit(request.limit))
            .add_stage(Stage::unset(SCORE_FIELDS));
        self.with_public_lister(pipeline, request.limit)
    }

    /// Duplicate user ids fan a listing out on unwind; the limit is
    /// applied again after it.
    fn with_public_lister(&self, pipeline: Pipeline, limit: usize) -> Pipeline {
        pipeline
            .add_stage(Stage::lookup(
                self.users_collection.clone(),
                "added_by._id",
                "_id",
                "added_by",
            ))
            .add_stage(Stage::unwind("added_by", true))
            .add_stage(Stage::Limit(limit))
            .add_stage(Stage::restrict("added_by", PUBLIC_LISTER_FIELDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore::MemoryDatabase;

    fn recommender() -> Recommender {
        let db = MemoryDatabase::new();
        Recommender::new(Arc::new(db.collection("pets").unwrap()))
    }

    #[test]
    fn test_basic_pipeline_shape() {
        let request = RecommendRequest::new(["dog"], "Dhaka", 12);
        let names: Vec<_> = recommender()
            .basic_pipeline(&request)
            .stages()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["match", "sort", "limit", "lookup", "unwind", "limit", "restrict"]
        );
    }

    #[test]
    fn test_advanced_pipeline_shape() {
        let request = RecommendRequest::new(["dog"], "Dhaka", 12);
        let names: Vec<_> = recommender()
            .advanced_pipeline(&request, 0)
            .stages()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "match",
                "ListingScorer",
                "sort",
                "limit",
                "unset",
                "lookup",
                "unwind",
                "limit",
                "restrict"
            ]
        );
    }

    #[test]
    fn test_users_collection_is_configurable() {
        let request = RecommendRequest::new(["cat"], "", 3);
        let pipeline = recommender()
            .with_users_collection("members")
            .basic_pipeline(&request);
        let lookup = pipeline
            .stages()
            .iter()
            .find_map(|s| match s {
                Stage::Lookup { from, .. } => Some(from.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(lookup, "members");
    }
}
