//! Relevance scoring for listings.
//!
//! Each candidate gets two component scores that are summed:
//! - location: 10 when the listing's location contains the hint
//!   (ignoring case), otherwise 5
//! - freshness: `10 - age_in_days`, a linear decay with no floor, so a
//!   listing older than ten days scores below zero

use docstore::filter::contains_ignore_case;
use docstore::{Document, FieldComputer};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const LOCATION_SCORE: &str = "locationScore";
pub const FRESHNESS_SCORE: &str = "freshnessScore";
pub const TOTAL_SCORE: &str = "totalScore";

/// Every field the scorer adds; stripped before results leave the ranker.
pub const SCORE_FIELDS: [&str; 3] = [LOCATION_SCORE, FRESHNESS_SCORE, TOTAL_SCORE];

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

const LOCATION_MATCH: f64 = 10.0;
const LOCATION_MISS: f64 = 5.0;
const FRESHNESS_BASE: f64 = 10.0;

/// Source of "now" for freshness decay.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// A clock stuck at one instant, for tests and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

pub fn location_score(location: Option<&str>, hint: &str) -> f64 {
    match location {
        Some(loc) if contains_ignore_case(loc, hint) => LOCATION_MATCH,
        _ => LOCATION_MISS,
    }
}

pub fn freshness_score(created_at_ms: i64, now_ms: i64) -> f64 {
    let age_ms = now_ms as f64 - created_at_ms as f64;
    FRESHNESS_BASE - age_ms / MILLIS_PER_DAY
}

/// Adds `locationScore`, `freshnessScore` and `totalScore` to a listing.
///
/// A listing without an integer `created_at` gets null freshness and
/// total scores, which sort below every scored listing.
#[derive(Debug, Clone)]
pub struct ListingScorer {
    location_hint: String,
    now_ms: i64,
}

impl ListingScorer {
    pub fn new(location_hint: impl Into<String>, now_ms: i64) -> Self {
        Self {
            location_hint: location_hint.into(),
            now_ms,
        }
    }
}

impl FieldComputer for ListingScorer {
    fn name(&self) -> &str {
        "ListingScorer"
    }

    fn compute(&self, doc: &Document) -> Vec<(String, Value)> {
        let location = doc.get("location").and_then(Value::as_str);
        let location = location_score(location, &self.location_hint);

        let freshness = doc
            .get("created_at")
            .and_then(Value::as_i64)
            .map(|created| freshness_score(created, self.now_ms));
        let total = freshness.map(|f| location + f);

        vec![
            (LOCATION_SCORE.to_string(), json!(location)),
            (FRESHNESS_SCORE.to_string(), json!(freshness)),
            (TOTAL_SCORE.to_string(), json!(total)),
        ]
    }
}
