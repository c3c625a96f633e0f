//! Offset-based pagination with cursor clamping.
//!
//! ## Algorithm
//! 1. Count every document matching the filter
//! 2. Clamp a cursor at or past the end back onto the last page
//! 3. Fetch `limit` documents starting at the effective cursor
//! 4. Derive the next/previous cursors from the effective cursor
//!
//! The count and the fetch are separate round trips. Under concurrent
//! writes `total` may disagree slightly with the items returned.

use docstore::{Collection, Document, Filter, FindOptions, Result};
use serde::Serialize;
use tracing::{debug, instrument};

/// Default and ceiling for a caller-supplied limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub default: usize,
    pub max: usize,
}

impl Limits {
    /// Listing pages: 6 per page, at most 100.
    pub const PAGE: Limits = Limits {
        default: 6,
        max: 100,
    };

    /// Recommendations: 12 per request, at most 50.
    pub const RECOMMEND: Limits = Limits {
        default: 12,
        max: 50,
    };

    pub fn new(default: usize, max: usize) -> Self {
        let max = max.max(1);
        Self {
            default: default.clamp(1, max),
            max,
        }
    }

    /// Resolve a raw limit parameter.
    ///
    /// Missing, non-numeric, zero or negative input falls back to the
    /// default; anything above the ceiling is capped.
    pub fn resolve(&self, raw: Option<&str>) -> usize {
        match raw.and_then(parse_leading_int) {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX).min(self.max),
            _ => self.default,
        }
    }

    /// Cap an already-numeric limit, substituting the default for zero.
    pub fn cap(&self, requested: usize) -> usize {
        if requested == 0 {
            self.default
        } else {
            requested.min(self.max)
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits::PAGE
    }
}

/// Parsed paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub cursor: usize,
}

impl PageRequest {
    pub fn new(limit: usize, cursor: usize) -> Self {
        Self {
            limit: limit.max(1),
            cursor,
        }
    }

    /// Parse raw query-string values. Never fails.
    ///
    /// A missing, non-numeric or negative cursor becomes 0.
    pub fn parse(limit: Option<&str>, cursor: Option<&str>, limits: &Limits) -> Self {
        let cursor = cursor
            .and_then(parse_leading_int)
            .and_then(|c| usize::try_from(c).ok())
            .unwrap_or(0);
        Self {
            limit: limits.resolve(limit),
            cursor,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(Limits::PAGE.default, 0)
    }
}

/// One page of results plus cursor metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<usize>,
    pub total: usize,
    /// Offset the page actually starts at, after clamping
    #[serde(skip)]
    pub cursor: usize,
}

/// Snap a cursor at or past the end back to the start of the last page.
pub fn effective_cursor(total: usize, limit: usize, cursor: usize) -> usize {
    if cursor >= total {
        total.saturating_sub(limit)
    } else {
        cursor
    }
}

/// Fetch one page of documents matching `filter`.
///
/// Only the projection and sort of `options` are used; skip and limit
/// come from `request`. The paginator never sorts on its own, so callers
/// wanting stable pages must pass a sort.
#[instrument(skip(collection, filter, options), fields(collection_name = collection.name()))]
pub async fn paginate(
    collection: &dyn Collection,
    filter: &Filter,
    request: PageRequest,
    options: &FindOptions,
) -> Result<Page> {
    let limit = request.limit.max(1);
    let total = collection.count(filter).await?;
    let cursor = effective_cursor(total, limit, request.cursor);
    if cursor != request.cursor {
        debug!(
            "Clamped cursor {} to {} (total: {}, limit: {})",
            request.cursor, cursor, total, limit
        );
    }

    let options = options.clone().with_skip(cursor).with_limit(limit);
    let items = collection.find(filter, &options).await?;

    let next_id = cursor.checked_add(limit).filter(|&next| next < total);
    let previous_id = cursor.checked_sub(limit);

    debug!(
        "Page at {}: {} items of {} (next: {:?}, previous: {:?})",
        cursor,
        items.len(),
        total,
        next_id,
        previous_id
    );

    Ok(Page {
        items,
        next_id,
        previous_id,
        total,
        cursor,
    })
}

/// Lenient integer parse: optional sign, then leading digits.
///
/// `"12abc"` → 12, `" -3"` → -3, `"abc"` → `None`. Values too large for
/// `i64` saturate.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut seen = false;
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        let d = i64::from(b - b'0');
        value = value.saturating_mul(10).saturating_add(d);
    }

    if !seen {
        return None;
    }
    Some(if negative { -value } else { value })
}
