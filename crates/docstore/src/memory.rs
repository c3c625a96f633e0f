//! In-memory document database.
//!
//! `MemoryDatabase` holds named collections behind a single `RwLock`;
//! `MemoryCollection` is a cheap handle implementing `Collection`. Every
//! call takes the lock afresh, so consecutive calls see whatever writes
//! happened in between.

use crate::collection::Collection;
use crate::error::{Result, StoreError};
use crate::filter::Filter;
use crate::pipeline::{LookupSource, Pipeline};
use crate::query::FindOptions;
use crate::types::Document;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Shared in-memory database of named collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to a collection, registering it if it does not exist yet.
    pub fn collection(&self, name: impl Into<String>) -> Result<MemoryCollection> {
        let name = name.into();
        self.write()?.entry(name.clone()).or_default();
        Ok(MemoryCollection {
            name,
            db: self.clone(),
        })
    }

    /// Append a document to a collection.
    pub fn insert(&self, collection: &str, doc: Document) -> Result<()> {
        self.write()?
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        Ok(())
    }

    /// Append many documents to a collection.
    pub fn insert_many(
        &self,
        collection: &str,
        docs: impl IntoIterator<Item = Document>,
    ) -> Result<()> {
        self.write()?
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
        Ok(())
    }

    /// Delete matching documents, returning how many were removed.
    pub fn delete_many(&self, collection: &str, filter: &Filter) -> Result<usize> {
        let mut guard = self.write()?;
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok(before - docs.len())
    }

    /// Document count per collection, sorted by name.
    pub fn counts(&self) -> Result<Vec<(String, usize)>> {
        let mut counts: Vec<(String, usize)> = self
            .read()?
            .iter()
            .map(|(name, docs)| (name.clone(), docs.len()))
            .collect();
        counts.sort();
        Ok(counts)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Unavailable("collection lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections
            .write()
            .map_err(|_| StoreError::Unavailable("collection lock poisoned".to_string()))
    }
}

impl LookupSource for MemoryDatabase {
    fn documents(&self, collection: &str) -> Result<Vec<Document>> {
        self.read()?
            .get(collection)
            .cloned()
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }
}

/// Handle to one collection of a `MemoryDatabase`.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    db: MemoryDatabase,
}

impl MemoryCollection {
    pub fn database(&self) -> &MemoryDatabase {
        &self.db
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count(&self, filter: &Filter) -> Result<usize> {
        let guard = self.db.read()?;
        let count = guard
            .get(&self.name)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        debug!("count on {}: {}", self.name, count);
        Ok(count)
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let mut matched: Vec<Document> = {
            let guard = self.db.read()?;
            guard
                .get(&self.name)
                .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
                .unwrap_or_default()
        };

        if let Some(sort) = &options.sort {
            sort.sort(&mut matched);
        }

        let limit = options.limit.unwrap_or(usize::MAX);
        let page: Vec<Document> = matched
            .into_iter()
            .skip(options.skip)
            .take(limit)
            .map(|doc| match &options.projection {
                Some(projection) => projection.apply(doc),
                None => doc,
            })
            .collect();

        debug!(
            "find on {}: skip={} limit={:?} returned={}",
            self.name,
            options.skip,
            options.limit,
            page.len()
        );
        Ok(page)
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>> {
        let docs = self.db.documents(&self.name)?;
        pipeline.run(docs, &self.db)
    }
}
