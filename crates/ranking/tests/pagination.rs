//! Integration tests for the paginator.
//!
//! These run `paginate` against the in-memory store and pin down cursor
//! clamping, next/previous cursors and store-failure propagation.

use async_trait::async_trait;
use docstore::{
    Collection, Document, Filter, FindOptions, MemoryCollection, MemoryDatabase, Pipeline,
    Projection, SortSpec, StoreError,
};
use ranking::{paginate, Limits, PageRequest};
use serde_json::{json, Value};

fn numbered_collection(total: usize) -> MemoryCollection {
    let db = MemoryDatabase::new();
    let pets = db.collection("pets").unwrap();
    db.insert_many(
        "pets",
        (0..total).map(|i| {
            json!({ "_id": format!("p{i}"), "n": i, "adopted": false })
                .as_object()
                .cloned()
                .unwrap()
        }),
    )
    .unwrap();
    pets
}

fn by_n() -> FindOptions {
    FindOptions::new().with_sort(SortSpec::asc("n"))
}

fn ns(items: &[Document]) -> Vec<u64> {
    items.iter().map(|d| d["n"].as_u64().unwrap()).collect()
}

#[tokio::test]
async fn test_first_page() {
    let pets = numbered_collection(10);
    let page = paginate(&pets, &Filter::All, PageRequest::new(6, 0), &by_n())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 6);
    assert_eq!(ns(&page.items), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(page.next_id, Some(6));
    assert_eq!(page.previous_id, None);
    assert_eq!(page.total, 10);
}

#[tokio::test]
async fn test_last_partial_page() {
    let pets = numbered_collection(10);
    let page = paginate(&pets, &Filter::All, PageRequest::new(6, 6), &by_n())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 4);
    assert_eq!(page.next_id, None);
    assert_eq!(page.previous_id, Some(0));
}

#[tokio::test]
async fn test_cursor_past_end_is_clamped() {
    let pets = numbered_collection(10);
    let page = paginate(&pets, &Filter::All, PageRequest::new(6, 20), &by_n())
        .await
        .unwrap();

    assert_eq!(page.cursor, 4);
    assert_eq!(page.items.len(), 6);
    assert_eq!(ns(&page.items), vec![4, 5, 6, 7, 8, 9]);
    assert_eq!(page.next_id, None);
    assert_eq!(page.previous_id, None);
}

#[tokio::test]
async fn test_empty_collection() {
    let pets = numbered_collection(0);
    let page = paginate(&pets, &Filter::All, PageRequest::new(6, 3), &by_n())
        .await
        .unwrap();

    assert_eq!(page.cursor, 0);
    assert!(page.items.is_empty());
    assert_eq!(page.next_id, None);
    assert_eq!(page.previous_id, None);
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_paging_properties_hold_for_all_inputs() {
    for total in 0..=15usize {
        let pets = numbered_collection(total);
        for limit in 1..=8usize {
            for cursor in 0..=25usize {
                let page = paginate(&pets, &Filter::All, PageRequest::new(limit, cursor), &by_n())
                    .await
                    .unwrap();
                let effective = page.cursor;

                assert!(effective <= total, "cursor {effective} beyond total {total}");
                if cursor >= total {
                    assert_eq!(effective, total.saturating_sub(limit));
                } else {
                    assert_eq!(effective, cursor);
                }

                let expected_len = if effective < total {
                    limit.min(total - effective)
                } else {
                    0
                };
                assert_eq!(page.items.len(), expected_len);
                assert!(page.items.len() <= limit);

                if effective + limit < total {
                    assert_eq!(page.next_id, Some(effective + limit));
                } else {
                    assert_eq!(page.next_id, None);
                }

                if effective >= limit {
                    assert_eq!(page.previous_id, Some(effective - limit));
                } else {
                    assert_eq!(page.previous_id, None);
                }
                assert_eq!(page.total, total);
            }
        }
    }
}

#[tokio::test]
async fn test_huge_limit_returns_everything() {
    let pets = numbered_collection(5);
    let page = paginate(&pets, &Filter::All, PageRequest::new(usize::MAX, 1), &by_n())
        .await
        .unwrap();

    assert_eq!(page.cursor, 1);
    assert_eq!(ns(&page.items), vec![1, 2, 3, 4]);
    assert_eq!(page.next_id, None);
    assert_eq!(page.previous_id, None);
}

#[tokio::test]
async fn test_idempotent_on_unchanged_store() {
    let pets = numbered_collection(13);
    let request = PageRequest::new(5, 7);
    let first = paginate(&pets, &Filter::All, request, &by_n()).await.unwrap();
    let second = paginate(&pets, &Filter::All, request, &by_n()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_stale_cursor_after_deletions() {
    let pets = numbered_collection(12);
    let request = PageRequest::new(6, 6);
    let before = paginate(&pets, &Filter::All, request, &by_n()).await.unwrap();
    assert_eq!(before.items.len(), 6);

    let removed = pets
        .database()
        .delete_many("pets", &Filter::any_of("_id", ["p0", "p1", "p2", "p3", "p4", "p5"]))
        .unwrap();
    assert_eq!(removed, 6);

    let after = paginate(&pets, &Filter::All, request, &by_n()).await.unwrap();
    assert_eq!(after.total, 6);
    assert_eq!(after.cursor, 0);
    assert_eq!(ns(&after.items), vec![6, 7, 8, 9, 10, 11]);
}

#[tokio::test]
async fn test_filter_and_projection() {
    let db = MemoryDatabase::new();
    let pets = db.collection("pets").unwrap();
    for i in 0..8 {
        db.insert(
            "pets",
            json!({ "_id": format!("p{i}"), "n": i, "adopted": i % 2 == 0, "secret": "x" })
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap();
    }

    let options = by_n().with_projection(Projection::include(["n"]));
    let page = paginate(&pets, &Filter::eq("adopted", false), PageRequest::new(3, 0), &options)
        .await
        .unwrap();

    assert_eq!(page.total, 4);
    assert_eq!(ns(&page.items), vec![1, 3, 5]);
    assert!(page.items.iter().all(|d| !d.contains_key("secret")));
    assert_eq!(page.next_id, Some(3));
}

#[tokio::test]
async fn test_malformed_params_fall_back_to_defaults() {
    let pets = numbered_collection(10);
    let request = PageRequest::parse(Some("lots"), Some("later"), &Limits::PAGE);
    let page = paginate(&pets, &Filter::All, request, &by_n()).await.unwrap();

    assert_eq!(page.items.len(), 6);
    assert_eq!(page.cursor, 0);
    assert_eq!(page.next_id, Some(6));
}

#[tokio::test]
async fn test_page_serializes_with_camel_case_ids() {
    let pets = numbered_collection(10);
    let page = paginate(&pets, &Filter::All, PageRequest::new(6, 0), &by_n())
        .await
        .unwrap();
    let value = serde_json::to_value(&page).unwrap();

    assert_eq!(value["nextId"], json!(6));
    assert_eq!(value["total"], json!(10));
    assert!(value.get("previousId").is_none());
    assert!(value.get("cursor").is_none());
    assert!(matches!(value["items"], Value::Array(ref items) if items.len() == 6));
}

struct UnavailableStore;

#[async_trait]
impl Collection for UnavailableStore {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn count(&self, _filter: &Filter) -> docstore::Result<usize> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find(&self, _filter: &Filter, _options: &FindOptions) -> docstore::Result<Vec<Document>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn aggregate(&self, _pipeline: &Pipeline) -> docstore::Result<Vec<Document>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let result = paginate(&UnavailableStore, &Filter::All, PageRequest::default(), &by_n()).await;
    match result {
        Err(StoreError::Unavailable(msg)) => assert_eq!(msg, "connection refused"),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}
