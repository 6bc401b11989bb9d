use super::*;
use crate::paginate::accepts;
use crate::session::{ExecutionMode, ListSession};
use lapor_model::{CategoryField, TimeField};
use lapor_store::{DocumentSnapshot, MemoryStore, StoreErrorCode};
use serde_json::json;

const COLLECTION: &str = "laporan";

fn doc(id: &str, value: serde_json::Value) -> DocumentSnapshot {
    DocumentSnapshot::new(id, value.as_object().cloned().expect("object"))
}

fn store_with(docs: Vec<DocumentSnapshot>) -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_many(COLLECTION, docs);
    store
}

fn stage_filter(stage: i64) -> ReportFilter {
    ReportFilter {
        stage: Some(StageValue::new(stage)),
        ..ReportFilter::default()
    }
}

#[tokio::test]
async fn category_probe_adopts_whichever_key_has_documents() {
    let store = store_with(vec![doc("a", json!({"stage": 4, "createdAt": "t1"}))]);
    let detected =
        probe::detect_category_field(&store, COLLECTION, Some(StageValue::new(4))).await;
    assert_eq!(detected, CategoryField::Stage);

    let detected =
        probe::detect_category_field(&store, COLLECTION, Some(StageValue::new(9))).await;
    assert_eq!(detected, CategoryField::Tahap, "empty collection defaults to primary");
}

#[tokio::test]
async fn category_probe_swallows_errors_and_defaults() {
    let store = store_with(vec![doc("a", json!({"stage": 4}))]);
    store.fail_with(lapor_store::StoreError::new(
        StoreErrorCode::Network,
        "probe window closed",
    ));
    let detected =
        probe::detect_category_field(&store, COLLECTION, Some(StageValue::new(4))).await;
    assert_eq!(detected, CategoryField::Tahap);
}

#[tokio::test]
async fn time_probe_honors_candidate_priority() {
    let store = store_with(vec![doc(
        "a",
        json!({"tahap": 1, "waktu": 5, "created_at": "2024-01-01T00:00:00Z"}),
    )]);
    let detected =
        probe::detect_time_field(&store, COLLECTION, CategoryField::Tahap, Some(StageValue::new(1)))
            .await;
    assert_eq!(detected, TimeField::CreatedAtSnake);

    let bare = store_with(vec![doc("b", json!({"tahap": 1}))]);
    let detected =
        probe::detect_time_field(&bare, COLLECTION, CategoryField::Tahap, Some(StageValue::new(1)))
            .await;
    assert_eq!(detected, TimeField::CreatedAt, "no candidate present defaults to primary");
}

#[test]
fn page_query_shape_matches_detection() {
    let filter = ReportFilter {
        stage: Some(StageValue::new(2)),
        date: Some(DateRange {
            start: Some("2024-01-01".to_string()),
            end: Some("2024-01-31".to_string()),
        }),
        search: None,
    };
    let query = request::build_page_query(
        COLLECTION,
        CategoryField::Tahap,
        TimeField::Timestamp,
        &filter,
        None,
        10,
    );
    assert_eq!(query.filters.len(), 3);
    assert_eq!(query.limit, Some(11), "one extra row detects more data");
    assert_eq!(query.order_by.len(), 2);
    assert_eq!(query.order_by[0].field, "timestamp");
    assert_eq!(query.order_by[1].field, lapor_store::DOC_ID_FIELD);

    let unfiltered = query.without_filters();
    assert!(unfiltered.filters.is_empty());
    assert_eq!(unfiltered.order_by, query.order_by);
}

#[tokio::test]
async fn session_fallback_is_sticky_and_one_way() {
    let store = store_with(vec![
        doc("a", json!({"tahap": 1, "createdAt": "t3"})),
        doc("b", json!({"tahap": 2, "createdAt": "t2"})),
        doc("c", json!({"tahap": 1, "createdAt": "t1"})),
    ]);
    // No composite index registered: the first scoped fetch must trip the
    // fallback, and later fetches must go straight to unfiltered reads.
    let mut session = ListSession::new(
        &store,
        COLLECTION,
        CategoryField::Tahap,
        TimeField::CreatedAt,
        EngineLimits::default(),
    );
    assert_eq!(session.mode(), ExecutionMode::Indexed);

    let (docs, unfiltered) = session
        .fetch_batch(&stage_filter(1), None, 10)
        .await
        .expect("first batch");
    assert!(unfiltered);
    assert_eq!(docs.len(), 3, "fallback batches are unfiltered");
    assert_eq!(session.mode(), ExecutionMode::Fallback);

    let calls_before = store.fetch_call_count();
    let (_, unfiltered) = session
        .fetch_batch(&stage_filter(1), None, 10)
        .await
        .expect("second batch");
    assert!(unfiltered);
    assert_eq!(
        store.fetch_call_count() - calls_before,
        1,
        "a fallback session must not re-trigger the index error"
    );
}

#[tokio::test]
async fn session_propagates_fatal_errors_unchanged() {
    let store = store_with(vec![doc("a", json!({"tahap": 1, "createdAt": "t"}))]);
    store.fail_with(lapor_store::StoreError::new(
        StoreErrorCode::PermissionDenied,
        "rules rejected the read",
    ));
    let mut session = ListSession::new(
        &store,
        COLLECTION,
        CategoryField::Tahap,
        TimeField::CreatedAt,
        EngineLimits::default(),
    );
    let err = session
        .fetch_batch(&stage_filter(1), None, 10)
        .await
        .expect_err("fatal");
    match err {
        EngineError::Store(store_err) => {
            assert_eq!(store_err.code, StoreErrorCode::PermissionDenied);
        }
        other => panic!("expected store error, got {other}"),
    }
}

#[test]
fn accepts_applies_scope_only_on_unfiltered_batches() {
    let filter = ReportFilter {
        stage: Some(StageValue::new(1)),
        search: Some("pipa".to_string()),
        ..ReportFilter::default()
    };
    let wrong_stage = doc("a", json!({"tahap": 2, "keterangan": "pipa bocor"}));
    // Server-filtered batches already scoped this out; in memory we trust it.
    assert!(accepts(&filter, &wrong_stage, false));
    assert!(!accepts(&filter, &wrong_stage, true));

    let legacy_key = doc("b", json!({"stage": 1, "keterangan": "pipa bocor"}));
    assert!(accepts(&filter, &legacy_key, true), "either category key counts");

    let no_match = doc("c", json!({"tahap": 1, "keterangan": "pengecoran"}));
    assert!(!accepts(&filter, &no_match, false), "search always applies");
}

#[tokio::test]
async fn engine_rejects_invalid_page_sizes() {
    let store = Arc::new(store_with(vec![]));
    let engine = ReportQueryEngine::new(store, COLLECTION, b"secret".to_vec());
    let err = engine.fetch_page(1, 0, None, None, None).await.expect_err("zero");
    assert!(matches!(err, EngineError::Validation(_)));
    let err = engine
        .fetch_page(1, 10_000, None, None, None)
        .await
        .expect_err("oversized");
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn engine_rejects_cursor_minted_under_unknown_ordering() {
    let store = Arc::new(store_with(vec![]));
    let engine = ReportQueryEngine::new(store, COLLECTION, b"secret".to_vec());
    let payload = CursorPayload {
        cursor_version: "v1".to_string(),
        time_field: "updatedAt".to_string(),
        last_time: json!("t"),
        last_id: "x".to_string(),
    };
    let token = encode_cursor(&payload, b"secret").expect("encode");
    let err = engine
        .fetch_page(1, 5, Some(&token), None, None)
        .await
        .expect_err("unknown ordering");
    match err {
        EngineError::Cursor(cursor_err) => {
            assert_eq!(cursor_err.code, CursorErrorCode::OrderMismatch);
        }
        other => panic!("expected cursor error, got {other}"),
    }
}

#[tokio::test]
async fn empty_stage_yields_empty_page_without_error() {
    let store = Arc::new(store_with(vec![doc(
        "a",
        json!({"tahap": 1, "createdAt": "t"}),
    )]));
    store.register_index(COLLECTION, &["tahap", "createdAt"]);
    let engine = ReportQueryEngine::new(store, COLLECTION, b"secret".to_vec());
    let page = engine.fetch_page(7, 5, None, None, None).await.expect("page");
    assert!(page.items.is_empty());
    assert!(!page.has_next);
    assert!(!page.has_prev);
    assert!(page.next_cursor.is_none(), "no raw document was examined");
}
