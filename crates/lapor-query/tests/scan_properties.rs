use std::sync::Arc;

use lapor_query::{EngineLimits, ReportQueryEngine};
use lapor_store::{DocumentSnapshot, MemoryStore};
use proptest::prelude::*;
use serde_json::json;

const COLLECTION: &str = "laporan";

#[derive(Debug, Clone)]
struct RawReport {
    stage: i64,
    legacy_key: bool,
    day: u8,
    pipa: bool,
}

fn raw_report() -> impl Strategy<Value = RawReport> {
    (1_i64..=3, any::<bool>(), 1_u8..=28, any::<bool>()).prop_map(|(stage, legacy_key, day, pipa)| {
        RawReport {
            stage,
            legacy_key,
            day,
            pipa,
        }
    })
}

fn seed(reports: &[RawReport]) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    for (i, r) in reports.iter().enumerate() {
        let key = if r.legacy_key { "stage" } else { "tahap" };
        let mut fields = serde_json::Map::new();
        fields.insert(key.to_string(), json!(r.stage));
        fields.insert("tanggal".to_string(), json!(format!("2024-03-{:02}", r.day)));
        fields.insert(
            "keterangan".to_string(),
            json!(if r.pipa { "las pipa" } else { "pengecatan" }),
        );
        fields.insert("createdAt".to_string(), json!(1000 + i));
        store.insert(COLLECTION, DocumentSnapshot::new(format!("r{i:03}"), fields));
    }
    Arc::new(store)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    // No composite index is ever registered here, so every listing runs in
    // fallback and the in-memory predicate is authoritative. Chained pages
    // must visit every matching document exactly once, newest first, and
    // the counter must agree with the concatenation.
    #[test]
    fn chained_pages_are_disjoint_exhaustive_and_ordered(
        reports in proptest::collection::vec(raw_report(), 0..50),
        page_size in 1_usize..=7,
        use_search in any::<bool>(),
        batch in 2_usize..=9,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        rt.block_on(async {
            let limits = EngineLimits {
                scan_batch_size: batch,
                ..EngineLimits::default()
            };
            let engine = ReportQueryEngine::new(seed(&reports), COLLECTION, b"prop".to_vec())
                .with_limits(limits);
            let search = if use_search { Some("pipa") } else { None };

            let expected: Vec<String> = reports
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, r)| r.stage == 2 && (!use_search || r.pipa))
                .map(|(i, _)| format!("r{i:03}"))
                .collect();

            let mut ids = Vec::new();
            let mut cursor: Option<String> = None;
            let mut guard = 0;
            loop {
                let page = engine
                    .fetch_page(2, page_size, cursor.as_deref(), search, None)
                    .await
                    .expect("page");
                assert!(page.items.len() <= page_size, "page size contract");
                ids.extend(page.items.iter().map(|r| r.id.clone()));
                if !page.has_next {
                    break;
                }
                cursor = page.next_cursor.clone();
                guard += 1;
                assert!(guard < 200, "listing failed to terminate");
            }
            assert_eq!(ids, expected);

            if use_search {
                let total = engine
                    .count_matching(2, search, None)
                    .await
                    .expect("count");
                assert_eq!(total, expected.len() as u64);
            }
        });
    }
}
