//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's load/save/staleness behaviour.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;

use crate::cache::{CacheStore, ManualClock, StalenessPolicy};
use crate::error::CacheError;

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_:]{1,64}"
}

/// Generates valid cache values; no surrounding whitespace since saves trim
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9{}\":,]{1,256}"
}

fn ttl_strategy() -> impl Strategy<Value = u64> {
    1u64..=604_800
}

fn clocked_store() -> (CacheStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let store = CacheStore::in_memory()
        .unwrap()
        .with_clock(clock.clone());
    (store, clock)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Save { key: String, value: String },
    Load { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Save { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Load { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Keys that were never saved always miss.
    #[test]
    fn prop_unsaved_key_misses(
        saved in prop::collection::vec(valid_key_strategy(), 0..10),
        probe in valid_key_strategy()
    ) {
        prop_assume!(!saved.contains(&probe));
        let (store, _) = clocked_store();

        for key in &saved {
            store.save(key, "value", 60).unwrap();
        }

        prop_assert!(matches!(store.load(&probe), Err(CacheError::NotFound(_))));
    }

    // A save with a positive TTL is immediately loadable.
    #[test]
    fn prop_save_then_load(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl in ttl_strategy()
    ) {
        let (store, _) = clocked_store();
        store.save(&key, &value, ttl).unwrap();

        let entry = store.load(&key).unwrap();
        prop_assert_eq!(entry.value, value);
        prop_assert_eq!(entry.ttl, ttl);
    }

    // Once `ttl` seconds have elapsed the entry is stale, one millisecond
    // earlier it is still fresh.
    #[test]
    fn prop_stale_after_ttl(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl in ttl_strategy()
    ) {
        let (store, clock) = clocked_store();
        store.save(&key, &value, ttl).unwrap();

        clock.advance(Duration::milliseconds(ttl as i64 * 1000 - 1));
        prop_assert!(store.load(&key).is_ok());

        clock.advance(Duration::milliseconds(1));
        prop_assert!(matches!(store.load(&key), Err(CacheError::Stale(_))));
    }

    // Saving the same triple twice leaves one entry holding that value.
    #[test]
    fn prop_save_idempotent(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl in ttl_strategy()
    ) {
        let (store, _) = clocked_store();
        store.save(&key, &value, ttl).unwrap();
        store.save(&key, &value, ttl).unwrap();

        prop_assert_eq!(store.load(&key).unwrap().value, value);
        prop_assert_eq!(store.len().unwrap(), 1);
    }

    // The last save for a key wins.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let (store, _) = clocked_store();
        store.save(&key, &value1, 60).unwrap();
        store.save(&key, &value2, 60).unwrap();

        prop_assert_eq!(store.load(&key).unwrap().value, value2);
        prop_assert_eq!(store.len().unwrap(), 1);
    }

    // Under both policies an entry older than its TTL is never served.
    #[test]
    fn prop_policies_agree_going_forward(
        ttl in ttl_strategy(),
        elapsed in 0i64..1_209_600
    ) {
        for policy in [StalenessPolicy::Forward, StalenessPolicy::Symmetric] {
            let clock = Arc::new(ManualClock::default());
            let store = CacheStore::in_memory()
                .unwrap()
                .with_clock(clock.clone())
                .with_policy(policy);

            store.save("k", "v", ttl).unwrap();
            clock.advance(Duration::seconds(elapsed));

            prop_assert_eq!(store.load("k").is_ok(), (elapsed as u64) < ttl);
        }
    }

    // Load statistics match the observed outcomes of any operation sequence.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let (store, _) = clocked_store();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Save { key, value } => {
                    store.save(&key, &value, 60).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Load { key } => match store.load(&key) {
                    Ok(entry) => {
                        expected_hits += 1;
                        prop_assert_eq!(Some(&entry.value), model.get(&key));
                    }
                    Err(_) => {
                        expected_misses += 1;
                        prop_assert!(!model.contains_key(&key));
                    }
                },
            }
        }

        let stats = store.stats().unwrap();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, model.len(), "Total entries mismatch");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Concurrent writers never leave a partially written value behind.
    #[test]
    fn prop_concurrent_saves_are_whole(
        keys in prop::collection::vec(valid_key_strategy(), 1..6),
        values in prop::collection::vec(valid_value_strategy(), 2..6)
    ) {
        let store = Arc::new(CacheStore::in_memory().unwrap());

        std::thread::scope(|scope| {
            for value in &values {
                let store = Arc::clone(&store);
                let keys = &keys;
                scope.spawn(move || {
                    for key in keys {
                        store.save(key, value, 60).unwrap();
                    }
                });
            }
        });

        for key in &keys {
            let stored = store.load(key).unwrap().value;
            prop_assert!(values.contains(&stored), "unexpected value {}", stored);
        }
    }
}

// == Property Test for Error Response Format ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_error_response_format(
        error_msg in "[a-zA-Z0-9 _-]{1,100}"
    ) {
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::NotFound(error_msg.clone()),
            CacheError::Stale(error_msg.clone()),
            CacheError::InvalidRequest(error_msg.clone()),
            CacheError::Database(error_msg.clone()),
            CacheError::Internal(error_msg.clone()),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();

        for error in error_variants {
            let response = error.into_response();

            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = rt.block_on(async {
                to_bytes(response.into_body(), usize::MAX).await.unwrap()
            });
            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            prop_assert_eq!(json["error"].as_str(), Some(error_msg.as_str()));
        }
    }
}
