#[cfg(test)]
mod tests {
    use crate::{
        CONNECTOR, DATASOURCE, context, full_datasource, incremental_datasource, item,
        utils::{CollectBehavior, CountingStore, MemoryBackend, MemoryCollector, StuckBackend},
    };
    use engine_config::error::ConfigError;
    use engine_core::{
        error::{CollectError, ScanError},
        scan::{ScanStatus, Scanner},
        state::SyncStateStore,
    };
    use model::{
        core::value::{FieldValue, Value},
        pagination::cursor::{CursorKind, StoredCursor, StoredCursorValue},
        records::row::RowData,
        state::{SyncMode, SyncState},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    fn seeded_state(property: &str, value: i64, tie: &str) -> SyncState {
        SyncState {
            connector_id: CONNECTOR.into(),
            datasource_id: DATASOURCE.into(),
            mode: SyncMode::PropertyWatermark,
            property: property.into(),
            cursor: StoredCursor {
                property: StoredCursorValue {
                    kind: CursorKind::Int,
                    value: value.to_string(),
                    raw_type: None,
                },
                tie: Some(StoredCursorValue {
                    kind: CursorKind::String,
                    value: tie.into(),
                    raw_type: None,
                }),
            },
            updated_at: None,
        }
    }

    fn watermark_of(cursor: &StoredCursor) -> (String, Option<String>) {
        (
            cursor.property.value.clone(),
            cursor.tie.as_ref().map(|t| t.value.clone()),
        )
    }

    // Scenario: Rows (1,a), (1,b), (2,c) with page size 2; two rows share the property value.
    // Expected Outcome:
    // - Page 1 returns (1,a), (1,b) and persists (1,b).
    // - Page 2 starts after (1,b), returns (2,c) and persists (2,c).
    // - Page 3 is empty; nothing else is written.
    #[traced_test]
    #[tokio::test]
    async fn watermark_advances_page_by_page() {
        let backend = MemoryBackend::new(vec![
            item(Some(1), "a"),
            item(Some(1), "b"),
            item(Some(2), "c"),
        ]);
        let probe = backend.probe();
        let store = Arc::new(CountingStore::default());
        let collector = Arc::new(MemoryCollector::default());

        let outcome = Scanner::new(
            backend,
            incremental_datasource(2, json!({})),
            context(store.clone(), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.status, ScanStatus::Completed);
        assert_eq!(collector.ids(), ["a", "b", "c"]);
        assert_eq!(outcome.metrics.pages, 2);
        assert_eq!(outcome.metrics.documents, 3);
        assert_eq!(store.saves(), 2);

        let fetches = probe.fetches();
        assert_eq!(fetches.len(), 3);
        assert!(fetches.iter().all(|f| f.offset == 0 && f.page_size == Some(2)));
        assert_eq!(fetches[0].after, None);
        assert_eq!(
            watermark_of(fetches[1].after.as_ref().unwrap()),
            ("1".to_string(), Some("b".to_string()))
        );
        assert_eq!(
            watermark_of(fetches[2].after.as_ref().unwrap()),
            ("2".to_string(), Some("c".to_string()))
        );

        let state = store.load(CONNECTOR, DATASOURCE).await.unwrap().unwrap();
        assert_eq!(state.property, "seq");
        assert_eq!(state.mode, SyncMode::PropertyWatermark);
        assert!(state.updated_at.is_some());
        assert_eq!(watermark_of(&state.cursor), ("2".to_string(), Some("c".to_string())));
        assert_eq!(outcome.watermark, Some(state.cursor));
        assert_eq!(probe.disconnects(), 1);
        assert!(logs_contain("Watermark advanced"));
    }

    // Scenario: A second run against the same store after one row sharing the last property value arrives.
    // Expected Outcome: Only the new row is read; a third run with nothing new reads one empty page and writes nothing.
    #[traced_test]
    #[tokio::test]
    async fn later_runs_resume_after_persisted_watermark() {
        let store = Arc::new(CountingStore::default());
        let first = MemoryBackend::new(vec![item(Some(1), "a"), item(Some(2), "c")]);
        let rows = first.rows();
        Scanner::new(
            first,
            incremental_datasource(10, json!({})),
            context(store.clone(), Arc::new(MemoryCollector::default()), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();
        assert_eq!(store.saves(), 1);

        rows.lock().unwrap().push(item(Some(2), "d"));
        let second = MemoryBackend::new(rows.lock().unwrap().clone());
        let collector = Arc::new(MemoryCollector::default());
        let outcome = Scanner::new(
            second,
            incremental_datasource(10, json!({})),
            context(store.clone(), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();
        assert_eq!(collector.ids(), ["d"]);
        assert_eq!(
            watermark_of(outcome.watermark.as_ref().unwrap()),
            ("2".to_string(), Some("d".to_string()))
        );
        assert_eq!(store.saves(), 2);

        let third = MemoryBackend::new(rows.lock().unwrap().clone());
        let probe = third.probe();
        let outcome = Scanner::new(
            third,
            incremental_datasource(10, json!({})),
            context(store.clone(), Arc::new(MemoryCollector::default()), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();
        assert_eq!(outcome.metrics.documents, 0);
        assert_eq!(outcome.watermark, None);
        assert_eq!(probe.fetches().len(), 1);
        assert_eq!(store.saves(), 2);
    }

    // Scenario: An integer column synced with the default string property type; a row crossing a digit boundary arrives after a restart.
    // Expected Outcome: The restored watermark keeps its integer order, so the second run reads 100 after 99 and persists it.
    #[traced_test]
    #[tokio::test]
    async fn restored_integer_watermark_keeps_numeric_order() {
        let store = Arc::new(CountingStore::default());
        let config = || incremental_datasource(10, json!({ "incremental": { "property_type": "string" } }));

        let first = MemoryBackend::new(vec![item(Some(98), "a"), item(Some(99), "b")]);
        let rows = first.rows();
        Scanner::new(
            first,
            config(),
            context(store.clone(), Arc::new(MemoryCollector::default()), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();
        let saved = store.load(CONNECTOR, DATASOURCE).await.unwrap().unwrap();
        assert_eq!(saved.cursor.property.kind, CursorKind::Int);

        rows.lock().unwrap().push(item(Some(100), "c"));
        let second = MemoryBackend::new(rows.lock().unwrap().clone());
        let collector = Arc::new(MemoryCollector::default());
        let outcome = Scanner::new(
            second,
            config(),
            context(store.clone(), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.status, ScanStatus::Completed);
        assert_eq!(collector.ids(), ["c"]);
        assert_eq!(
            watermark_of(outcome.watermark.as_ref().unwrap()),
            ("100".to_string(), Some("c".to_string()))
        );
        assert_eq!(store.saves(), 2);
    }

    // Scenario: Incremental sync without pagination.
    // Expected Outcome: The first fetch reads every row; the scan still stops on the following empty fetch.
    #[traced_test]
    #[tokio::test]
    async fn unpaged_incremental_stops_on_empty_fetch() {
        let backend = MemoryBackend::new((1..=4).map(|i| item(Some(i), &format!("r{i}"))).collect());
        let probe = backend.probe();
        let store = Arc::new(CountingStore::default());

        let outcome = Scanner::new(
            backend,
            incremental_datasource(2, json!({ "pagination": { "enabled": false } })),
            context(store.clone(), Arc::new(MemoryCollector::default()), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.metrics.documents, 4);
        let fetches = probe.fetches();
        assert_eq!(fetches.len(), 2);
        assert_eq!(fetches[0].page_size, None);
        assert_eq!(store.saves(), 1);
    }

    // Scenario: A source that ignores the watermark keeps returning the same page.
    // Expected Outcome: The second page does not advance the watermark and the scan fails with a stagnation fault.
    #[traced_test]
    #[tokio::test]
    async fn repeated_page_is_stagnation() {
        let backend = StuckBackend::new(vec![item(Some(1), "a"), item(Some(1), "b")]);
        let probe = backend.probe();
        let store = Arc::new(CountingStore::default());

        let err = Scanner::new(
            backend,
            incremental_datasource(2, json!({})),
            context(store.clone(), Arc::new(MemoryCollector::default()), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ScanError::Stagnation { page: 2, regressed: false, .. }
        ));
        assert!(err.is_fatal_config());
        assert!(err.to_string().contains("equal to"));
        assert_eq!(store.saves(), 1);
        assert_eq!(probe.fetches().len(), 2);
        assert_eq!(probe.disconnects(), 1);
        assert!(logs_contain("Scan failed"));
    }

    // Scenario: The stored watermark is ahead of everything the source returns.
    // Expected Outcome: The first page regresses the watermark; the scan fails without overwriting it.
    #[traced_test]
    #[tokio::test]
    async fn regressed_page_is_stagnation() {
        let store = Arc::new(CountingStore::default());
        store.save(&seeded_state("seq", 5, "z")).await.unwrap();
        let backend = StuckBackend::new(vec![item(Some(1), "a")]);

        let err = Scanner::new(
            backend,
            incremental_datasource(2, json!({})),
            context(store.clone(), Arc::new(MemoryCollector::default()), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ScanError::Stagnation { page: 1, regressed: true, .. }
        ));
        let state = store.load(CONNECTOR, DATASOURCE).await.unwrap().unwrap();
        assert_eq!(watermark_of(&state.cursor), ("5".to_string(), Some("z".to_string())));
    }

    // Scenario: Full sync with page size 2 over 5 rows.
    // Expected Outcome: Offsets 0, 2, 4 are read, the short last page ends the scan and nothing is persisted.
    #[traced_test]
    #[tokio::test]
    async fn full_sync_pages_by_offset_and_never_persists() {
        let backend = MemoryBackend::new((1..=5).map(|i| item(Some(i), &format!("r{i}"))).collect());
        let probe = backend.probe();
        let store = Arc::new(CountingStore::default());
        let collector = Arc::new(MemoryCollector::default());

        let outcome = Scanner::new(
            backend,
            full_datasource(2),
            context(store.clone(), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        let offsets: Vec<usize> = probe.fetches().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, [0, 2, 4]);
        assert!(probe.fetches().iter().all(|f| f.after.is_none()));
        assert_eq!(collector.ids(), ["r1", "r2", "r3", "r4", "r5"]);
        assert_eq!(outcome.watermark, None);
        assert_eq!(store.saves(), 0);
    }

    // Scenario: Full sync with pagination disabled.
    // Expected Outcome: Exactly one fetch without a limit.
    #[traced_test]
    #[tokio::test]
    async fn unpaged_full_sync_fetches_once() {
        let backend = MemoryBackend::new((1..=3).map(|i| item(Some(i), &format!("r{i}"))).collect());
        let probe = backend.probe();

        let outcome = Scanner::new(
            backend,
            incremental_datasource(
                2,
                json!({ "pagination": { "enabled": false }, "incremental": { "enabled": false } }),
            ),
            context(
                Arc::new(CountingStore::default()),
                Arc::new(MemoryCollector::default()),
                CancellationToken::new(),
            ),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.metrics.documents, 3);
        assert_eq!(probe.fetches().len(), 1);
        assert_eq!(probe.fetches()[0].page_size, None);
    }

    // Scenario: The stored watermark was written for another property.
    // Expected Outcome: It is ignored, the scan starts from the beginning and the record is replaced.
    #[traced_test]
    #[tokio::test]
    async fn property_change_restarts_from_beginning() {
        let store = Arc::new(CountingStore::default());
        store.save(&seeded_state("updated_at", 100, "x")).await.unwrap();
        let backend = MemoryBackend::new(vec![item(Some(1), "a"), item(Some(2), "b")]);
        let probe = backend.probe();
        let collector = Arc::new(MemoryCollector::default());

        Scanner::new(
            backend,
            incremental_datasource(10, json!({})),
            context(store.clone(), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(probe.fetches()[0].after, None);
        assert_eq!(collector.ids(), ["a", "b"]);
        let state = store.load(CONNECTOR, DATASOURCE).await.unwrap().unwrap();
        assert_eq!(state.property, "seq");
        assert_eq!(watermark_of(&state.cursor), ("2".to_string(), Some("b".to_string())));
        assert!(logs_contain("Watermark property changed"));
    }

    // Scenario: No watermark is stored and `resume_from` is configured.
    // Expected Outcome: The first fetch starts strictly after the resume value, which carries no tie.
    #[traced_test]
    #[tokio::test]
    async fn resume_point_seeds_first_fetch() {
        let backend = MemoryBackend::new(vec![
            item(Some(1), "a"),
            item(Some(1), "b"),
            item(Some(2), "c"),
        ]);
        let probe = backend.probe();
        let collector = Arc::new(MemoryCollector::default());

        Scanner::new(
            backend,
            incremental_datasource(10, json!({ "incremental": { "resume_from": " 1 " } })),
            context(
                Arc::new(CountingStore::default()),
                collector.clone(),
                CancellationToken::new(),
            ),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(collector.ids(), ["c"]);
        let first = probe.fetches()[0].after.clone().unwrap();
        assert_eq!(watermark_of(&first), ("1".to_string(), None));
    }

    // Scenario: Shutdown was requested before the scan starts.
    // Expected Outcome: The scan reports cancellation without touching the source.
    #[traced_test]
    #[tokio::test]
    async fn cancelled_before_start() {
        let backend = MemoryBackend::new(vec![item(Some(1), "a")]);
        let probe = backend.probe();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = Scanner::new(
            backend,
            incremental_datasource(10, json!({})),
            context(Arc::new(CountingStore::default()), Arc::new(MemoryCollector::default()), cancel),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert!(outcome.is_cancelled());
        assert_eq!(probe.connects.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(probe.fetches().is_empty());
    }

    // Scenario: Shutdown arrives while a page is being processed.
    // Expected Outcome: The scan stops before the next row and the interrupted page is not persisted.
    #[traced_test]
    #[tokio::test]
    async fn cancel_mid_page_keeps_previous_watermark() {
        let cancel = CancellationToken::new();
        let backend = MemoryBackend::new(vec![
            item(Some(1), "a"),
            item(Some(2), "b"),
            item(Some(3), "c"),
        ]);
        let probe = backend.probe();
        let store = Arc::new(CountingStore::default());
        let collector = Arc::new(MemoryCollector::new(CollectBehavior::CancelAfter(1, cancel.clone())));

        let outcome = Scanner::new(
            backend,
            incremental_datasource(10, json!({})),
            context(store.clone(), collector.clone(), cancel),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.status, ScanStatus::Cancelled);
        assert_eq!(collector.ids(), ["a"]);
        assert_eq!(outcome.watermark, None);
        assert_eq!(store.saves(), 0);
        assert_eq!(probe.disconnects(), 1);
        assert!(logs_contain("Scan cancelled"));
    }

    // Scenario: Shutdown arrives while the last row of the first page is collected.
    // Expected Outcome: That page is persisted and the scan stops before fetching the next one.
    #[traced_test]
    #[tokio::test]
    async fn cancel_between_pages_keeps_finished_page() {
        let cancel = CancellationToken::new();
        let backend = MemoryBackend::new(vec![
            item(Some(1), "a"),
            item(Some(2), "b"),
            item(Some(3), "c"),
        ]);
        let probe = backend.probe();
        let store = Arc::new(CountingStore::default());
        let collector = Arc::new(MemoryCollector::new(CollectBehavior::CancelAfter(2, cancel.clone())));

        let outcome = Scanner::new(
            backend,
            incremental_datasource(2, json!({})),
            context(store.clone(), collector, cancel),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert!(outcome.is_cancelled());
        assert_eq!(
            watermark_of(outcome.watermark.as_ref().unwrap()),
            ("2".to_string(), Some("b".to_string()))
        );
        assert_eq!(store.saves(), 1);
        assert_eq!(probe.fetches().len(), 1);
    }

    // Scenario: The query does not return the configured cursor property.
    // Expected Outcome: A configuration fault naming the field; no page is fetched and the connection is released.
    #[traced_test]
    #[tokio::test]
    async fn missing_cursor_field_is_rejected_before_fetching() {
        let backend = MemoryBackend::new(vec![item(Some(1), "a")]).with_schema(&["id", "title"]);
        let probe = backend.probe();

        let err = Scanner::new(
            backend,
            incremental_datasource(10, json!({})),
            context(
                Arc::new(CountingStore::default()),
                Arc::new(MemoryCollector::default()),
                CancellationToken::new(),
            ),
        )
        .unwrap()
        .run()
        .await
        .unwrap_err();

        assert!(matches!(&err, ScanError::MissingField { field, .. } if field == "seq"));
        assert!(err.is_fatal_config());
        assert!(probe.fetches().is_empty());
        assert_eq!(probe.disconnects(), 1);
    }

    // Scenario: Schema column names differ from the configuration only in case.
    // Expected Outcome: The schema check passes.
    #[traced_test]
    #[tokio::test]
    async fn schema_check_ignores_case() {
        let backend = MemoryBackend::new(vec![item(Some(1), "a")]).with_schema(&["SEQ", "ID", "TITLE"]);

        let outcome = Scanner::new(
            backend,
            incremental_datasource(10, json!({})),
            context(
                Arc::new(CountingStore::default()),
                Arc::new(MemoryCollector::default()),
                CancellationToken::new(),
            ),
        )
        .unwrap()
        .run()
        .await
        .unwrap();
        assert_eq!(outcome.metrics.documents, 1);
    }

    // Scenario: Incremental sync is enabled without a tie-breaker.
    // Expected Outcome: The scanner refuses the configuration before connecting.
    #[traced_test]
    #[tokio::test]
    async fn missing_tie_breaker_is_config_fault() {
        let result = Scanner::new(
            MemoryBackend::new(vec![]),
            incremental_datasource(10, json!({ "incremental": { "tie_breaker": " " } })),
            context(
                Arc::new(CountingStore::default()),
                Arc::new(MemoryCollector::default()),
                CancellationToken::new(),
            ),
        );

        let Err(err) = result else {
            panic!("configuration should be rejected");
        };
        assert!(matches!(
            err,
            ScanError::Config(ConfigError::MissingIncrementalField("tie_breaker"))
        ));
        assert!(err.is_fatal_config());
    }

    // Scenario: Two of three rows have an empty mapped id.
    // Expected Outcome: More than half of the page fails to transform and the scan stops without persisting.
    #[traced_test]
    #[tokio::test]
    async fn transform_failures_above_threshold_abort() {
        let store = Arc::new(CountingStore::default());
        let mapping = json!({ "field_mapping": { "enabled": true, "mapping": { "id": "id", "title": "title" } } });

        let err = Scanner::new(
            MemoryBackend::new(vec![item(Some(1), ""), item(Some(2), ""), item(Some(3), "c")]),
            incremental_datasource(10, mapping),
            context(store.clone(), Arc::new(MemoryCollector::default()), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ScanError::TransformThreshold { page: 1, rows: 3, skipped: 2 }
        ));
        assert_eq!(store.saves(), 0);
    }

    // Scenario: One of three rows has an empty mapped id.
    // Expected Outcome: That row is skipped, the others become documents with scoped ids and the watermark advances.
    #[traced_test]
    #[tokio::test]
    async fn transform_failures_below_threshold_are_skipped() {
        let collector = Arc::new(MemoryCollector::default());
        let mapping = json!({ "field_mapping": { "enabled": true, "mapping": { "id": "id", "title": "title" } } });

        let outcome = Scanner::new(
            MemoryBackend::new(vec![item(Some(1), ""), item(Some(2), "b"), item(Some(3), "c")]),
            incremental_datasource(10, mapping),
            context(Arc::new(CountingStore::default()), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.metrics.transform_skipped, 1);
        assert_eq!(outcome.metrics.documents, 2);
        let docs = collector.documents();
        assert_eq!(docs[0].id, format!("{DATASOURCE}-b"));
        assert_eq!(docs[0].title, "Item b");
        assert!(docs[0].payload.contains_key("seq"));
        assert!(!docs[0].payload.contains_key("title"));
        assert_eq!(
            watermark_of(outcome.watermark.as_ref().unwrap()),
            ("3".to_string(), Some("c".to_string()))
        );
    }

    // Scenario: No row of the page carries a cursor value.
    // Expected Outcome: The page yields no watermark and the scan fails with a decode fault.
    #[traced_test]
    #[tokio::test]
    async fn page_without_watermark_is_decode_fault() {
        let err = Scanner::new(
            MemoryBackend::new(vec![item(None, "a"), item(None, "b")]),
            incremental_datasource(10, json!({})),
            context(
                Arc::new(CountingStore::default()),
                Arc::new(MemoryCollector::default()),
                CancellationToken::new(),
            ),
        )
        .unwrap()
        .run()
        .await
        .unwrap_err();

        assert!(matches!(err, ScanError::Decode { page: 1, rows: 2, failures: 2, .. }));
    }

    // Scenario: One of three rows has no cursor value.
    // Expected Outcome: With the default policy the row is still emitted, counted, and the watermark advances past the others.
    #[traced_test]
    #[tokio::test]
    async fn single_decode_failure_is_recovered() {
        let collector = Arc::new(MemoryCollector::default());

        let outcome = Scanner::new(
            MemoryBackend::new(vec![item(Some(1), "a"), item(None, "b"), item(Some(2), "c")]),
            incremental_datasource(10, json!({})),
            context(Arc::new(CountingStore::default()), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.metrics.decode_failures, 1);
        assert_eq!(outcome.metrics.documents, 3);
        assert_eq!(
            watermark_of(outcome.watermark.as_ref().unwrap()),
            ("2".to_string(), Some("c".to_string()))
        );
        assert!(logs_contain("Row yields no watermark"));
    }

    // Scenario: The same page under a stricter decode policy.
    // Expected Outcome: One failure in three reaches the 0.3 threshold and the scan fails.
    #[traced_test]
    #[tokio::test]
    async fn decode_threshold_is_configurable() {
        let err = Scanner::new(
            MemoryBackend::new(vec![item(Some(1), "a"), item(None, "b"), item(Some(2), "c")]),
            incremental_datasource(10, json!({ "policy": { "decode_failure_threshold": 0.3 } })),
            context(
                Arc::new(CountingStore::default()),
                Arc::new(MemoryCollector::default()),
                CancellationToken::new(),
            ),
        )
        .unwrap()
        .run()
        .await
        .unwrap_err();

        assert!(matches!(err, ScanError::Decode { failures: 1, rows: 3, .. }));
    }

    // Scenario: The collector refuses one document.
    // Expected Outcome: The refusal is counted and logged; the scan completes.
    #[traced_test]
    #[tokio::test]
    async fn rejected_documents_do_not_stop_scan() {
        let collector = Arc::new(MemoryCollector::new(CollectBehavior::Reject(vec!["b".into()])));

        let outcome = Scanner::new(
            MemoryBackend::new(vec![item(Some(1), "a"), item(Some(2), "b"), item(Some(3), "c")]),
            incremental_datasource(10, json!({})),
            context(Arc::new(CountingStore::default()), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(collector.ids(), ["a", "c"]);
        assert_eq!(outcome.metrics.collect_failures, 1);
        assert_eq!(outcome.status, ScanStatus::Completed);
        assert!(logs_contain("Failed to collect document"));
    }

    // Scenario: The collector reports a hard stop (the datasource was deleted).
    // Expected Outcome: The scan ends at once with a collector fault and nothing is persisted.
    #[traced_test]
    #[tokio::test]
    async fn stopped_collector_ends_scan() {
        let store = Arc::new(CountingStore::default());

        let err = Scanner::new(
            MemoryBackend::new(vec![item(Some(1), "a"), item(Some(2), "b")]),
            incremental_datasource(10, json!({})),
            context(
                store.clone(),
                Arc::new(MemoryCollector::new(CollectBehavior::StopAfter(1))),
                CancellationToken::new(),
            ),
        )
        .unwrap()
        .run()
        .await
        .unwrap_err();

        assert!(matches!(err, ScanError::Collector(CollectError::Stopped(_))));
        assert_eq!(store.saves(), 0);
    }

    // Scenario: The source cannot be reached.
    // Expected Outcome: A source fault is returned and logged; no disconnect is attempted.
    #[traced_test]
    #[tokio::test]
    async fn unreachable_source_is_source_fault() {
        let backend = MemoryBackend::new(vec![]).unreachable();
        let probe = backend.probe();

        let err = Scanner::new(
            backend,
            incremental_datasource(10, json!({})),
            context(
                Arc::new(CountingStore::default()),
                Arc::new(MemoryCollector::default()),
                CancellationToken::new(),
            ),
        )
        .unwrap()
        .run()
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "source");
        assert!(!err.is_fatal_config());
        assert_eq!(probe.disconnects(), 0);
        assert!(logs_contain("Scan failed"));
    }

    // Scenario: A datetime cursor whose values arrive as text in mixed layouts.
    // Expected Outcome: Rows are read in chronological order and the watermark is stored in canonical RFC 3339.
    #[traced_test]
    #[tokio::test]
    async fn text_timestamps_are_ordered_chronologically() {
        fn event(at: &str, id: &str) -> RowData {
            RowData::new(
                "query",
                vec![
                    FieldValue::new("updated", Value::String(at.into())).with_raw_type("varchar"),
                    FieldValue::new("id", Value::String(id.into())).with_raw_type("text"),
                ],
            )
        }

        let store = Arc::new(CountingStore::default());
        let collector = Arc::new(MemoryCollector::default());
        let outcome = Scanner::new(
            MemoryBackend::new(vec![
                event("2024-03-01 10:00:00", "a"),
                event("2024-03-01T09:00:00Z", "b"),
                event("2024-03-02", "c"),
            ]),
            incremental_datasource(
                2,
                json!({ "incremental": { "property": "updated", "property_type": "timestamp" } }),
            ),
            context(store.clone(), collector.clone(), CancellationToken::new()),
        )
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(collector.ids(), ["b", "a", "c"]);
        let state = store.load(CONNECTOR, DATASOURCE).await.unwrap().unwrap();
        assert_eq!(state.cursor.property.kind, CursorKind::Datetime);
        assert_eq!(state.cursor.property.value, "2024-03-02T00:00:00Z");
        assert_eq!(state.cursor.property.raw_type.as_deref(), Some("varchar"));
        assert_eq!(outcome.metrics.pages, 2);
    }
}
