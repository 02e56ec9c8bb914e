// src/services/reconciliation_service_tests.rs
//
// Reconciliation processor tests
//
// INVARIANTS TESTED:
// - Candidates are processed in input order, one failure never aborts the batch
// - Summary counts and the unresolved list match the per-candidate rows
// - Re-running the same batch leaves the vehicle in the same state
// - No record update after a failed upload
// - An upload without a successful update is surfaced as orphaned

#[cfg(test)]
mod reconciliation_tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::config::ImportConfig;
    use crate::domain::{
        FieldUpdate, ImportCandidate, ImportKind, OutcomeStatus, TargetRecord,
    };
    use crate::error::{AppError, AppResult};
    use crate::events::{CandidateReconciled, EventBus};
    use crate::infrastructure::{FileStorage, MockFileStorage, StoredObject};
    use crate::services::record_store::{MockRecordStore, RecordStore};
    use crate::services::reconciliation_service::{
        ReconciliationService, LOOKUP_FAILED, UPDATE_FAILED, UPLOAD_FAILED,
    };

    // ------------------------------------------------------------------
    // In-memory fakes
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct FakeStore {
        records: Mutex<HashMap<String, TargetRecord>>,
        failing_lookups: HashSet<String>,
        fail_updates: bool,
    }

    impl FakeStore {
        fn with_keys(keys: &[&str]) -> Self {
            let store = FakeStore::default();
            for key in keys {
                store.records.lock().unwrap().insert(
                    key.to_string(),
                    TargetRecord {
                        id: Uuid::new_v4(),
                        business_key: key.to_string(),
                        label: format!("VW Golf {}", key),
                        photo_urls: Vec::new(),
                        report_url: None,
                    },
                );
            }
            store
        }

        fn record(&self, key: &str) -> TargetRecord {
            self.records.lock().unwrap()[key].clone()
        }
    }

    #[async_trait]
    impl RecordStore for FakeStore {
        async fn find_by_key(&self, key: &str) -> AppResult<Option<TargetRecord>> {
            if self.failing_lookups.contains(key) {
                return Err(AppError::Other("connection reset".to_string()));
            }
            Ok(self.records.lock().unwrap().get(key).cloned())
        }

        async fn update_field(&self, record_id: Uuid, update: FieldUpdate) -> AppResult<()> {
            if self.fail_updates {
                return Err(AppError::Other("row locked".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            let record = records
                .values_mut()
                .find(|r| r.id == record_id)
                .ok_or(AppError::NotFound)?;
            match update {
                FieldUpdate::PhotoUrls(urls) => record.photo_urls = urls,
                FieldUpdate::ReportUrl(url) => record.report_url = Some(url),
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        failing_paths: HashSet<String>,
    }

    #[async_trait]
    impl FileStorage for FakeStorage {
        async fn upload(
            &self,
            bucket: &str,
            path: &str,
            payload: &[u8],
            _upsert: bool,
        ) -> AppResult<StoredObject> {
            if self.failing_paths.contains(path) {
                return Err(AppError::Storage("quota exceeded".to_string()));
            }
            self.objects
                .lock()
                .unwrap()
                .insert(format!("{}/{}", bucket, path), payload.to_vec());
            Ok(StoredObject {
                bucket: bucket.to_string(),
                path: path.to_string(),
                public_url: self.public_url(bucket, path),
            })
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!("https://cdn.test/{}/{}", bucket, path)
        }
    }

    fn candidate(name: &str, key: &str) -> ImportCandidate {
        ImportCandidate::new(name.to_string(), Some(key.to_string()), name.as_bytes().to_vec())
    }

    fn service(
        kind: ImportKind,
        store: Arc<dyn RecordStore>,
        storage: Arc<dyn FileStorage>,
        bus: Arc<EventBus>,
    ) -> ReconciliationService {
        ReconciliationService::new(kind, store, storage, bus, &ImportConfig::default())
    }

    fn statuses(report: &crate::services::reconciliation_service::ImportReport) -> Vec<OutcomeStatus> {
        report.candidates.iter().map(|c| c.status).collect()
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_failure_in_the_middle_does_not_stop_batch() {
        let store = Arc::new(FakeStore {
            failing_lookups: HashSet::from(["0002".to_string()]),
            ..FakeStore::with_keys(&["0001", "0002", "0003"])
        });
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        bus.subscribe::<CandidateReconciled, _>(move |event| {
            seen_clone
                .lock()
                .unwrap()
                .push((event.source_identifier.clone(), event.status));
        });

        let svc = service(ImportKind::Photo, store, Arc::new(FakeStorage::default()), bus.clone());
        let report = svc
            .run(vec![
                candidate("0001.jpg", "0001"),
                candidate("0002.jpg", "0002"),
                candidate("0003.jpg", "0003"),
            ])
            .await;

        assert_eq!(
            statuses(&report),
            vec![OutcomeStatus::Matched, OutcomeStatus::Failed, OutcomeStatus::Matched]
        );
        assert_eq!(report.candidates[1].message.as_deref(), Some(LOOKUP_FAILED));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("0001.jpg".to_string(), OutcomeStatus::Matched),
                ("0002.jpg".to_string(), OutcomeStatus::Failed),
                ("0003.jpg".to_string(), OutcomeStatus::Matched),
            ]
        );

        let log = bus.get_event_log();
        assert_eq!(log.len(), 4);
        assert_eq!(log[3].event_type, "ReconciliationBatchCompleted");
    }

    #[tokio::test]
    async fn test_summary_of_mixed_batch() {
        let store = Arc::new(FakeStore::with_keys(&["0001", "0002", "0003", "0005"]));
        let storage = Arc::new(FakeStorage {
            failing_paths: HashSet::from(["0005/photo.jpg".to_string()]),
            ..FakeStorage::default()
        });

        let svc = service(ImportKind::Photo, store, storage, Arc::new(EventBus::new()));
        let report = svc
            .run(vec![
                candidate("0001.jpg", "0001"),
                candidate("0004.jpg", "0004"),
                candidate("0002.png", "0002"),
                candidate("0005.jpg", "0005"),
                candidate("0003.webp", "0003"),
            ])
            .await;

        let summary = &report.summary;
        assert_eq!(summary.total, 5);
        assert_eq!(summary.matched, 3);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.percent_complete, 100);
        assert!(summary.is_complete());
        assert!(!summary.should_auto_close());
        assert_eq!(summary.unresolved, vec!["0004.jpg".to_string(), "0005.jpg".to_string()]);
        assert_eq!(
            report.candidates[2].stored_path.as_deref(),
            Some("0002/photo.png")
        );
        assert_eq!(report.candidates[0].matched_label.as_deref(), Some("VW Golf 0001"));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let store = Arc::new(FakeStore::with_keys(&["0993"]));
        let storage = Arc::new(FakeStorage::default());
        let svc = service(
            ImportKind::Photo,
            store.clone(),
            storage.clone(),
            Arc::new(EventBus::new()),
        );

        let batch = vec![candidate("0993.JPEG", "0993")];
        let first = svc.run(batch.clone()).await;
        let after_first = store.record("0993");
        let second = svc.run(batch).await;
        let after_second = store.record("0993");

        assert_eq!(statuses(&first), vec![OutcomeStatus::Matched]);
        assert_eq!(statuses(&second), vec![OutcomeStatus::Matched]);
        assert_eq!(after_first, after_second);
        assert_eq!(
            after_second.photo_urls,
            vec!["https://cdn.test/vehicle-photos/0993/photo.jpg".to_string()]
        );
        assert_eq!(storage.objects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_key_in_one_batch_shares_one_object() {
        let store = Arc::new(FakeStore::with_keys(&["2704"]));
        let storage = Arc::new(FakeStorage::default());
        let svc = service(
            ImportKind::Photo,
            store.clone(),
            storage.clone(),
            Arc::new(EventBus::new()),
        );

        let report = svc
            .run(vec![
                candidate("2704_dekra_report-1.jpg", "2704"),
                candidate("2704_dekra_report-2.jpg", "2704"),
                candidate("2704_dekra_report-3.jpg", "2704"),
            ])
            .await;

        assert_eq!(report.summary.matched, 3);
        assert_eq!(report.summary.shared_paths, vec!["2704/photo.jpg".to_string()]);
        assert_eq!(store.record("2704").photo_urls.len(), 1);
        assert_eq!(
            storage.objects.lock().unwrap()["vehicle-photos/2704/photo.jpg"],
            b"2704_dekra_report-3.jpg".to_vec()
        );
    }

    #[tokio::test]
    async fn test_report_import_sets_report_url() {
        let store = Arc::new(FakeStore::with_keys(&["2704"]));
        let svc = service(
            ImportKind::Report,
            store.clone(),
            Arc::new(FakeStorage::default()),
            Arc::new(EventBus::new()),
        );

        let report = svc
            .run(vec![candidate("2704_dekra_report-1.PDF", "2704")])
            .await;

        assert_eq!(report.candidates[0].stored_path.as_deref(), Some("2704/dekra-report.pdf"));
        assert_eq!(
            store.record("2704").report_url.as_deref(),
            Some("https://cdn.test/vehicle-reports/2704/dekra-report.pdf")
        );
    }

    #[tokio::test]
    async fn test_failed_upload_skips_update() {
        let mut store = MockRecordStore::new();
        let record = TargetRecord {
            id: Uuid::new_v4(),
            business_key: "0993".to_string(),
            label: "BMW 320d".to_string(),
            photo_urls: Vec::new(),
            report_url: None,
        };
        store
            .expect_find_by_key()
            .times(1)
            .returning(move |_| Ok(Some(record.clone())));
        store.expect_update_field().times(0);

        let mut storage = MockFileStorage::new();
        storage
            .expect_upload()
            .times(1)
            .returning(|_, _, _, _| Err(AppError::Storage("bucket missing".to_string())));

        let svc = service(
            ImportKind::Photo,
            Arc::new(store),
            Arc::new(storage),
            Arc::new(EventBus::new()),
        );
        let report = svc.run(vec![candidate("0993.jpg", "0993")]).await;

        let row = &report.candidates[0];
        assert_eq!(row.status, OutcomeStatus::Failed);
        assert_eq!(row.message.as_deref(), Some(UPLOAD_FAILED));
        assert!(!row.message.as_deref().unwrap().contains("bucket missing"));
        assert!(row.stored_path.is_none());
        assert!(row.orphaned_path.is_none());
    }

    #[tokio::test]
    async fn test_failed_update_reports_orphaned_upload() {
        let store = Arc::new(FakeStore {
            fail_updates: true,
            ..FakeStore::with_keys(&["0993"])
        });
        let svc = service(
            ImportKind::Photo,
            store,
            Arc::new(FakeStorage::default()),
            Arc::new(EventBus::new()),
        );

        let report = svc.run(vec![candidate("0993.jpg", "0993")]).await;

        assert_eq!(report.candidates[0].status, OutcomeStatus::Failed);
        assert_eq!(report.candidates[0].message.as_deref(), Some(UPDATE_FAILED));
        assert_eq!(report.candidates[0].orphaned_path.as_deref(), Some("0993/photo.jpg"));
        assert_eq!(report.summary.orphaned_paths, vec!["0993/photo.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_candidate_without_key_is_invalid() {
        let mut store = MockRecordStore::new();
        store.expect_find_by_key().times(0);

        let svc = service(
            ImportKind::Photo,
            Arc::new(store),
            Arc::new(FakeStorage::default()),
            Arc::new(EventBus::new()),
        );
        let report = svc
            .run(vec![ImportCandidate::new("front.jpg".to_string(), None, vec![1])])
            .await;

        assert_eq!(statuses(&report), vec![OutcomeStatus::Invalid]);
        assert_eq!(report.summary.invalid, 1);
    }

    #[tokio::test]
    async fn test_snapshot_channel_ends_with_final_rows() {
        let store = Arc::new(FakeStore::with_keys(&["0001"]));
        let svc = service(
            ImportKind::Photo,
            store,
            Arc::new(FakeStorage::default()),
            Arc::new(EventBus::new()),
        );
        let rx = svc.subscribe();

        let report = svc
            .run(vec![candidate("0001.jpg", "0001"), candidate("0009.jpg", "0009")])
            .await;

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot, report.candidates);
        assert!(snapshot.iter().all(|row| row.status.is_terminal()));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let bus = Arc::new(EventBus::new());
        let svc = service(
            ImportKind::Photo,
            Arc::new(FakeStore::default()),
            Arc::new(FakeStorage::default()),
            bus.clone(),
        );

        let report = svc.run(Vec::new()).await;

        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.percent_complete, 100);
        assert!(!report.summary.should_auto_close());
        assert_eq!(bus.get_event_log().len(), 1);
    }
}
