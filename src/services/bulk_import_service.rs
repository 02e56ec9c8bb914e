// src/services/bulk_import_service.rs
//
// Bulk Import Service
//
// Entry point for dropped files: filter, then queue for reconciliation.
// Photos and reports each have their own filter, processor and queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::ImportConfig;
use crate::domain::{CandidateProgress, ImportKind};
use crate::error::AppResult;
use crate::events::EventBus;
use crate::infrastructure::FileStorage;
use crate::services::candidate_filter::{CandidateFilter, RawInput};
use crate::services::import_queue::ImportQueue;
use crate::services::reconciliation_service::{ImportReport, ReconciliationService};
use crate::services::record_store::RecordStore;

struct ImportLane {
    filter: Arc<CandidateFilter>,
    processor: Arc<ReconciliationService>,
    queue: ImportQueue,
}

impl ImportLane {
    fn spawn(
        kind: ImportKind,
        store: Arc<dyn RecordStore>,
        storage: Arc<dyn FileStorage>,
        event_bus: Arc<EventBus>,
        config: &ImportConfig,
    ) -> Self {
        let processor = Arc::new(ReconciliationService::new(
            kind, store, storage, event_bus, config,
        ));
        Self {
            filter: Arc::new(CandidateFilter::new(kind, config)),
            queue: ImportQueue::spawn(Arc::clone(&processor)),
            processor,
        }
    }
}

pub struct BulkImportService {
    auto_close_delay: Duration,
    photos: ImportLane,
    reports: ImportLane,
}

impl BulkImportService {
    /// Spawns one worker per import kind; call from inside a tokio runtime
    pub fn new(
        store: Arc<dyn RecordStore>,
        storage: Arc<dyn FileStorage>,
        event_bus: Arc<EventBus>,
        config: &ImportConfig,
    ) -> Self {
        Self {
            auto_close_delay: Duration::from_millis(config.auto_close_delay_ms),
            photos: ImportLane::spawn(
                ImportKind::Photo,
                Arc::clone(&store),
                Arc::clone(&storage),
                Arc::clone(&event_bus),
                config,
            ),
            reports: ImportLane::spawn(ImportKind::Report, store, storage, event_bus, config),
        }
    }

    fn lane(&self, kind: ImportKind) -> &ImportLane {
        match kind {
            ImportKind::Photo => &self.photos,
            ImportKind::Report => &self.reports,
        }
    }

    /// Filter `inputs`, reconcile the accepted ones and wait for the result
    pub async fn import(&self, kind: ImportKind, inputs: Vec<RawInput>) -> AppResult<ImportReport> {
        let lane = self.lane(kind);
        let filter = Arc::clone(&lane.filter);
        let outcome = tokio::task::spawn_blocking(move || filter.filter(inputs)).await?;

        let ticket = lane.queue.submit(outcome.accepted).await?;
        let mut report = ticket.wait().await?;
        report.rejected = outcome.rejected;

        Ok(report)
    }

    /// Live rows of the batch the `kind` worker is processing
    pub fn subscribe(&self, kind: ImportKind) -> watch::Receiver<Vec<CandidateProgress>> {
        self.lane(kind).processor.subscribe()
    }

    /// How long a fully matched batch stays visible before closing
    pub fn auto_close_delay(&self) -> Duration {
        self.auto_close_delay
    }

    pub async fn shutdown(self) -> AppResult<()> {
        self.photos.queue.shutdown().await?;
        self.reports.queue.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, get_connection, initialize_database};
    use crate::domain::{OutcomeStatus, Vehicle};
    use crate::infrastructure::LocalFileStorage;
    use crate::repositories::{SqliteVehicleRepository, VehicleRepository};
    use crate::services::candidate_filter::scan_directory;
    use crate::services::record_store::VehicleRecordStore;

    fn vehicles() -> Arc<SqliteVehicleRepository> {
        let pool = Arc::new(create_memory_pool().unwrap());
        {
            let conn = get_connection(&pool).unwrap();
            initialize_database(&conn).unwrap();
        }
        Arc::new(SqliteVehicleRepository::new(pool))
    }

    #[tokio::test]
    async fn test_import_photos_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let repo = vehicles();
        let vehicle = Vehicle::new("0993".to_string(), "BMW".to_string(), "320d".to_string());
        repo.save(&vehicle).unwrap();

        let service = BulkImportService::new(
            Arc::new(VehicleRecordStore::new(repo.clone())),
            Arc::new(LocalFileStorage::new(dir.path(), "http://cdn.local")),
            Arc::new(EventBus::new()),
            &ImportConfig::default(),
        );

        let report = service
            .import(
                ImportKind::Photo,
                vec![
                    RawInput::new("0993.JPG", b"jpeg".to_vec()),
                    RawInput::new("0994.jpg", b"jpeg".to_vec()),
                    RawInput::new("notes.txt", b"text".to_vec()),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.rejected, 1);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.candidates[0].status, OutcomeStatus::Matched);
        assert_eq!(report.candidates[1].status, OutcomeStatus::NotFound);
        assert_eq!(report.summary.unresolved, vec!["0994.jpg".to_string()]);

        let stored = repo.get_by_id(vehicle.id).unwrap().unwrap();
        assert_eq!(
            stored.photo_urls,
            vec!["http://cdn.local/vehicle-photos/0993/photo.jpg".to_string()]
        );
        assert!(dir.path().join("vehicle-photos/0993/photo.jpg").exists());

        let snapshot = service.subscribe(ImportKind::Photo).borrow().clone();
        assert_eq!(snapshot.len(), 2);

        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_import_reports_uses_report_lane() {
        let dir = tempfile::tempdir().unwrap();
        let repo = vehicles();
        let vehicle = Vehicle::new("2704".to_string(), "Audi".to_string(), "A4".to_string());
        repo.save(&vehicle).unwrap();

        let service = BulkImportService::new(
            Arc::new(VehicleRecordStore::new(repo.clone())),
            Arc::new(LocalFileStorage::new(dir.path(), "http://cdn.local")),
            Arc::new(EventBus::new()),
            &ImportConfig::default(),
        );

        let report = service
            .import(
                ImportKind::Report,
                vec![RawInput::new("2704_dekra_report-1.pdf", b"%PDF".to_vec())],
            )
            .await
            .unwrap();

        assert!(report.summary.should_auto_close());
        assert_eq!(service.auto_close_delay(), Duration::from_millis(1500));
        assert_eq!(
            repo.get_by_id(vehicle.id).unwrap().unwrap().report_url.as_deref(),
            Some("http://cdn.local/vehicle-reports/2704/dekra-report.pdf")
        );

        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_scanned_directory_with_unreadable_file_still_reconciles() {
        let storage_dir = tempfile::tempdir().unwrap();
        let drop_dir = tempfile::tempdir().unwrap();
        let repo = vehicles();
        let vehicle = Vehicle::new("0993".to_string(), "BMW".to_string(), "320d".to_string());
        repo.save(&vehicle).unwrap();

        std::fs::write(drop_dir.path().join("0993.jpg"), b"jpeg").unwrap();
        std::fs::write(drop_dir.path().join("0994.jpg"), b"jpeg").unwrap();
        std::fs::write(drop_dir.path().join("0995.mov"), vec![0u8; 64]).unwrap();

        let scan = scan_directory(drop_dir.path()).unwrap();
        assert_eq!(scan.inputs.len(), 3);
        std::fs::remove_file(drop_dir.path().join("0994.jpg")).unwrap();

        let service = BulkImportService::new(
            Arc::new(VehicleRecordStore::new(repo.clone())),
            Arc::new(LocalFileStorage::new(storage_dir.path(), "http://cdn.local")),
            Arc::new(EventBus::new()),
            &ImportConfig::default(),
        );

        let report = service.import(ImportKind::Photo, scan.inputs).await.unwrap();

        assert_eq!(report.rejected, 2);
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.candidates[0].status, OutcomeStatus::Matched);
        assert_eq!(repo.get_by_id(vehicle.id).unwrap().unwrap().photo_urls.len(), 1);

        service.shutdown().await.unwrap();
    }
}
