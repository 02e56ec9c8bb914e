// src/application/state.rs
//
// Wiring of repositories, storage, services and the event bus.
// Built once per process by the CLI; tests build it over an in-memory pool.

use std::sync::Arc;

use crate::config::{AppConfig, StorageConfig};
use crate::db::{self, ConnectionPool};
use crate::error::AppResult;
use crate::events::{CandidateReconciled, EventBus, ReconciliationBatchCompleted};
use crate::infrastructure::{FileStorage, LocalFileStorage};
use crate::integrations::HttpObjectStorage;
use crate::repositories::{
    InquiryRepository, SqliteInquiryRepository, SqliteVehicleRepository, VehicleRepository,
};
use crate::services::{
    BulkImportService, FieldImporter, InquiryService, MaintenanceExtractor, VehicleRecordStore,
    VehicleService,
};

/// Application state.
/// Shared services are Arc-wrapped; the bulk import service owns its
/// worker tasks and is consumed by `shutdown`.
pub struct AppState {
    pub config: AppConfig,
    pub pool: Arc<ConnectionPool>,
    pub event_bus: Arc<EventBus>,
    pub vehicle_service: Arc<VehicleService>,
    pub inquiry_service: Arc<InquiryService>,
    pub bulk_import: BulkImportService,
    pub field_importer: FieldImporter,
    pub maintenance_extractor: MaintenanceExtractor,
}

impl AppState {
    /// Open (and migrate) the configured database, then wire everything.
    /// Must be called from inside a tokio runtime.
    pub fn initialize(config: AppConfig) -> AppResult<Self> {
        let db_path = config.resolved_database_path()?;
        log::info!("Using database {}", db_path.display());

        let pool = db::create_connection_pool(&db_path)?;
        {
            let conn = db::get_connection(&pool)?;
            db::initialize_database(&conn)?;
        }

        Self::with_pool(config, Arc::new(pool))
    }

    /// Wire everything over an already-migrated pool
    pub fn with_pool(config: AppConfig, pool: Arc<ConnectionPool>) -> AppResult<Self> {
        let storage = build_storage(&config.storage)?;
        Ok(Self::with_storage(config, pool, storage))
    }

    pub fn with_storage(
        config: AppConfig,
        pool: Arc<ConnectionPool>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new());
        register_import_logging(&event_bus);

        let vehicle_repo: Arc<dyn VehicleRepository> =
            Arc::new(SqliteVehicleRepository::new(Arc::clone(&pool)));
        let inquiry_repo: Arc<dyn InquiryRepository> =
            Arc::new(SqliteInquiryRepository::new(Arc::clone(&pool)));

        let vehicle_service = Arc::new(VehicleService::new(
            Arc::clone(&vehicle_repo),
            Arc::clone(&inquiry_repo),
            Arc::clone(&event_bus),
        ));
        let inquiry_service = Arc::new(InquiryService::new(
            inquiry_repo,
            Arc::clone(&vehicle_repo),
            Arc::clone(&event_bus),
        ));
        let bulk_import = BulkImportService::new(
            Arc::new(VehicleRecordStore::new(vehicle_repo)),
            storage,
            Arc::clone(&event_bus),
            &config.import,
        );

        Self {
            config,
            pool,
            event_bus,
            vehicle_service,
            inquiry_service,
            bulk_import,
            field_importer: FieldImporter::default(),
            maintenance_extractor: MaintenanceExtractor::default(),
        }
    }

    /// Let queued imports finish, then stop the workers
    pub async fn shutdown(self) -> AppResult<()> {
        self.bulk_import.shutdown().await
    }
}

fn build_storage(config: &StorageConfig) -> AppResult<Arc<dyn FileStorage>> {
    Ok(match config {
        StorageConfig::Local {
            root,
            public_base_url,
        } => {
            log::info!("Storing uploads under {}", root.display());
            Arc::new(LocalFileStorage::new(root.clone(), public_base_url.clone()))
        }
        StorageConfig::Http { base_url, api_key } => {
            log::info!("Storing uploads at {}", base_url);
            Arc::new(HttpObjectStorage::new(base_url.clone(), api_key.clone())?)
        }
    })
}

/// Per-candidate trace lines and a batch summary at info level
fn register_import_logging(bus: &EventBus) {
    bus.subscribe::<CandidateReconciled, _>(|event| {
        log::debug!(
            "[{}] {} {} -> {}",
            event.batch_id,
            event.kind,
            event.source_identifier,
            event.status
        );
    });
    bus.subscribe::<ReconciliationBatchCompleted, _>(|event| {
        log::info!(
            "{} import finished: {}/{} matched in {} ms",
            event.kind,
            event.matched,
            event.total,
            event.duration_ms
        );
    });
}
