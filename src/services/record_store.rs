// src/services/record_store.rs
//
// Record store port
//
// The reconciliation processor only needs two things from the backend:
// find a record by its business key, and write one field on it.
// `VehicleRecordStore` adapts the synchronous SQLite repository.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{FieldUpdate, TargetRecord, Vehicle};
use crate::error::{AppError, AppResult};
use crate::repositories::VehicleRepository;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Exact match on the business key; leading zeros are significant
    async fn find_by_key(&self, key: &str) -> AppResult<Option<TargetRecord>>;

    async fn update_field(&self, record_id: Uuid, update: FieldUpdate) -> AppResult<()>;
}

pub struct VehicleRecordStore {
    vehicles: Arc<dyn VehicleRepository>,
}

impl VehicleRecordStore {
    pub fn new(vehicles: Arc<dyn VehicleRepository>) -> Self {
        Self { vehicles }
    }

    fn to_record(vehicle: Vehicle) -> TargetRecord {
        TargetRecord {
            id: vehicle.id,
            label: vehicle.display_label(),
            business_key: vehicle.report_number,
            photo_urls: vehicle.photo_urls,
            report_url: vehicle.report_url,
        }
    }
}

#[async_trait]
impl RecordStore for VehicleRecordStore {
    async fn find_by_key(&self, key: &str) -> AppResult<Option<TargetRecord>> {
        let vehicles = Arc::clone(&self.vehicles);
        let key = key.to_string();

        let vehicle = tokio::task::spawn_blocking(move || vehicles.get_by_report_number(&key)).await??;
        Ok(vehicle.map(Self::to_record))
    }

    async fn update_field(&self, record_id: Uuid, update: FieldUpdate) -> AppResult<()> {
        let vehicles = Arc::clone(&self.vehicles);

        tokio::task::spawn_blocking(move || match update {
            FieldUpdate::PhotoUrls(urls) => vehicles.update_photo_urls(record_id, &urls),
            FieldUpdate::ReportUrl(url) => vehicles.update_report_url(record_id, &url),
        })
        .await
        .map_err(AppError::from)?
    }
}
