// src/services/vehicle_service.rs
use crate::domain::vehicle::{validate_vehicle, MaintenanceReading, Vehicle, VehicleFieldImport};
use crate::domain::{DomainError, SessionContext};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, VehicleCreated, VehicleUpdated};
use crate::repositories::{InquiryRepository, VehicleRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct CreateVehicleRequest {
    pub report_number: String,
    pub brand: String,
    pub model: String,
    pub first_registration: Option<String>,
    pub mileage_km: Option<u64>,
    pub vin: Option<String>,
    pub power_kw: Option<u32>,
    pub fuel: Option<String>,
    pub color: Option<String>,
}

/// A vehicle as listed on the storefront for one visitor session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontVehicle {
    pub vehicle: Vehicle,

    /// The session's lead already sent an inquiry for this vehicle
    pub reserved_by_session: bool,
}

pub struct VehicleService {
    vehicle_repo: Arc<dyn VehicleRepository>,
    inquiry_repo: Arc<dyn InquiryRepository>,
    event_bus: Arc<EventBus>,
}

impl VehicleService {
    pub fn new(
        vehicle_repo: Arc<dyn VehicleRepository>,
        inquiry_repo: Arc<dyn InquiryRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            vehicle_repo,
            inquiry_repo,
            event_bus,
        }
    }

    pub fn create_vehicle(&self, request: CreateVehicleRequest) -> AppResult<Uuid> {
        let mut vehicle = Vehicle::new(
            request.report_number.trim().to_string(),
            request.brand.trim().to_string(),
            request.model.trim().to_string(),
        );
        vehicle.first_registration = request.first_registration;
        vehicle.mileage_km = request.mileage_km;
        vehicle.vin = request.vin;
        vehicle.power_kw = request.power_kw;
        vehicle.fuel = request.fuel;
        vehicle.color = request.color;

        validate_vehicle(&vehicle).map_err(AppError::Domain)?;
        self.ensure_report_number_free(&vehicle.report_number, None)?;
        self.vehicle_repo.save(&vehicle)?;

        log::info!("Created vehicle {} ({})", vehicle.report_number, vehicle.display_label());
        self.event_bus
            .emit(VehicleCreated::new(vehicle.id, vehicle.report_number.clone()));

        Ok(vehicle.id)
    }

    pub fn get_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Vehicle>> {
        self.vehicle_repo.get_by_id(vehicle_id)
    }

    pub fn get_by_report_number(&self, report_number: &str) -> AppResult<Option<Vehicle>> {
        self.vehicle_repo.get_by_report_number(report_number.trim())
    }

    /// Write every recognized field of a pasted import onto the vehicle.
    /// Unrecognized lines are ignored here; the caller shows them.
    pub fn apply_field_import(
        &self,
        vehicle_id: Uuid,
        import: &VehicleFieldImport,
    ) -> AppResult<Vehicle> {
        let mut vehicle = self
            .vehicle_repo
            .get_by_id(vehicle_id)?
            .ok_or(AppError::NotFound)?;

        if import.fields.is_empty() {
            return Ok(vehicle);
        }

        vehicle.apply_fields(import);
        validate_vehicle(&vehicle).map_err(AppError::Domain)?;
        self.ensure_report_number_free(&vehicle.report_number, Some(vehicle.id))?;
        self.vehicle_repo.save(&vehicle)?;

        let mut changed: Vec<String> = Vec::new();
        for field in &import.fields {
            let name = field.name().to_string();
            if !changed.contains(&name) {
                changed.push(name);
            }
        }
        self.event_bus.emit(VehicleUpdated::new(vehicle.id, changed));

        Ok(vehicle)
    }

    /// Returns false when the identical reading was already recorded
    pub fn add_maintenance(&self, vehicle_id: Uuid, reading: MaintenanceReading) -> AppResult<bool> {
        let mut vehicle = self
            .vehicle_repo
            .get_by_id(vehicle_id)?
            .ok_or(AppError::NotFound)?;

        if !vehicle.add_maintenance(reading) {
            return Ok(false);
        }

        self.vehicle_repo.save(&vehicle)?;
        self.event_bus
            .emit(VehicleUpdated::new(vehicle.id, vec!["maintenance".to_string()]));
        Ok(true)
    }

    /// All vehicles, flagged with whether the session's lead already asked
    /// about them. Anonymous sessions see nothing reserved.
    pub fn list_storefront(&self, session: &SessionContext) -> AppResult<Vec<StorefrontVehicle>> {
        let reserved: HashSet<Uuid> = match session.lead_id {
            Some(lead_id) => self
                .inquiry_repo
                .reserved_vehicle_ids(lead_id)?
                .into_iter()
                .collect(),
            None => HashSet::new(),
        };

        Ok(self
            .vehicle_repo
            .list_all()?
            .into_iter()
            .map(|vehicle| StorefrontVehicle {
                reserved_by_session: reserved.contains(&vehicle.id),
                vehicle,
            })
            .collect())
    }

    fn ensure_report_number_free(&self, report_number: &str, own_id: Option<Uuid>) -> AppResult<()> {
        match self.vehicle_repo.get_by_report_number(report_number)? {
            Some(existing) if Some(existing.id) != own_id => Err(AppError::Domain(
                DomainError::InvariantViolation(format!(
                    "Report number {} is already used by another vehicle",
                    report_number
                )),
            )),
            _ => Ok(()),
        }
    }
}
