// src/services/inquiry_service.rs
use crate::domain::inquiry::{validate_inquiry, Inquiry};
use crate::domain::DomainError;
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, InquirySubmitted};
use crate::repositories::{InquiryRepository, VehicleRepository};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SubmitInquiryRequest {
    pub lead_id: Uuid,
    pub name: String,
    pub email: String,
    pub message: Option<String>,
    pub vehicle_ids: Vec<Uuid>,
}

pub struct InquiryService {
    inquiry_repo: Arc<dyn InquiryRepository>,
    vehicle_repo: Arc<dyn VehicleRepository>,
    event_bus: Arc<EventBus>,
}

impl InquiryService {
    pub fn new(
        inquiry_repo: Arc<dyn InquiryRepository>,
        vehicle_repo: Arc<dyn VehicleRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            inquiry_repo,
            vehicle_repo,
            event_bus,
        }
    }

    pub fn submit_inquiry(&self, request: SubmitInquiryRequest) -> AppResult<Uuid> {
        let inquiry = Inquiry::new(
            request.lead_id,
            request.name.trim().to_string(),
            request.email.trim().to_string(),
            request
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            request.vehicle_ids,
        );

        validate_inquiry(&inquiry).map_err(AppError::Domain)?;

        for vehicle_id in &inquiry.vehicle_ids {
            if self.vehicle_repo.get_by_id(*vehicle_id)?.is_none() {
                return Err(AppError::Domain(DomainError::NotFound(format!(
                    "Vehicle {}",
                    vehicle_id
                ))));
            }
        }

        self.inquiry_repo.save(&inquiry)?;

        log::info!(
            "Inquiry {} from lead {} for {} vehicle(s)",
            inquiry.id,
            inquiry.lead_id,
            inquiry.vehicle_ids.len()
        );
        self.event_bus.emit(InquirySubmitted::new(
            inquiry.id,
            inquiry.lead_id,
            inquiry.vehicle_ids.clone(),
        ));

        Ok(inquiry.id)
    }

    pub fn list_by_lead(&self, lead_id: Uuid) -> AppResult<Vec<Inquiry>> {
        self.inquiry_repo.list_by_lead(lead_id)
    }

    pub fn reserved_vehicle_ids(&self, lead_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.inquiry_repo.reserved_vehicle_ids(lead_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, get_connection, initialize_database};
    use crate::domain::Vehicle;
    use crate::repositories::{SqliteInquiryRepository, SqliteVehicleRepository};

    fn setup() -> (InquiryService, Arc<SqliteVehicleRepository>, Arc<EventBus>) {
        let pool = Arc::new(create_memory_pool().unwrap());
        {
            let conn = get_connection(&pool).unwrap();
            initialize_database(&conn).unwrap();
        }
        let vehicles = Arc::new(SqliteVehicleRepository::new(pool.clone()));
        let bus = Arc::new(EventBus::new());
        let service = InquiryService::new(
            Arc::new(SqliteInquiryRepository::new(pool)),
            vehicles.clone(),
            bus.clone(),
        );
        (service, vehicles, bus)
    }

    fn request(lead_id: Uuid, vehicle_ids: Vec<Uuid>) -> SubmitInquiryRequest {
        SubmitInquiryRequest {
            lead_id,
            name: "Erika Mustermann".to_string(),
            email: "erika@example.de".to_string(),
            message: Some("  ".to_string()),
            vehicle_ids,
        }
    }

    #[test]
    fn test_submit_inquiry_reserves_vehicles() {
        let (service, vehicles, bus) = setup();
        let vehicle = Vehicle::new("0993".to_string(), "BMW".to_string(), "320d".to_string());
        vehicles.save(&vehicle).unwrap();

        let lead = Uuid::new_v4();
        let id = service.submit_inquiry(request(lead, vec![vehicle.id])).unwrap();

        assert_eq!(service.reserved_vehicle_ids(lead).unwrap(), vec![vehicle.id]);
        let stored = service.list_by_lead(lead).unwrap();
        assert_eq!(stored[0].id, id);
        assert!(stored[0].message.is_none());
        assert_eq!(bus.get_event_log()[0].event_type, "InquirySubmitted");
    }

    #[test]
    fn test_unknown_vehicle_rejected() {
        let (service, _, bus) = setup();
        let result = service.submit_inquiry(request(Uuid::new_v4(), vec![Uuid::new_v4()]));

        assert!(matches!(result, Err(AppError::Domain(DomainError::NotFound(_)))));
        assert!(bus.get_event_log().is_empty());
    }

    #[test]
    fn test_empty_selection_rejected() {
        let (service, _, _) = setup();
        let result = service.submit_inquiry(request(Uuid::new_v4(), vec![]));
        assert!(matches!(result, Err(AppError::Domain(_))));
    }
}
