// src/events/types.rs
//
// Domain events outside the bulk-import pipeline.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// VEHICLE EVENTS
// ============================================================================

/// Emitted when a vehicle record is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub vehicle_id: Uuid,
    pub report_number: String,
}

impl VehicleCreated {
    pub fn new(vehicle_id: Uuid, report_number: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            vehicle_id,
            report_number,
        }
    }
}

impl DomainEvent for VehicleCreated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "VehicleCreated" }
}

/// Emitted when pasted fields or a maintenance reading were written to a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleUpdated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub vehicle_id: Uuid,
    pub fields_changed: Vec<String>,
}

impl VehicleUpdated {
    pub fn new(vehicle_id: Uuid, fields_changed: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            vehicle_id,
            fields_changed,
        }
    }
}

impl DomainEvent for VehicleUpdated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "VehicleUpdated" }
}

// ============================================================================
// INQUIRY EVENTS
// ============================================================================

/// Emitted when a storefront visitor submits an inquiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquirySubmitted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub inquiry_id: Uuid,
    pub lead_id: Uuid,
    pub vehicle_ids: Vec<Uuid>,
}

impl InquirySubmitted {
    pub fn new(inquiry_id: Uuid, lead_id: Uuid, vehicle_ids: Vec<Uuid>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            inquiry_id,
            lead_id,
            vehicle_ids,
        }
    }
}

impl DomainEvent for InquirySubmitted {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "InquirySubmitted" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids_are_unique() {
        let vehicle_id = Uuid::new_v4();
        let a = VehicleCreated::new(vehicle_id, "0993".to_string());
        let b = VehicleCreated::new(vehicle_id, "0993".to_string());

        assert_ne!(a.event_id(), b.event_id());
        assert_eq!(a.event_type(), "VehicleCreated");
    }

    #[test]
    fn test_inquiry_event_serializes() {
        let event = InquirySubmitted::new(Uuid::new_v4(), Uuid::new_v4(), vec![Uuid::new_v4()]);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["vehicle_ids"].as_array().unwrap().len(), 1);
        assert_eq!(event.event_type(), "InquirySubmitted");
    }
}
