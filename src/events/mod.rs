// src/events/mod.rs
//
// Internal Event System - Public API
//
// CRITICAL: EventHandler is INTERNAL and must NOT be exported

pub mod bus;
pub mod import_events;
pub mod types;

// ============================================================================
// PUBLIC EXPORTS - Event Types and Bus Only
// ============================================================================

pub use types::DomainEvent;

pub use types::{InquirySubmitted, VehicleCreated, VehicleUpdated};

pub use import_events::{CandidateReconciled, ReconciliationBatchCompleted};

pub use bus::{EventBus, EventLogEntry};

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
