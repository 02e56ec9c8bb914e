// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod import;
pub mod inquiry;
pub mod session;
pub mod vehicle;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Vehicle Domain
pub use vehicle::{
    validate_report_number, validate_vehicle, MaintenanceReading, UnrecognizedField, Vehicle,
    VehicleField, VehicleFieldImport,
};

// Inquiry Domain
pub use inquiry::{validate_inquiry, Inquiry};

// Bulk Import Domain
pub use import::{
    CandidateProgress, FieldUpdate, ImportCandidate, ImportKind, ImportSummary, OutcomeStatus,
    TargetRecord,
};

// Storefront Session
pub use session::SessionContext;

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
