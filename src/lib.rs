// src/lib.rs
// vehiclesale - back office for selling vehicles out of insolvency estates
//
// Architecture:
// - Domain-centric: business rules live in domain/ (vehicles, inquiries, import)
// - Event-driven: services announce facts on a synchronous event bus
// - Explicit: no implicit behavior, no global session state
// - Bulk import: filter → sequential reconciliation → status report

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_inquiry,
    validate_report_number,
    validate_vehicle,
    // Import
    CandidateProgress,
    FieldUpdate,
    ImportCandidate,
    ImportKind,
    ImportSummary,
    // Inquiry
    Inquiry,
    // Vehicle
    MaintenanceReading,
    OutcomeStatus,
    SessionContext,
    TargetRecord,
    UnrecognizedField,
    Vehicle,
    VehicleField,
    VehicleFieldImport,
};

// ============================================================================
// PUBLIC API - Errors and Configuration
// ============================================================================

pub use config::{AppConfig, ImportConfig, StorageConfig};
pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus, CandidateReconciled, DomainEvent, EventBus, EventLogEntry,
    InquirySubmitted, ReconciliationBatchCompleted, VehicleCreated, VehicleUpdated,
};

// ============================================================================
// PUBLIC API - Database and Repositories
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

pub use repositories::{
    InquiryRepository, SqliteInquiryRepository, SqliteVehicleRepository, VehicleRepository,
};

// ============================================================================
// PUBLIC API - Storage
// ============================================================================

pub use infrastructure::{FileStorage, LocalFileStorage, StoredObject};
pub use integrations::HttpObjectStorage;

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    BulkImportService,
    CandidateFilter,
    CreateVehicleRequest,
    DirectoryScan,
    FieldImporter,
    FilterOutcome,
    IdentifierRules,
    ImportQueue,
    ImportReport,
    ImportTicket,
    InquiryService,
    MaintenanceExtractor,
    RawInput,
    ReconciliationService,
    RecordStore,
    StorefrontVehicle,
    SubmitInquiryRequest,
    VehicleRecordStore,
    VehicleService,
    scan_directory,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::AppState;
pub use application::dto;
