// src/services/mod.rs
//
// Service layer: orchestrates domain, repositories, storage and events.

pub mod bulk_import_service;
pub mod candidate_filter;
pub mod extraction_rules;
pub mod field_importer;
pub mod import_queue;
pub mod inquiry_service;
pub mod reconciliation_service;
pub mod record_store;
pub mod vehicle_service;

#[cfg(test)]
mod reconciliation_service_tests;

pub use bulk_import_service::BulkImportService;
pub use candidate_filter::{scan_directory, CandidateFilter, DirectoryScan, FilterOutcome, RawInput};
pub use extraction_rules::{normalize_integer, IdentifierRules, MaintenanceExtractor};
pub use field_importer::FieldImporter;
pub use import_queue::{ImportQueue, ImportTicket};
pub use inquiry_service::{InquiryService, SubmitInquiryRequest};
pub use reconciliation_service::{ImportReport, ReconciliationService};
pub use record_store::{RecordStore, VehicleRecordStore};
pub use vehicle_service::{CreateVehicleRequest, StorefrontVehicle, VehicleService};
