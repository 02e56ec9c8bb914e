// src/domain/import/mod.rs
//
// Bulk Import Domain
//
// Value objects for reconciling uploaded files with existing vehicles.
//
// RULES:
// - Pure value objects, no I/O
// - No event emission (that's the service's job)
// - Summaries are derived, never stored

pub mod summary;
pub mod value_objects;

pub use summary::ImportSummary;
pub use value_objects::{
    extension_of, normalize_extension, CandidateProgress, FieldUpdate, ImportCandidate,
    ImportKind, OutcomeStatus, TargetRecord,
};
