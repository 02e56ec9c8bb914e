// src/domain/import/value_objects.rs
//
// Bulk Import Value Objects
//
// Pure data describing one reconciliation batch: what came in, what it was
// matched against, and where each item ended up.
//
// INVARIANTS:
// - ImportCandidate is immutable after construction
// - OutcomeStatus only ever moves forward
// - Terminal states never transition again

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};

// ============================================================================
// IMPORT KIND
// ============================================================================

/// What a bulk import attaches to the matched vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// Vehicle photos, appended to the photo URL list
    Photo,

    /// Appraisal report documents, replacing the report URL
    Report,
}

impl ImportKind {
    /// File stem used for the canonical storage path
    pub fn canonical_stem(&self) -> &'static str {
        match self {
            ImportKind::Photo => "photo",
            ImportKind::Report => "dekra-report",
        }
    }

    /// Storage location derived from the business identifier only.
    /// The original filename never leaks into the path, so re-importing the
    /// same identifier overwrites the same object.
    pub fn canonical_path(&self, business_key: &str, extension: &str) -> String {
        format!(
            "{}/{}.{}",
            business_key,
            self.canonical_stem(),
            normalize_extension(extension)
        )
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportKind::Photo => write!(f, "photo"),
            ImportKind::Report => write!(f, "report"),
        }
    }
}

/// Lower-case an extension and fold common aliases
pub fn normalize_extension(extension: &str) -> String {
    let lower = extension.trim_start_matches('.').to_ascii_lowercase();
    match lower.as_str() {
        "jpeg" => "jpg".to_string(),
        _ => lower,
    }
}

/// Extension of a raw filename, lower-cased, without the dot
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

// ============================================================================
// IMPORT CANDIDATE
// ============================================================================

/// One unit of bulk-import input, created when the operator drops files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    source_identifier: String,
    extracted_key: Option<String>,
    payload: Vec<u8>,
}

impl ImportCandidate {
    pub fn new(source_identifier: String, extracted_key: Option<String>, payload: Vec<u8>) -> Self {
        Self {
            source_identifier,
            extracted_key,
            payload,
        }
    }

    /// Raw filename as supplied by the operator
    pub fn source_identifier(&self) -> &str {
        &self.source_identifier
    }

    pub fn extracted_key(&self) -> Option<&str> {
        self.extracted_key.as_deref()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.source_identifier)
    }
}

// ============================================================================
// TARGET RECORD
// ============================================================================

/// Read view of the backend row a candidate is matched against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub id: Uuid,
    pub business_key: String,

    /// Human-readable label (brand + model)
    pub label: String,

    pub photo_urls: Vec<String>,
    pub report_url: Option<String>,
}

/// The single-field write performed for a matched candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    PhotoUrls(Vec<String>),
    ReportUrl(String),
}

impl FieldUpdate {
    /// Build the update for `kind`, merging `url` into the record's current value
    pub fn for_kind(kind: ImportKind, record: &TargetRecord, url: String) -> Self {
        match kind {
            ImportKind::Photo => {
                let mut urls = record.photo_urls.clone();
                if !urls.contains(&url) {
                    urls.push(url);
                }
                FieldUpdate::PhotoUrls(urls)
            }
            ImportKind::Report => FieldUpdate::ReportUrl(url),
        }
    }
}

// ============================================================================
// OUTCOME STATUS
// ============================================================================

/// Lifecycle of one candidate inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Pending,
    InProgress,
    Matched,
    NotFound,
    Invalid,
    Failed,
}

impl OutcomeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OutcomeStatus::Matched
                | OutcomeStatus::NotFound
                | OutcomeStatus::Invalid
                | OutcomeStatus::Failed
        )
    }

    fn rank(&self) -> u8 {
        match self {
            OutcomeStatus::Pending => 0,
            OutcomeStatus::InProgress => 1,
            _ => 2,
        }
    }

    /// Forward-only: no transition out of a terminal state, none backwards
    pub fn can_transition_to(&self, next: OutcomeStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Pending => write!(f, "pending"),
            OutcomeStatus::InProgress => write!(f, "in_progress"),
            OutcomeStatus::Matched => write!(f, "matched"),
            OutcomeStatus::NotFound => write!(f, "not_found"),
            OutcomeStatus::Invalid => write!(f, "invalid"),
            OutcomeStatus::Failed => write!(f, "failed"),
        }
    }
}

// ============================================================================
// CANDIDATE PROGRESS
// ============================================================================

/// Per-candidate status row shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProgress {
    pub source_identifier: String,
    pub extracted_key: Option<String>,
    pub status: OutcomeStatus,

    /// Optional message rendered next to the status icon
    pub message: Option<String>,

    /// Label of the matched record (Matched only)
    pub matched_label: Option<String>,

    /// Canonical storage path written for this candidate
    pub stored_path: Option<String>,

    /// Uploaded object no record references (upload ok, update failed)
    pub orphaned_path: Option<String>,
}

impl CandidateProgress {
    pub fn pending(candidate: &ImportCandidate) -> Self {
        Self {
            source_identifier: candidate.source_identifier().to_string(),
            extracted_key: candidate.extracted_key().map(str::to_string),
            status: OutcomeStatus::Pending,
            message: None,
            matched_label: None,
            stored_path: None,
            orphaned_path: None,
        }
    }

    pub fn transition(&mut self, next: OutcomeStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition(format!(
                "{}: {} -> {}",
                self.source_identifier, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Terminal but not matched: needs manual follow-up
    pub fn is_unresolved(&self) -> bool {
        self.status.is_terminal() && self.status != OutcomeStatus::Matched
    }
}
