// src/services/reconciliation_service.rs
//
// Sequential Reconciliation Processor
//
// Takes accepted candidates and, one at a time in input order, looks up the
// vehicle by report number, uploads the file under its canonical path and
// writes the resulting URL onto the vehicle.
//
// CRITICAL RULES:
// - Exactly one candidate is in flight at any time
// - A candidate's failure never aborts the batch
// - Status only moves forward: Pending → InProgress → terminal
// - Snapshots are whole-vector replacements, never in-place patches
// - The record update is only attempted after a successful upload
// - No retries

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::ImportConfig;
use crate::domain::{
    CandidateProgress, FieldUpdate, ImportCandidate, ImportKind, ImportSummary, OutcomeStatus,
};
use crate::events::{CandidateReconciled, EventBus, ReconciliationBatchCompleted};
use crate::infrastructure::FileStorage;
use crate::services::record_store::RecordStore;

// Row messages stay generic; backend detail goes to the log only.
pub const LOOKUP_FAILED: &str = "Vehicle lookup failed";
pub const UPLOAD_FAILED: &str = "Upload failed";
pub const UPDATE_FAILED: &str = "Vehicle update failed";

/// Final result of one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: Uuid,
    pub kind: ImportKind,

    /// One row per accepted candidate, in input order
    pub candidates: Vec<CandidateProgress>,
    pub summary: ImportSummary,

    /// Inputs dropped by the candidate filter before reconciliation
    pub rejected: usize,
    pub duration_ms: u64,
}

/// Terminal result of one candidate, before it is written to its row
struct Resolution {
    status: OutcomeStatus,
    message: Option<String>,
    matched_label: Option<String>,
    stored_path: Option<String>,
    orphaned_path: Option<String>,
}

impl Resolution {
    fn terminal(status: OutcomeStatus, message: String) -> Self {
        Self {
            status,
            message: Some(message),
            matched_label: None,
            stored_path: None,
            orphaned_path: None,
        }
    }
}

pub struct ReconciliationService {
    kind: ImportKind,
    bucket: String,
    store: Arc<dyn RecordStore>,
    storage: Arc<dyn FileStorage>,
    event_bus: Arc<EventBus>,
    snapshots: watch::Sender<Vec<CandidateProgress>>,
}

impl ReconciliationService {
    pub fn new(
        kind: ImportKind,
        store: Arc<dyn RecordStore>,
        storage: Arc<dyn FileStorage>,
        event_bus: Arc<EventBus>,
        config: &ImportConfig,
    ) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());

        Self {
            kind,
            bucket: config.bucket(kind).to_string(),
            store,
            storage,
            event_bus,
            snapshots,
        }
    }

    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    /// Live per-candidate rows of the batch currently (or last) processed
    pub fn subscribe(&self) -> watch::Receiver<Vec<CandidateProgress>> {
        self.snapshots.subscribe()
    }

    /// Process every candidate in order. Never fails as a whole: each
    /// candidate's problem is recorded on its own row.
    pub async fn run(&self, candidates: Vec<ImportCandidate>) -> ImportReport {
        let batch_id = Uuid::new_v4();
        let started = Instant::now();

        log::info!(
            "Reconciling {} {} candidate(s) (batch {})",
            candidates.len(),
            self.kind,
            batch_id
        );

        let mut rows: Vec<CandidateProgress> =
            candidates.iter().map(CandidateProgress::pending).collect();
        self.publish(&rows);

        for (idx, candidate) in candidates.iter().enumerate() {
            Self::advance(&mut rows[idx], OutcomeStatus::InProgress);
            self.publish(&rows);

            let resolution = self.reconcile(candidate).await;

            let row = &mut rows[idx];
            Self::advance(row, resolution.status);
            row.message = resolution.message;
            row.matched_label = resolution.matched_label;
            row.stored_path = resolution.stored_path;
            row.orphaned_path = resolution.orphaned_path;

            log::info!(
                "{} -> {}{}",
                row.source_identifier,
                row.status,
                row.message
                    .as_deref()
                    .map(|m| format!(" ({})", m))
                    .unwrap_or_default()
            );

            self.event_bus.emit(CandidateReconciled::new(
                batch_id,
                self.kind,
                row.source_identifier.clone(),
                row.extracted_key.clone(),
                row.status,
                row.stored_path.clone(),
            ));
            self.publish(&rows);
        }

        let summary = ImportSummary::from_progress(&rows);
        let duration_ms = started.elapsed().as_millis() as u64;

        log::info!(
            "Batch {} done in {} ms: {} matched, {} not found, {} invalid, {} failed",
            batch_id,
            duration_ms,
            summary.matched,
            summary.not_found,
            summary.invalid,
            summary.failed
        );
        if !summary.orphaned_paths.is_empty() {
            log::warn!(
                "Uploaded without a referencing vehicle: {}",
                summary.orphaned_paths.join(", ")
            );
        }

        if !summary.shared_paths.is_empty() {
            log::warn!(
                "Several files of batch {} were stored under the same path: {}",
                batch_id,
                summary.shared_paths.join(", ")
            );
        }

        self.event_bus.emit(ReconciliationBatchCompleted::new(
            batch_id,
            self.kind,
            &summary,
            duration_ms,
        ));

        ImportReport {
            batch_id,
            kind: self.kind,
            candidates: rows,
            summary,
            rejected: 0,
            duration_ms,
        }
    }

    async fn reconcile(&self, candidate: &ImportCandidate) -> Resolution {
        let Some(key) = candidate.extracted_key() else {
            return Resolution::terminal(
                OutcomeStatus::Invalid,
                "No report number in file name".to_string(),
            );
        };
        let Some(extension) = candidate.extension() else {
            return Resolution::terminal(OutcomeStatus::Invalid, "No file extension".to_string());
        };

        let record = match self.store.find_by_key(key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Resolution::terminal(
                    OutcomeStatus::NotFound,
                    format!("No vehicle with report number {}", key),
                )
            }
            Err(e) => {
                log::warn!("Lookup of {} failed: {}", key, e);
                return Resolution::terminal(OutcomeStatus::Failed, LOOKUP_FAILED.to_string());
            }
        };

        let path = self.kind.canonical_path(key, &extension);
        let stored = match self
            .storage
            .upload(&self.bucket, &path, candidate.payload(), true)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!(
                    "Upload of {} to {}/{} failed: {}",
                    candidate.source_identifier(),
                    self.bucket,
                    path,
                    e
                );
                return Resolution::terminal(OutcomeStatus::Failed, UPLOAD_FAILED.to_string());
            }
        };

        let update = FieldUpdate::for_kind(self.kind, &record, stored.public_url);
        if let Err(e) = self.store.update_field(record.id, update).await {
            log::warn!("Updating vehicle {} after upload of {} failed: {}", key, path, e);
            return Resolution {
                status: OutcomeStatus::Failed,
                message: Some(UPDATE_FAILED.to_string()),
                matched_label: None,
                stored_path: Some(path.clone()),
                orphaned_path: Some(path),
            };
        }

        Resolution {
            status: OutcomeStatus::Matched,
            message: None,
            matched_label: Some(record.label),
            stored_path: Some(path),
            orphaned_path: None,
        }
    }

    fn advance(row: &mut CandidateProgress, next: OutcomeStatus) {
        if let Err(e) = row.transition(next) {
            log::error!("{}", e);
        }
    }

    fn publish(&self, rows: &[CandidateProgress]) {
        self.snapshots.send_replace(rows.to_vec());
    }
}
