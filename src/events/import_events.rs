// src/events/import_events.rs
//
// Bulk Import Events
//
// Outputs of one reconciliation batch. One CandidateReconciled per candidate
// that reached a terminal status, then exactly one
// ReconciliationBatchCompleted.
//
// INVARIANTS:
// - Emitted in processing order
// - Only terminal statuses are reported
// - All events are serializable

use crate::domain::{ImportKind, ImportSummary, OutcomeStatus};
use crate::events::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CANDIDATE RECONCILED
// ============================================================================

/// Emitted when a single candidate reaches a terminal status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateReconciled {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub batch_id: Uuid,
    pub kind: ImportKind,

    /// Raw filename as dropped by the operator
    pub source_identifier: String,
    pub business_key: Option<String>,
    pub status: OutcomeStatus,

    /// Canonical storage path, when the upload succeeded
    pub stored_path: Option<String>,
}

impl CandidateReconciled {
    pub fn new(
        batch_id: Uuid,
        kind: ImportKind,
        source_identifier: String,
        business_key: Option<String>,
        status: OutcomeStatus,
        stored_path: Option<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            batch_id,
            kind,
            source_identifier,
            business_key,
            status,
            stored_path,
        }
    }
}

impl DomainEvent for CandidateReconciled {
    fn event_id(&self) -> Uuid {
        self.event_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn event_type(&self) -> &'static str {
        "CandidateReconciled"
    }
}

// ============================================================================
// BATCH COMPLETED
// ============================================================================

/// Emitted once after every candidate in a batch is terminal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconciliationBatchCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub batch_id: Uuid,
    pub kind: ImportKind,
    pub total: usize,
    pub matched: usize,
    pub not_found: usize,
    pub invalid: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

impl ReconciliationBatchCompleted {
    pub fn new(batch_id: Uuid, kind: ImportKind, summary: &ImportSummary, duration_ms: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            batch_id,
            kind,
            total: summary.total,
            matched: summary.matched,
            not_found: summary.not_found,
            invalid: summary.invalid,
            failed: summary.failed,
            duration_ms,
        }
    }
}

impl DomainEvent for ReconciliationBatchCompleted {
    fn event_id(&self) -> Uuid {
        self.event_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn event_type(&self) -> &'static str {
        "ReconciliationBatchCompleted"
    }
}
