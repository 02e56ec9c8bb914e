// src/domain/import/summary.rs
//
// Status reporter: pure aggregation over the current per-candidate rows.
// Recomputed from scratch on every snapshot, never persisted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::value_objects::{CandidateProgress, OutcomeStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub matched: usize,
    pub not_found: usize,
    pub invalid: usize,
    pub failed: usize,

    /// Terminal rows as a whole-number percentage of all rows
    pub percent_complete: u8,

    /// Filenames of every non-matched terminal row, in input order
    pub unresolved: Vec<String>,

    /// Storage paths uploaded without a referencing record
    pub orphaned_paths: Vec<String>,

    /// Storage paths written by more than one row of the batch; the
    /// object holds the last upload
    pub shared_paths: Vec<String>,
}

impl ImportSummary {
    pub fn from_progress(items: &[CandidateProgress]) -> Self {
        let mut summary = ImportSummary {
            total: items.len(),
            ..Default::default()
        };

        let mut writes: HashMap<&str, usize> = HashMap::new();

        for item in items {
            if let Some(path) = &item.stored_path {
                let count = writes.entry(path.as_str()).or_default();
                *count += 1;
                if *count == 2 {
                    summary.shared_paths.push(path.clone());
                }
            }

            match item.status {
                OutcomeStatus::Pending => summary.pending += 1,
                OutcomeStatus::InProgress => summary.in_progress += 1,
                OutcomeStatus::Matched => summary.matched += 1,
                OutcomeStatus::NotFound => summary.not_found += 1,
                OutcomeStatus::Invalid => summary.invalid += 1,
                OutcomeStatus::Failed => summary.failed += 1,
            }

            if item.is_unresolved() {
                summary.unresolved.push(item.source_identifier.clone());
            }
            if let Some(path) = &item.orphaned_path {
                summary.orphaned_paths.push(path.clone());
            }
        }

        summary.percent_complete = if summary.total == 0 {
            100
        } else {
            (summary.terminal() * 100 / summary.total) as u8
        };

        summary
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        match status {
            OutcomeStatus::Pending => self.pending,
            OutcomeStatus::InProgress => self.in_progress,
            OutcomeStatus::Matched => self.matched,
            OutcomeStatus::NotFound => self.not_found,
            OutcomeStatus::Invalid => self.invalid,
            OutcomeStatus::Failed => self.failed,
        }
    }

    pub fn terminal(&self) -> usize {
        self.matched + self.not_found + self.invalid + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.terminal() == self.total
    }

    /// Every row terminal and nothing needs follow-up; an empty batch
    /// never auto-closes.
    pub fn should_auto_close(&self) -> bool {
        self.total > 0 && self.is_complete() && self.unresolved.is_empty()
    }
}
