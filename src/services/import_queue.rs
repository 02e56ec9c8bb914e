// src/services/import_queue.rs
//
// Import Queue
//
// Serializes batches onto a single worker task. Batches run in submission
// order and each batch runs its candidates in input order, so at most one
// candidate is in flight per queue.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::ImportCandidate;
use crate::error::{AppError, AppResult};
use crate::services::reconciliation_service::{ImportReport, ReconciliationService};

/// Batches waiting behind the one being processed
const QUEUE_CAPACITY: usize = 16;

struct Job {
    candidates: Vec<ImportCandidate>,
    reply: oneshot::Sender<ImportReport>,
}

/// Handle to a submitted batch
pub struct ImportTicket {
    receiver: oneshot::Receiver<ImportReport>,
}

impl ImportTicket {
    /// Wait for the batch to finish
    pub async fn wait(self) -> AppResult<ImportReport> {
        self.receiver
            .await
            .map_err(|_| AppError::Other("Import worker stopped before the batch finished".to_string()))
    }
}

pub struct ImportQueue {
    sender: mpsc::Sender<Job>,
    worker: JoinHandle<()>,
}

impl ImportQueue {
    /// Start the worker. Must be called from inside a tokio runtime.
    pub fn spawn(service: Arc<ReconciliationService>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Job>(QUEUE_CAPACITY);

        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let report = service.run(job.candidates).await;
                if job.reply.send(report).is_err() {
                    log::debug!("Import ticket dropped before its batch finished");
                }
            }
            log::debug!("{} import worker stopped", service.kind());
        });

        Self { sender, worker }
    }

    pub async fn submit(&self, candidates: Vec<ImportCandidate>) -> AppResult<ImportTicket> {
        let (reply, receiver) = oneshot::channel();

        self.sender
            .send(Job { candidates, reply })
            .await
            .map_err(|_| AppError::Other("Import queue is closed".to_string()))?;

        Ok(ImportTicket { receiver })
    }

    /// Stop accepting batches, finish the queued ones, then stop the worker
    pub async fn shutdown(self) -> AppResult<()> {
        drop(self.sender);
        self.worker.await?;
        Ok(())
    }
}
