// src/infrastructure/storage.rs
//
// File storage port
//
// Buckets hold objects addressed by a relative path. The reconciliation
// processor only ever writes canonical `{key}/{stem}.{ext}` paths.
//
// RULES:
// - `public_url` is pure string building, no I/O
// - `upload` with `upsert = false` must refuse to overwrite

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Where an uploaded object ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub public_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `payload` at `bucket/path`
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        payload: &[u8],
        upsert: bool,
    ) -> AppResult<StoredObject>;

    /// Publicly reachable URL of `bucket/path`
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Reject absolute paths, empty segments and `..` before touching a backend
pub fn validate_object_path(path: &str) -> AppResult<()> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(AppError::Storage(format!("Invalid object path '{}'", path)));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(AppError::Storage(format!("Invalid object path '{}'", path)));
    }
    Ok(())
}
