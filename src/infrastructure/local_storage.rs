// src/infrastructure/local_storage.rs
//
// Directory-backed FileStorage
//
// Layout: {root}/{bucket}/{path}. Public URLs are
// {public_base_url}/{bucket}/{path}, for whatever static file server
// fronts the root.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::infrastructure::storage::{validate_object_path, FileStorage, StoredObject};

pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, path: &str) -> AppResult<PathBuf> {
        validate_object_path(bucket)?;
        validate_object_path(path)?;
        Ok(self.root.join(bucket).join(path))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        payload: &[u8],
        upsert: bool,
    ) -> AppResult<StoredObject> {
        let target = self.object_path(bucket, path)?;

        if !upsert && tokio::fs::try_exists(&target).await? {
            return Err(AppError::Storage(format!(
                "Object {}/{} already exists",
                bucket, path
            )));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, payload).await?;

        log::debug!("Stored {} bytes at {}", payload.len(), target.display());

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: self.public_url(bucket, path),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_under_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://cdn.local/");

        let stored = storage
            .upload("vehicle-photos", "0993/photo.jpg", b"jpeg", true)
            .await
            .unwrap();

        assert_eq!(stored.public_url, "http://cdn.local/vehicle-photos/0993/photo.jpg");
        let on_disk = std::fs::read(dir.path().join("vehicle-photos/0993/photo.jpg")).unwrap();
        assert_eq!(on_disk, b"jpeg");
    }

    #[tokio::test]
    async fn test_upsert_controls_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://cdn.local");

        storage.upload("b", "1/photo.jpg", b"one", false).await.unwrap();

        let refused = storage.upload("b", "1/photo.jpg", b"two", false).await;
        assert!(matches!(refused, Err(AppError::Storage(_))));

        storage.upload("b", "1/photo.jpg", b"three", true).await.unwrap();
        let on_disk = std::fs::read(dir.path().join("b/1/photo.jpg")).unwrap();
        assert_eq!(on_disk, b"three");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().join("root"), "http://cdn.local");

        let result = storage.upload("b", "../../escape.jpg", b"x", true).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert!(!dir.path().join("escape.jpg").exists());
    }
}
