// src/integrations/object_storage/client.rs
//
// Hosted object storage over HTTP
//
// ARCHITECTURE:
// - Speaks the `/storage/v1/object` REST dialect (bucket + path addressing)
// - Upload:  POST {base}/storage/v1/object/{bucket}/{path}
// - Public:  {base}/storage/v1/object/public/{bucket}/{path}
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Non-2xx responses become AppError::Storage carrying the response body
// - The API key is sent both as bearer token and `apikey` header

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{validate_object_path, FileStorage, StoredObject};

pub struct HttpObjectStorage {
    base_url: String,
    api_key: String,
    http_client: Client,
}

impl HttpObjectStorage {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> AppResult<Self> {
        let http_client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http_client,
        })
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    fn content_type(path: &str) -> &'static str {
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "pdf" => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

#[async_trait]
impl FileStorage for HttpObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        payload: &[u8],
        upsert: bool,
    ) -> AppResult<StoredObject> {
        validate_object_path(bucket)?;
        validate_object_path(path)?;

        let response = self
            .http_client
            .post(self.object_url(bucket, path))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("apikey", &self.api_key)
            .header(header::CONTENT_TYPE, Self::content_type(path))
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(payload.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Upload of {}/{} failed with status {}: {}",
                bucket,
                path,
                status,
                body.trim()
            )));
        }

        log::debug!("Uploaded {} bytes to {}/{}", payload.len(), bucket, path);

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: self.public_url(bucket, path),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let storage = HttpObjectStorage::new("https://project.example.co/", "key").unwrap();

        assert_eq!(
            storage.object_url("vehicle-photos", "0993/photo.jpg"),
            "https://project.example.co/storage/v1/object/vehicle-photos/0993/photo.jpg"
        );
        assert_eq!(
            storage.public_url("vehicle-photos", "0993/photo.jpg"),
            "https://project.example.co/storage/v1/object/public/vehicle-photos/0993/photo.jpg"
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(HttpObjectStorage::content_type("0993/photo.jpg"), "image/jpeg");
        assert_eq!(HttpObjectStorage::content_type("2704/dekra-report.pdf"), "application/pdf");
        assert_eq!(HttpObjectStorage::content_type("x/blob"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_invalid_path_rejected_before_request() {
        let storage = HttpObjectStorage::new("http://127.0.0.1:9", "key").unwrap();
        let result = storage.upload("b", "../x.jpg", b"x", true).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
