//! Blob store backed by the backend's storage API.

use async_trait::async_trait;
use domain::services::{BlobStore, StoreError, StoredFile};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::client::BackendClient;
use crate::documents::UNIQUE_ID;

/// Permission granting anyone read access to an uploaded file.
pub const PUBLIC_READ: &str = r#"read("any")"#;

/// Remote file buckets.
#[derive(Debug, Clone)]
pub struct RemoteBlobStore {
    client: BackendClient,
}

impl RemoteBlobStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Public view URL of a stored file.
    pub fn view_url(&self, bucket: &str, file_id: &str) -> Result<String, StoreError> {
        let mut url = self
            .client
            .url(&["storage", "buckets", bucket, "files", file_id, "view"])?;
        url.query_pairs_mut()
            .append_pair("project", &self.client.config().project_id);
        Ok(url.to_string())
    }
}

#[async_trait]
impl BlobStore for RemoteBlobStore {
    async fn upload_file(
        &self,
        bucket: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StoreError> {
        let url = self.client.url(&["storage", "buckets", bucket, "files"])?;
        let size = bytes.len();
        let form = Form::new()
            .text("fileId", UNIQUE_ID)
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("permissions[]", PUBLIC_READ);

        let body = self
            .client
            .send(self.client.http().post(url).multipart(form), "upload_file")
            .await?;

        let id = body
            .get("$id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::InvalidResponse("uploaded file has no id".to_string()))?
            .to_string();

        tracing::info!(bucket = %bucket, file_id = %id, size, "File uploaded");

        Ok(StoredFile {
            view_url: self.view_url(bucket, &id)?,
            id,
        })
    }

    async fn delete_file(&self, bucket: &str, file_id: &str) -> Result<(), StoreError> {
        let url = self
            .client
            .url(&["storage", "buckets", bucket, "files", file_id])?;
        self.client
            .send(self.client.http().delete(url), "delete_file")
            .await?;
        Ok(())
    }
}
