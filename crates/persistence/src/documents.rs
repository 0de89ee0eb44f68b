//! Document store backed by the backend's databases API.

use async_trait::async_trait;
use domain::models::ListQuery;
use domain::services::{DocumentList, DocumentStore, StoreError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::BackendClient;
use crate::query::query_pairs;

/// Id placeholder asking the backend to generate a document id.
pub const UNIQUE_ID: &str = "unique()";

#[derive(Debug, Deserialize)]
struct DocumentListResponse {
    total: u64,
    #[serde(default)]
    documents: Vec<Value>,
}

/// Remote document collections of one database.
#[derive(Debug, Clone)]
pub struct RemoteDocumentStore {
    client: BackendClient,
}

impl RemoteDocumentStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentStore for RemoteDocumentStore {
    async fn list_documents(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<DocumentList, StoreError> {
        let url = self.client.documents_url(collection, None)?;
        let request = self.client.http().get(url).query(&query_pairs(query));

        let body = self.client.send(request, "list_documents").await?;
        let list: DocumentListResponse = serde_json::from_value(body)
            .map_err(|e| StoreError::InvalidResponse(format!("document list: {}", e)))?;

        tracing::debug!(
            collection = %collection,
            total = list.total,
            returned = list.documents.len(),
            "Listed documents"
        );

        Ok(DocumentList {
            total: list.total,
            documents: list.documents,
        })
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        let url = self.client.documents_url(collection, Some(id))?;
        let body = self
            .client
            .send(self.client.http().get(url), "get_document")
            .await?;
        expect_object(body)
    }

    async fn create_document(&self, collection: &str, data: Value) -> Result<Value, StoreError> {
        let url = self.client.documents_url(collection, None)?;
        let request = self
            .client
            .http()
            .post(url)
            .json(&json!({ "documentId": UNIQUE_ID, "data": data }));

        let body = self.client.send(request, "create_document").await?;
        tracing::info!(collection = %collection, document_id = ?body.get("$id"), "Document created");
        expect_object(body)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        let url = self.client.documents_url(collection, Some(id))?;
        let request = self.client.http().patch(url).json(&json!({ "data": data }));

        let body = self.client.send(request, "update_document").await?;
        expect_object(body)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.client.documents_url(collection, Some(id))?;
        self.client
            .send(self.client.http().delete(url), "delete_document")
            .await?;
        Ok(())
    }
}

fn expect_object(body: Value) -> Result<Value, StoreError> {
    if body.is_object() {
        Ok(body)
    } else {
        Err(StoreError::InvalidResponse(format!(
            "expected a document, got {}",
            body
        )))
    }
}
