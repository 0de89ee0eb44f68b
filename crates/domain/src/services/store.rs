//! Abstractions over the hosted backend.
//!
//! The document store, blob store and function gateway are external
//! services. Implementations live in the persistence crate; in-memory mocks
//! live in [`super::mock`].

use serde_json::Value;
use thiserror::Error;

use crate::models::ListQuery;

/// Errors raised at the backend boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// One page of raw documents plus the size of the full filtered set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Value>,
}

/// Schemaless document collections.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<DocumentList, StoreError>;

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value, StoreError>;

    /// Creates a document; the store assigns the id.
    async fn create_document(&self, collection: &str, data: Value) -> Result<Value, StoreError>;

    /// Writes the given attributes onto an existing document.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// A file persisted in the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub id: String,
    pub view_url: String,
}

/// File storage with generated ids.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_file(
        &self,
        bucket: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StoreError>;

    async fn delete_file(&self, bucket: &str, file_id: &str) -> Result<(), StoreError>;
}

/// Raw reply of a synchronous function execution.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// Whether the gateway answered with a success status.
    pub ok: bool,
    /// The decoded reply, or `Value::Null` if it was not JSON.
    pub payload: Value,
}

/// Synchronous serverless function invocation.
#[async_trait::async_trait]
pub trait FunctionGateway: Send + Sync {
    async fn execute(&self, function_id: &str, body: Value) -> Result<GatewayResponse, StoreError>;
}
