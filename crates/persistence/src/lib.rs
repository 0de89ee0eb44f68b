//! Persistence layer for the dorm admin backend.
//!
//! This crate contains:
//! - The REST client for the hosted backend
//! - Query encoding for the document store
//! - `DocumentStore`, `BlobStore` and `FunctionGateway` implementations

pub mod client;
pub mod documents;
pub mod functions;
pub mod metrics;
pub mod query;
pub mod storage;

pub use client::{create_client, BackendClient, BackendConfig, ClientError};
pub use documents::RemoteDocumentStore;
pub use functions::RemoteFunctionGateway;
pub use storage::RemoteBlobStore;
