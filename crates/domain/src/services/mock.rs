//! In-memory backend implementations for development and testing.
//!
//! They evaluate queries locally and record every call, so tests can assert
//! that an operation did or did not reach the backend.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::store::{
    BlobStore, DocumentList, DocumentStore, FunctionGateway, GatewayResponse, StoreError,
    StoredFile,
};
use crate::models::{ListQuery, Predicate, SortDirection};

/// A call observed by [`MockDocumentStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List { collection: String, query: ListQuery },
    Get { collection: String, id: String },
    Create { collection: String, data: Value },
    Update { collection: String, id: String, data: Value },
    Delete { collection: String, id: String },
}

/// Document store backed by in-memory collections.
#[derive(Debug, Default)]
pub struct MockDocumentStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<StoreCall>>,
    failure: Mutex<Option<StoreError>>,
    next_id: Mutex<u64>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection. Documents must carry a `$id`.
    pub fn with_documents(self, collection: &str, documents: Vec<Value>) -> Self {
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        self
    }

    /// Makes every subsequent call fail with `error` (or succeed again with `None`).
    pub fn set_failure(&self, error: Option<StoreError>) {
        *lock(&self.failure) = error;
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Current contents of a collection.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        lock(&self.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        lock(&self.calls).push(call);
        match lock(&self.failure).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MockDocumentStore {
    async fn list_documents(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<DocumentList, StoreError> {
        self.record(StoreCall::List {
            collection: collection.to_string(),
            query: query.clone(),
        })?;

        let mut matching: Vec<Value> = self
            .documents(collection)
            .into_iter()
            .filter(|doc| query.predicates.iter().all(|p| matches_predicate(doc, p)))
            .collect();

        if let Some(sort) = &query.sort {
            matching.sort_by(|a, b| {
                let ordering = match (a.get(&sort.field), b.get(&sort.field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                };
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let total = matching.len() as u64;
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let documents = matching.into_iter().skip(offset).take(limit).collect();

        Ok(DocumentList { total, documents })
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        self.record(StoreCall::Get {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        self.documents(collection)
            .into_iter()
            .find(|doc| document_id(doc) == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("Document {} not found", id)))
    }

    async fn create_document(&self, collection: &str, data: Value) -> Result<Value, StoreError> {
        self.record(StoreCall::Create {
            collection: collection.to_string(),
            data: data.clone(),
        })?;

        let id = {
            let mut next = lock(&self.next_id);
            *next += 1;
            format!("doc-{}", *next)
        };

        let mut document = match data {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Backend {
                    status: 400,
                    message: format!("Document data must be an object, got {}", other),
                })
            }
        };
        document.insert("$id".to_string(), Value::String(id));
        let document = Value::Object(document);

        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        self.record(StoreCall::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            data: data.clone(),
        })?;

        let mut collections = lock(&self.collections);
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| document_id(doc) == Some(id)))
            .ok_or_else(|| StoreError::NotFound(format!("Document {} not found", id)))?;

        if let (Some(target), Value::Object(changes)) = (document.as_object_mut(), data) {
            merge(target, changes);
        }
        Ok(document.clone())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        let mut collections = lock(&self.collections);
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(format!("Document {} not found", id)))?;
        let before = docs.len();
        docs.retain(|doc| document_id(doc) != Some(id));
        if docs.len() == before {
            return Err(StoreError::NotFound(format!("Document {} not found", id)));
        }
        Ok(())
    }
}

/// Blob store keeping files in memory.
#[derive(Debug, Default)]
pub struct MockBlobStore {
    files: Mutex<HashMap<String, (String, Vec<u8>)>>,
    deleted: Mutex<Vec<String>>,
    next_id: Mutex<u64>,
    /// Whether uploads fail.
    pub simulate_failure: bool,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A blob store whose uploads always fail.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Default::default()
        }
    }

    /// Ids of the files currently stored.
    pub fn file_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.files).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Ids of the files that were deleted.
    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }

    pub fn view_url(bucket: &str, file_id: &str) -> String {
        format!("mock://{}/{}", bucket, file_id)
    }
}

#[async_trait::async_trait]
impl BlobStore for MockBlobStore {
    async fn upload_file(
        &self,
        bucket: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StoreError> {
        if self.simulate_failure {
            tracing::warn!(bucket = %bucket, file_name = %file_name, "Mock blob store simulating failure");
            return Err(StoreError::Transport("Simulated upload failure".to_string()));
        }

        let id = {
            let mut next = lock(&self.next_id);
            *next += 1;
            format!("file-{}", *next)
        };
        lock(&self.files).insert(id.clone(), (file_name.to_string(), bytes));

        Ok(StoredFile {
            view_url: Self::view_url(bucket, &id),
            id,
        })
    }

    async fn delete_file(&self, _bucket: &str, file_id: &str) -> Result<(), StoreError> {
        if lock(&self.files).remove(file_id).is_none() {
            return Err(StoreError::NotFound(format!("File {} not found", file_id)));
        }
        lock(&self.deleted).push(file_id.to_string());
        Ok(())
    }
}

/// Function gateway replaying scripted replies.
#[derive(Debug, Default)]
pub struct MockFunctionGateway {
    replies: Mutex<VecDeque<Result<GatewayResponse, StoreError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockFunctionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for the next execution.
    pub fn with_reply(self, reply: Result<GatewayResponse, StoreError>) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }

    /// Queues a successful execution whose function returned `body`.
    pub fn with_response_body(self, body: &str) -> Self {
        self.with_reply(Ok(GatewayResponse {
            ok: true,
            payload: serde_json::json!({ "responseBody": body }),
        }))
    }

    /// Executions observed so far, as `(function_id, body)`.
    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }
}

#[async_trait::async_trait]
impl FunctionGateway for MockFunctionGateway {
    async fn execute(&self, function_id: &str, body: Value) -> Result<GatewayResponse, StoreError> {
        lock(&self.calls).push((function_id.to_string(), body));
        lock(&self.replies).pop_front().unwrap_or_else(|| {
            Err(StoreError::Transport(
                "No scripted reply for function execution".to_string(),
            ))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn document_id(doc: &Value) -> Option<&str> {
    doc.get("$id").and_then(Value::as_str)
}

fn merge(target: &mut Map<String, Value>, changes: Map<String, Value>) {
    for (key, value) in changes {
        target.insert(key, value);
    }
}

fn matches_predicate(doc: &Value, predicate: &Predicate) -> bool {
    let Some(actual) = doc.get(predicate.attribute()) else {
        return false;
    };

    match predicate {
        Predicate::Search { value, .. } => actual
            .as_str()
            .map(|text| text.to_lowercase().contains(&value.to_lowercase()))
            .unwrap_or(false),
        Predicate::Equal { values, .. } => values
            .iter()
            .any(|v| compare_values(actual, v) == Some(Ordering::Equal)),
        Predicate::GreaterThan { value, .. } => {
            compare_values(actual, value) == Some(Ordering::Greater)
        }
        Predicate::GreaterThanEqual { value, .. } => matches!(
            compare_values(actual, value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Predicate::LessThan { value, .. } => compare_values(actual, value) == Some(Ordering::Less),
        Predicate::LessThanEqual { value, .. } => matches!(
            compare_values(actual, value),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Orders two attribute values; timestamps compare as instants.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => Some(x.with_timezone(&Utc).cmp(&y.with_timezone(&Utc))),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
