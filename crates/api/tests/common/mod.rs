//! Common test utilities for integration tests.
//!
//! The application runs against in-memory backends, so no hosted backend is
//! needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use dorm_admin_api::{
    app::{create_app, Backends},
    config::{
        BackendSettings, CollectionsConfig, Config, FunctionsConfig, LimitsConfig, LoggingConfig,
        SecurityConfig, ServerConfig, StorageConfig,
    },
    middleware::ADMIN_KEY_HEADER,
};
use domain::services::{MockBlobStore, MockDocumentStore, MockFunctionGateway};
use serde_json::{json, Value};

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Test configuration bound to a fake backend.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            max_body_size: 1_048_576,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        backend: BackendSettings {
            endpoint: "https://backend.test/v1".to_string(),
            project_id: "dorm-test".to_string(),
            api_key: String::new(),
            database_id: "main".to_string(),
            timeout_ms: 5_000,
        },
        collections: CollectionsConfig {
            activities: "activities".to_string(),
            activity_registrations: "activity_registrations".to_string(),
            users: "users".to_string(),
        },
        storage: StorageConfig {
            images_bucket: "images".to_string(),
        },
        functions: FunctionsConfig {
            request_approval: "request-approval".to_string(),
        },
        limits: LimitsConfig {
            default_page_size: 10,
            max_page_size: 50,
            registration_fetch_limit: 100,
            user_batch_limit: 100,
        },
        security: SecurityConfig {
            admin_key: TEST_ADMIN_KEY.to_string(),
            cors_origins: vec![],
        },
    }
}

/// In-memory backends, kept so tests can inspect what reached them.
pub struct TestBackends {
    pub documents: Arc<MockDocumentStore>,
    pub blobs: Arc<MockBlobStore>,
    pub functions: Arc<MockFunctionGateway>,
}

impl TestBackends {
    pub fn new(documents: MockDocumentStore) -> Self {
        Self::with_functions(documents, MockFunctionGateway::new())
    }

    pub fn with_functions(documents: MockDocumentStore, functions: MockFunctionGateway) -> Self {
        Self {
            documents: Arc::new(documents),
            blobs: Arc::new(MockBlobStore::new()),
            functions: Arc::new(functions),
        }
    }

    fn backends(&self) -> Backends {
        Backends {
            documents: self.documents.clone(),
            blobs: self.blobs.clone(),
            functions: self.functions.clone(),
        }
    }
}

/// Create the application for testing.
pub fn create_test_app(config: Config, backends: &TestBackends) -> Router {
    create_app(config, backends.backends())
}

/// A request carrying the admin key and an optional JSON body.
pub fn admin_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(ADMIN_KEY_HEADER, TEST_ADMIN_KEY);

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Parse a JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap()
}

/// Read a response body as text.
pub async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// A stored activity document.
pub fn activity_doc(id: &str, title: &str, activity_type: &str, start: &str, end: &str) -> Value {
    json!({
        "$id": id,
        "title": title,
        "description": format!("{} description", title),
        "type": activity_type,
        "location": "Common room",
        "imageUrl": "",
        "maxParticipants": 20,
        "startDate": start,
        "endDate": end,
        "registrationDeadline": start,
        "supervisor": "Warden",
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-01-01T00:00:00.000Z"
    })
}

/// A stored registration document.
pub fn registration_doc(id: &str, activity_id: &str, user_id: &str, status: &str) -> Value {
    json!({
        "$id": id,
        "activityId": activity_id,
        "userId": user_id,
        "status": status,
        "registrationDate": "2024-02-01T09:00:00.000Z"
    })
}

/// A stored user document.
pub fn user_doc(id: &str, first_name: &str, last_name: &str) -> Value {
    json!({
        "$id": id,
        "firstName": first_name,
        "lastName": last_name,
        "email": format!("{}@dorm.test", id),
        "roomNumber": "B-12"
    })
}

/// A valid create or update body.
pub fn draft_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Evening session",
        "type": "workshop",
        "location": "Hall A",
        "max_participants": 15,
        "start_date": "2030-05-01T18:00",
        "end_date": "2030-05-01T20:00",
        "registration_deadline": "2030-05-01T19:00",
        "supervisor": "Ms. Lee"
    })
}
