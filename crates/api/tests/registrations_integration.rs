//! Integration tests for registration status endpoints.
//!
//! Run with: cargo test --test registrations_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{
    admin_request, create_test_app, parse_response_body, registration_doc, test_config,
    TestBackends,
};
use domain::services::{MockDocumentStore, StoreCall, StoreError};
use tower::ServiceExt;

fn store() -> MockDocumentStore {
    MockDocumentStore::new().with_documents(
        "activity_registrations",
        vec![
            registration_doc("r-1", "a-1", "u-1", "pending"),
            registration_doc("r-2", "a-1", "u-2", "pending"),
        ],
    )
}

#[tokio::test]
async fn test_confirm_registration() {
    let backends = TestBackends::new(store());
    let app = create_test_app(test_config(), &backends);

    let response = app
        .oneshot(admin_request(
            Method::POST,
            "/api/v1/registrations/r-1/confirm",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["registration_id"], "r-1");
    assert_eq!(body["status"], "confirmed");
    assert!(body["updated_at"].is_string());

    let docs = backends.documents.documents("activity_registrations");
    let r1 = docs.iter().find(|d| d["$id"] == "r-1").unwrap();
    let r2 = docs.iter().find(|d| d["$id"] == "r-2").unwrap();
    assert_eq!(r1["status"], "confirmed");
    assert!(r1["updatedAt"].is_string());
    assert_eq!(r2["status"], "pending");
}

#[tokio::test]
async fn test_reject_registration_writes_only_status_and_timestamp() {
    let backends = TestBackends::new(store());
    let app = create_test_app(test_config(), &backends);

    let response = app
        .oneshot(admin_request(
            Method::POST,
            "/api/v1/registrations/r-2/reject",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "rejected");

    let calls = backends.documents.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        StoreCall::Update {
            collection, id, data,
        } => {
            assert_eq!(collection, "activity_registrations");
            assert_eq!(id, "r-2");
            let keys: Vec<&String> = data.as_object().unwrap().keys().collect();
            assert_eq!(keys.len(), 2);
            assert_eq!(data["status"], "rejected");
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_transition_missing_registration() {
    let backends = TestBackends::new(store());
    let app = create_test_app(test_config(), &backends);

    let response = app
        .oneshot(admin_request(
            Method::POST,
            "/api/v1/registrations/missing/confirm",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transition_backend_failure() {
    let store = store();
    store.set_failure(Some(StoreError::Backend {
        status: 500,
        message: "internal".to_string(),
    }));
    let backends = TestBackends::new(store);
    let app = create_test_app(test_config(), &backends);

    let response = app
        .oneshot(admin_request(
            Method::POST,
            "/api/v1/registrations/r-1/confirm",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let docs = backends.documents.documents("activity_registrations");
    assert!(docs.iter().all(|d| d["status"] == "pending"));
}
