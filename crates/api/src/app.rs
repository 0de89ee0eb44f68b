use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{
    ActivityController, ApprovalExecutor, BlobStore, DocumentStore, FunctionGateway,
};
use persistence::{
    create_client, ClientError, RemoteBlobStore, RemoteDocumentStore, RemoteFunctionGateway,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_admin_key, trace_id};
use crate::routes::{activities, approval, health, registrations};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ActivityController>,
    pub approvals: Arc<ApprovalExecutor>,
    pub config: Arc<Config>,
}

/// Backend services the application runs against.
#[derive(Clone)]
pub struct Backends {
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub functions: Arc<dyn FunctionGateway>,
}

impl Backends {
    /// Backends talking to the hosted backend over REST.
    pub fn remote(config: &Config) -> Result<Self, ClientError> {
        let client = create_client(&config.backend_config())?;
        Ok(Self {
            documents: Arc::new(RemoteDocumentStore::new(client.clone())),
            blobs: Arc::new(RemoteBlobStore::new(client.clone())),
            functions: Arc::new(RemoteFunctionGateway::new(client)),
        })
    }
}

pub fn create_app(config: Config, backends: Backends) -> Router {
    let config = Arc::new(config);

    let controller = ActivityController::new(
        backends.documents,
        backends.blobs,
        config.controller_config(),
    );
    let approvals = ApprovalExecutor::new(
        backends.functions,
        config.functions.request_approval.clone(),
    );

    let state = AppState {
        controller: Arc::new(controller),
        approvals: Arc::new(approvals),
        config: config.clone(),
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Dashboard API (requires the admin key)
    let admin_routes = Router::new()
        .route(
            "/api/v1/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route(
            "/api/v1/activities/:id",
            get(activities::get_activity)
                .put(activities::update_activity)
                .delete(activities::delete_activity),
        )
        .route(
            "/api/v1/activities/:id/registrations",
            get(activities::list_registrations),
        )
        .route(
            "/api/v1/registrations/:id/confirm",
            post(registrations::confirm_registration),
        )
        .route(
            "/api/v1/registrations/:id/reject",
            post(registrations::reject_registration),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_key,
        ));

    // Public routes (no admin key; approval links carry their own token)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/metrics", get(metrics_handler))
        .route("/request-approval", get(approval::request_approval));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
