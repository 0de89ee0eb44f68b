//! Domain services for the dorm admin backend.
//!
//! Services contain business logic that operates on domain models.

pub mod activity_controller;
pub mod approval;
pub mod mock;
pub mod store;

pub use activity_controller::{
    ActivityController, CollectionIds, ControllerConfig, ControllerError, DialogOutcome,
};

pub use approval::{classify_response, ApprovalExecutor};

pub use mock::{MockBlobStore, MockDocumentStore, MockFunctionGateway, StoreCall};

pub use store::{
    BlobStore, DocumentList, DocumentStore, FunctionGateway, GatewayResponse, StoreError,
    StoredFile,
};
