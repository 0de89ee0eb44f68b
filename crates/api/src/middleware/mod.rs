//! HTTP middleware components.

pub mod admin_key;
pub mod logging;
pub mod metrics;
pub mod trace_id;

pub use admin_key::{require_admin_key, ADMIN_KEY_HEADER};
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
