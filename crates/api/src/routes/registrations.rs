//! Registration status route handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::info;

use domain::models::{RegistrationDecision, RegistrationPatch, RegistrationStatus};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_registration_transition;

/// Confirm a registration.
///
/// POST /api/v1/registrations/:id/confirm
pub async fn confirm_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RegistrationPatch>, ApiError> {
    transition(&state, &id, RegistrationDecision::Confirm).await
}

/// Reject a registration.
///
/// POST /api/v1/registrations/:id/reject
pub async fn reject_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RegistrationPatch>, ApiError> {
    transition(&state, &id, RegistrationDecision::Reject).await
}

async fn transition(
    state: &AppState,
    id: &str,
    decision: RegistrationDecision,
) -> Result<Json<RegistrationPatch>, ApiError> {
    let patch = state
        .controller
        .set_registration_status(id, decision, Utc::now())
        .await?;

    record_registration_transition(status_label(patch.status));
    info!(registration_id = %id, status = %patch.status, "Registration transitioned via API");

    Ok(Json(patch))
}

fn status_label(status: RegistrationStatus) -> &'static str {
    match status {
        RegistrationStatus::Pending => "pending",
        RegistrationStatus::Confirmed => "confirmed",
        RegistrationStatus::Rejected => "rejected",
    }
}
