//! Activity route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidateUrl, ValidationError};

use domain::models::activity::{default_activity_sort, fields, parse_timestamp};
use domain::models::{
    Activity, ActivityDialog, ActivityDraft, ActivityFilters, ActivityStatus, ActivityTab,
    ActivityType, ImageSource, RegistrationWithUser, SortDirection, SortOrder,
};
use domain::services::DialogOutcome;
use shared::pagination::{Page, PageRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_activity_mutation;

/// Attributes the list may be sorted by.
const SORTABLE_FIELDS: &[&str] = &[
    fields::TITLE,
    fields::START_DATE,
    fields::END_DATE,
    "registrationDeadline",
    "maxParticipants",
    "createdAt",
];

/// Query parameters of the activities list.
#[derive(Debug, Deserialize, Validate)]
pub struct ListActivitiesQuery {
    #[validate(length(max = 200, message = "Search must be at most 200 characters"))]
    pub search: Option<String>,

    #[serde(rename = "type")]
    pub activity_type: Option<String>,

    #[serde(default)]
    pub tab: ActivityTab,

    /// Zero-based page index
    #[serde(default)]
    pub page: u32,

    #[validate(range(min = 1, message = "Page size must be at least 1"))]
    pub page_size: Option<u32>,

    pub sort: Option<String>,

    pub order: Option<SortDirection>,
}

impl ListActivitiesQuery {
    fn filters(&self) -> Result<ActivityFilters, ApiError> {
        let activity_type = match self.activity_type.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(value) => Some(ActivityType::parse(value).ok_or_else(|| {
                ApiError::Validation(format!("Unknown activity type: {}", value))
            })?),
        };

        Ok(ActivityFilters {
            search: self.search.clone(),
            activity_type,
            tab: self.tab,
        })
    }

    fn sort_order(&self) -> Result<SortOrder, ApiError> {
        let default = default_activity_sort();
        let field = match self.sort.as_deref() {
            None => default.field,
            Some(field) if SORTABLE_FIELDS.contains(&field) => field.to_string(),
            Some(field) => {
                return Err(ApiError::Validation(format!(
                    "Cannot sort by {}",
                    field
                )))
            }
        };

        Ok(SortOrder {
            field,
            direction: self.order.unwrap_or(default.direction),
        })
    }
}

/// Body of create and update requests.
#[derive(Debug, Deserialize, Validate)]
pub struct ActivityDraftRequest {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    #[serde(default)]
    pub location: String,

    /// Already uploaded image to keep; empty clears it
    #[validate(custom(function = "validate_image_url"))]
    pub image_url: Option<String>,

    /// New image to upload, base64 encoded
    pub image_base64: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Image file name must be 1-255 characters"))]
    pub image_file_name: Option<String>,

    pub max_participants: i64,

    pub start_date: String,

    pub end_date: String,

    pub registration_deadline: String,

    #[serde(default)]
    pub supervisor: String,
}

impl ActivityDraftRequest {
    /// Converts the body into a draft, decoding timestamps and the image.
    pub fn into_draft(self) -> Result<ActivityDraft, ApiError> {
        let image = match (self.image_base64.as_deref(), self.image_url.as_deref()) {
            (Some(encoded), _) if !encoded.trim().is_empty() => {
                let file_name = self.image_file_name.clone().ok_or_else(|| {
                    ApiError::Validation(
                        "Image file name is required when uploading an image".to_string(),
                    )
                })?;
                ImageSource::Pending {
                    file_name,
                    bytes: decode_image(encoded)?,
                }
            }
            (_, url) => ImageSource::from_stored(url),
        };

        Ok(ActivityDraft {
            title: self.title,
            description: self.description,
            activity_type: self.activity_type,
            location: self.location,
            image,
            max_participants: self.max_participants,
            start_date: timestamp("Start date", &self.start_date)?,
            end_date: timestamp("End date", &self.end_date)?,
            registration_deadline: timestamp("Registration deadline", &self.registration_deadline)?,
            supervisor: self.supervisor,
        })
    }
}

/// Accepts an empty string (no image) or an absolute URL.
fn validate_image_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() || url.validate_url() {
        return Ok(());
    }
    let mut err = ValidationError::new("image_url");
    err.message = Some("Image URL must be a valid URL".into());
    Err(err)
}

fn timestamp(label: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_timestamp(value)
        .ok_or_else(|| ApiError::Validation(format!("{} must be a valid date and time", label)))
}

/// Decodes base64 image data, accepting an optional `data:` URL prefix.
fn decode_image(encoded: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| ApiError::Validation("Image data is not valid base64".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("Image data is empty".to_string()));
    }
    Ok(bytes)
}

/// An activity with its derived status.
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    #[serde(flatten)]
    pub activity: Activity,
    pub status: ActivityStatus,
}

impl ActivityResponse {
    fn new(activity: Activity, now: DateTime<Utc>) -> Self {
        let status = activity.status(now);
        Self { activity, status }
    }
}

/// Registrations of one activity.
#[derive(Debug, Serialize)]
pub struct RegistrationsResponse {
    pub activity_id: String,
    pub total: usize,
    pub items: Vec<RegistrationWithUser>,
}

/// List activities.
///
/// GET /api/v1/activities
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ListActivitiesQuery>,
) -> Result<Json<Page<ActivityResponse>>, ApiError> {
    query.validate()?;

    let limits = &state.config.limits;
    let request = PageRequest::bounded(
        query.page,
        query.page_size.unwrap_or(limits.default_page_size),
        limits.max_page_size,
    )?;
    let filters = query.filters()?;
    let sort = query.sort_order()?;
    let now = Utc::now();

    let page = state.controller.list(&filters, request, &sort, now).await?;

    Ok(Json(page.map(|activity| ActivityResponse::new(activity, now))))
}

/// Fetch one activity.
///
/// GET /api/v1/activities/:id
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let activity = state.controller.get(&id).await?;
    Ok(Json(ActivityResponse::new(activity, Utc::now())))
}

/// Create an activity.
///
/// POST /api/v1/activities
pub async fn create_activity(
    State(state): State<AppState>,
    Json(body): Json<ActivityDraftRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    let draft = body.into_draft()?;
    let now = Utc::now();

    match state
        .controller
        .submit(ActivityDialog::create(draft), now)
        .await?
    {
        DialogOutcome::Created(activity) => {
            record_activity_mutation("created");
            info!(activity_id = %activity.id, "Activity created via API");
            Ok((StatusCode::CREATED, Json(ActivityResponse::new(activity, now))))
        }
        other => Err(ApiError::Internal(format!(
            "Unexpected create outcome: {:?}",
            other
        ))),
    }
}

/// Update an activity.
///
/// PUT /api/v1/activities/:id
pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActivityDraftRequest>,
) -> Result<Json<ActivityResponse>, ApiError> {
    body.validate()?;
    let draft = body.into_draft()?;
    let existing = state.controller.get(&id).await?;
    let now = Utc::now();

    let dialog = ActivityDialog::Edit {
        activity: existing,
        draft,
    };
    match state.controller.submit(dialog, now).await? {
        DialogOutcome::Updated(activity) => {
            record_activity_mutation("updated");
            info!(activity_id = %activity.id, "Activity updated via API");
            Ok(Json(ActivityResponse::new(activity, now)))
        }
        other => Err(ApiError::Internal(format!(
            "Unexpected update outcome: {:?}",
            other
        ))),
    }
}

/// Delete an activity. Registrations are not removed.
///
/// DELETE /api/v1/activities/:id
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.controller.delete(&id).await?;
    record_activity_mutation("deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List the registrations of an activity with their users.
///
/// GET /api/v1/activities/:id/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RegistrationsResponse>, ApiError> {
    let items = state.controller.registrations(&id).await?;
    Ok(Json(RegistrationsResponse {
        activity_id: id,
        total: items.len(),
        items,
    }))
}
