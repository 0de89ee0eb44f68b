//! Activity resource controller.
//!
//! Mediates between the admin views and the activities collection: compiles
//! filter state into list queries, runs create/update/delete, and joins
//! registrations to users. The controller keeps no view state; callers
//! re-list after every successful mutation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use shared::pagination::{Page, PageRequest};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use validator::ValidationError;

use super::store::{BlobStore, DocumentStore, StoreError, StoredFile};
use crate::models::activity::{Activity, ActivityDialog, ActivityDraft, ActivityFilters, ActivityType};
use crate::models::query::{timestamp_value, ListQuery, Predicate, SortOrder};
use crate::models::registration::{
    fields as registration_fields, ActivityRegistration, RegistrationBoard, RegistrationDecision,
    RegistrationPatch, RegistrationWithUser,
};
use crate::models::{ImageSource, User, UserSummary};

/// Attribute holding a user document's id.
const USER_ID_ATTRIBUTE: &str = "$id";

/// Errors surfaced by controller operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// Local pre-check failed; nothing was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport or store-side failure.
    #[error("Fetch error: {0}")]
    Fetch(StoreError),

    #[error("Invalid document: {0}")]
    Decode(String),
}

impl From<StoreError> for ControllerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ControllerError::NotFound(msg),
            other => ControllerError::Fetch(other),
        }
    }
}

impl From<ValidationError> for ControllerError {
    fn from(err: ValidationError) -> Self {
        ControllerError::Validation(shared::validation::error_message(&err))
    }
}

/// Collection ids of the backend database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIds {
    pub activities: String,
    pub activity_registrations: String,
    pub users: String,
}

/// Explicit controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub collections: CollectionIds,
    pub images_bucket: String,
    /// Maximum registrations fetched per activity.
    pub registration_fetch_limit: u32,
    /// Maximum user ids per join query.
    pub user_batch_limit: u32,
}

/// Result of submitting a dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogOutcome {
    Created(Activity),
    Updated(Activity),
    Deleted(String),
    /// The dialog had nothing to submit.
    Unchanged,
}

/// Activity fields as written to the store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityWrite<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(rename = "type")]
    activity_type: ActivityType,
    location: &'a str,
    image_url: &'a str,
    max_participants: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    registration_deadline: DateTime<Utc>,
    supervisor: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl<'a> ActivityWrite<'a> {
    fn new(
        draft: &'a ActivityDraft,
        image_url: &'a str,
        created_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: draft.title.trim(),
            description: draft.description.trim(),
            activity_type: draft.activity_type,
            location: draft.location.trim(),
            image_url,
            max_participants: draft.max_participants,
            start_date: draft.start_date,
            end_date: draft.end_date,
            registration_deadline: draft.registration_deadline,
            supervisor: draft.supervisor.trim(),
            created_at,
            updated_at,
        }
    }
}

/// Controller for the activities collection and its registrations.
pub struct ActivityController {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    config: ControllerConfig,
}

impl ActivityController {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            documents,
            blobs,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Lists one page of activities matching the filters.
    pub async fn list(
        &self,
        filters: &ActivityFilters,
        page: PageRequest,
        sort: &SortOrder,
        now: DateTime<Utc>,
    ) -> Result<Page<Activity>, ControllerError> {
        let query = ListQuery::new(filters.predicates(now))
            .limit(page.limit())
            .offset(page.offset())
            .sort(sort.clone());

        let result = self
            .documents
            .list_documents(&self.config.collections.activities, &query)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list activities");
                e
            })?;

        let items: Vec<Activity> = decode_all(result.documents)?;

        debug!(
            page_index = page.page_index(),
            returned = items.len(),
            total = result.total,
            "Listed activities"
        );

        Ok(Page::new(items, result.total, page))
    }

    /// Fetches a single activity.
    pub async fn get(&self, id: &str) -> Result<Activity, ControllerError> {
        let doc = self
            .documents
            .get_document(&self.config.collections.activities, id)
            .await
            .map_err(|e| {
                warn!(activity_id = %id, error = %e, "Failed to fetch activity");
                e
            })?;
        decode(doc)
    }

    /// Validates and creates an activity. The store assigns the id.
    pub async fn create(
        &self,
        draft: ActivityDraft,
        now: DateTime<Utc>,
    ) -> Result<Activity, ControllerError> {
        draft.validate()?;

        let (image_url, uploaded) = self.resolve_image(&draft.image).await?;
        let fields = ActivityWrite::new(&draft, &image_url, Some(now), now);
        let data = to_document(&fields)?;

        match self
            .documents
            .create_document(&self.config.collections.activities, data)
            .await
        {
            Ok(doc) => {
                let activity: Activity = decode(doc)?;
                info!(activity_id = %activity.id, title = %activity.title, "Activity created");
                Ok(activity)
            }
            Err(e) => {
                error!(error = %e, "Failed to create activity");
                self.discard_upload(uploaded).await;
                Err(e.into())
            }
        }
    }

    /// Validates and replaces the editable fields of an activity.
    pub async fn update(
        &self,
        id: &str,
        draft: ActivityDraft,
        now: DateTime<Utc>,
    ) -> Result<Activity, ControllerError> {
        draft.validate()?;

        let (image_url, uploaded) = self.resolve_image(&draft.image).await?;
        let fields = ActivityWrite::new(&draft, &image_url, None, now);
        let data = to_document(&fields)?;

        match self
            .documents
            .update_document(&self.config.collections.activities, id, data)
            .await
        {
            Ok(doc) => {
                let activity: Activity = decode(doc)?;
                info!(activity_id = %activity.id, "Activity updated");
                Ok(activity)
            }
            Err(e) => {
                error!(activity_id = %id, error = %e, "Failed to update activity");
                self.discard_upload(uploaded).await;
                Err(e.into())
            }
        }
    }

    /// Deletes an activity. Registrations are left in place.
    pub async fn delete(&self, id: &str) -> Result<(), ControllerError> {
        self.documents
            .delete_document(&self.config.collections.activities, id)
            .await
            .map_err(|e| {
                error!(activity_id = %id, error = %e, "Failed to delete activity");
                e
            })?;
        info!(activity_id = %id, "Activity deleted");
        Ok(())
    }

    /// Submits a dialog, dispatching to the matching mutation.
    pub async fn submit(
        &self,
        dialog: ActivityDialog,
        now: DateTime<Utc>,
    ) -> Result<DialogOutcome, ControllerError> {
        match dialog {
            ActivityDialog::Create { draft } => {
                self.create(draft, now).await.map(DialogOutcome::Created)
            }
            ActivityDialog::Edit { activity, draft } => self
                .update(&activity.id, draft, now)
                .await
                .map(DialogOutcome::Updated),
            ActivityDialog::Delete { activity } => {
                self.delete(&activity.id).await?;
                Ok(DialogOutcome::Deleted(activity.id))
            }
            ActivityDialog::Closed | ActivityDialog::View { .. } => Ok(DialogOutcome::Unchanged),
        }
    }

    /// Fetches the registrations of an activity, each decorated with its user.
    ///
    /// Every registration appears exactly once, in fetch order. Users that
    /// cannot be resolved are replaced by the "Unknown User" sentinel.
    pub async fn registrations(
        &self,
        activity_id: &str,
    ) -> Result<Vec<RegistrationWithUser>, ControllerError> {
        let query = ListQuery::new(vec![Predicate::equal(
            registration_fields::ACTIVITY_ID,
            activity_id,
        )])
        .limit(self.config.registration_fetch_limit);

        let result = self
            .documents
            .list_documents(&self.config.collections.activity_registrations, &query)
            .await
            .map_err(|e| {
                error!(activity_id = %activity_id, error = %e, "Failed to list registrations");
                e
            })?;

        if result.total > result.documents.len() as u64 {
            warn!(
                activity_id = %activity_id,
                total = result.total,
                fetched = result.documents.len(),
                "Registration count exceeds fetch limit"
            );
        }

        let registrations: Vec<ActivityRegistration> = decode_all(result.documents)?;
        if registrations.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.fetch_users(&registrations).await?;

        let joined = registrations
            .into_iter()
            .map(|registration| {
                let user = users
                    .get(&registration.user_id)
                    .map(UserSummary::from)
                    .unwrap_or_else(UserSummary::unknown);
                RegistrationWithUser { registration, user }
            })
            .collect::<Vec<_>>();

        debug!(
            activity_id = %activity_id,
            count = joined.len(),
            unresolved = joined.iter().filter(|r| r.user.is_unknown()).count(),
            "Joined registrations with users"
        );

        Ok(joined)
    }

    /// Writes a new status onto a registration and returns the applied change.
    pub async fn set_registration_status(
        &self,
        registration_id: &str,
        decision: RegistrationDecision,
        now: DateTime<Utc>,
    ) -> Result<RegistrationPatch, ControllerError> {
        let patch = RegistrationPatch {
            registration_id: registration_id.to_string(),
            status: decision.status(),
            updated_at: now,
        };

        let data = json!({
            (registration_fields::STATUS): patch.status,
            (registration_fields::UPDATED_AT): timestamp_value(now),
        });

        self.documents
            .update_document(
                &self.config.collections.activity_registrations,
                registration_id,
                data,
            )
            .await
            .map_err(|e| {
                error!(
                    registration_id = %registration_id,
                    error = %e,
                    "Failed to update registration status"
                );
                e
            })?;

        info!(
            registration_id = %registration_id,
            status = %patch.status,
            "Registration status updated"
        );
        Ok(patch)
    }

    /// Transitions a registration and patches the displayed row in place.
    ///
    /// Only the targeted row changes; the user join is not re-run.
    pub async fn transition_status(
        &self,
        board: &mut RegistrationBoard,
        registration_id: &str,
        decision: RegistrationDecision,
        now: DateTime<Utc>,
    ) -> Result<RegistrationPatch, ControllerError> {
        let patch = self
            .set_registration_status(registration_id, decision, now)
            .await?;
        if !board.apply(&patch) {
            warn!(registration_id = %registration_id, "Transitioned registration is not on the board");
        }
        Ok(patch)
    }

    async fn fetch_users(
        &self,
        registrations: &[ActivityRegistration],
    ) -> Result<HashMap<String, User>, ControllerError> {
        let mut seen = HashSet::new();
        let user_ids: Vec<&str> = registrations
            .iter()
            .map(|r| r.user_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect();

        let batch_size = self.config.user_batch_limit.max(1);
        let mut users = HashMap::with_capacity(user_ids.len());

        for batch in user_ids.chunks(batch_size as usize) {
            let query = ListQuery::new(vec![Predicate::equal_any(
                USER_ID_ATTRIBUTE,
                batch.iter().copied(),
            )])
            .limit(batch_size);

            let result = self
                .documents
                .list_documents(&self.config.collections.users, &query)
                .await
                .map_err(|e| {
                    error!(error = %e, batch = batch.len(), "Failed to fetch registration users");
                    e
                })?;

            for doc in result.documents {
                match serde_json::from_value::<User>(doc) {
                    Ok(user) => {
                        users.insert(user.id.clone(), user);
                    }
                    Err(e) => warn!(error = %e, "Skipping malformed user document"),
                }
            }
        }

        Ok(users)
    }

    /// Returns the URL to store, uploading pending bytes first.
    async fn resolve_image(
        &self,
        image: &ImageSource,
    ) -> Result<(String, Option<StoredFile>), ControllerError> {
        match image {
            ImageSource::Empty => Ok((String::new(), None)),
            ImageSource::Persisted(url) => Ok((url.clone(), None)),
            ImageSource::Pending { file_name, bytes } => {
                let file = self
                    .blobs
                    .upload_file(&self.config.images_bucket, file_name, bytes.clone())
                    .await
                    .map_err(|e| {
                        error!(file_name = %file_name, error = %e, "Failed to upload activity image");
                        e
                    })?;
                debug!(file_id = %file.id, "Activity image uploaded");
                Ok((file.view_url.clone(), Some(file)))
            }
        }
    }

    /// Best-effort removal of an image whose document write failed.
    async fn discard_upload(&self, uploaded: Option<StoredFile>) {
        let Some(file) = uploaded else {
            return;
        };
        match self
            .blobs
            .delete_file(&self.config.images_bucket, &file.id)
            .await
        {
            Ok(()) => info!(file_id = %file.id, "Discarded orphaned activity image"),
            Err(e) => warn!(file_id = %file.id, error = %e, "Failed to discard orphaned activity image"),
        }
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Value, ControllerError> {
    serde_json::to_value(value).map_err(|e| ControllerError::Decode(e.to_string()))
}

fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, ControllerError> {
    serde_json::from_value(doc).map_err(|e| ControllerError::Decode(e.to_string()))
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>, ControllerError> {
    docs.into_iter().map(decode).collect()
}
