//! Activity registration models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;

/// Attribute names of the registrations collection.
pub mod fields {
    pub const ACTIVITY_ID: &str = "activityId";
    pub const STATUS: &str = "status";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Status of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "pending"),
            RegistrationStatus::Confirmed => write!(f, "confirmed"),
            RegistrationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// The only transitions an administrator can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationDecision {
    Confirm,
    Reject,
}

impl RegistrationDecision {
    pub fn status(&self) -> RegistrationStatus {
        match self {
            RegistrationDecision::Confirm => RegistrationStatus::Confirmed,
            RegistrationDecision::Reject => RegistrationStatus::Rejected,
        }
    }
}

/// A registration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRegistration {
    #[serde(rename(deserialize = "$id"))]
    pub id: String,
    pub activity_id: String,
    pub user_id: String,
    #[serde(default)]
    pub status: RegistrationStatus,
    #[serde(default)]
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ActivityRegistration {
    /// When the user registered; falls back to the creation stamp.
    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registration_date.or(self.created_at)
    }
}

/// A registration joined with its user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationWithUser {
    #[serde(flatten)]
    pub registration: ActivityRegistration,
    pub user: UserSummary,
}

/// The change written by a status transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationPatch {
    pub registration_id: String,
    pub status: RegistrationStatus,
    pub updated_at: DateTime<Utc>,
}

/// In-memory registrations of one activity, as displayed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationBoard {
    rows: Vec<RegistrationWithUser>,
}

impl RegistrationBoard {
    pub fn new(rows: Vec<RegistrationWithUser>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[RegistrationWithUser] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RegistrationWithUser> {
        self.rows
    }

    /// Patches the targeted row in place. Returns false if no row matches.
    pub fn apply(&mut self, patch: &RegistrationPatch) -> bool {
        match self
            .rows
            .iter_mut()
            .find(|row| row.registration.id == patch.registration_id)
        {
            Some(row) => {
                row.registration.status = patch.status;
                row.registration.updated_at = Some(patch.updated_at);
                true
            }
            None => false,
        }
    }
}
