//! Domain models for the dorm admin backend.

pub mod activity;
pub mod approval;
pub mod query;
pub mod registration;
pub mod user;

pub use activity::{
    activity_status, Activity, ActivityDialog, ActivityDraft, ActivityFilters, ActivityStatus,
    ActivityTab, ActivityType, ImageSource,
};
pub use approval::{ApprovalOutcome, ApprovalParams, ApprovalRequest, ApprovalState};
pub use query::{ListQuery, Predicate, SortDirection, SortOrder};
pub use registration::{
    ActivityRegistration, RegistrationBoard, RegistrationDecision, RegistrationPatch,
    RegistrationStatus, RegistrationWithUser,
};
pub use user::{User, UserSummary, UNKNOWN_USER_NAME};
