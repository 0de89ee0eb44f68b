//! Approval link models.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUCCESS_TITLE: &str = "Request processed";
pub const DEFAULT_SUCCESS_MESSAGE: &str = "The request has been processed successfully.";
pub const DEFAULT_FAILURE_TITLE: &str = "Request failed";
pub const DEFAULT_FAILURE_MESSAGE: &str = "The request could not be processed.";
pub const GENERIC_ERROR_TITLE: &str = "Error";
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";
pub const INVALID_LINK_MESSAGE: &str = "This approval link is invalid or incomplete.";

/// Raw query parameters of an approval link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalParams {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl ApprovalParams {
    /// Returns the request if all four parameters are present and non-empty.
    pub fn validated(&self) -> Option<ApprovalRequest> {
        fn present(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Some(ApprovalRequest {
            action: present(&self.action)?,
            request_id: present(&self.request_id)?,
            user_id: present(&self.user_id)?,
            token: present(&self.token)?,
        })
    }
}

/// A complete approval request, sent as the function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub action: String,
    pub request_id: String,
    pub user_id: String,
    pub token: String,
}

/// Terminal result of an approval link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Success { title: String, message: String },
    DomainError { title: String, message: String },
    TransportError { message: String },
    InvalidLink,
    /// Opaque markup returned by the function, displayed verbatim.
    RenderableHtml { html: String },
}

impl ApprovalOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ApprovalOutcome::Success { .. })
    }
}

/// Approval flow state. Every outcome is terminal; there are no retries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApprovalState {
    #[default]
    Loading,
    Finished(ApprovalOutcome),
}

impl ApprovalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApprovalState::Finished(_))
    }

    pub fn outcome(&self) -> Option<&ApprovalOutcome> {
        match self {
            ApprovalState::Loading => None,
            ApprovalState::Finished(outcome) => Some(outcome),
        }
    }
}
