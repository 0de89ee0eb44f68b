//! Approval link page.
//!
//! Opened from e-mailed links; runs the approval function once and renders
//! the terminal outcome.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use askama::Template;
use tracing::{error, info};

use domain::models::approval::{GENERIC_ERROR_MESSAGE, GENERIC_ERROR_TITLE, INVALID_LINK_MESSAGE};
use domain::models::{ApprovalOutcome, ApprovalParams};

use crate::app::AppState;
use crate::middleware::metrics::record_approval_outcome;

/// Execute an approval link.
///
/// GET /request-approval?action=&requestId=&userId=&token=
///
/// Responds with JSON when the client asks for it, otherwise with an HTML page.
pub async fn request_approval(
    State(state): State<AppState>,
    Query(params): Query<ApprovalParams>,
    headers: HeaderMap,
) -> Response {
    let outcome = state.approvals.execute(&params).await;
    record_approval_outcome(&outcome);
    info!(
        action = params.action.as_deref().unwrap_or_default(),
        success = outcome.is_success(),
        "Approval link handled"
    );

    let outcome = public_outcome(outcome);
    let status = outcome_status(&outcome);
    if wants_json(&headers) {
        return (status, Json(outcome)).into_response();
    }

    let page = match outcome {
        ApprovalOutcome::RenderableHtml { html } => Ok(html),
        other => ApprovalPage::from_outcome(&other).render(),
    };
    match page {
        Ok(page) => (status, Html(page)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render approval page");
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE).into_response()
        }
    }
}

/// Outcome page for everything except function-supplied markup.
#[derive(Template)]
#[template(path = "approval.html")]
struct ApprovalPage<'a> {
    kind: &'a str,
    icon: char,
    title: &'a str,
    message: &'a str,
}

impl<'a> ApprovalPage<'a> {
    fn from_outcome(outcome: &'a ApprovalOutcome) -> Self {
        let (kind, title, message) = match outcome {
            ApprovalOutcome::Success { title, message } => ("success", title.as_str(), message.as_str()),
            ApprovalOutcome::DomainError { title, message } => {
                ("error", title.as_str(), message.as_str())
            }
            ApprovalOutcome::TransportError { message } => {
                ("error", GENERIC_ERROR_TITLE, message.as_str())
            }
            ApprovalOutcome::InvalidLink => ("error", GENERIC_ERROR_TITLE, INVALID_LINK_MESSAGE),
            ApprovalOutcome::RenderableHtml { .. } => ("error", GENERIC_ERROR_TITLE, GENERIC_ERROR_MESSAGE),
        };
        let icon = if kind == "success" { '\u{2714}' } else { '\u{2718}' };
        Self {
            kind,
            icon,
            title,
            message,
        }
    }
}

/// Replaces transport failure details with the generic message.
fn public_outcome(outcome: ApprovalOutcome) -> ApprovalOutcome {
    match outcome {
        ApprovalOutcome::TransportError { .. } => ApprovalOutcome::TransportError {
            message: GENERIC_ERROR_MESSAGE.to_string(),
        },
        other => other,
    }
}

fn outcome_status(outcome: &ApprovalOutcome) -> StatusCode {
    match outcome {
        ApprovalOutcome::Success { .. } | ApprovalOutcome::RenderableHtml { .. } => StatusCode::OK,
        ApprovalOutcome::DomainError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ApprovalOutcome::TransportError { .. } => StatusCode::BAD_GATEWAY,
        ApprovalOutcome::InvalidLink => StatusCode::BAD_REQUEST,
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn render(outcome: &ApprovalOutcome) -> String {
        ApprovalPage::from_outcome(outcome).render().unwrap()
    }

    #[test]
    fn test_page_escapes_message() {
        let page = render(&ApprovalOutcome::DomainError {
            title: "Denied & closed".to_string(),
            message: "<script>alert(1)</script>".to_string(),
        });
        assert!(page.contains("<h1>Denied &amp; closed</h1>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_page_success() {
        let page = render(&ApprovalOutcome::Success {
            title: "Approved".to_string(),
            message: "Guest visit approved.".to_string(),
        });
        assert!(page.contains("class=\"success\""));
        assert!(page.contains('\u{2714}'));
        assert!(page.contains("Guest visit approved."));
    }

    #[test]
    fn test_public_outcome_hides_transport_details() {
        let outcome = public_outcome(ApprovalOutcome::TransportError {
            message: "dns error: backend.internal".to_string(),
        });
        assert_eq!(
            outcome,
            ApprovalOutcome::TransportError {
                message: GENERIC_ERROR_MESSAGE.to_string()
            }
        );

        let page = render(&outcome);
        assert!(page.contains(GENERIC_ERROR_MESSAGE));
        assert!(!page.contains("backend.internal"));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["message"], GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_public_outcome_keeps_domain_errors() {
        let outcome = ApprovalOutcome::DomainError {
            title: "Expired".to_string(),
            message: "Token expired".to_string(),
        };
        assert_eq!(public_outcome(outcome.clone()), outcome);
    }

    #[test]
    fn test_page_invalid_link() {
        let page = render(&ApprovalOutcome::InvalidLink);
        assert!(page.contains(INVALID_LINK_MESSAGE));
    }

    #[test]
    fn test_outcome_status() {
        assert_eq!(outcome_status(&ApprovalOutcome::InvalidLink), StatusCode::BAD_REQUEST);
        assert_eq!(
            outcome_status(&ApprovalOutcome::TransportError {
                message: "down".to_string()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            outcome_status(&ApprovalOutcome::RenderableHtml {
                html: "<html></html>".to_string()
            }),
            StatusCode::OK
        );
    }

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!wants_json(&headers));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain"),
        );
        assert!(wants_json(&headers));
    }
}
