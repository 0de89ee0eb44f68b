//! Approval link execution.
//!
//! An approval link carries four query parameters. They are forwarded to a
//! serverless function exactly once and its reply is reduced to a single
//! terminal [`ApprovalOutcome`].

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

use super::store::{FunctionGateway, GatewayResponse};
use crate::models::approval::{
    ApprovalOutcome, ApprovalParams, DEFAULT_FAILURE_MESSAGE, DEFAULT_FAILURE_TITLE,
    DEFAULT_SUCCESS_MESSAGE, DEFAULT_SUCCESS_TITLE, GENERIC_ERROR_MESSAGE, GENERIC_ERROR_TITLE,
};

lazy_static! {
    static ref HTML_DOCUMENT: Regex = Regex::new(r"(?i)^\s*(<!doctype|<html)").unwrap();
}

/// Invokes the approval function for incoming links.
pub struct ApprovalExecutor {
    gateway: Arc<dyn FunctionGateway>,
    function_id: String,
}

impl ApprovalExecutor {
    pub fn new(gateway: Arc<dyn FunctionGateway>, function_id: impl Into<String>) -> Self {
        Self {
            gateway,
            function_id: function_id.into(),
        }
    }

    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    /// Runs the approval for the given link parameters.
    ///
    /// Incomplete parameters yield [`ApprovalOutcome::InvalidLink`] without
    /// contacting the gateway.
    pub async fn execute(&self, params: &ApprovalParams) -> ApprovalOutcome {
        let Some(request) = params.validated() else {
            warn!("Approval link is missing parameters");
            return ApprovalOutcome::InvalidLink;
        };

        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => {
                return ApprovalOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        };

        match self.gateway.execute(&self.function_id, body).await {
            Ok(response) => {
                let outcome = classify_response(&response);
                info!(
                    request_id = %request.request_id,
                    action = %request.action,
                    success = outcome.is_success(),
                    "Approval function executed"
                );
                outcome
            }
            Err(e) => {
                warn!(
                    request_id = %request.request_id,
                    error = %e,
                    "Approval function unreachable"
                );
                ApprovalOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Reduces a gateway reply to an outcome.
pub fn classify_response(response: &GatewayResponse) -> ApprovalOutcome {
    if response.ok {
        if let Some(body) = response_body(&response.payload) {
            return classify_body(body);
        }
    }

    match response.payload.get("message").and_then(Value::as_str) {
        Some(message) if !message.trim().is_empty() => ApprovalOutcome::DomainError {
            title: GENERIC_ERROR_TITLE.to_string(),
            message: message.to_string(),
        },
        _ => ApprovalOutcome::DomainError {
            title: GENERIC_ERROR_TITLE.to_string(),
            message: GENERIC_ERROR_MESSAGE.to_string(),
        },
    }
}

fn response_body(payload: &Value) -> Option<&str> {
    payload
        .get("responseBody")
        .and_then(Value::as_str)
        .filter(|body| !body.trim().is_empty())
}

fn classify_body(body: &str) -> ApprovalOutcome {
    if HTML_DOCUMENT.is_match(body) {
        return ApprovalOutcome::RenderableHtml {
            html: body.to_string(),
        };
    }

    let parsed = serde_json::from_str::<Value>(body).ok();
    let structured = parsed.as_ref().and_then(|value| {
        let map = value.as_object()?;
        let success = map.get("success")?.as_bool()?;
        Some((map, success))
    });

    let Some((map, success)) = structured else {
        // Plain text reply, or JSON without a success flag
        return ApprovalOutcome::Success {
            title: DEFAULT_SUCCESS_TITLE.to_string(),
            message: body.to_string(),
        };
    };

    let text = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    if success {
        ApprovalOutcome::Success {
            title: text("title").unwrap_or_else(|| DEFAULT_SUCCESS_TITLE.to_string()),
            message: text("message").unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
        }
    } else {
        ApprovalOutcome::DomainError {
            title: text("title").unwrap_or_else(|| DEFAULT_FAILURE_TITLE.to_string()),
            message: text("message").unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        }
    }
}
