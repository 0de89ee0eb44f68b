//! User models used to decorate registrations.

use serde::{Deserialize, Serialize};

/// Display name substituted when a user reference does not resolve.
pub const UNKNOWN_USER_NAME: &str = "Unknown User";

/// A user document. Read-only in this service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// `name` if set, otherwise `firstName lastName`, otherwise the sentinel.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return name.to_string();
            }
        }

        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if full.is_empty() {
            UNKNOWN_USER_NAME.to_string()
        } else {
            full
        }
    }
}

/// Brief user info attached to a registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserSummary {
    /// The sentinel for a dangling user reference.
    pub fn unknown() -> Self {
        Self {
            id: None,
            name: UNKNOWN_USER_NAME.to_string(),
            email: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id.is_none()
    }
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: Some(user.id.clone()),
            name: user.display_name(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(value: serde_json::Value) -> User {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_display_name_prefers_name() {
        let u = user(json!({"$id": "u1", "name": "Ada", "firstName": "A", "lastName": "L"}));
        assert_eq!(u.display_name(), "Ada");
    }

    #[test]
    fn test_display_name_from_parts() {
        let u = user(json!({"$id": "u1", "firstName": "Grace", "lastName": "Hopper"}));
        assert_eq!(u.display_name(), "Grace Hopper");

        let u = user(json!({"$id": "u2", "name": "  ", "lastName": "Lovelace"}));
        assert_eq!(u.display_name(), "Lovelace");
    }

    #[test]
    fn test_display_name_without_any_name() {
        let u = user(json!({"$id": "u3"}));
        assert_eq!(u.display_name(), UNKNOWN_USER_NAME);
    }

    #[test]
    fn test_unknown_summary() {
        let summary = UserSummary::unknown();
        assert!(summary.is_unknown());
        assert_eq!(summary.name, "Unknown User");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json, json!({"name": "Unknown User"}));
    }

    #[test]
    fn test_summary_from_user() {
        let u = user(json!({"$id": "u4", "name": "Linus", "email": "l@example.com"}));
        let summary = UserSummary::from(&u);
        assert_eq!(summary.id.as_deref(), Some("u4"));
        assert!(!summary.is_unknown());
        assert_eq!(summary.email.as_deref(), Some("l@example.com"));
    }
}
