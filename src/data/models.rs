//! Data models
//!
//! Rust structs representing the two persisted entities: local users and
//! the provider identities linked to them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// A local account
///
/// Created exactly once per distinct provider identity and never
/// updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub join_date: Option<NaiveDate>,
}

/// Fields for a user that has not been inserted yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub join_date: NaiveDate,
}

impl NewUser {
    /// Provision a user for a provider identity seen for the first time.
    ///
    /// The username is the provider-assigned identifier; the join date is today.
    pub fn from_provider_identity(provider_user_id: &str, email: &str) -> Self {
        Self {
            username: provider_user_id.to_string(),
            email: email.to_string(),
            join_date: Utc::now().date_naive(),
        }
    }
}

// =============================================================================
// OAuth link
// =============================================================================

/// A provider identity and the token it was last issued
///
/// `id` is `None` until the link has been persisted; `user_id` is `None`
/// until the link is associated with a local account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OAuthLink {
    pub id: Option<i64>,
    /// Provider name (e.g. "google")
    pub provider: String,
    /// Provider-scoped stable user identifier
    pub provider_user_id: String,
    /// Token response as JSON
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<i64>,
}

impl OAuthLink {
    /// Construct an unsaved link holding `token`.
    pub fn new(provider: &str, provider_user_id: &str, token: String) -> Self {
        Self {
            id: None,
            provider: provider.to_string(),
            provider_user_id: provider_user_id.to_string(),
            token,
            created_at: Utc::now(),
            user_id: None,
        }
    }

    /// Extract `access_token` from the stored token payload.
    pub fn access_token(&self) -> Option<String> {
        serde_json::from_str::<serde_json::Value>(&self.token)
            .ok()?
            .get("access_token")?
            .as_str()
            .map(ToOwned::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_reads_json_payload() {
        let link = OAuthLink::new(
            "google",
            "1234",
            r#"{"access_token":"ya29.abc","token_type":"bearer"}"#.to_string(),
        );
        assert_eq!(link.access_token().as_deref(), Some("ya29.abc"));
        assert!(link.id.is_none());
        assert!(link.user_id.is_none());
    }

    #[test]
    fn access_token_is_none_for_garbage_payload() {
        let link = OAuthLink::new("google", "1234", "not json".to_string());
        assert!(link.access_token().is_none());
    }

    #[test]
    fn new_user_uses_provider_id_as_username() {
        let user = NewUser::from_provider_identity("1098", "alice@example.com");
        assert_eq!(user.username, "1098");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.join_date, Utc::now().date_naive());
    }
}
