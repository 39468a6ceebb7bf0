//! Account and session records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use rewear_storage::Storage;

use crate::local::SESSION_KEY;
use crate::Result;

/// All registered accounts, keyed by email exactly as entered.
pub type Accounts = BTreeMap<String, Account>;

/// The identity exposed to subscribers and stored in the session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}

impl AuthUser {
    /// Display name when set, otherwise the email.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub uid: String,
    pub email: String,
    /// Stored and compared in clear
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(email: String, password: String, display_name: Option<String>) -> Self {
        let now = Utc::now();

        Self {
            uid: generate_uid(now),
            email,
            password,
            display_name,
            photo_url: None,
            created_at: now,
        }
    }

    pub fn to_user(&self) -> AuthUser {
        AuthUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

fn generate_uid(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("user_{}_{}", now.timestamp_millis(), &random[..9])
}

/// The persisted session: who is signed in and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: Option<AuthUser>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl SessionRecord {
    pub fn new(user: AuthUser) -> Self {
        Self {
            user: Some(user),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Parse a raw stored value. Malformed values are treated as absent.
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed session record");
                None
            }
        }
    }

    /// Read the session record currently persisted in `storage`.
    pub fn load(storage: &Storage) -> Result<Option<Self>> {
        Ok(storage
            .get_item(SESSION_KEY)?
            .as_deref()
            .and_then(Self::decode))
    }

    pub fn established_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Whether the record is younger than `window` at `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let age_ms = now.timestamp_millis() - self.timestamp;
        age_ms < window.as_millis() as i64
    }

    /// The signed-in user, if this record is fresh at the current time.
    pub fn fresh_user(&self, window: Duration) -> Option<&AuthUser> {
        self.user
            .as_ref()
            .filter(|_| self.is_fresh_at(Utc::now(), window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthUser {
        AuthUser {
            uid: "user_1".to_string(),
            email: "a@x.com".to_string(),
            display_name: None,
            photo_url: None,
        }
    }

    #[test]
    fn test_uid_shape() {
        let a = Account::new("a@x.com".to_string(), "secret1".to_string(), None);
        let b = Account::new("b@x.com".to_string(), "secret1".to_string(), None);

        assert!(a.uid.starts_with("user_"));
        assert_eq!(a.uid.rsplit('_').next().unwrap().len(), 9);
        assert_ne!(a.uid, b.uid);
    }

    #[test]
    fn test_account_wire_names() {
        let account = Account::new(
            "a@x.com".to_string(),
            "secret1".to_string(),
            Some("Ann".to_string()),
        );
        let json = serde_json::to_value(&account).unwrap();

        assert_eq!(json["displayName"], "Ann");
        assert!(json["photoURL"].is_null());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["password"], "secret1");
    }

    #[test]
    fn test_label_prefers_display_name() {
        let mut u = user();
        assert_eq!(u.label(), "a@x.com");

        u.display_name = Some(String::new());
        assert_eq!(u.label(), "a@x.com");

        u.display_name = Some("Ann".to_string());
        assert_eq!(u.label(), "Ann");
    }

    #[test]
    fn test_freshness_window() {
        let window = Duration::from_secs(24 * 60 * 60);
        let record = SessionRecord::new(user());
        let established = record.established_at().unwrap();

        assert!(record.is_fresh_at(established, window));
        assert!(record.is_fresh_at(established + chrono::Duration::hours(23), window));
        assert!(!record.is_fresh_at(established + chrono::Duration::hours(24), window));
        assert!(record.fresh_user(window).is_some());
    }

    #[test]
    fn test_decode_tolerates_garbage() {
        assert_eq!(SessionRecord::decode("not json"), None);
        assert_eq!(
            SessionRecord::decode(r#"{"user":null,"timestamp":5}"#),
            Some(SessionRecord {
                user: None,
                timestamp: 5
            })
        );
    }
}
