//! Extended user profiles
//!
//! Each signed-in user gets a `users/{uid}` document with marketplace
//! fields. Failures here are logged and never reach the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use rewear_auth::{AuthService, AuthUser, Subscription};
use rewear_storage::DocumentStore;

pub const USERS_COLLECTION: &str = "users";

/// Points credited to every new member.
const STARTING_POINTS: i64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    pub points: i64,
    pub location: String,
    pub items_listed: u32,
    pub successful_swaps: u32,
}

impl UserProfile {
    pub fn for_new_user(user: &AuthUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone().unwrap_or_default(),
            photo_url: user.photo_url.clone().unwrap_or_default(),
            created_at: Utc::now(),
            points: STARTING_POINTS,
            location: String::new(),
            items_listed: 0,
            successful_swaps: 0,
        }
    }
}

/// Creates the profile document whenever a user without one signs in.
pub struct ProfileSync {
    documents: DocumentStore,
    _subscription: Subscription,
}

impl ProfileSync {
    pub fn attach(auth: &dyn AuthService, documents: DocumentStore) -> Self {
        let target = documents.clone();
        let subscription = auth.subscribe(Arc::new(move |user: Option<&AuthUser>| {
            if let Some(user) = user {
                ensure_profile(&target, user);
            }
        }));

        Self {
            documents,
            _subscription: subscription,
        }
    }

    /// Profile of `user`, or `None` if missing or unreadable.
    pub fn load(&self, user: &AuthUser) -> Option<UserProfile> {
        let snapshot = match self.documents.get(USERS_COLLECTION, &user.uid) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(uid = %user.uid, error = %e, "Error getting user data");
                return None;
            }
        };

        match snapshot.data_as::<UserProfile>() {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(uid = %user.uid, error = %e, "Error decoding user data");
                None
            }
        }
    }

    /// Shallow-merge `fields` into the profile of `user`.
    pub fn update(&self, user: &AuthUser, fields: Map<String, Value>) {
        match self.documents.update(USERS_COLLECTION, &user.uid, fields) {
            Ok(()) => tracing::info!(uid = %user.uid, "User data updated"),
            Err(e) => tracing::error!(uid = %user.uid, error = %e, "Error updating user data"),
        }
    }
}

fn ensure_profile(documents: &DocumentStore, user: &AuthUser) {
    let result = documents
        .get(USERS_COLLECTION, &user.uid)
        .and_then(|snapshot| {
            if snapshot.exists() {
                return Ok(false);
            }
            documents.set(USERS_COLLECTION, &user.uid, &UserProfile::for_new_user(user))?;
            Ok(true)
        });

    match result {
        Ok(true) => tracing::info!(uid = %user.uid, "New user profile created"),
        Ok(false) => {}
        Err(e) => tracing::error!(uid = %user.uid, error = %e, "Error saving user profile"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewear_auth::{AuthConfig, LocalAuth};
    use rewear_storage::Database;
    use serde_json::json;
    use std::time::Duration;

    fn instant_auth(db: &Database) -> LocalAuth {
        LocalAuth::new(
            db.context(),
            AuthConfig {
                sign_in_delay: Duration::ZERO,
                sign_up_delay: Duration::ZERO,
                ..AuthConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_profile_created_on_first_sign_in() {
        let db = Database::open_in_memory().unwrap();
        let auth = instant_auth(&db);
        let profiles = ProfileSync::attach(&auth, DocumentStore::new(db.context()));

        let user = auth.sign_up("a@x.com", "secret1", Some("Ann")).await.unwrap();

        let profile = profiles.load(&user).unwrap();
        assert_eq!(profile.uid, user.uid);
        assert_eq!(profile.display_name, "Ann");
        assert_eq!(profile.points, 100);
        assert_eq!(profile.location, "");
        assert_eq!(profile.items_listed, 0);
    }

    #[tokio::test]
    async fn test_existing_profile_is_kept() {
        let db = Database::open_in_memory().unwrap();
        let auth = instant_auth(&db);
        let profiles = ProfileSync::attach(&auth, DocumentStore::new(db.context()));

        let user = auth.sign_up("a@x.com", "secret1", None).await.unwrap();
        let mut fields = Map::new();
        fields.insert("points".to_string(), json!(250));
        profiles.update(&user, fields);

        auth.sign_out().await.unwrap();
        auth.sign_in("a@x.com", "secret1").await.unwrap();

        assert_eq!(profiles.load(&user).unwrap().points, 250);
    }

    #[tokio::test]
    async fn test_unreadable_profile_is_none() {
        let db = Database::open_in_memory().unwrap();
        let auth = instant_auth(&db);
        let documents = DocumentStore::new(db.context());
        let profiles = ProfileSync::attach(&auth, documents.clone());

        let user = auth.sign_up("a@x.com", "secret1", None).await.unwrap();
        documents
            .set(USERS_COLLECTION, &user.uid, &json!({"points": "lots"}))
            .unwrap();

        assert_eq!(profiles.load(&user), None);
    }
}
