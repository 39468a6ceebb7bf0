//! Session restoration for page load and guarded views

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

use rewear_storage::Storage;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::navigator::Navigator;
use crate::state::SessionState;
use crate::user::{AuthUser, SessionRecord};
use crate::Result;

pub struct SessionRestorer {
    storage: Storage,
    state: Arc<SessionState>,
    navigator: Arc<dyn Navigator>,
    config: AuthConfig,
}

impl SessionRestorer {
    pub fn new(
        storage: Storage,
        state: Arc<SessionState>,
        navigator: Arc<dyn Navigator>,
        config: AuthConfig,
    ) -> Self {
        Self {
            storage,
            state,
            navigator,
            config,
        }
    }

    /// Adopt the persisted session if it is fresh.
    ///
    /// Subscribers are notified only when this changes the current user.
    pub fn restore(&self) -> Result<Option<AuthUser>> {
        let Some(record) = SessionRecord::load(&self.storage)? else {
            return Ok(None);
        };
        if record.user.is_none() {
            tracing::debug!("Persisted session has no user");
            return Ok(None);
        }
        let Some(user) = record.fresh_user(self.config.freshness_window).cloned() else {
            tracing::debug!(timestamp = record.timestamp, "Persisted session is stale");
            return Ok(None);
        };

        if self.state.current_user().as_ref() != Some(&user) {
            self.state.transition(Some(user.clone()));
        }

        Ok(Some(user))
    }

    /// Resolve the signed-in user for a guarded view.
    ///
    /// Completes from the first of: a fresh persisted session, a user already
    /// in memory, a signed-in notification, or the timeout. On timeout the
    /// visitor is sent to the landing page once and `Unauthenticated` is
    /// returned.
    pub async fn require_auth(&self) -> Result<AuthUser> {
        match self.restore() {
            Ok(Some(user)) => {
                tracing::info!(email = %user.email, "Restored user from storage");
                return Ok(user);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Could not read persisted session"),
        }

        if let Some(user) = self.state.current_user() {
            tracing::info!(email = %user.email, "User already authenticated");
            return Ok(user);
        }

        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));
        let subscription = self.state.subscribe(Arc::new(move |user: Option<&AuthUser>| {
            if let Some(user) = user {
                if let Some(tx) = slot.lock().take() {
                    let _ = tx.send(user.clone());
                }
            }
        }));

        let outcome = tokio::time::timeout(self.config.restore_timeout, rx).await;
        drop(subscription);

        if let Ok(Ok(user)) = outcome {
            tracing::info!(email = %user.email, "User authenticated via auth state change");
            return Ok(user);
        }

        if let Some(user) = self.state.current_user() {
            tracing::info!(email = %user.email, "User found after timeout");
            return Ok(user);
        }

        tracing::info!("Authentication timeout, redirecting to landing page");
        self.navigator.redirect_to_landing();
        Err(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::{LocalAuth, SESSION_KEY};
    use crate::navigator::testing::RecordingNavigator;
    use crate::navigator::View;
    use crate::service::AuthService;
    use chrono::Utc;
    use rewear_storage::Database;
    use std::time::Duration;
    use tokio::time::Instant;

    fn ann() -> AuthUser {
        AuthUser {
            uid: "user_1_abcdefghi".to_string(),
            email: "a@x.com".to_string(),
            display_name: Some("Ann".to_string()),
            photo_url: None,
        }
    }

    fn setup(db: &Database) -> (LocalAuth, Arc<RecordingNavigator>, SessionRestorer) {
        let auth = LocalAuth::new(db.context(), AuthConfig::default());
        let navigator = Arc::new(RecordingNavigator::at(View::Dashboard));
        let restorer = auth.restorer(navigator.clone());
        (auth, navigator, restorer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_record_restores_immediately() {
        let db = Database::open_in_memory().unwrap();
        db.context()
            .set_json(SESSION_KEY, &SessionRecord::new(ann()))
            .unwrap();
        let (auth, navigator, restorer) = setup(&db);

        let started = Instant::now();
        let user = restorer.require_auth().await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(user, ann());
        assert_eq!(auth.current_user(), Some(ann()));
        assert_eq!(navigator.redirects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_record_is_not_restored() {
        let db = Database::open_in_memory().unwrap();
        let stale = SessionRecord {
            user: Some(ann()),
            timestamp: (Utc::now() - chrono::Duration::hours(25)).timestamp_millis(),
        };
        db.context().set_json(SESSION_KEY, &stale).unwrap();
        let (_auth, navigator, restorer) = setup(&db);

        assert_eq!(restorer.restore().unwrap(), None);

        let started = Instant::now();
        let err = restorer.require_auth().await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
        assert!(started.elapsed() >= Duration::from_millis(3000));
        assert_eq!(navigator.redirects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_userless_record_is_not_restored() {
        let db = Database::open_in_memory().unwrap();
        let empty = SessionRecord {
            user: None,
            timestamp: Utc::now().timestamp_millis(),
        };
        db.context().set_json(SESSION_KEY, &empty).unwrap();
        let (auth, navigator, restorer) = setup(&db);

        assert_eq!(restorer.restore().unwrap(), None);
        assert_eq!(auth.current_user(), None);
        assert_eq!(navigator.redirects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_sign_out() {
        let db = Database::open_in_memory().unwrap();
        let (auth, navigator, restorer) = setup(&db);
        auth.sign_up("a@x.com", "secret1", None).await.unwrap();
        auth.sign_out().await.unwrap();

        let err = restorer.require_auth().await.unwrap_err();

        assert!(matches!(err, AuthError::Unauthenticated));
        assert_eq!(auth.read_session().unwrap(), None);
        assert_eq!(navigator.redirects(), 1);
        assert_eq!(navigator.current_view(), View::Landing);
        assert_eq!(auth.state().subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_memory_user_short_circuits() {
        let db = Database::open_in_memory().unwrap();
        let (auth, navigator, restorer) = setup(&db);
        auth.state().transition(Some(ann()));

        assert_eq!(restorer.require_auth().await.unwrap(), ann());
        assert_eq!(navigator.redirects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_on_notification_before_timeout() {
        let db = Database::open_in_memory().unwrap();
        let (auth, navigator, restorer) = setup(&db);
        let state = Arc::clone(auth.state());

        let started = Instant::now();
        let (result, _) = tokio::join!(restorer.require_auth(), async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            // A signed-out notification does not settle the wait.
            state.transition(None);
            tokio::time::sleep(Duration::from_millis(500)).await;
            state.transition(Some(ann()));
            tokio::time::sleep(Duration::from_millis(5000)).await;
            state.transition(None);
        });

        assert_eq!(result.unwrap(), ann());
        assert_eq!(navigator.redirects(), 0);
        assert!(started.elapsed() >= Duration::from_millis(6000));
        assert_eq!(auth.state().subscriber_count(), 0);
    }
}
