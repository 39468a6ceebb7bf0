//! Storage-backed auth service
//!
//! Accounts and the active session are kept in shared key-value storage.
//! Sign-up and sign-in wait for a fixed delay first, like a remote call.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use rewear_storage::{Storage, StorageEvents};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::navigator::Navigator;
use crate::observers::{Observer, Subscription};
use crate::restore::SessionRestorer;
use crate::service::{AuthService, ProfileUpdate};
use crate::state::SessionState;
use crate::sync::CrossTabSync;
use crate::user::{Account, Accounts, AuthUser, SessionRecord};
use crate::Result;

/// Storage key of the email-to-account map.
pub const ACCOUNTS_KEY: &str = "rewear_users";
/// Storage key of the persisted session record.
pub const SESSION_KEY: &str = "rewear_auth_state";

pub struct LocalAuth {
    storage: Storage,
    state: Arc<SessionState>,
    config: AuthConfig,
}

impl LocalAuth {
    pub fn new(storage: Storage, config: AuthConfig) -> Self {
        Self {
            storage,
            state: Arc::new(SessionState::new()),
            config,
        }
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Cross-tab sync bound to this service's session state.
    pub fn cross_tab_sync(&self, navigator: Arc<dyn Navigator>) -> CrossTabSync {
        CrossTabSync::new(self.storage.clone(), Arc::clone(&self.state), navigator)
    }

    /// Like [`cross_tab_sync`](Self::cross_tab_sync), but consumes an event
    /// stream that was opened earlier.
    pub fn cross_tab_sync_from(
        &self,
        events: StorageEvents,
        navigator: Arc<dyn Navigator>,
    ) -> CrossTabSync {
        CrossTabSync::with_events(
            self.storage.clone(),
            Arc::clone(&self.state),
            navigator,
            events,
        )
    }

    pub fn restorer(&self, navigator: Arc<dyn Navigator>) -> SessionRestorer {
        SessionRestorer::new(
            self.storage.clone(),
            Arc::clone(&self.state),
            navigator,
            self.config.clone(),
        )
    }

    pub fn read_session(&self) -> Result<Option<SessionRecord>> {
        SessionRecord::load(&self.storage)
    }

    pub fn accounts(&self) -> Result<Accounts> {
        Ok(self.storage.get_json(ACCOUNTS_KEY)?.unwrap_or_default())
    }

    fn persist_session(&self, user: &AuthUser) -> Result<()> {
        self.storage
            .set_json(SESSION_KEY, &SessionRecord::new(user.clone()))?;
        Ok(())
    }

    fn is_weak(&self, password: &str) -> bool {
        password.chars().count() < self.config.min_password_len
    }

    /// Establish `user` as the session: persist first, then notify.
    fn establish(&self, user: &AuthUser) -> Result<()> {
        self.persist_session(user)?;
        self.state.transition(Some(user.clone()));
        Ok(())
    }
}

#[async_trait]
impl AuthService for LocalAuth {
    fn current_user(&self) -> Option<AuthUser> {
        self.state.current_user()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser> {
        simulate_latency(self.config.sign_up_delay).await;

        let account = Account::new(
            email.to_string(),
            password.to_string(),
            display_name.map(str::to_string),
        );
        let user = account.to_user();

        self.storage
            .update_item(ACCOUNTS_KEY, |raw| -> Result<Option<String>> {
                let mut accounts: Accounts = match raw {
                    Some(raw) => serde_json::from_str(raw)?,
                    None => Accounts::new(),
                };

                if accounts.contains_key(email) {
                    return Err(AuthError::EmailAlreadyInUse);
                }
                if self.is_weak(password) {
                    return Err(AuthError::WeakPassword);
                }

                accounts.insert(email.to_string(), account);
                Ok(Some(serde_json::to_string(&accounts)?))
            })?;

        self.establish(&user)?;

        tracing::info!(uid = %user.uid, email = %user.email, "Created account");

        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        simulate_latency(self.config.sign_in_delay).await;

        let accounts = self.accounts()?;
        let account = accounts.get(email).ok_or(AuthError::UserNotFound)?;

        if account.password != password {
            return Err(AuthError::WrongPassword);
        }

        let user = account.to_user();
        self.establish(&user)?;

        tracing::info!(uid = %user.uid, email = %user.email, "User signed in");

        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.storage.remove_item(SESSION_KEY)?;
        self.state.transition(None);

        tracing::info!("User signed out");

        Ok(())
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<()> {
        let Some(display_name) = update.display_name else {
            return Ok(());
        };
        let Some(mut user) = self.state.current_user() else {
            tracing::debug!("Profile update without a signed-in user");
            return Ok(());
        };

        self.storage.update_item(ACCOUNTS_KEY, |raw| -> Result<Option<String>> {
            let mut accounts: Accounts = match raw {
                Some(raw) => serde_json::from_str(raw)?,
                None => Accounts::new(),
            };
            match accounts.get_mut(&user.email) {
                Some(account) => account.display_name = Some(display_name.clone()),
                None => tracing::warn!(email = %user.email, "No account for current user"),
            }
            Ok(Some(serde_json::to_string(&accounts)?))
        })?;

        user.display_name = Some(display_name);

        // Keep the persisted session in step; its timestamp is not refreshed.
        self.storage.update_item(SESSION_KEY, |raw| -> Result<Option<String>> {
            let Some(mut record) = raw.and_then(SessionRecord::decode) else {
                return Ok(raw.map(str::to_string));
            };
            if record.user.as_ref().map(|u| &u.uid) == Some(&user.uid) {
                record.user = Some(user.clone());
            }
            Ok(Some(serde_json::to_string(&record)?))
        })?;

        self.state.replace(Some(user.clone()));

        tracing::info!(uid = %user.uid, "Updated profile");

        Ok(())
    }

    fn subscribe(&self, observer: Observer) -> Subscription {
        self.state.subscribe(observer)
    }
}

async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
