//! One browser tab
//!
//! A `Context` owns the tab's auth service and everything that follows it:
//! cross-tab sync, restoration, profile documents and the navigation model.
//! UI code calls the flow methods here and shows `CoreError::user_message`
//! on failure.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

use rewear_auth::{
    AuthService, AuthUser, CrossTabSync, LocalAuth, Navigator, ProfileUpdate, SessionRestorer,
    SyncAction, SyncHandle,
};
use rewear_storage::{Database, DocumentStore};

use crate::config::Config;
use crate::location::Location;
use crate::navigation::{NavBar, Navigation};
use crate::profile::{ProfileSync, UserProfile, USERS_COLLECTION};
use crate::Result;

pub struct Context {
    auth: Arc<LocalAuth>,
    documents: DocumentStore,
    location: Arc<Location>,
    navigation: Navigation,
    profiles: ProfileSync,
    restorer: SessionRestorer,
    /// Pending until `spawn_sync` moves it onto the runtime
    sync: Mutex<Option<CrossTabSync>>,
    /// Dropping it stops the background sync
    sync_task: Mutex<Option<SyncHandle>>,
}

impl Context {
    /// Open a tab at `href` over the shared database.
    pub fn open(db: &Database, config: &Config, href: &str) -> Result<Self> {
        let storage = db.context();
        // Listen before anything else can write, so no signal is missed.
        let events = storage.events();

        let location = Arc::new(Location::parse(href)?);
        let auth = Arc::new(LocalAuth::new(storage.clone(), config.auth.clone()));
        let documents = DocumentStore::new(storage);

        let navigation = Navigation::attach(auth.as_ref());
        let profiles = ProfileSync::attach(auth.as_ref(), documents.clone());
        let sync = auth.cross_tab_sync_from(events, location.clone());
        let restorer = auth.restorer(location.clone());

        tracing::debug!(href, "Opened tab");

        Ok(Self {
            auth,
            documents,
            location,
            navigation,
            profiles,
            restorer,
            sync: Mutex::new(Some(sync)),
            sync_task: Mutex::new(None),
        })
    }

    /// Restore a fresh persisted session, as on page load.
    pub fn initialize(&self) -> Result<Option<AuthUser>> {
        let restored = self.restorer.restore()?;
        if let Some(user) = &restored {
            tracing::info!(email = %user.email, "Restored session on load");
        }
        Ok(restored)
    }

    /// Process cross-tab signals in the background.
    pub fn spawn_sync(&self) {
        if let Some(sync) = self.sync.lock().take() {
            *self.sync_task.lock() = Some(sync.spawn());
        }
    }

    /// Process cross-tab signals that have already arrived. Does nothing
    /// once `spawn_sync` has been called.
    pub fn sync_pending(&self) -> Result<Vec<SyncAction>> {
        match self.sync.lock().as_mut() {
            Some(sync) => Ok(sync.drain()?),
            None => Ok(Vec::new()),
        }
    }

    pub fn auth(&self) -> &Arc<LocalAuth> {
        &self.auth
    }

    pub fn location(&self) -> &Arc<Location> {
        &self.location
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user()
    }

    pub fn nav_bar(&self) -> NavBar {
        self.navigation.current()
    }

    pub async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<AuthUser> {
        match self.auth.sign_in(email, password).await {
            Ok(user) => {
                tracing::info!(email = %user.email, "User signed in successfully");
                Ok(user)
            }
            Err(e) => {
                tracing::error!(code = e.code(), "Sign in error");
                Err(e.into())
            }
        }
    }

    /// Register, set the display name, and record the location on the
    /// profile. A failed profile write does not fail the registration.
    pub async fn create_account_with_email(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        location: Option<&str>,
    ) -> Result<AuthUser> {
        let user = match self.auth.sign_up(email, password, display_name).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(code = e.code(), "Account creation error");
                return Err(e.into());
            }
        };

        if let Some(location) = location.filter(|l| !l.is_empty()) {
            let mut fields = Map::new();
            fields.insert(
                "displayName".to_string(),
                Value::from(display_name.unwrap_or_default()),
            );
            fields.insert("location".to_string(), Value::from(location));

            if let Err(e) = self.documents.update(USERS_COLLECTION, &user.uid, fields) {
                tracing::error!(uid = %user.uid, error = %e, "Error saving profile details");
            }
        }

        tracing::info!(uid = %user.uid, "Account created successfully");
        Ok(user)
    }

    /// Sign out and return to the landing page.
    pub async fn sign_out(&self) -> Result<()> {
        if let Err(e) = self.auth.sign_out().await {
            tracing::error!(error = %e, "Sign out error");
            return Err(e.into());
        }

        tracing::info!("User signed out successfully");
        self.location.redirect_to_landing();
        Ok(())
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<()> {
        Ok(self.auth.update_profile(update).await?)
    }

    /// Gate for guarded views. Redirects to the landing page on failure.
    pub async fn require_auth(&self) -> Result<AuthUser> {
        Ok(self.restorer.require_auth().await?)
    }

    pub fn current_user_data(&self) -> Option<UserProfile> {
        let user = self.current_user()?;
        self.profiles.load(&user)
    }

    pub fn update_user_data(&self, fields: Map<String, Value>) {
        match self.current_user() {
            Some(user) => self.profiles.update(&user, fields),
            None => tracing::debug!("Ignoring user data update while signed out"),
        }
    }
}
