//! Current page of a tab

use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

use rewear_auth::{Navigator, View};

use crate::Result;

pub struct Location {
    url: RwLock<Url>,
    redirects: AtomicUsize,
}

impl Location {
    pub fn parse(href: &str) -> Result<Self> {
        Ok(Self {
            url: RwLock::new(Url::parse(href)?),
            redirects: AtomicUsize::new(0),
        })
    }

    pub fn href(&self) -> String {
        self.url.read().to_string()
    }

    pub fn view(&self) -> View {
        View::from_path(self.url.read().path())
    }

    /// Follow a link relative to the current page.
    pub fn navigate(&self, target: &str) -> Result<()> {
        let next = self.url.read().join(target)?;
        tracing::debug!(from = %self.url.read(), to = %next, "Navigating");
        *self.url.write() = next;
        Ok(())
    }

    /// Number of forced redirects to the landing page so far.
    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for Location {
    fn current_view(&self) -> View {
        self.view()
    }

    fn redirect_to_landing(&self) {
        let mut url = self.url.write();
        match url.join(View::LANDING_PAGE) {
            Ok(landing) => {
                tracing::info!(from = %url, to = %landing, "Redirecting to landing page");
                *url = landing;
            }
            Err(e) => tracing::error!(error = %e, "Cannot build landing page URL"),
        }
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}
