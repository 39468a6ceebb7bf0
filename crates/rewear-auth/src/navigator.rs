//! Views and redirects
//!
//! Sync and restoration need to know whether the current page is guarded
//! and to send the visitor back to the landing page. The hosting layer
//! supplies both through `Navigator`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Public landing page
    Landing,
    Browse,
    Dashboard,
    /// Any other public page
    Other,
}

impl View {
    pub const LANDING_PAGE: &'static str = "index.html";

    /// Classify a URL path by its last segment.
    pub fn from_path(path: &str) -> Self {
        let page = path.rsplit('/').next().unwrap_or_default();
        match page {
            "" | "index.html" => View::Landing,
            "browse.html" => View::Browse,
            "dashboard.html" => View::Dashboard,
            _ => View::Other,
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, View::Browse | View::Dashboard)
    }
}

pub trait Navigator: Send + Sync {
    fn current_view(&self) -> View;

    fn redirect_to_landing(&self);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Navigator that records redirects instead of performing them.
    pub struct RecordingNavigator {
        view: Mutex<View>,
        redirects: Mutex<usize>,
    }

    impl RecordingNavigator {
        pub fn at(view: View) -> Self {
            Self {
                view: Mutex::new(view),
                redirects: Mutex::new(0),
            }
        }

        pub fn redirects(&self) -> usize {
            *self.redirects.lock()
        }
    }

    impl Navigator for RecordingNavigator {
        fn current_view(&self) -> View {
            *self.view.lock()
        }

        fn redirect_to_landing(&self) {
            *self.view.lock() = View::Landing;
            *self.redirects.lock() += 1;
        }
    }
}
