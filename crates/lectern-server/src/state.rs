//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use lectern_site::Site;

use crate::mode::ServerMode;

/// `Cache-Control` of pages served in local mode.
pub(crate) const NO_CACHE: &str = "no-cache, private, max-age=0";
/// `Cache-Control` of static files and group resources.
pub(crate) const ONE_YEAR: &str = "max-age=31536000";

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Page groups, templates and page caches.
    pub(crate) site: Arc<Site>,
    /// Local / production mode.
    pub(crate) mode: ServerMode,
    /// Target of root redirects and of not-found redirects.
    pub(crate) default_page: String,
    /// Directory served under `/static/`.
    pub(crate) static_dir: PathBuf,
    /// `Cache-Control` of pages served in production mode.
    page_max_age: HeaderValue,
}

impl AppState {
    pub(crate) fn new(
        site: Arc<Site>,
        default_page: String,
        static_dir: PathBuf,
        max_age_secs: u64,
    ) -> Self {
        let page_max_age = HeaderValue::from_str(&format!("max-age={max_age_secs}"))
            .unwrap_or_else(|_| HeaderValue::from_static("max-age=0"));
        Self {
            site,
            mode: ServerMode::new(),
            default_page,
            static_dir,
            page_max_age,
        }
    }

    /// `Cache-Control` of a rendered page.
    pub(crate) fn page_cache_control(&self, is_local: bool) -> HeaderValue {
        if is_local {
            HeaderValue::from_static(NO_CACHE)
        } else {
            self.page_max_age.clone()
        }
    }
}
