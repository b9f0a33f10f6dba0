//! Local / production server mode.
//!
//! The server starts in production mode. A request addressed to
//! `localhost` switches it to local mode, where pages are rendered from
//! source on every request and print pages are available. Entering local
//! mode drops everything cached while in production mode.

use std::sync::{Mutex, PoisonError};

/// Process-wide server mode.
#[derive(Debug, Default)]
pub struct ServerMode {
    is_local: Mutex<bool>,
}

impl ServerMode {
    /// Create in production mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the mode implied by the current request and return it.
    ///
    /// `on_enter_local` runs only on a production to local transition, under
    /// the same lock as the flag update, so concurrent requests observe the
    /// transition exactly once.
    pub fn confirm(&self, is_local: bool, on_enter_local: impl FnOnce()) -> bool {
        let mut current = self.is_local.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != is_local {
            *current = is_local;
            tracing::info!(local = is_local, "server mode changed");
            if is_local {
                on_enter_local();
            }
        }
        is_local
    }

    /// Whether the last request switched the server to local mode.
    #[must_use]
    pub fn is_local(&self) -> bool {
        *self.is_local.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Whether a `Host` header value names the local machine.
///
/// Only the exact name `localhost` counts. `127.0.0.1` stays in production
/// mode so the cached site can be checked from the same machine.
#[must_use]
pub fn is_local_host(host: &str) -> bool {
    let name = host.split(':').next().unwrap_or_default();
    name == "localhost"
}
