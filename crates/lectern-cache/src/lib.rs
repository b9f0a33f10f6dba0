//! In-memory rendered page cache for lectern.
//!
//! [`PageCache`] maps a [`CacheKey`] to the final bytes of a rendered page. It is
//! shared by every request handler and guarded by a single mutex that is only held
//! for the map operation itself; rendering always happens outside the lock.
//!
//! Two lookups of the same cold key may therefore render the same page twice.
//! That is accepted: pages are small and cheap to render, and the second `set`
//! simply overwrites the first with identical bytes.
//!
//! # Empty Pages
//!
//! A stored **empty** buffer is a real value meaning "this page is confirmed not
//! to exist". It is distinct from an absent key ("not rendered yet") and lets the
//! renderer answer repeated requests for missing pages without touching storage.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use lectern_cache::{CacheKey, PageCache};
//!
//! let cache = PageCache::new();
//! let key = CacheKey::page("fundamentals", "101.HTML");
//!
//! assert_eq!(cache.get(&key), None);
//! cache.set(key.clone(), Bytes::from_static(b"<html>101</html>"));
//! assert_eq!(cache.get(&CacheKey::page("fundamentals", "101.html")).as_deref(), Some(&b"<html>101</html>"[..]));
//!
//! cache.clear();
//! assert!(cache.is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;

/// Composite key of a cached page.
///
/// The page component is lowercased on construction, so keys that differ only
/// in the case of the page path are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    group: String,
    page: String,
    version: Option<String>,
}

impl CacheKey {
    /// Key of an unversioned page (articles, redirect stubs, composites).
    #[must_use]
    pub fn page(group: impl Into<String>, page: &str) -> Self {
        Self {
            group: group.into(),
            page: page.to_lowercase(),
            version: None,
        }
    }

    /// Key of a page that exists in several versions (go-get pages).
    ///
    /// An empty version is the same key as [`CacheKey::page`].
    #[must_use]
    pub fn versioned(group: impl Into<String>, page: &str, version: &str) -> Self {
        let mut key = Self::page(group, page);
        if !version.is_empty() {
            key.version = Some(version.to_owned());
        }
        key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.page)?;
        if let Some(version) = &self.version {
            write!(f, "{version}")?;
        }
        Ok(())
    }
}

/// Thread-safe store of rendered pages.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: Mutex<HashMap<CacheKey, Bytes>>,
}

impl PageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pages(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Bytes>> {
        // A panic while holding the lock cannot leave the map half-updated:
        // every critical section is a single map operation.
        self.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a page.
    ///
    /// Returns `None` if the key was never set (or was cleared), and
    /// `Some(empty)` if the page was recorded as not found.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Bytes> {
        self.pages().get(key).cloned()
    }

    /// Store a page, overwriting any previous value.
    pub fn set(&self, key: CacheKey, page: Bytes) {
        self.pages().insert(key, page);
    }

    /// Record that a page does not exist.
    pub fn set_not_found(&self, key: CacheKey) {
        self.set(key, Bytes::new());
    }

    /// Drop every entry.
    ///
    /// The backing map is swapped for a fresh one under the lock, so a
    /// concurrent `get` sees either the whole old map or the empty new one.
    pub fn clear(&self) {
        let old = std::mem::take(&mut *self.pages());
        tracing::debug!(entries = old.len(), "page cache cleared");
    }

    /// Number of cached pages (including not-found markers).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_get_absent_key() {
        let cache = PageCache::new();

        assert_eq!(cache.get(&CacheKey::page("fundamentals", "101.html")), None);
    }

    #[test]
    fn test_set_then_get_is_stable() {
        let cache = PageCache::new();
        let key = CacheKey::page("fundamentals", "101.html");
        cache.set(key.clone(), Bytes::from_static(b"<p>page</p>"));

        for _ in 0..3 {
            assert_eq!(cache.get(&key), Some(Bytes::from_static(b"<p>page</p>")));
        }
    }

    #[test]
    fn test_set_overwrites() {
        let cache = PageCache::new();
        let key = CacheKey::page("blog", "post.html");
        cache.set(key.clone(), Bytes::from_static(b"one"));
        cache.set(key.clone(), Bytes::from_static(b"two"));

        assert_eq!(cache.get(&key), Some(Bytes::from_static(b"two")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_empty_page_is_a_value() {
        let cache = PageCache::new();
        let missing = CacheKey::page("fundamentals", "nope.html");
        cache.set_not_found(missing.clone());

        let cached = cache.get(&missing);
        assert!(cached.is_some());
        assert!(cached.unwrap().is_empty());
        assert_eq!(cache.get(&CacheKey::page("fundamentals", "never.html")), None);
    }

    #[test]
    fn test_page_component_is_case_insensitive() {
        let cache = PageCache::new();
        cache.set(
            CacheKey::page("fundamentals", "101.HTML"),
            Bytes::from_static(b"x"),
        );

        assert_eq!(
            cache.get(&CacheKey::page("fundamentals", "101.html")),
            Some(Bytes::from_static(b"x"))
        );
        assert_eq!(CacheKey::page("g", "A.Html").to_string(), "g/a.html");
    }

    #[test]
    fn test_group_component_is_significant() {
        let cache = PageCache::new();
        cache.set(CacheKey::page("blog", "101.html"), Bytes::from_static(b"x"));

        assert_eq!(cache.get(&CacheKey::page("fundamentals", "101.html")), None);
    }

    #[test]
    fn test_versioned_keys() {
        let plain = CacheKey::page("gold", "gold");
        let empty_version = CacheKey::versioned("gold", "gold", "");
        let v1 = CacheKey::versioned("gold", "gold", "@v1.0.0");

        assert_eq!(plain, empty_version);
        assert_ne!(plain, v1);
        assert_eq!(v1.to_string(), "gold/gold@v1.0.0");
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = PageCache::new();
        cache.set(CacheKey::page("a", "1.html"), Bytes::from_static(b"1"));
        cache.set_not_found(CacheKey::page("a", "2.html"));

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get(&CacheKey::page("a", "1.html")), None);
        assert_eq!(cache.get(&CacheKey::page("a", "2.html")), None);
    }

    #[test]
    fn test_concurrent_set_and_clear() {
        let cache = Arc::new(PageCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..100 {
                        let key = CacheKey::page("g", &format!("{i}-{j}.html"));
                        cache.set(key.clone(), Bytes::from(format!("{i}-{j}")));
                        if j % 25 == 0 {
                            cache.clear();
                        }
                        if let Some(page) = cache.get(&key) {
                            assert_eq!(page, Bytes::from(format!("{i}-{j}")));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        cache.clear();
        assert!(cache.is_empty());
    }
}
