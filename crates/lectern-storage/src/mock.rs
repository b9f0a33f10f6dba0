//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access. Every
//! `read` call is counted per article so tests can assert that a cached page
//! did not touch storage again.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, RwLock};

use crate::storage::{Storage, StorageError, StorageErrorKind};

type ArticleKey = (String, String);

fn key(group: &str, file: &str) -> ArticleKey {
    (group.to_owned(), file.to_owned())
}

/// Mock storage for testing.
///
/// # Example
///
/// ```ignore
/// use lectern_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_article("fundamentals", "101.html", "<h1>Go 101</h1>");
///
/// storage.read("fundamentals", "101.html").unwrap();
/// assert_eq!(storage.read_count("fundamentals", "101.html"), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    groups: RwLock<BTreeSet<String>>,
    articles: RwLock<BTreeMap<ArticleKey, Vec<u8>>>,
    failures: RwLock<HashMap<ArticleKey, StorageErrorKind>>,
    reads: Mutex<HashMap<ArticleKey, usize>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty group.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_group(self, group: impl Into<String>) -> Self {
        self.groups.write().unwrap().insert(group.into());
        self
    }

    /// Add an article (and its group).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_article(self, group: &str, file: &str, content: impl Into<Vec<u8>>) -> Self {
        self.groups.write().unwrap().insert(group.to_owned());
        self.articles
            .write()
            .unwrap()
            .insert(key(group, file), content.into());
        self
    }

    /// Make reads of an article fail with the given kind.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, group: &str, file: &str, kind: StorageErrorKind) -> Self {
        self.failures.write().unwrap().insert(key(group, file), kind);
        self
    }

    /// Replace an article's content after construction.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_article(&self, group: &str, file: &str, content: impl Into<Vec<u8>>) {
        self.articles
            .write()
            .unwrap()
            .insert(key(group, file), content.into());
    }

    /// Number of `read` calls made for one article.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn read_count(&self, group: &str, file: &str) -> usize {
        self.reads
            .lock()
            .unwrap()
            .get(&key(group, file))
            .copied()
            .unwrap_or(0)
    }

    /// Number of `read` calls made in total.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn total_reads(&self) -> usize {
        self.reads.lock().unwrap().values().sum()
    }
}

impl Storage for MockStorage {
    fn groups(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.groups.read().unwrap().iter().cloned().collect())
    }

    fn read(&self, group: &str, file: &str) -> Result<Vec<u8>, StorageError> {
        let article = key(group, file);
        *self.reads.lock().unwrap().entry(article.clone()).or_default() += 1;

        let path = format!("{group}/{file}");
        if let Some(kind) = self.failures.read().unwrap().get(&article) {
            return Err(StorageError::new(*kind)
                .with_path(path)
                .with_backend("Mock"));
        }

        self.articles
            .read()
            .unwrap()
            .get(&article)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path).with_backend("Mock"))
    }

    fn list(&self, group: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .articles
            .read()
            .unwrap()
            .keys()
            .filter(|(g, file)| g == group && file.ends_with(".html"))
            .map(|(_, file)| file.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_storage_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockStorage>();
    }

    #[test]
    fn test_new_empty() {
        let storage = MockStorage::new();

        assert!(storage.groups().unwrap().is_empty());
        assert_eq!(storage.total_reads(), 0);
    }

    #[test]
    fn test_with_article_registers_group() {
        let storage = MockStorage::new()
            .with_article("fundamentals", "101.html", "<h1>Go 101</h1>")
            .with_group("blog");

        assert_eq!(storage.groups().unwrap(), vec!["blog", "fundamentals"]);
        assert_eq!(storage.list("fundamentals").unwrap(), vec!["101.html"]);
    }

    #[test]
    fn test_read_counts_hits_and_misses() {
        let storage = MockStorage::new().with_article("fundamentals", "101.html", "x");

        storage.read("fundamentals", "101.html").unwrap();
        storage.read("fundamentals", "101.html").unwrap();
        let err = storage.read("fundamentals", "nope.html").unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(storage.read_count("fundamentals", "101.html"), 2);
        assert_eq!(storage.read_count("fundamentals", "nope.html"), 1);
        assert_eq!(storage.total_reads(), 3);
    }

    #[test]
    fn test_with_failure() {
        let storage = MockStorage::new()
            .with_article("fundamentals", "101.html", "x")
            .with_failure("fundamentals", "101.html", StorageErrorKind::PermissionDenied);

        let err = storage.read("fundamentals", "101.html").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_set_article_replaces_content() {
        let storage = MockStorage::new().with_article("blog", "a.html", "old");

        storage.set_article("blog", "a.html", "new");

        assert_eq!(storage.read("blog", "a.html").unwrap(), b"new");
    }
}
