//! Legacy article redirects.

use std::collections::HashMap;

/// A `(group, file)` article address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArticleRef {
    pub group: String,
    pub file: String,
}

impl ArticleRef {
    #[must_use]
    pub fn new(group: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            file: file.into(),
        }
    }

    /// Parse a `group/file` pair.
    ///
    /// Returns `None` unless both parts are non-empty and the file has no
    /// further slash.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let (group, file) = path.trim_start_matches('/').split_once('/')?;
        if group.is_empty() || file.is_empty() || file.contains('/') {
            return None;
        }
        Some(Self::new(group, file.to_lowercase()))
    }
}

/// Static mapping of moved articles to their new address.
#[derive(Clone, Debug, Default)]
pub struct RedirectTable {
    entries: HashMap<ArticleRef, ArticleRef>,
}

impl RedirectTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a redirect.
    pub fn insert(&mut self, from: ArticleRef, to: ArticleRef) {
        self.entries.insert(from, to);
    }

    /// Target of a moved article.
    #[must_use]
    pub fn lookup(&self, group: &str, file: &str) -> Option<&ArticleRef> {
        self.entries.get(&ArticleRef::new(group, file))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ArticleRef, ArticleRef)> for RedirectTable {
    fn from_iter<I: IntoIterator<Item = (ArticleRef, ArticleRef)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
