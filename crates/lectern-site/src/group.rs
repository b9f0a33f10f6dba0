//! Page groups.

use std::path::PathBuf;

/// Group served under the legacy `/article/` prefix.
pub const ARTICLE_GROUP: &str = "fundamentals";
/// URL segment of [`ARTICLE_GROUP`].
pub const ARTICLE_SEGMENT: &str = "article";
/// Group whose items are served at the site root.
pub const WEBSITE_GROUP: &str = "website";

/// A top-level content collection.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageGroup {
    /// Directory name of the group.
    pub name: String,
    /// URL prefix without trailing slash (`""` for the website group).
    pub url_prefix: String,
    /// Web index fragment from the group's root article; may be empty.
    pub index: String,
    /// Directory served at `<url_prefix>/res/`, if the group has one.
    pub resource_dir: Option<PathBuf>,
}

impl PageGroup {
    /// Create a group with the URL prefix derived from its name.
    #[must_use]
    pub fn new(name: impl Into<String>, index: String, resource_dir: Option<PathBuf>) -> Self {
        let name = name.into();
        Self {
            url_prefix: url_prefix(&name),
            name,
            index,
            resource_dir,
        }
    }

    /// URL of one of the group's pages.
    #[must_use]
    pub fn page_url(&self, file: &str) -> String {
        format!("{}/{file}", self.url_prefix)
    }
}

/// URL prefix of a group.
#[must_use]
pub fn url_prefix(group: &str) -> String {
    match group {
        ARTICLE_GROUP => format!("/{ARTICLE_SEGMENT}"),
        WEBSITE_GROUP => String::new(),
        _ => format!("/{group}"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_url_prefix() {
        assert_eq!(url_prefix("fundamentals"), "/article");
        assert_eq!(url_prefix("website"), "");
        assert_eq!(url_prefix("blog"), "/blog");
    }

    #[test]
    fn test_page_url() {
        let group = PageGroup::new("fundamentals", String::new(), None);
        assert_eq!(group.page_url("101.html"), "/article/101.html");

        let website = PageGroup::new("website", String::new(), None);
        assert_eq!(website.page_url("about.html"), "/about.html");
    }
}
