//! Go vanity import pages.
//!
//! `go get example.org/tool/sub@v1.2.0` fetches `/tool/sub@v1.2.0?go-get=1`
//! and expects a page with `go-import` and `go-source` meta tags pointing at the
//! real repository.

use serde::Serialize;

const GITHUB: &str = "https://github.com/";

/// Metadata of one vanity import root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoGetPackage {
    /// Import path of the module root, e.g. `go101.org/gold`.
    pub root_package: String,
    /// GitHub `owner/repo` holding the source.
    pub source_repo: String,
    /// Documentation site prefix, e.g. `https://pkg.go.dev/`.
    pub doc_website: Option<String>,
}

/// Template data of a go-get page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GoGetPage {
    pub root_package: String,
    pub source_repo: String,
    pub doc_website: String,
}

impl GoGetPackage {
    /// Page data for a sub-package (empty for the root) at a version.
    #[must_use]
    pub fn page(&self, sub: &str, version: &str) -> GoGetPage {
        let source_repo = format!("{GITHUB}{}", self.source_repo);
        let doc_website = match &self.doc_website {
            Some(doc) => format!("{doc}{}/{sub}{version}", self.root_package),
            None if sub.is_empty() => source_repo.clone(),
            None => format!("{source_repo}/tree/master/{sub}"),
        };
        GoGetPage {
            root_package: self.root_package.clone(),
            source_repo,
            doc_website,
        }
    }
}

/// A parsed go-get request path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoGetRequest<'a> {
    /// Vanity root name, the first path segment.
    pub name: &'a str,
    /// Sub-package path; empty for the root.
    pub sub: &'a str,
    /// `@vN...` suffix, or empty.
    pub version: &'a str,
}

impl<'a> GoGetRequest<'a> {
    /// Split `/<name>[@version]` or `/<name>/<sub>[@version]`.
    ///
    /// The version suffix is kept only when it looks like a module version
    /// (`@v` followed by a digit); anything else after `@` is dropped.
    #[must_use]
    pub fn parse(name: &'a str, sub: &'a str) -> Self {
        let (name, sub, version) = if sub.is_empty() {
            match name.find('@') {
                Some(at) if at > 0 => (&name[..at], sub, &name[at..]),
                _ => (name, sub, ""),
            }
        } else {
            match sub.find('@') {
                Some(at) => (name, &sub[..at], &sub[at..]),
                None => (name, sub, ""),
            }
        };

        Self {
            name,
            sub,
            version: if is_module_version(version) { version } else { "" },
        }
    }
}

fn is_module_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() >= 3 && bytes[1] == b'v' && bytes[2].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn gold() -> GoGetPackage {
        GoGetPackage {
            root_package: "go101.org/gold".to_owned(),
            source_repo: "go101/gold".to_owned(),
            doc_website: Some("https://pkg.go.dev/".to_owned()),
        }
    }

    #[test]
    fn test_parse_root() {
        assert_eq!(
            GoGetRequest::parse("gold", ""),
            GoGetRequest {
                name: "gold",
                sub: "",
                version: ""
            }
        );
    }

    #[test]
    fn test_parse_root_with_version() {
        let request = GoGetRequest::parse("gold@v0.3.6", "");

        assert_eq!(request.name, "gold");
        assert_eq!(request.version, "@v0.3.6");
    }

    #[test]
    fn test_parse_sub_with_version() {
        let request = GoGetRequest::parse("tmd", "cmd/tmd@v1.0.0");

        assert_eq!(request.sub, "cmd/tmd");
        assert_eq!(request.version, "@v1.0.0");
    }

    #[test]
    fn test_parse_drops_non_module_versions() {
        assert_eq!(GoGetRequest::parse("gold@latest", "").version, "");
        assert_eq!(GoGetRequest::parse("gold@v", "").version, "");
        assert_eq!(GoGetRequest::parse("gold", "x@master").version, "");
        assert_eq!(GoGetRequest::parse("gold", "x@master").sub, "x");
    }

    #[test]
    fn test_parse_leading_at_is_not_a_version() {
        let request = GoGetRequest::parse("@v1", "");

        assert_eq!(request.name, "@v1");
        assert_eq!(request.version, "");
    }

    #[test]
    fn test_page_with_doc_website() {
        let page = gold().page("", "@v0.3.6");

        assert_eq!(page.source_repo, "https://github.com/go101/gold");
        assert_eq!(page.doc_website, "https://pkg.go.dev/go101.org/gold/@v0.3.6");
    }

    #[test]
    fn test_page_without_doc_website() {
        let package = GoGetPackage {
            doc_website: None,
            ..gold()
        };

        assert_eq!(package.page("", "").doc_website, "https://github.com/go101/gold");
        assert_eq!(
            package.page("sub", "").doc_website,
            "https://github.com/go101/gold/tree/master/sub"
        );
    }
}
