//! Site structure and page rendering.
//!
//! [`Site`] owns everything a request needs to turn a URL into bytes: the
//! page groups discovered at startup, the template registry and two page caches
//! (articles and go-get pages). It holds no mode flag of its own; every render
//! call says whether it serves a local development request.
//!
//! # Caching
//!
//! Production renders are stored in the page cache, including "not found"
//! results (as empty pages). Local renders neither read nor write the cache,
//! so a developer always sees the current files. Failed renders are never
//! stored either.
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use lectern_site::{Rendered, Site, SiteConfig, TemplateRegistry};
//! use lectern_storage::FsStorage;
//!
//! let storage = Arc::new(FsStorage::new(PathBuf::from("pages")));
//! let templates = TemplateRegistry::new(PathBuf::from("web/templates"));
//! let site = Site::new(storage, templates, SiteConfig::default())?;
//!
//! match site.render_article("fundamentals", "101.html", false) {
//!     Rendered::Page(html) => { /* write html */ }
//!     Rendered::NotFound => { /* redirect */ }
//!     Rendered::Failed(message) => { /* show message */ }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytes::Bytes;
use lectern_cache::{CacheKey, PageCache};
use lectern_storage::{Storage, StorageError};
use minijinja::{Value, context};

use crate::article::Article;
use crate::goget::{GoGetPackage, GoGetRequest};
use crate::group::{ARTICLE_GROUP, ARTICLE_SEGMENT, PageGroup, WEBSITE_GROUP, url_prefix};
use crate::index::{disable_self_link, index_links, print_index, web_index};
use crate::redirects::{ArticleRef, RedirectTable};
use crate::templates::{TemplateError, TemplateKind, TemplateRegistry};

/// Prefix of composite book items, e.g. `book101`.
const BOOK_PREFIX: &str = "book";

/// Configuration for [`Site`].
#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Theme name passed to every template.
    pub theme: String,
    /// Root article of every group, holding its index.
    pub index_article: String,
    /// Moved articles.
    pub redirects: RedirectTable,
    /// Go vanity import roots by name.
    pub packages: HashMap<String, GoGetPackage>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_owned(),
            index_article: "101.html".to_owned(),
            redirects: RedirectTable::new(),
            packages: HashMap::new(),
        }
    }
}

/// Error building a [`Site`].
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Page groups could not be discovered.
    #[error("failed to discover page groups: {0}")]
    Storage(#[from] StorageError),
    /// A template failed to load at startup.
    #[error("failed to load page templates: {0}")]
    Template(#[from] TemplateError),
}

/// Error returned when page rendering fails.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Source article does not exist.
    #[error("page not found: {0}")]
    NotFound(String),
    /// Source article could not be read.
    #[error(transparent)]
    Storage(StorageError),
    /// Template failed to load or execute.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// Root article of a book has no index.
    #[error("no index found in book root {0}")]
    MissingIndex(String),
}

/// Outcome of a render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rendered {
    /// Final page bytes.
    Page(Bytes),
    /// The page does not exist.
    NotFound,
    /// Rendering failed; carries the error text.
    Failed(String),
}

impl Rendered {
    fn from_cached(page: Bytes) -> Self {
        if page.is_empty() {
            Self::NotFound
        } else {
            Self::Page(page)
        }
    }
}

/// Page groups, templates and caches of one content tree.
pub struct Site {
    storage: Arc<dyn Storage>,
    groups: BTreeMap<String, PageGroup>,
    templates: TemplateRegistry,
    articles: PageCache,
    goget_pages: PageCache,
    config: SiteConfig,
}

impl Site {
    /// Load templates and discover page groups.
    ///
    /// A group whose root article is missing or has no index gets an empty
    /// index.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Template`] if any template fails to parse and
    /// [`SiteError::Storage`] if the content root cannot be listed.
    pub fn new(
        storage: Arc<dyn Storage>,
        templates: TemplateRegistry,
        config: SiteConfig,
    ) -> Result<Self, SiteError> {
        templates.preload()?;

        let groups: BTreeMap<String, PageGroup> = storage
            .groups()?
            .into_iter()
            .map(|name| {
                let group = load_group(storage.as_ref(), &name, &config.index_article);
                (name, group)
            })
            .collect();
        tracing::info!(
            groups = groups.len(),
            redirects = config.redirects.len(),
            packages = config.packages.len(),
            "site loaded"
        );

        Ok(Self {
            storage,
            groups,
            templates,
            articles: PageCache::new(),
            goget_pages: PageCache::new(),
            config,
        })
    }

    /// All page groups, sorted by name.
    pub fn groups(&self) -> impl Iterator<Item = &PageGroup> {
        self.groups.values()
    }

    /// Group by directory name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&PageGroup> {
        self.groups.get(name)
    }

    /// Group addressed by the first URL segment.
    ///
    /// `article` is the legacy alias of the fundamentals group. The website
    /// group has no segment of its own.
    #[must_use]
    pub fn resolve_group(&self, segment: &str) -> Option<&PageGroup> {
        let name = if segment == ARTICLE_SEGMENT {
            ARTICLE_GROUP
        } else {
            segment
        };
        self.groups.get(name).filter(|group| group.name != WEBSITE_GROUP)
    }

    /// Storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Template registry.
    #[must_use]
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Cache of article, redirect and book pages.
    #[must_use]
    pub fn article_cache(&self) -> &PageCache {
        &self.articles
    }

    /// Cache of go-get pages.
    #[must_use]
    pub fn goget_cache(&self) -> &PageCache {
        &self.goget_pages
    }

    /// Drop every parsed template and cached page.
    pub fn invalidate(&self) {
        self.templates.unload();
        self.articles.clear();
        self.goget_pages.clear();
    }

    /// Render one article (or the redirect stub of a moved article).
    pub fn render_article(&self, group: &str, file: &str, is_local: bool) -> Rendered {
        let file = file.to_lowercase();
        let key = CacheKey::page(group, &file);
        if let Some(cached) = lookup(&self.articles, &key, is_local) {
            return cached;
        }

        let result = match self.config.redirects.lookup(group, &file) {
            Some(target) => self.build_redirect(target, is_local),
            None => self.build_article(group, &file, is_local),
        };
        finish(&self.articles, key, result, is_local)
    }

    /// Render a composite print page, e.g. target `pdf`, item `book101`.
    pub fn render_print(&self, group: &str, target: &str, item: &str, is_local: bool) -> Rendered {
        let item = item.to_lowercase();
        let key = CacheKey::page(group, &format!("{target}-{item}"));
        if let Some(cached) = lookup(&self.articles, &key, is_local) {
            return cached;
        }

        let result = self.build_print(group, target, &item, is_local);
        finish(&self.articles, key, result, is_local)
    }

    /// Render a go-get page, or `None` if the name is not a configured root.
    pub fn render_goget(&self, request: &GoGetRequest<'_>, is_local: bool) -> Option<Rendered> {
        let package = self.config.packages.get(request.name)?;
        let key = CacheKey::versioned(request.name, request.sub, request.version);
        if let Some(cached) = lookup(&self.goget_pages, &key, is_local) {
            return Some(cached);
        }

        let result = self
            .templates
            .get(TemplateKind::GoGet, !is_local)
            .and_then(|template| template.render(package.page(request.sub, request.version)))
            .map_err(RenderError::from);
        Some(finish(&self.goget_pages, key, result, is_local))
    }

    fn read_article(&self, group: &str, file: &str) -> Result<Article, RenderError> {
        match self.storage.read(group, file) {
            Ok(raw) => Ok(Article::parse(file, &raw)),
            Err(err) if err.is_not_found() => Err(RenderError::NotFound(format!("{group}/{file}"))),
            Err(err) => Err(RenderError::Storage(err)),
        }
    }

    fn build_article(&self, group: &str, file: &str, is_local: bool) -> Result<String, RenderError> {
        let article = self.read_article(group, file)?;
        let index = self
            .groups
            .get(group)
            .map(|g| disable_self_link(&g.index, file))
            .unwrap_or_default();

        let template = self.templates.get(TemplateKind::Article, !is_local)?;
        let file_stem = article.file_stem().to_owned();
        let Article {
            file,
            title,
            title_plain,
            body,
        } = article;
        Ok(template.render(context! {
            group => group,
            file => file,
            file_stem => file_stem,
            title => Value::from_safe_string(title),
            title_plain => title_plain,
            content => Value::from_safe_string(body),
            index => Value::from_safe_string(index),
            is_local_server => is_local,
            theme => &self.config.theme,
        })?)
    }

    fn build_redirect(&self, target: &ArticleRef, is_local: bool) -> Result<String, RenderError> {
        let redirect_page = format!("{}/{}", url_prefix(&target.group), target.file);
        let template = self.templates.get(TemplateKind::Redirect, !is_local)?;
        Ok(template.render(context! {
            redirect_page => redirect_page,
            is_local_server => is_local,
        })?)
    }

    fn build_print(
        &self,
        group: &str,
        target: &str,
        item: &str,
        is_local: bool,
    ) -> Result<String, RenderError> {
        let root = item
            .strip_prefix(BOOK_PREFIX)
            .filter(|root| !root.is_empty())
            .ok_or_else(|| RenderError::NotFound(format!("{group}/{target}-{item}")))?;
        let root_file = format!("{root}.html");
        let mut root_article = self.read_article(group, &root_file)?;
        let index = print_index(&root_article.body)
            .ok_or_else(|| RenderError::MissingIndex(format!("{group}/{root_file}")))?;
        let links: Vec<String> = index_links(&index).into_iter().map(str::to_owned).collect();
        root_article.body = index;

        let mut articles = Vec::with_capacity(links.len() + 1);
        articles.push(book_chapter(root_article));
        for link in &links {
            match self.read_article(group, link) {
                Ok(article) => articles.push(book_chapter(article)),
                Err(err) => {
                    tracing::warn!(group = %group, file = %link, error = %err, "skipping book chapter");
                }
            }
        }

        let template = self.templates.get(TemplateKind::PrintBook, !is_local)?;
        Ok(template.render(context! {
            articles => Value::from(articles),
            print_target => target,
            is_local_server => is_local,
            theme => &self.config.theme,
        })?)
    }
}

fn book_chapter(article: Article) -> Value {
    let file_stem = article.file_stem().to_owned();
    context! {
        file => article.file,
        file_stem => file_stem,
        title => Value::from_safe_string(article.title),
        title_plain => article.title_plain,
        content => Value::from_safe_string(article.body),
    }
}

fn load_group(storage: &dyn Storage, name: &str, index_article: &str) -> PageGroup {
    let index = match storage.read(name, index_article) {
        Ok(raw) => web_index(&String::from_utf8_lossy(&raw)),
        Err(err) if err.is_not_found() => String::new(),
        Err(err) => {
            tracing::warn!(group = %name, error = %err, "failed to read group index");
            String::new()
        }
    };
    if index.is_empty() {
        tracing::debug!(group = %name, "group has no index");
    }
    PageGroup::new(name, index, storage.resource_dir(name))
}

/// Cached page for a production request.
///
/// Local requests never read the cache: a production render that finished
/// after the switch to local mode may have stored a page built from old files.
fn lookup(cache: &PageCache, key: &CacheKey, is_local: bool) -> Option<Rendered> {
    if is_local {
        return None;
    }
    cache.get(key).map(Rendered::from_cached)
}

fn finish(
    cache: &PageCache,
    key: CacheKey,
    result: Result<String, RenderError>,
    is_local: bool,
) -> Rendered {
    match result {
        Ok(page) if !page.is_empty() => {
            let page = Bytes::from(page);
            if !is_local {
                cache.set(key, page.clone());
            }
            Rendered::Page(page)
        }
        Ok(_) | Err(RenderError::NotFound(_)) => {
            tracing::warn!(page = %key, "page not found");
            if !is_local {
                cache.set_not_found(key);
            }
            Rendered::NotFound
        }
        Err(err) => {
            tracing::error!(page = %key, error = %err, "failed to render page");
            Rendered::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Mutex, mpsc};
    use std::thread;

    use lectern_storage::{FsStorage, MockStorage, StorageErrorKind};
    use pretty_assertions::assert_eq;

    use super::*;

    const ROOT: &str = r#"<h1>Go 101</h1>
<!-- index starts (don't remove) -->
<ul>
<li><a class="index" href="101.html">Contents</a></li>
<li><a class="index" href="basic.html">Basics</a></li>
</ul>
<!-- index ends (don't remove) -->"#;

    fn templates() -> TemplateRegistry {
        TemplateRegistry::from_sources([
            (
                TemplateKind::Article,
                "<title>{{ title_plain }}</title>{{ title }}|{{ index }}|{{ content }}|{{ theme }}|{{ is_local_server }}"
                    .to_owned(),
            ),
            (
                TemplateKind::PrintBook,
                "{{ print_target }}:{% for a in articles %}[{{ a.file }}]{% endfor %}".to_owned(),
            ),
            (
                TemplateKind::GoGet,
                "{{ root_package|safe }} git {{ source_repo|safe }} {{ doc_website|safe }}".to_owned(),
            ),
            (
                TemplateKind::Redirect,
                "<meta http-equiv=\"refresh\" content=\"0; url={{ redirect_page|safe }}\">".to_owned(),
            ),
        ])
    }

    fn storage() -> Arc<MockStorage> {
        Arc::new(
            MockStorage::new()
                .with_article("fundamentals", "101.html", ROOT)
                .with_article("fundamentals", "basic.html", "<h1>Basics</h1><p>types</p>")
                .with_group("website"),
        )
    }

    fn site_with(storage: Arc<MockStorage>, config: SiteConfig) -> Site {
        Site::new(storage, templates(), config).unwrap()
    }

    fn site(storage: Arc<MockStorage>) -> Site {
        site_with(storage, SiteConfig::default())
    }

    fn page_text(rendered: Rendered) -> String {
        match rendered {
            Rendered::Page(page) => String::from_utf8(page.to_vec()).unwrap(),
            other => panic!("expected a page, got {other:?}"),
        }
    }

    #[test]
    fn test_new_discovers_groups() {
        let site = site(storage());

        let names: Vec<&str> = site.groups().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["fundamentals", "website"]);
        assert!(site.group("fundamentals").unwrap().index.contains("basic.html"));
        assert_eq!(site.group("website").unwrap().index, "");
        assert_eq!(site.templates().loaded_count(), TemplateKind::ALL.len());
    }

    #[test]
    fn test_new_fails_on_template_error() {
        let templates = TemplateRegistry::from_sources([]);

        let result = Site::new(storage(), templates, SiteConfig::default());

        assert!(matches!(result, Err(SiteError::Template(_))));
    }

    #[test]
    fn test_new_fails_without_content_root() {
        let storage = Arc::new(FsStorage::new(PathBuf::from("/nonexistent/lectern/pages")));

        let result = Site::new(storage, templates(), SiteConfig::default());

        assert!(matches!(result, Err(SiteError::Storage(_))));
    }

    #[test]
    fn test_resolve_group() {
        let site = site(storage());

        assert_eq!(site.resolve_group("article").unwrap().name, "fundamentals");
        assert_eq!(site.resolve_group("fundamentals").unwrap().name, "fundamentals");
        assert!(site.resolve_group("website").is_none());
        assert!(site.resolve_group("gold").is_none());
    }

    #[test]
    fn test_render_article() {
        let site = site(storage());

        let html = page_text(site.render_article("fundamentals", "basic.html", false));

        assert!(html.starts_with("<title>Basics</title><h1>Basics</h1>|"));
        assert!(html.contains(r#"<b class="index" id="i-basic.html">Basics</b>"#));
        assert!(html.contains(r#"<a class="index" href="101.html">Contents</a>"#));
        assert!(html.ends_with("|<p>types</p>|dark|false"));
    }

    #[test]
    fn test_production_render_is_cached() {
        let storage = storage();
        let site = site(Arc::clone(&storage));

        let first = site.render_article("fundamentals", "basic.html", false);
        let second = site.render_article("fundamentals", "basic.html", false);

        assert_eq!(first, second);
        assert_eq!(storage.read_count("fundamentals", "basic.html"), 1);
    }

    #[test]
    fn test_file_name_case_shares_cache_entry() {
        let storage = storage();
        let site = site(Arc::clone(&storage));

        let upper = site.render_article("fundamentals", "BASIC.HTML", false);
        let lower = site.render_article("fundamentals", "basic.html", false);

        assert_eq!(upper, lower);
        assert_eq!(storage.read_count("fundamentals", "basic.html"), 1);
        assert_eq!(site.article_cache().len(), 1);
    }

    #[test]
    fn test_local_render_is_never_cached() {
        let storage = storage();
        let site = site(Arc::clone(&storage));

        site.render_article("fundamentals", "basic.html", true);
        storage.set_article("fundamentals", "basic.html", "<h1>Changed</h1>");
        let html = page_text(site.render_article("fundamentals", "basic.html", true));

        assert!(html.starts_with("<title>Changed</title>"));
        assert!(html.ends_with("|true"));
        assert_eq!(storage.read_count("fundamentals", "basic.html"), 2);
        assert!(site.article_cache().is_empty());
    }

    #[test]
    fn test_not_found_is_cached_as_empty_page() {
        let storage = storage();
        let site = site(Arc::clone(&storage));

        assert_eq!(site.render_article("fundamentals", "nope.html", false), Rendered::NotFound);
        assert_eq!(site.render_article("fundamentals", "nope.html", false), Rendered::NotFound);

        assert_eq!(storage.read_count("fundamentals", "nope.html"), 1);
        let cached = site
            .article_cache()
            .get(&CacheKey::page("fundamentals", "nope.html"));
        assert_eq!(cached, Some(Bytes::new()));
    }

    #[test]
    fn test_storage_failure_is_shown_and_not_cached() {
        let storage = Arc::new(
            MockStorage::new()
                .with_article("fundamentals", "101.html", ROOT)
                .with_article("fundamentals", "locked.html", "x")
                .with_failure("fundamentals", "locked.html", StorageErrorKind::PermissionDenied),
        );
        let site = site(Arc::clone(&storage));

        let rendered = site.render_article("fundamentals", "locked.html", false);
        site.render_article("fundamentals", "locked.html", false);

        let Rendered::Failed(message) = rendered else {
            panic!("expected failure, got {rendered:?}");
        };
        assert!(message.contains("permission denied"));
        assert_eq!(storage.read_count("fundamentals", "locked.html"), 2);
        assert!(site.article_cache().is_empty());
    }

    #[test]
    fn test_redirect_stub() {
        let mut config = SiteConfig::default();
        config.redirects.insert(
            ArticleRef::new("fundamentals", "go-sdk.html"),
            ArticleRef::new("fundamentals", "go-toolchain.html"),
        );
        let storage = storage();
        let site = site_with(Arc::clone(&storage), config);

        let html = page_text(site.render_article("fundamentals", "Go-SDK.html", false));

        assert_eq!(
            html,
            r#"<meta http-equiv="refresh" content="0; url=/article/go-toolchain.html">"#
        );
        assert_eq!(storage.read_count("fundamentals", "go-sdk.html"), 0);
        assert_eq!(site.article_cache().len(), 1);
    }

    #[test]
    fn test_print_book_skips_missing_chapters() {
        let index: String = ["a", "b", "missing", "c", "d"]
            .iter()
            .map(|name| format!("<li><a class=\"index\" href=\"{name}.html\">{name}</a></li>\n"))
            .collect();
        let root = format!(
            "<h1>Book</h1>\n<!-- index starts (don't remove) -->\n{index}<!-- index ends (don't remove) -->"
        );
        let mut storage = MockStorage::new().with_article("blog", "101.html", root);
        for name in ["a", "b", "c", "d"] {
            storage = storage.with_article("blog", &format!("{name}.html"), format!("<h1>{name}</h1>"));
        }
        let site = site(Arc::new(storage));

        let html = page_text(site.render_print("blog", "pdf", "book101", true));

        assert_eq!(html, "pdf:[101.html][a.html][b.html][c.html][d.html]");
    }

    #[test]
    fn test_print_book_strips_web_only_lines() {
        let root = "<h1>Book</h1>\n<!-- index starts (don't remove) -->\n\
            <li><a class=\"index\" href=\"a.html\">a</a></li>\n\
            <li><a class=\"index\" href=\"web.html\">web</a> (to remove)</li>\n\
            <!-- index ends (don't remove) -->";
        let storage = Arc::new(
            MockStorage::new()
                .with_article("blog", "101.html", root)
                .with_article("blog", "a.html", "<h1>a</h1>")
                .with_article("blog", "web.html", "<h1>web</h1>"),
        );
        let site = site(Arc::clone(&storage));

        let html = page_text(site.render_print("blog", "print", "book101", true));

        assert_eq!(html, "print:[101.html][a.html]");
        assert_eq!(storage.read_count("blog", "web.html"), 0);
    }

    #[test]
    fn test_print_unknown_item() {
        let site = site(storage());

        assert_eq!(site.render_print("fundamentals", "pdf", "nothing", true), Rendered::NotFound);
        assert_eq!(site.render_print("fundamentals", "pdf", "book", true), Rendered::NotFound);
        assert_eq!(site.render_print("fundamentals", "pdf", "book999", true), Rendered::NotFound);
    }

    #[test]
    fn test_print_without_index_fails() {
        let storage = Arc::new(MockStorage::new().with_article("blog", "7.html", "<h1>No index</h1>"));
        let site = site(storage);

        let rendered = site.render_print("blog", "pdf", "book7", true);

        let Rendered::Failed(message) = rendered else {
            panic!("expected failure, got {rendered:?}");
        };
        assert!(message.contains("no index found in book root blog/7.html"));
    }

    #[test]
    fn test_goget_page() {
        let mut config = SiteConfig::default();
        config.packages.insert(
            "gold".to_owned(),
            GoGetPackage {
                root_package: "go101.org/gold".to_owned(),
                source_repo: "go101/gold".to_owned(),
                doc_website: Some("https://pkg.go.dev/".to_owned()),
            },
        );
        let site = site_with(storage(), config);

        let request = GoGetRequest::parse("gold@v0.3.6", "");
        let html = page_text(site.render_goget(&request, false).unwrap());

        assert_eq!(
            html,
            "go101.org/gold git https://github.com/go101/gold https://pkg.go.dev/go101.org/gold/@v0.3.6"
        );
        assert_eq!(site.goget_cache().len(), 1);

        site.render_goget(&GoGetRequest::parse("gold", ""), false);
        assert_eq!(site.goget_cache().len(), 2);
    }

    #[test]
    fn test_goget_unknown_name() {
        let site = site(storage());

        assert_eq!(site.render_goget(&GoGetRequest::parse("nope", ""), false), None);
        assert!(site.goget_cache().is_empty());
    }

    #[test]
    fn test_invalidate() {
        let site = site(storage());
        site.render_article("fundamentals", "basic.html", false);
        assert_eq!(site.article_cache().len(), 1);

        site.invalidate();

        assert!(site.article_cache().is_empty());
        assert!(site.goget_cache().is_empty());
        assert_eq!(site.templates().loaded_count(), 0);
    }

    /// Storage that holds the first read of `slow.html` until released.
    struct GatedStorage {
        slow: Mutex<String>,
        entered: Mutex<Option<mpsc::Sender<()>>>,
        release: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl Storage for GatedStorage {
        fn groups(&self) -> Result<Vec<String>, StorageError> {
            Ok(vec!["fundamentals".to_owned()])
        }

        fn read(&self, group: &str, file: &str) -> Result<Vec<u8>, StorageError> {
            if file != "slow.html" {
                return Err(StorageError::not_found(format!("{group}/{file}")));
            }
            let content = self.slow.lock().unwrap().clone();
            if let Some(entered) = self.entered.lock().unwrap().take() {
                entered.send(()).unwrap();
                let release = self.release.lock().unwrap().take().unwrap();
                release.recv().unwrap();
            }
            Ok(content.into_bytes())
        }

        fn list(&self, _group: &str) -> Result<Vec<String>, StorageError> {
            Ok(vec!["slow.html".to_owned()])
        }
    }

    #[test]
    fn test_late_production_render_is_not_served_locally() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let storage = Arc::new(GatedStorage {
            slow: Mutex::new("<h1>Slow</h1><p>old</p>".to_owned()),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        let site = Site::new(Arc::clone(&storage) as Arc<dyn Storage>, templates(), SiteConfig::default());
        let site = Arc::new(site.unwrap());

        let production = {
            let site = Arc::clone(&site);
            thread::spawn(move || site.render_article("fundamentals", "slow.html", false))
        };
        entered_rx.recv().unwrap();
        site.invalidate();
        release_tx.send(()).unwrap();
        production.join().unwrap();

        *storage.slow.lock().unwrap() = "<h1>Slow</h1><p>new</p>".to_owned();
        let html = page_text(site.render_article("fundamentals", "slow.html", true));

        assert!(html.contains("<p>new</p>"), "{html}");
        assert!(html.ends_with("|true"));
    }

    #[test]
    fn test_concurrent_cold_renders_agree() {
        let storage = storage();
        let site = Arc::new(site(Arc::clone(&storage)));

        let pages: Vec<Rendered> = (0..8)
            .map(|_| {
                let site = Arc::clone(&site);
                thread::spawn(move || site.render_article("fundamentals", "basic.html", false))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert!(pages.windows(2).all(|pair| pair[0] == pair[1]));
        let reads = storage.read_count("fundamentals", "basic.html");
        assert!((1..=8).contains(&reads));
        assert_eq!(site.article_cache().len(), 1);
    }
}
