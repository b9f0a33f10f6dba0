//! `lectern.toml` loading.
//!
//! The file is looked up in the working directory and then in each parent.
//! Every section is optional; a project without a config file runs on
//! defaults rooted at the working directory. Command-line flags
//! ([`CliSettings`]) win over file values.
//!
//! A few string fields accept `${VAR}` and `${VAR:-fallback}` references to
//! the environment. An unset variable without a fallback is an error.
//!
//! Fields with expansion:
//! - `server.host`
//! - `site.root`
//! - `goget.<name>.doc_website`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Values given on the command line. `None` keeps the file value.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
    pub theme: Option<String>,
}

const CONFIG_FILE: &str = "lectern.toml";

/// Everything `lectern.toml` can say, plus the resolved site paths.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// `[site]` as written; `root` is relative to the config file.
    site: SiteConfigRaw,
    /// Background repository refresh.
    pub updater: UpdaterConfig,
    /// Moved articles.
    pub redirects: Vec<RedirectConfig>,
    /// Go vanity import roots by name.
    pub goget: BTreeMap<String, GoGetConfig>,

    #[serde(skip)]
    pub site_resolved: SiteSettings,
    /// The file this configuration came from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// `[server]`: listen address and request timeout.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Blanket timeout applied to every request.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 55555,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    root: Option<String>,
    theme: Option<String>,
    index_article: Option<String>,
    default_page: Option<String>,
    max_age_secs: Option<u64>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    /// Project root holding `pages/` and `web/`.
    pub root: PathBuf,
    /// Theme passed to page templates.
    pub theme: String,
    /// Root article of every group.
    pub index_article: String,
    /// Target of `/` and of not-found redirects.
    pub default_page: String,
    /// `Cache-Control` max-age of rendered pages in production.
    pub max_age_secs: u64,
}

impl SiteSettings {
    fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            theme: "dark".to_owned(),
            index_article: "101.html".to_owned(),
            default_page: "/article/101.html".to_owned(),
            max_age_secs: 50_000,
        }
    }

    /// Article groups directory (`pages/`).
    #[must_use]
    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    /// Page templates directory (`web/templates/`).
    #[must_use]
    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("web").join("templates")
    }

    /// Static assets directory (`web/static/`).
    #[must_use]
    pub fn static_dir(&self) -> PathBuf {
        self.root.join("web").join("static")
    }

    /// Static site output directory (`generated/`).
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("generated")
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self::with_root(PathBuf::from("."))
    }
}

/// Background repository refresh configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Whether to run `git pull` periodically.
    pub enabled: bool,
    /// Delay before the first pull.
    pub initial_delay_secs: u64,
    /// Delay between pulls.
    pub interval_secs: u64,
}

impl UpdaterConfig {
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay_secs: 30,
            interval_secs: 24 * 60 * 60,
        }
    }
}

/// A moved article, as `group/file` pairs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RedirectConfig {
    pub from: String,
    pub to: String,
}

/// A go-get vanity import root.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GoGetConfig {
    /// Import path, e.g. `go101.org/gold`.
    pub root_package: String,
    /// GitHub `owner/repo`.
    pub source_repo: String,
    /// Documentation site prefix, e.g. `https://pkg.go.dev/`.
    #[serde(default)]
    pub doc_website: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config file at {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid lectern.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Validation(String),
    /// A `${VAR}` reference in `field` could not be expanded.
    #[error("{field}: {message}")]
    EnvVar { field: String, message: String },
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation(message)
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    match value {
        "" => Err(invalid(format!("{field} is empty"))),
        _ => Ok(()),
    }
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    let scheme_ok = ["http://", "https://"].iter().any(|s| url.starts_with(s));
    if scheme_ok {
        Ok(())
    } else {
        Err(invalid(format!("{field} is not an http(s) URL: {url:?}")))
    }
}

/// Require a `group/file` article address.
fn require_article_path(value: &str, field: &str) -> Result<(), ConfigError> {
    let valid = value
        .split_once('/')
        .is_some_and(|(group, file)| !group.is_empty() && !file.is_empty() && !file.contains('/'));
    if valid {
        Ok(())
    } else {
        Err(invalid(format!("{field} must have the form group/file, got {value:?}")))
    }
}

impl Config {
    /// Load `config_path`, or the nearest `lectern.toml` above the working
    /// directory, then apply `cli`.
    ///
    /// Without an explicit path and without a discoverable file the defaults
    /// are used, rooted at the working directory.
    ///
    /// # Errors
    ///
    /// Fails when an explicit `config_path` is missing, or when the file
    /// cannot be read, parsed, expanded or validated.
    pub fn load(config_path: Option<&Path>, cli: Option<&CliSettings>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path)?,
            None => match Self::find_config_file() {
                Some(found) => Self::from_file(&found)?,
                None => Self::default_with_base(&std::env::current_dir().unwrap_or_default()),
            },
        };
        if let Some(cli) = cli {
            config.override_with(cli);
        }
        Ok(config)
    }

    fn override_with(&mut self, cli: &CliSettings) {
        let CliSettings {
            host,
            port,
            root,
            theme,
        } = cli;
        if let Some(host) = host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = *port {
            self.server.port = port;
        }
        if let Some(root) = root {
            self.site_resolved.root.clone_from(root);
        }
        if let Some(theme) = theme {
            self.site_resolved.theme.clone_from(theme);
        }
    }

    fn find_config_file() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        cwd.ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Default configuration rooted at `base`.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            site: SiteConfigRaw::default(),
            updater: UpdaterConfig::default(),
            redirects: Vec::new(),
            goget: BTreeMap::new(),
            site_resolved: SiteSettings::with_root(base.to_path_buf()),
            config_path: None,
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(&std::fs::read_to_string(path)?)?;
        config.expand_env()?;
        config.resolve_paths(path.parent().unwrap_or(Path::new(".")));
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and formats. [`Config::load`] runs this for files.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_site()?;
        self.validate_updater()?;
        self.validate_redirects()?;
        self.validate_goget()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        require_non_empty(&server.host, "server.host")?;
        match (server.port, server.request_timeout_secs) {
            (0, _) => Err(invalid("server.port is 0".to_owned())),
            (_, 0) => Err(invalid("server.request_timeout_secs is 0".to_owned())),
            _ => Ok(()),
        }
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        let site = &self.site_resolved;
        require_non_empty(&site.theme, "site.theme")?;
        require_non_empty(&site.index_article, "site.index_article")?;
        if !site.default_page.starts_with('/') {
            return Err(invalid("site.default_page must start with /".to_owned()));
        }
        Ok(())
    }

    fn validate_updater(&self) -> Result<(), ConfigError> {
        if self.updater.enabled && self.updater.interval_secs == 0 {
            return Err(invalid("updater.interval_secs is 0".to_owned()));
        }
        Ok(())
    }

    fn validate_redirects(&self) -> Result<(), ConfigError> {
        for (i, redirect) in self.redirects.iter().enumerate() {
            require_article_path(&redirect.from, &format!("redirects[{i}].from"))?;
            require_article_path(&redirect.to, &format!("redirects[{i}].to"))?;
        }
        Ok(())
    }

    fn validate_goget(&self) -> Result<(), ConfigError> {
        for (name, package) in &self.goget {
            require_non_empty(&package.root_package, &format!("goget.{name}.root_package"))?;
            require_non_empty(&package.source_repo, &format!("goget.{name}.source_repo"))?;
            if let Some(doc) = &package.doc_website {
                require_http_url(doc, &format!("goget.{name}.doc_website"))?;
            }
        }
        Ok(())
    }

    fn expand_env(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.site.root = self
            .site
            .root
            .as_deref()
            .map(|root| expand::expand_env(root, "site.root"))
            .transpose()?;
        for (name, package) in &mut self.goget {
            let field = format!("goget.{name}.doc_website");
            package.doc_website = package
                .doc_website
                .as_deref()
                .map(|doc| expand::expand_env(doc, &field))
                .transpose()?;
        }
        Ok(())
    }

    /// Resolve the project root relative to the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let mut site = SiteSettings::with_root(config_dir.join(self.site.root.as_deref().unwrap_or(".")));
        if let Some(theme) = &self.site.theme {
            site.theme.clone_from(theme);
        }
        if let Some(index_article) = &self.site.index_article {
            site.index_article.clone_from(index_article);
        }
        if let Some(default_page) = &self.site.default_page {
            site.default_page.clone_from(default_page);
        }
        if let Some(max_age_secs) = self.site.max_age_secs {
            site.max_age_secs = max_age_secs;
        }
        self.site_resolved = site;
    }
}
