//! HTTP server for the lectern content engine.
//!
//! This crate provides the axum server in front of [`lectern_site::Site`]:
//! - Articles under their group prefix, with legacy redirects
//! - Composite print books in local mode
//! - Go vanity import pages for configured roots
//! - Theme assets and group resources from disk
//!
//! # Server Mode
//!
//! The server starts in production mode, where rendered pages are cached and
//! served with a long `Cache-Control`. The first request addressed to
//! `localhost` switches it to local mode: caches are dropped and every page
//! is rendered from source. A later request under another host name switches
//! it back.
//!
//! # Quick Start
//!
//! ```ignore
//! use lectern_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = lectern_config::Config::load(None, None).unwrap();
//!     run_server(ServerConfig::from_config(&config)).await.unwrap();
//! }
//! ```

mod app;
mod handlers;
mod middleware;
mod mode;
mod state;
mod static_files;
mod updater;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use lectern_site::{ArticleRef, GoGetPackage, RedirectTable, Site, SiteConfig, SiteError, TemplateRegistry};
use lectern_storage::FsStorage;
use tokio::net::TcpListener;

pub use mode::{ServerMode, is_local_host};
pub use updater::UpdaterConfig;

use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Blanket timeout of every request.
    pub request_timeout: Duration,
    /// Page groups directory.
    pub pages_dir: PathBuf,
    /// Page templates directory.
    pub templates_dir: PathBuf,
    /// Theme assets directory, served under `/static/`.
    pub static_dir: PathBuf,
    /// Target of `/` and of not-found redirects.
    pub default_page: String,
    /// `Cache-Control` max-age of pages served in production mode.
    pub max_age_secs: u64,
    /// Rendering settings.
    pub site: SiteConfig,
    /// Background `git pull` schedule (`None` disables it).
    pub updater: Option<UpdaterConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 55555,
            request_timeout: Duration::from_secs(10),
            pages_dir: PathBuf::from("pages"),
            templates_dir: PathBuf::from("web/templates"),
            static_dir: PathBuf::from("web/static"),
            default_page: "/article/101.html".to_owned(),
            max_age_secs: 50_000,
            site: SiteConfig::default(),
            updater: None,
        }
    }
}

impl ServerConfig {
    /// Create server configuration from a loaded config file.
    #[must_use]
    pub fn from_config(config: &lectern_config::Config) -> Self {
        let site = &config.site_resolved;

        let redirects: RedirectTable = config
            .redirects
            .iter()
            .filter_map(|redirect| {
                let entry = ArticleRef::parse(&redirect.from).zip(ArticleRef::parse(&redirect.to));
                if entry.is_none() {
                    tracing::warn!(from = %redirect.from, to = %redirect.to, "ignoring malformed redirect");
                }
                entry
            })
            .collect();

        let packages = config
            .goget
            .iter()
            .map(|(name, package)| {
                let package = GoGetPackage {
                    root_package: package.root_package.clone(),
                    source_repo: package.source_repo.clone(),
                    doc_website: package.doc_website.clone(),
                };
                (name.clone(), package)
            })
            .collect();

        let updater = config.updater.enabled.then(|| UpdaterConfig {
            root: site.root.clone(),
            initial_delay: config.updater.initial_delay(),
            interval: config.updater.interval(),
        });

        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            request_timeout: config.server.request_timeout(),
            pages_dir: site.pages_dir(),
            templates_dir: site.templates_dir(),
            static_dir: site.static_dir(),
            default_page: site.default_page.clone(),
            max_age_secs: site.max_age_secs,
            site: SiteConfig {
                theme: site.theme.clone(),
                index_article: site.index_article.clone(),
                redirects,
                packages,
            },
            updater,
        }
    }
}

/// Server startup error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Site could not be loaded.
    #[error(transparent)]
    Site(#[from] SiteError),
    /// Host and port do not form a socket address.
    #[error("invalid listen address {0}")]
    Address(String),
    /// Socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// Server loop failed.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load the site served by `config` from disk.
pub fn load_site(config: &ServerConfig) -> Result<Arc<Site>, ServerError> {
    let storage = Arc::new(FsStorage::new(config.pages_dir.clone()));
    let templates = TemplateRegistry::new(config.templates_dir.clone());
    let site = Site::new(storage, templates, config.site.clone())?;
    Ok(Arc::new(site))
}

/// Build the application router for a loaded site.
#[must_use]
pub fn create_app(site: Arc<Site>, config: &ServerConfig) -> Router {
    let state = Arc::new(AppState::new(
        site,
        config.default_page.clone(),
        config.static_dir.clone(),
        config.max_age_secs,
    ));
    app::create_router(state, config.request_timeout)
}

/// Serve `app` on an already bound listener until `shutdown` completes.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the site cannot be loaded or the address cannot be
/// bound.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let site = load_site(&config)?;

    let updater = config.updater.clone().map(updater::spawn);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| ServerError::Address(format!("{}:{}", config.host, config.port)))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(address = %addr, "Starting server");

    let app = create_app(site, &config);
    let result = serve(listener, app, shutdown_signal()).await;

    if let Some(updater) = updater {
        updater.abort();
    }
    result
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
