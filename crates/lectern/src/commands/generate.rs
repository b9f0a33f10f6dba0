//! `lectern gen` command implementation.
//!
//! Starts the server on an ephemeral loopback port, fetches every page over
//! HTTP, copies theme assets and group images from disk, then replaces the
//! output directory with the collected files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use lectern_config::{CliSettings, Config};
use lectern_server::{ServerConfig, create_app, load_site, serve};
use lectern_site::Site;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use ureq::Agent;

use crate::error::CliError;
use crate::output::Output;

/// Timeout of one page fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Image extensions copied from group resource directories.
const IMAGE_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// Generated files by path relative to the output directory.
type SiteFiles = BTreeMap<String, Vec<u8>>;

/// Arguments for the gen command.
#[derive(Args)]
pub(crate) struct GenArgs {
    /// Path to configuration file (default: auto-discover lectern.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root holding pages/ and web/ (overrides config).
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Page theme (overrides config).
    #[arg(long)]
    theme: Option<String>,
}

impl GenArgs {
    /// Execute the gen command.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is incomplete, a page cannot be
    /// fetched, or the output cannot be written.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            root: self.root,
            theme: self.theme,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let output_dir = config.site_resolved.output_dir();

        let files = generate(&config).await?;
        write_site(&output_dir, &files)?;

        for (name, data) in &files {
            output.generated(name, data.len());
        }
        output.success(&format!(
            "Generated {} files in {}",
            files.len(),
            output_dir.display()
        ));
        Ok(())
    }
}

/// Collect every file of the static site.
async fn generate(config: &Config) -> Result<SiteFiles, CliError> {
    let server_config = ServerConfig {
        updater: None,
        ..ServerConfig::from_config(config)
    };
    if !server_config.static_dir.is_dir() {
        return Err(CliError::NotAProject(server_config.static_dir));
    }

    let site = load_site(&server_config)?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let root_url = format!("http://{}", listener.local_addr()?);
    let app = create_app(Arc::clone(&site), &server_config);

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, app, async move {
        let _ = stopped.await;
    }));

    let static_dir = server_config.static_dir.clone();
    let collected = tokio::task::spawn_blocking(move || {
        let crawler = Crawler::new(root_url);
        collect_files(&crawler, &site, &static_dir)
    })
    .await;

    let _ = stop.send(());
    server
        .await
        .map_err(|err| CliError::Task(err.to_string()))??;

    collected.map_err(|err| CliError::Task(err.to_string()))?
}

/// Blocking HTTP client of the in-process server.
struct Crawler {
    agent: Agent,
    root_url: String,
}

impl Crawler {
    fn new(root_url: String) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent, root_url }
    }

    /// Body of `path`, following redirects.
    fn fetch(&self, path: &str) -> Result<Vec<u8>, CliError> {
        let url = format!("{}{path}", self.root_url);
        let fetched = self
            .agent
            .get(&url)
            .call()
            .and_then(|response| response.into_body().read_to_vec());
        match fetched {
            Ok(body) => {
                tracing::info!(url = %url, bytes = body.len(), "fetched");
                Ok(body)
            }
            Err(source) => Err(CliError::Fetch { url, source }),
        }
    }
}

fn collect_files(crawler: &Crawler, site: &Site, static_dir: &Path) -> Result<SiteFiles, CliError> {
    let mut files = SiteFiles::new();

    files.insert("index.html".to_owned(), crawler.fetch("/")?);

    for path in walk_files(static_dir)? {
        let name = relative_name(static_dir, &path);
        files.insert(format!("static/{name}"), fs::read(&path)?);
    }

    for group in site.groups() {
        if let Some(res_dir) = &group.resource_dir {
            for path in dir_files(res_dir)? {
                if has_extension(&path, &IMAGE_EXTENSIONS) {
                    let url = group.page_url(&format!("res/{}", relative_name(res_dir, &path)));
                    files.insert(output_name(&url), fs::read(&path)?);
                }
            }
        }

        for file in site.storage().list(&group.name)? {
            let url = group.page_url(&file);
            let page = crawler.fetch(&url)?;
            files.insert(output_name(&url), page);
        }
    }

    Ok(files)
}

/// Replace `output_dir` with `files`.
fn write_site(output_dir: &Path, files: &SiteFiles) -> Result<(), CliError> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    for (name, data) in files {
        let path = output_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
    }
    Ok(())
}

/// Output path of a site URL: `/article/101.html` is `article/101.html`.
fn output_name(url: &str) -> String {
    url.trim_start_matches('/').to_owned()
}

fn relative_name(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Regular files directly inside `dir`, sorted.
fn dir_files(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Regular files anywhere below `dir`, breadth first.
fn walk_files(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}
