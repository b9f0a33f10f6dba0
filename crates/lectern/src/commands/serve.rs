//! `lectern serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use lectern_config::{CliSettings, Config};
use lectern_server::{ServerConfig, run_server};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover lectern.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root holding pages/ and web/ (overrides config).
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Page theme (overrides config).
    #[arg(long)]
    theme: Option<String>,

    /// Do not open the browser.
    #[arg(long)]
    nob: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            root: self.root,
            theme: self.theme,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let port = config.server.port;

        output.info(&format!(
            "Content root: {}",
            config.site_resolved.root.display()
        ));
        if config.updater.enabled {
            output.info(&format!(
                "Updater: git pull every {}s",
                config.updater.interval_secs
            ));
        }
        output.server_urls(port);

        let server_config = ServerConfig::from_config(&config);
        let server = tokio::spawn(run_server(server_config));

        if !self.nob {
            let url = format!("http://localhost:{port}");
            if let Err(err) = open::that(&url) {
                output.warning(&format!("Failed to open browser: {err}"));
            }
        }

        server
            .await
            .map_err(|err| CliError::Task(err.to_string()))??;
        Ok(())
    }
}
