//! CLI error types.

use std::path::PathBuf;

use lectern_config::ConfigError;
use lectern_server::ServerError;
use lectern_storage::StorageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("{} not found, is this a lectern project?", .0.display())]
    NotAProject(PathBuf),

    #[error("{0}")]
    Task(String),
}
