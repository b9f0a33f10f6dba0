//! Periodic `git pull` of the content root.
//!
//! Pulled changes are picked up when the server next renders a page from
//! source, i.e. in local mode or after a restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;

/// Upper bound of one `git pull`.
const PULL_TIMEOUT: Duration = Duration::from_secs(30);

/// Schedule of the background updater.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdaterConfig {
    /// Repository to pull.
    pub root: PathBuf,
    /// Delay before the first pull.
    pub initial_delay: Duration,
    /// Delay between pulls.
    pub interval: Duration,
}

/// Spawn the updater loop. Failures are logged and never stop the loop.
pub(crate) fn spawn(config: UpdaterConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(config.initial_delay).await;
        loop {
            git_pull(&config.root).await;
            tokio::time::sleep(config.interval).await;
        }
    })
}

async fn git_pull(root: &Path) {
    let output = Command::new("git")
        .arg("pull")
        .current_dir(root)
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(PULL_TIMEOUT, output).await {
        Ok(Ok(output)) if output.status.success() => {
            tracing::info!(
                output = %String::from_utf8_lossy(&output.stdout).trim(),
                "git pull"
            );
        }
        Ok(Ok(output)) => {
            tracing::warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git pull failed"
            );
        }
        Ok(Err(err)) => tracing::warn!(error = %err, "failed to run git pull"),
        Err(_) => tracing::warn!(timeout = ?PULL_TIMEOUT, "git pull timed out"),
    }
}
