//! Hot reload of the hashing settings.
//!
//! Only the `[hashing]` section is forwarded. Changes to other sections are
//! logged and ignored until the next restart.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{HashingConfig, ServiceConfig};

/// Watches a config file and emits new hashing settings.
pub struct ConfigWatcher {
    path: PathBuf,
    current: Mutex<ServiceConfig>,
    update_tx: mpsc::UnboundedSender<HashingConfig>,
}

impl ConfigWatcher {
    /// `initial` is the configuration the service was started with.
    pub fn new(
        path: &Path,
        initial: ServiceConfig,
    ) -> (Self, mpsc::UnboundedReceiver<HashingConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current: Mutex::new(initial),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for updates to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_change(&event.kind) => {
                    if let Err(e) = self.reload() {
                        tracing::error!(
                            error = %e,
                            "Config reload failed, keeping current settings"
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }

    /// Re-read the file and forward the hashing section if it changed.
    ///
    /// Returns whether an update was sent.
    pub fn reload(&self) -> Result<bool, ConfigError> {
        let fresh = load_config(&self.path)?;
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        if fresh.listener != current.listener
            || fresh.timeouts != current.timeouts
            || fresh.limits != current.limits
            || fresh.observability != current.observability
        {
            tracing::warn!("Only [hashing] is reloaded; other changes need a restart");
        }

        let changed = fresh.hashing != current.hashing;
        if changed {
            tracing::info!(delay_ms = fresh.hashing.delay_ms, "Hashing settings reloaded");
            let _ = self.update_tx.send(fresh.hashing.clone());
        }
        *current = fresh;
        Ok(changed)
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    kind.is_modify() || kind.is_create()
}
