//! Retention sweeper.
//!
//! Deletes stored files older than the configured max age. The interval's
//! first tick completes immediately, which doubles as the eager startup
//! sweep that reclaims space left over from a prior crash. Per-file
//! failures never abort a pass, and a failed pass never stops the schedule.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::interval;

use vidrelay_storage::DownloadStore;

pub struct RetentionSweeper {
    store: Arc<DownloadStore>,
    max_age: Duration,
    sweep_interval: Duration,
}

impl RetentionSweeper {
    pub fn new(store: Arc<DownloadStore>, max_age: Duration, sweep_interval: Duration) -> Self {
        Self {
            store,
            max_age,
            sweep_interval,
        }
    }

    /// Start the recurring sweep task.
    /// Returns a JoinHandle so the server can abort it on shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(self.sweep_interval);

            loop {
                tick.tick().await;

                match self.sweep().await {
                    Ok(removed) => {
                        tracing::info!(removed, "Retention sweep completed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Retention sweep failed");
                    }
                }
            }
        })
    }

    /// One pass over the storage root. Returns the number of files removed.
    pub async fn sweep(&self) -> Result<usize, anyhow::Error> {
        let files = self.store.list().await?;
        let now = SystemTime::now();
        let mut removed = 0;

        for file in files {
            // A file modified "in the future" (clock skew) has age zero.
            let age = now.duration_since(file.modified).unwrap_or_default();
            if age <= self.max_age {
                continue;
            }

            match self.store.remove(&file.name).await {
                Ok(()) => {
                    removed += 1;
                    tracing::info!(
                        name = %file.name,
                        age_secs = age.as_secs(),
                        size = file.size,
                        "Removed expired file"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        name = %file.name,
                        "Failed to remove expired file, continuing"
                    );
                }
            }
        }

        Ok(removed)
    }
}
