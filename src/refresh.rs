//! Background menu refresh
//!
//! Periodically re-fetches the menu in the background and reports each
//! completion over a tokio channel, so a UI can react without awaiting the
//! network itself.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cache::{FetchOutcome, MenuCache};
use crate::data::MenuDay;

/// Messages sent from the background refresh to the app
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A refresh cycle started
    RefreshStarted,
    /// A new menu day was stored in the cache
    MenuUpdated(MenuDay),
    /// The plan had no serving day left; the cache kept its value
    NoMenu,
    /// The fetch failed; the cache kept its value
    RefreshError(String),
}

impl From<FetchOutcome> for RefreshMessage {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Updated(day) => RefreshMessage::MenuUpdated(day),
            FetchOutcome::NoMatchingDay => RefreshMessage::NoMenu,
            FetchOutcome::Failed(err) => RefreshMessage::RefreshError(err.to_string()),
        }
    }
}

/// Configuration for the refresh loop
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between refreshes
    pub interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(900), // 15 minutes
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Signals shutdown to the refresh task
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the refresh task for `location` on `cache`
    ///
    /// The first refresh happens one interval after spawning; callers that
    /// want data right away call `MenuCache::get_menu` themselves.
    pub fn spawn(cache: MenuCache, location: String, config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            debug!(%location, "periodic menu refresh");
                            let _ = msg_tx.send(RefreshMessage::RefreshStarted).await;

                            let outcome = cache.refresh(&location).await;
                            if msg_tx.send(outcome.into()).await.is_err() {
                                break;
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for a pending refresh message without blocking
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
