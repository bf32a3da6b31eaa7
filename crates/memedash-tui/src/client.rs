//! Bridges dashboard services onto the TUI event channel.

use crate::event::AppEvent;
use log::{debug, info, warn};
use memedash_core::{Dashboard, FetchOutcome};
use memedash_protocol::Credentials;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Thin wrapper that runs dashboard operations off the UI task.
#[derive(Clone)]
pub struct DashboardClient {
    dashboard: Dashboard,
}

impl DashboardClient {
    pub fn new(dashboard: Dashboard) -> Self {
        Self { dashboard }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Forward cache and notification changes as redraw events.
    pub fn spawn_watchers(&self, sender: mpsc::Sender<AppEvent>) {
        forward_cache_changes(
            self.dashboard.top_memes.cache().subscribe(),
            sender.clone(),
            || AppEvent::TopMemesChanged,
        );
        forward_cache_changes(
            self.dashboard.history.cache().subscribe(),
            sender.clone(),
            || AppEvent::HistoryChanged,
        );

        let mut notifications = self.dashboard.notifier.subscribe();
        tokio::spawn(async move {
            while notifications.changed().await.is_ok() {
                if sender.send(AppEvent::NotificationChanged).await.is_err() {
                    break;
                }
            }
            debug!("notification watcher stopped");
        });
    }

    /// Start leaderboard polling; abort the handle when the page unmounts.
    pub fn mount_top(&self) -> JoinHandle<()> {
        self.dashboard.top_memes.start_polling()
    }

    /// Load the first history page, or refetch it behind the cached pages.
    pub fn mount_history(&self) {
        let history = self.dashboard.history.clone();
        tokio::spawn(async move {
            if let Err(err) = history.revalidate().await {
                debug!("history fetch on mount failed: {err}");
            }
        });
    }

    pub fn load_more(&self, sender: mpsc::Sender<AppEvent>) {
        let history = self.dashboard.history.clone();
        tokio::spawn(async move {
            match history.load_more().await {
                Ok(FetchOutcome::Applied) => {
                    let _ = sender.send(AppEvent::Status("loaded more".to_string())).await;
                }
                Ok(_) => {}
                Err(err) => {
                    let _ = sender
                        .send(AppEvent::Status(format!("load more failed: {err}")))
                        .await;
                }
            }
        });
    }

    pub fn refresh_history(&self) {
        let history = self.dashboard.history.clone();
        tokio::spawn(async move {
            if let Err(err) = history.refresh().await {
                debug!("history refresh failed: {err}");
            }
        });
    }

    pub fn refresh_top(&self) {
        let top_memes = self.dashboard.top_memes.clone();
        tokio::spawn(async move {
            // Failures land in the cache and render inline.
            let _ = top_memes.refresh().await;
        });
    }

    pub fn send_report(&self, sender: mpsc::Sender<AppEvent>) {
        let reports = self.dashboard.reports.clone();
        tokio::spawn(async move {
            let outcome = reports.send().await;
            info!("report finished (outcome={outcome:?})");
            let _ = sender.send(AppEvent::Status("report finished".to_string())).await;
        });
    }

    /// Persist credentials; failures are surfaced as an error notification.
    pub fn save_credentials(&self, credentials: Credentials) -> bool {
        match self.dashboard.settings.save(credentials) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to save credentials: {err}");
                self.dashboard
                    .notifier
                    .error(format!("Failed to save credentials: {err}"));
                false
            }
        }
    }
}

fn forward_cache_changes<K, F>(
    mut receiver: broadcast::Receiver<K>,
    sender: mpsc::Sender<AppEvent>,
    event: F,
) where
    K: Clone + Send + 'static,
    F: Fn() -> AppEvent + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if sender.send(event()).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("cache watcher stopped");
    });
}
