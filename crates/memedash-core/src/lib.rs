//! Data layer for the memes dashboard.
//!
//! Owns the API client, query cache, paginated history, report mutation,
//! settings persistence, and notifications the terminal UI renders from.

pub mod cache;
pub mod error;
pub mod history;
pub mod http;
pub mod notify;
pub mod report;
pub mod settings;
pub mod storage;
pub mod top_memes;

pub use cache::{CacheEntry, FetchStatus, QueryCache};
pub use error::MemedashCoreError;
pub use history::{FetchOutcome, HistoryCache, HistoryKey, HistoryQuery, HistorySnapshot};
pub use http::HttpMemeApi;
pub use notify::{Notification, NotificationKind, Notifier};
pub use report::{ReportMutation, ReportOutcome};
pub use settings::SettingsStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use top_memes::{TopMemesCache, TopMemesKey, TopMemesQuery, TopMemesSnapshot};

use log::info;
use memedash_config::MemedashConfig;
use memedash_protocol::MemeApi;
use std::sync::Arc;

/// Every service a dashboard session needs, wired to one API and one store.
#[derive(Clone)]
pub struct Dashboard {
    pub notifier: Notifier,
    pub settings: Arc<SettingsStore>,
    pub top_memes: TopMemesQuery,
    pub history: HistoryQuery,
    pub reports: Arc<ReportMutation>,
}

impl Dashboard {
    /// Wire services around an existing API client and storage backend.
    pub fn new(
        api: Arc<dyn MemeApi>,
        storage: Arc<dyn KeyValueStorage>,
        config: &MemedashConfig,
    ) -> Self {
        let notifier = Notifier::new(config.notifications.ttl());
        let settings = Arc::new(SettingsStore::new(storage, notifier.clone()));
        let top_memes = TopMemesQuery::new(
            api.clone(),
            Arc::new(TopMemesCache::new()),
            &config.top_memes,
        );
        let history = HistoryQuery::new(
            api.clone(),
            Arc::new(HistoryCache::new()),
            HistoryKey::from(&config.history),
        );
        let reports = Arc::new(ReportMutation::new(
            api,
            settings.clone(),
            notifier.clone(),
            config.reports.limit,
        ));
        Self {
            notifier,
            settings,
            top_memes,
            history,
            reports,
        }
    }

    /// Wire services against the configured HTTP API and storage file.
    pub fn from_config(config: &MemedashConfig) -> Result<Self, MemedashCoreError> {
        let api = HttpMemeApi::from_config(&config.api)?;
        let storage = FileStorage::new(config.storage.resolve_path());
        info!(
            "dashboard services ready (base_url={}, storage={})",
            api.base_url(),
            storage.path().display()
        );
        Ok(Self::new(Arc::new(api), Arc::new(storage), config))
    }
}
