//! Configuration schema for memedash.

use memedash_protocol::{DEFAULT_REPORT_LIMIT, DEFAULT_TOP_LIMIT, PageSize, SortField, SortOrder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root config for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemedashConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub top_memes: TopMemesConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl MemedashConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> MemedashConfigBuilder {
        MemedashConfigBuilder::new()
    }
}

/// Builder for assembling a `MemedashConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct MemedashConfigBuilder {
    config: MemedashConfig,
}

impl MemedashConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: MemedashConfig::default(),
        }
    }

    /// Point the client at a different API root.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.api.base_url = base_url.into();
        self
    }

    pub fn top_memes(mut self, top_memes: TopMemesConfig) -> Self {
        self.config.top_memes = top_memes;
        self
    }

    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.config.history = history;
        self
    }

    pub fn reports(mut self, reports: ReportsConfig) -> Self {
        self.config.reports = reports;
        self
    }

    pub fn notifications(mut self, notifications: NotificationsConfig) -> Self {
        self.config.notifications = notifications;
        self
    }

    pub fn storage_path(mut self, path: impl Into<String>) -> Self {
        self.config.storage.path = Some(path.into());
        self
    }

    pub fn build(self) -> MemedashConfig {
        self.config
    }
}

/// Location of the memes API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout; unset means the transport default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Leaderboard polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopMemesConfig {
    #[serde(default = "default_top_limit")]
    pub limit: u32,
    #[serde(default = "default_refetch_interval_ms")]
    pub refetch_interval_ms: u64,
    #[serde(default = "default_stale_time_ms")]
    pub stale_time_ms: u64,
}

impl Default for TopMemesConfig {
    fn default() -> Self {
        Self {
            limit: default_top_limit(),
            refetch_interval_ms: default_refetch_interval_ms(),
            stale_time_ms: default_stale_time_ms(),
        }
    }
}

impl TopMemesConfig {
    pub fn refetch_interval(&self) -> Duration {
        Duration::from_millis(self.refetch_interval_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }
}

fn default_top_limit() -> u32 {
    DEFAULT_TOP_LIMIT
}

/// Five minutes.
fn default_refetch_interval_ms() -> u64 {
    300_000
}

/// Slightly shorter than the poll so every scheduled poll refetches.
fn default_stale_time_ms() -> u64 {
    290_000
}

/// Initial history browsing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub limit: PageSize,
}

/// Report mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_report_limit")]
    pub limit: u32,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            limit: default_report_limit(),
        }
    }
}

fn default_report_limit() -> u32 {
    DEFAULT_REPORT_LIMIT
}

/// Toast lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_notification_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_notification_ttl_ms(),
        }
    }
}

impl NotificationsConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

fn default_notification_ttl_ms() -> u64 {
    3_000
}

/// Durable settings storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Storage file; defaults to `~/.memedash/storage.json`.
    #[serde(default)]
    pub path: Option<String>,
}

impl StorageConfig {
    /// Resolve the storage file, falling back to the working directory when
    /// no home directory is known.
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return PathBuf::from(path);
        }
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".memedash"))
            .unwrap_or_else(|| PathBuf::from(".memedash"))
            .join("storage.json")
    }
}
