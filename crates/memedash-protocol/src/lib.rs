//! Wire types exchanged with the memes API.

mod api;
mod sort;

pub use api::{ApiError, MemeApi};
pub use sort::{PageSize, ParseParamError, SortField, SortOrder};

use serde::{Deserialize, Deserializer, Serialize};

/// Storage key under which Telegram credentials are persisted.
pub const CREDENTIALS_STORAGE_KEY: &str = "telegramCredentials";
/// Number of memes requested by the top-memes leaderboard.
pub const DEFAULT_TOP_LIMIT: u32 = 20;
/// Number of memes included in a sent report.
pub const DEFAULT_REPORT_LIMIT: u32 = 20;

/// A single meme as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meme {
    /// Stable identifier, unique within one response page.
    pub reddit_id: String,
    /// Display title.
    pub title: String,
    /// Image location.
    #[serde(default)]
    pub url: String,
    /// External link opened when a card is activated.
    #[serde(default)]
    pub permalink: String,
    /// Upvote count at fetch time.
    #[serde(default)]
    pub score: i64,
    /// Comment count at fetch time.
    #[serde(default)]
    pub num_comments: i64,
    /// When the API first stored the meme.
    #[serde(default)]
    pub created_at: Option<String>,
    /// When the meme was posted on reddit.
    #[serde(default)]
    pub reddit_created_at: Option<String>,
}

/// One page of the history feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MemePage {
    /// Memes in server order.
    #[serde(default)]
    pub items: Vec<Meme>,
    /// Cursor for the following page; `None` marks the end of the feed.
    #[serde(
        default,
        deserialize_with = "deserialize_cursor",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_cursor: Option<String>,
}

impl MemePage {
    /// Whether another page can be requested after this one.
    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Parameters of a single history page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: PageSize,
    /// Cursor taken from the previous page, absent for the first page.
    pub cursor: Option<String>,
}

impl PageRequest {
    /// Query string pairs in the order the API documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.value().to_string()),
            ("sort_by", self.sort_by.as_str().to_string()),
            ("order", self.order.as_str().to_string()),
        ];
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }
        pairs
    }
}

/// Telegram bot credentials used as the report destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Credentials {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

impl Credentials {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Both fields are set, so the server should use them instead of its default bot.
    pub fn is_complete(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    /// Neither field is set.
    pub fn is_empty(&self) -> bool {
        self.bot_token.is_empty() && self.chat_id.is_empty()
    }
}

/// Body of `POST /memes/send-report`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRequest {
    /// Omitted entirely when the server should use its default destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    pub limit: u32,
}

impl ReportRequest {
    /// Build a request, forwarding credentials only when both fields are set.
    pub fn new(credentials: &Credentials, limit: u32) -> Self {
        Self {
            credentials: credentials.is_complete().then(|| credentials.clone()),
            limit,
        }
    }
}

/// Error body returned by the API on a failed mutation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorDetail {
    /// The human readable detail, when the server sent one as a string.
    pub fn message(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|value| value.as_str())
            .filter(|message| !message.trim().is_empty())
    }
}

/// Treat `null` and empty cursors as the end of the feed.
fn deserialize_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let cursor = Option::<String>::deserialize(deserializer)?;
    Ok(cursor.filter(|value| !value.is_empty()))
}
