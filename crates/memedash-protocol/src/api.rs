use crate::{Meme, MemePage, PageRequest, ReportRequest};
use async_trait::async_trait;
use serde_json::Value;

/// Errors returned by API clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, reset, timeout).
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status and no usable detail.
    #[error("Network response was not ok")]
    Status { status: u16 },
    /// The server rejected a mutation and explained why.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Client interface for the memes API.
#[async_trait]
pub trait MemeApi: Send + Sync {
    /// `GET /memes/top?limit=`.
    async fn top_memes(&self, limit: u32) -> Result<Vec<Meme>, ApiError>;

    /// `GET /memes/allmemes` for one page.
    async fn meme_page(&self, request: &PageRequest) -> Result<MemePage, ApiError>;

    /// `POST /memes/send-report`; returns the server's JSON acknowledgement.
    async fn send_report(&self, request: &ReportRequest) -> Result<Value, ApiError>;
}
