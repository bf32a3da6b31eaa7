//! reqwest-backed client for the memes API.

use async_trait::async_trait;
use log::{debug, warn};
use memedash_config::ApiConfig;
use memedash_protocol::{
    ApiError, ErrorDetail, Meme, MemeApi, MemePage, PageRequest, ReportRequest,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const TOP_PATH: &str = "/memes/top";
const PAGE_PATH: &str = "/memes/allmemes";
const REPORT_PATH: &str = "/memes/send-report";

/// HTTP client for the three memes endpoints.
#[derive(Debug, Clone)]
pub struct HttpMemeApi {
    client: Client,
    base_url: String,
}

impl HttpMemeApi {
    /// Build a client rooted at `base_url`; `timeout` of `None` keeps the
    /// transport default.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        debug!("http api client created (base_url={base_url})");
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            warn!("api request failed (path={path}, status={})", status.as_u16());
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }
        decode_json(response).await
    }
}

#[async_trait]
impl MemeApi for HttpMemeApi {
    async fn top_memes(&self, limit: u32) -> Result<Vec<Meme>, ApiError> {
        self.get_json(TOP_PATH, &[("limit", limit.to_string())]).await
    }

    async fn meme_page(&self, request: &PageRequest) -> Result<MemePage, ApiError> {
        self.get_json(PAGE_PATH, &request.query_pairs()).await
    }

    async fn send_report(&self, request: &ReportRequest) -> Result<Value, ApiError> {
        let response = self
            .client
            .post(self.endpoint(REPORT_PATH))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return decode_json(response).await;
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let detail = serde_json::from_slice::<ErrorDetail>(&body)
            .ok()
            .and_then(|detail| detail.message().map(str::to_string));
        warn!(
            "report request rejected (status={}, detail_present={})",
            status.as_u16(),
            detail.is_some()
        );
        Err(match detail {
            Some(detail) => ApiError::Rejected {
                status: status.as_u16(),
                detail,
            },
            None => ApiError::Status {
                status: status.as_u16(),
            },
        })
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

/// Decode a JSON body; an empty 2xx body decodes as `null`.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await.map_err(transport_error)?;
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &body[..]
    };
    serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
}
