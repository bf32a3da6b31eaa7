use async_trait::async_trait;
use memedash_protocol::{ApiError, Meme, MemeApi, MemePage, PageRequest, ReportRequest};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::time::Duration;

struct Scripted<T> {
    delay: Option<Duration>,
    result: Result<T, ApiError>,
}

/// API double that replays queued responses and records every request.
///
/// When a queue runs dry the call succeeds with an empty result.
#[derive(Default)]
pub struct ScriptedApi {
    top: Mutex<VecDeque<Scripted<Vec<Meme>>>>,
    pages: Mutex<VecDeque<Scripted<MemePage>>>,
    reports: Mutex<VecDeque<Scripted<Value>>>,
    top_calls: Mutex<Vec<u32>>,
    page_requests: Mutex<Vec<PageRequest>>,
    report_requests: Mutex<Vec<ReportRequest>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_top(&self, result: Result<Vec<Meme>, ApiError>) {
        self.top.lock().push_back(Scripted {
            delay: None,
            result,
        });
    }

    /// Queue a leaderboard that resolves only after `delay`.
    pub fn push_top_after(&self, delay: Duration, result: Result<Vec<Meme>, ApiError>) {
        self.top.lock().push_back(Scripted {
            delay: Some(delay),
            result,
        });
    }

    pub fn push_page(&self, result: Result<MemePage, ApiError>) {
        self.pages.lock().push_back(Scripted {
            delay: None,
            result,
        });
    }

    /// Queue a page that resolves only after `delay`.
    pub fn push_page_after(&self, delay: Duration, result: Result<MemePage, ApiError>) {
        self.pages.lock().push_back(Scripted {
            delay: Some(delay),
            result,
        });
    }

    pub fn push_report(&self, result: Result<Value, ApiError>) {
        self.reports.lock().push_back(Scripted {
            delay: None,
            result,
        });
    }

    pub fn push_report_after(&self, delay: Duration, result: Result<Value, ApiError>) {
        self.reports.lock().push_back(Scripted {
            delay: Some(delay),
            result,
        });
    }

    /// Limits passed to `top_memes`, in call order.
    pub fn top_calls(&self) -> Vec<u32> {
        self.top_calls.lock().clone()
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.page_requests.lock().clone()
    }

    pub fn report_requests(&self) -> Vec<ReportRequest> {
        self.report_requests.lock().clone()
    }
}

async fn resolve<T>(next: Option<Scripted<T>>, fallback: impl FnOnce() -> T) -> Result<T, ApiError> {
    match next {
        Some(Scripted { delay, result }) => {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
        None => Ok(fallback()),
    }
}

#[async_trait]
impl MemeApi for ScriptedApi {
    async fn top_memes(&self, limit: u32) -> Result<Vec<Meme>, ApiError> {
        self.top_calls.lock().push(limit);
        let next = self.top.lock().pop_front();
        resolve(next, Vec::new).await
    }

    async fn meme_page(&self, request: &PageRequest) -> Result<MemePage, ApiError> {
        self.page_requests.lock().push(request.clone());
        let next = self.pages.lock().pop_front();
        resolve(next, MemePage::default).await
    }

    async fn send_report(&self, request: &ReportRequest) -> Result<Value, ApiError> {
        self.report_requests.lock().push(request.clone());
        let next = self.reports.lock().pop_front();
        resolve(next, || json!({ "status": "ok" })).await
    }
}

/// API double whose every call fails with the same error.
#[derive(Debug, Clone)]
pub struct FailingApi {
    error: ApiError,
}

impl FailingApi {
    pub fn new(error: ApiError) -> Self {
        Self { error }
    }

    /// Fails like an unreachable server.
    pub fn unreachable() -> Self {
        Self::new(ApiError::Transport("connection refused".to_string()))
    }
}

#[async_trait]
impl MemeApi for FailingApi {
    async fn top_memes(&self, _limit: u32) -> Result<Vec<Meme>, ApiError> {
        Err(self.error.clone())
    }

    async fn meme_page(&self, _request: &PageRequest) -> Result<MemePage, ApiError> {
        Err(self.error.clone())
    }

    async fn send_report(&self, _request: &ReportRequest) -> Result<Value, ApiError> {
        Err(self.error.clone())
    }
}
