//! Sortable, cursor-paginated meme history.
//!
//! Pages for one `(sort_by, order, limit)` identity are fetched strictly in
//! cursor order and appended. Changing the identity drops the accumulated
//! pages and starts again from the first page.

use crate::cache::{FetchStatus, QueryCache};
use log::{debug, info, warn};
use memedash_config::HistoryConfig;
use memedash_protocol::{ApiError, Meme, MemeApi, MemePage, PageRequest, PageSize, SortField, SortOrder};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Cache identity of one history series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HistoryKey {
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: PageSize,
}

impl HistoryKey {
    pub fn new(sort_by: SortField, order: SortOrder, limit: PageSize) -> Self {
        Self {
            sort_by,
            order,
            limit,
        }
    }

    pub fn with_sort_by(self, sort_by: SortField) -> Self {
        Self { sort_by, ..self }
    }

    pub fn with_order(self, order: SortOrder) -> Self {
        Self { order, ..self }
    }

    pub fn with_limit(self, limit: PageSize) -> Self {
        Self { limit, ..self }
    }

    fn request(&self, cursor: Option<String>) -> PageRequest {
        PageRequest {
            sort_by: self.sort_by,
            order: self.order,
            limit: self.limit,
            cursor,
        }
    }
}

impl From<&HistoryConfig> for HistoryKey {
    fn from(config: &HistoryConfig) -> Self {
        Self::new(config.sort_by, config.order, config.limit)
    }
}

/// Pages fetched so far for one identity, in cursor order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryPages {
    pub pages: Vec<MemePage>,
}

impl HistoryPages {
    /// All items across pages, in fetch order.
    pub fn items(&self) -> Vec<Meme> {
        self.pages
            .iter()
            .flat_map(|page| page.items.iter().cloned())
            .collect()
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.pages.last().and_then(|page| page.next_cursor.as_deref())
    }

    /// True until a page arrives without a cursor.
    pub fn has_more(&self) -> bool {
        self.next_cursor().is_some()
    }
}

pub type HistoryCache = QueryCache<HistoryKey, HistoryPages>;

/// What happened to a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was fetched and stored.
    Applied,
    /// Nothing was requested: a fetch is in flight, the feed is exhausted,
    /// or data is already cached.
    Refused,
    /// The page arrived after the identity changed and was dropped.
    Superseded,
}

/// What the history view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    pub key: HistoryKey,
    pub items: Vec<Meme>,
    pub has_more: bool,
    pub loading_first: bool,
    /// Cached pages are shown while the first page is fetched again.
    pub refreshing: bool,
    pub fetching_next: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    First,
    Next,
    Revalidate,
}

struct HistoryState {
    key: HistoryKey,
    /// Bumped whenever the series is restarted; results carry the value they
    /// were issued under.
    generation: u64,
    in_flight: Option<InFlight>,
    error: Option<String>,
}

struct HistoryInner {
    api: Arc<dyn MemeApi>,
    cache: Arc<HistoryCache>,
    state: Mutex<HistoryState>,
}

/// Paginated history query; cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct HistoryQuery {
    inner: Arc<HistoryInner>,
}

impl HistoryQuery {
    pub fn new(api: Arc<dyn MemeApi>, cache: Arc<HistoryCache>, key: HistoryKey) -> Self {
        Self {
            inner: Arc::new(HistoryInner {
                api,
                cache,
                state: Mutex::new(HistoryState {
                    key,
                    generation: 0,
                    in_flight: None,
                    error: None,
                }),
            }),
        }
    }

    pub fn key(&self) -> HistoryKey {
        self.inner.state.lock().key
    }

    pub fn cache(&self) -> &Arc<HistoryCache> {
        &self.inner.cache
    }

    /// Switch to a new identity. Returns `false` when nothing changed.
    ///
    /// The old series is dropped from the cache and any in-flight result for
    /// it will be discarded. Call [`HistoryQuery::fetch_first`] afterwards.
    pub fn set_params(&self, key: HistoryKey) -> bool {
        let previous = {
            let mut state = self.inner.state.lock();
            if state.key == key {
                return false;
            }
            let previous = state.key;
            state.key = key;
            state.generation += 1;
            state.in_flight = None;
            state.error = None;
            previous
        };
        self.inner.cache.remove(&previous);
        info!(
            "history params changed (sort_by={}, order={}, limit={})",
            key.sort_by,
            key.order,
            key.limit.value()
        );
        true
    }

    /// Load the first page unless pages are already cached or a fetch is
    /// running.
    pub async fn fetch_first(&self) -> Result<FetchOutcome, ApiError> {
        let (key, generation) = {
            let mut state = self.inner.state.lock();
            let cached = self
                .inner
                .cache
                .data(&state.key)
                .is_some_and(|pages| !pages.pages.is_empty());
            if state.in_flight.is_some() || cached {
                return Ok(FetchOutcome::Refused);
            }
            state.in_flight = Some(InFlight::First);
            state.error = None;
            (state.key, state.generation)
        };
        self.inner.cache.mark_fetching(&key);
        debug!("fetching first history page (generation={generation})");
        let result = self.inner.api.meme_page(&key.request(None)).await;
        self.complete(key, generation, InFlight::First, result)
    }

    /// Load the page after the most recent one.
    pub async fn load_more(&self) -> Result<FetchOutcome, ApiError> {
        let (key, generation, cursor) = {
            let mut state = self.inner.state.lock();
            if state.in_flight.is_some() {
                debug!("load more refused; fetch already in flight");
                return Ok(FetchOutcome::Refused);
            }
            let cursor = self
                .inner
                .cache
                .data(&state.key)
                .and_then(|pages| pages.next_cursor().map(str::to_string));
            let Some(cursor) = cursor else {
                debug!("load more refused; no further pages");
                return Ok(FetchOutcome::Refused);
            };
            state.in_flight = Some(InFlight::Next);
            state.error = None;
            (state.key, state.generation, cursor)
        };
        debug!("fetching next history page (generation={generation})");
        let result = self.inner.api.meme_page(&key.request(Some(cursor))).await;
        self.complete(key, generation, InFlight::Next, result)
    }

    /// Fetch the first page again, keeping cached pages visible meanwhile.
    ///
    /// With nothing cached this is [`HistoryQuery::fetch_first`]. Once the
    /// fresh page arrives it replaces the whole series.
    pub async fn revalidate(&self) -> Result<FetchOutcome, ApiError> {
        let issued = {
            let mut state = self.inner.state.lock();
            if state.in_flight.is_some() {
                return Ok(FetchOutcome::Refused);
            }
            let cached = self
                .inner
                .cache
                .data(&state.key)
                .is_some_and(|pages| !pages.pages.is_empty());
            cached.then(|| {
                state.in_flight = Some(InFlight::Revalidate);
                state.error = None;
                (state.key, state.generation)
            })
        };
        let Some((key, generation)) = issued else {
            return self.fetch_first().await;
        };
        debug!("revalidating history (generation={generation})");
        let result = self.inner.api.meme_page(&key.request(None)).await;
        self.complete(key, generation, InFlight::Revalidate, result)
    }

    /// Drop the current series and fetch it again from the first page.
    pub async fn refresh(&self) -> Result<FetchOutcome, ApiError> {
        let key = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.in_flight = None;
            state.error = None;
            state.key
        };
        self.inner.cache.remove(&key);
        self.fetch_first().await
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.state.lock().in_flight.is_some()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let state = self.inner.state.lock();
        let pages = self.inner.cache.data(&state.key).unwrap_or_default();
        HistorySnapshot {
            key: state.key,
            items: pages.items(),
            has_more: pages.has_more(),
            loading_first: state.in_flight == Some(InFlight::First),
            refreshing: state.in_flight == Some(InFlight::Revalidate),
            fetching_next: state.in_flight == Some(InFlight::Next),
            error: state.error.clone(),
        }
    }

    fn complete(
        &self,
        key: HistoryKey,
        generation: u64,
        kind: InFlight,
        result: Result<MemePage, ApiError>,
    ) -> Result<FetchOutcome, ApiError> {
        let mut state = self.inner.state.lock();
        if state.generation != generation || state.key != key {
            debug!(
                "discarding superseded history page (generation={generation}, current={})",
                state.generation
            );
            return Ok(FetchOutcome::Superseded);
        }
        state.in_flight = None;
        match result {
            Ok(page) => {
                let count = page.items.len();
                let has_next = page.has_next();
                self.inner.cache.update(&key, |entry| {
                    let pages = entry.data.get_or_insert_with(HistoryPages::default);
                    if kind != InFlight::Next {
                        pages.pages.clear();
                    }
                    pages.pages.push(page);
                    entry.updated_at = Some(Instant::now());
                    entry.status = FetchStatus::Success;
                    entry.error = None;
                });
                info!("fetched history page (items={count}, has_next={has_next})");
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                warn!("failed to fetch history page: {err}");
                state.error = Some(err.to_string());
                self.inner.cache.mark_error(&key, err.to_string());
                Err(err)
            }
        }
    }
}
