//! Fixed-size leaderboard of top memes with periodic refresh.

use crate::cache::{FetchStatus, QueryCache};
use log::{debug, info, warn};
use memedash_config::TopMemesConfig;
use memedash_protocol::{ApiError, Meme, MemeApi};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Cache identity of the leaderboard; constant for a given limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopMemesKey {
    pub limit: u32,
}

pub type TopMemesCache = QueryCache<TopMemesKey, Vec<Meme>>;

/// What the top view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopMemesSnapshot {
    pub memes: Vec<Meme>,
    /// No data yet and a fetch is running.
    pub loading: bool,
    /// A refresh is running; any previous data is still shown.
    pub refreshing: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
    pub updated_at: Option<Instant>,
}

/// Fetch bookkeeping shared by every clone of a query.
#[derive(Debug, Default)]
struct FetchState {
    /// Bumped by every refresh; only the newest one may write the cache.
    generation: u64,
    /// Generation of the newest fetch still running.
    in_flight: Option<u64>,
}

/// Leaderboard query bound to a cache entry.
#[derive(Clone)]
pub struct TopMemesQuery {
    api: Arc<dyn MemeApi>,
    cache: Arc<TopMemesCache>,
    key: TopMemesKey,
    refetch_interval: Duration,
    stale_time: Duration,
    state: Arc<Mutex<FetchState>>,
}

/// Releases the in-flight slot of a fetch. If the fetch future is dropped
/// before it settles, the cache entry leaves `Fetching` as well.
struct FetchGuard<'a> {
    query: &'a TopMemesQuery,
    generation: u64,
    settled: bool,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.query.state.lock();
        if state.in_flight != Some(self.generation) {
            return;
        }
        state.in_flight = None;
        if self.settled {
            return;
        }
        debug!(
            "top memes fetch cancelled (generation={})",
            self.generation
        );
        self.query.cache.update(&self.query.key, |entry| {
            entry.status = if entry.error.is_some() {
                FetchStatus::Error
            } else if entry.data.is_some() {
                FetchStatus::Success
            } else {
                FetchStatus::Idle
            };
        });
    }
}

impl TopMemesQuery {
    pub fn new(api: Arc<dyn MemeApi>, cache: Arc<TopMemesCache>, config: &TopMemesConfig) -> Self {
        Self {
            api,
            cache,
            key: TopMemesKey {
                limit: config.limit,
            },
            refetch_interval: config.refetch_interval(),
            stale_time: config.stale_time(),
            state: Arc::new(Mutex::new(FetchState::default())),
        }
    }

    pub fn key(&self) -> TopMemesKey {
        self.key
    }

    pub fn cache(&self) -> &Arc<TopMemesCache> {
        &self.cache
    }

    /// Fetch now, regardless of staleness.
    ///
    /// Results longer than the limit are truncated; server order is kept.
    /// When a newer refresh starts before this one settles, this result is
    /// returned to the caller but never written to the cache.
    pub async fn refresh(&self) -> Result<Vec<Meme>, ApiError> {
        let limit = self.key.limit;
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.in_flight = Some(state.generation);
            state.generation
        };
        let mut guard = FetchGuard {
            query: self,
            generation,
            settled: false,
        };
        self.cache.mark_fetching(&self.key);

        let result = self.api.top_memes(limit).await.map(|mut memes| {
            if memes.len() > limit as usize {
                debug!(
                    "truncating top memes (received={}, limit={limit})",
                    memes.len()
                );
                memes.truncate(limit as usize);
            }
            memes
        });

        // Holding the state lock keeps a newer refresh from interleaving
        // between the generation check and the cache write.
        let state = self.state.lock();
        guard.settled = true;
        if state.generation != generation {
            debug!(
                "discarding superseded top memes (generation={generation}, current={})",
                state.generation
            );
            return result;
        }
        match &result {
            Ok(memes) => {
                info!("fetched top memes (count={})", memes.len());
                self.cache.insert(self.key, memes.clone());
            }
            Err(err) => {
                warn!("failed to fetch top memes: {err}");
                self.cache.mark_error(&self.key, err.to_string());
            }
        }
        drop(state);
        result
    }

    pub fn is_stale(&self) -> bool {
        self.cache.is_stale(&self.key, self.stale_time)
    }

    pub fn is_fetching(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    /// Whether a fetch should be issued: stale and nothing already running.
    pub fn needs_fetch(&self) -> bool {
        !self.is_fetching() && self.is_stale()
    }

    /// Refresh only when stale; returns `None` when the cache was fresh.
    pub async fn ensure_fresh(&self) -> Option<Result<Vec<Meme>, ApiError>> {
        if !self.needs_fetch() {
            return None;
        }
        Some(self.refresh().await)
    }

    pub fn snapshot(&self) -> TopMemesSnapshot {
        let Some(entry) = self.cache.get(&self.key) else {
            return TopMemesSnapshot::default();
        };
        let fetching = entry.status == FetchStatus::Fetching;
        TopMemesSnapshot {
            loading: fetching && entry.data.is_none(),
            refreshing: fetching && entry.data.is_some(),
            error: (entry.status == FetchStatus::Error)
                .then(|| entry.error.clone())
                .flatten(),
            updated_at: entry.updated_at,
            memes: entry.data.unwrap_or_default(),
        }
    }

    /// Poll while the returned task is alive.
    ///
    /// The first tick fires immediately, so mounting with stale or missing
    /// data fetches at once. Abort the handle to stop polling.
    pub fn start_polling(&self) -> JoinHandle<()> {
        let query = self.clone();
        info!(
            "starting top memes polling (interval_ms={})",
            query.refetch_interval.as_millis()
        );
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(query.refetch_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                // Errors are already recorded in the cache; wait for the next tick.
                let _ = query.ensure_fresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{TopMemesCache, TopMemesQuery};
    use memedash_config::TopMemesConfig;
    use memedash_protocol::ApiError;
    use memedash_test_utils::{ScriptedApi, meme, memes};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn query(api: Arc<ScriptedApi>) -> TopMemesQuery {
        TopMemesQuery::new(
            api,
            Arc::new(TopMemesCache::new()),
            &TopMemesConfig::default(),
        )
    }

    #[tokio::test]
    async fn oversized_response_is_truncated_in_order() {
        let api = Arc::new(ScriptedApi::new());
        api.push_top(Ok(memes("top", 30)));
        let memes = query(api.clone()).refresh().await.expect("refresh");
        assert_eq!(memes.len(), 20);
        assert_eq!(memes[0].reddit_id, "top-0");
        assert_eq!(memes[19].reddit_id, "top-19");
        assert_eq!(api.top_calls(), vec![20]);
    }

    #[tokio::test]
    async fn fresh_cache_skips_fetch() {
        let api = Arc::new(ScriptedApi::new());
        api.push_top(Ok(vec![meme("1")]));
        let query = query(api.clone());
        assert!(query.ensure_fresh().await.is_some());
        assert!(query.ensure_fresh().await.is_none());
        assert_eq!(api.top_calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_good_data() {
        let api = Arc::new(ScriptedApi::new());
        api.push_top(Ok(vec![meme("1")]));
        api.push_top(Err(ApiError::Status { status: 502 }));
        let query = query(api);
        query.refresh().await.expect("first");
        assert!(query.refresh().await.is_err());

        let snapshot = query.snapshot();
        assert_eq!(snapshot.memes.len(), 1);
        assert_eq!(snapshot.error.as_deref(), Some("Network response was not ok"));
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn polling_fetches_immediately_and_stops_on_abort() {
        let api = Arc::new(ScriptedApi::new());
        api.push_top(Ok(vec![meme("1")]));
        let query = query(api.clone());
        let handle = query.start_polling();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        handle.abort();
        assert_eq!(api.top_calls().len(), 1);
        assert_eq!(query.snapshot().memes.len(), 1);
    }

    #[tokio::test]
    async fn polling_resumes_after_abort_mid_fetch() {
        let api = Arc::new(ScriptedApi::new());
        api.push_top_after(Duration::from_millis(200), Ok(vec![meme("slow")]));
        api.push_top(Ok(vec![meme("1")]));
        let query = query(api.clone());

        let handle = query.start_polling();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        let _ = handle.await;
        assert!(!query.is_fetching());
        assert!(!query.snapshot().loading);
        assert!(query.needs_fetch());

        let handle = query.start_polling();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();
        assert_eq!(api.top_calls().len(), 2);
        let snapshot = query.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.memes[0].reddit_id, "1");
    }

    #[tokio::test]
    async fn cancelled_refresh_restores_previous_error() {
        let api = Arc::new(ScriptedApi::new());
        api.push_top(Err(ApiError::Status { status: 500 }));
        api.push_top_after(Duration::from_millis(200), Ok(vec![meme("1")]));
        let query = query(api);
        assert!(query.refresh().await.is_err());

        let refresh = query.refresh();
        assert!(
            tokio::time::timeout(Duration::from_millis(20), refresh)
                .await
                .is_err()
        );
        let snapshot = query.snapshot();
        assert!(!snapshot.refreshing && !snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some("Network response was not ok"));
    }

    #[tokio::test]
    async fn older_refresh_never_overwrites_newer_result() {
        let api = Arc::new(ScriptedApi::new());
        api.push_top_after(Duration::from_millis(150), Ok(vec![meme("old")]));
        api.push_top(Ok(vec![meme("new")]));
        let query = query(api.clone());

        let slow = tokio::spawn({
            let query = query.clone();
            async move { query.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        query.refresh().await.expect("fast refresh");
        let updated_at = query.snapshot().updated_at;

        let old = slow.await.expect("join").expect("slow refresh");
        assert_eq!(old[0].reddit_id, "old");
        assert_eq!(api.top_calls().len(), 2);
        let snapshot = query.snapshot();
        assert_eq!(snapshot.memes[0].reddit_id, "new");
        assert_eq!(snapshot.updated_at, updated_at);
        assert!(!snapshot.refreshing);
        assert!(!query.is_fetching());
    }
}
