//! Keyed query cache with change notification.
//!
//! Queries write their results here and views read from it, so two views
//! asking the same question share one result.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

const DEFAULT_CHANGE_BUFFER: usize = 64;

/// Where the most recent fetch for an entry stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching,
    Success,
    Error,
}

/// Cached value plus fetch bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Last successful result; kept while a refresh is in flight or failed.
    pub data: Option<V>,
    /// When `data` was last written; `None` once invalidated.
    pub updated_at: Option<Instant>,
    pub status: FetchStatus,
    pub error: Option<String>,
}

impl<V> Default for CacheEntry<V> {
    fn default() -> Self {
        Self {
            data: None,
            updated_at: None,
            status: FetchStatus::Idle,
            error: None,
        }
    }
}

impl<V> CacheEntry<V> {
    /// Whether the data is missing or older than `stale_time`.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        match (&self.data, self.updated_at) {
            (Some(_), Some(updated_at)) => updated_at.elapsed() >= stale_time,
            _ => true,
        }
    }
}

/// Injectable cache shared between queries and views.
pub struct QueryCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    changes: broadcast::Sender<K>,
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Clone + Eq + Hash + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Clone + Eq + Hash + Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_change_buffer(DEFAULT_CHANGE_BUFFER)
    }

    /// Create a cache whose change channel holds `buffer` unread keys.
    pub fn with_change_buffer(buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(buffer.max(1));
        Self {
            entries: Mutex::new(HashMap::new()),
            changes,
        }
    }

    pub fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.lock().get(key).cloned()
    }

    /// Cached data only.
    pub fn data(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).and_then(|entry| entry.data.clone())
    }

    /// Store a fresh successful result.
    pub fn insert(&self, key: K, data: V) {
        self.entries.lock().insert(
            key.clone(),
            CacheEntry {
                data: Some(data),
                updated_at: Some(Instant::now()),
                status: FetchStatus::Success,
                error: None,
            },
        );
        self.publish(key);
    }

    /// Mutate an entry in place, creating an empty one first if needed.
    pub fn update<F>(&self, key: &K, apply: F)
    where
        F: FnOnce(&mut CacheEntry<V>),
    {
        {
            let mut entries = self.entries.lock();
            let entry = entries.entry(key.clone()).or_default();
            apply(entry);
        }
        self.publish(key.clone());
    }

    pub fn mark_fetching(&self, key: &K) {
        self.update(key, |entry| {
            entry.status = FetchStatus::Fetching;
        });
    }

    /// Record a failed fetch, keeping any previous data.
    pub fn mark_error(&self, key: &K, error: impl Into<String>) {
        let error = error.into();
        self.update(key, |entry| {
            entry.status = FetchStatus::Error;
            entry.error = Some(error);
        });
    }

    pub fn remove(&self, key: &K) -> Option<CacheEntry<V>> {
        let removed = self.entries.lock().remove(key);
        if removed.is_some() {
            debug!("removed cache entry (key={key:?})");
            self.publish(key.clone());
        }
        removed
    }

    /// Mark every entry stale so the next mount refetches; data stays visible.
    pub fn invalidate_all(&self) {
        let keys: Vec<K> = {
            let mut entries = self.entries.lock();
            for entry in entries.values_mut() {
                entry.updated_at = None;
            }
            entries.keys().cloned().collect()
        };
        debug!("invalidated cache entries (count={})", keys.len());
        for key in keys {
            self.publish(key);
        }
    }

    /// Missing entries are always stale.
    pub fn is_stale(&self, key: &K, stale_time: Duration) -> bool {
        self.entries
            .lock()
            .get(key)
            .is_none_or(|entry| entry.is_stale(stale_time))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Receive the key of every entry that changes.
    pub fn subscribe(&self) -> broadcast::Receiver<K> {
        self.changes.subscribe()
    }

    fn publish(&self, key: K) {
        let _ = self.changes.send(key);
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchStatus, QueryCache};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn insert_and_read_back() {
        let cache: QueryCache<&'static str, Vec<u32>> = QueryCache::new();
        assert!(cache.is_stale(&"top", Duration::from_secs(60)));
        cache.insert("top", vec![1, 2, 3]);
        assert_eq!(cache.data(&"top"), Some(vec![1, 2, 3]));
        assert!(!cache.is_stale(&"top", Duration::from_secs(60)));
        assert!(cache.is_stale(&"top", Duration::ZERO));
    }

    #[test]
    fn error_keeps_previous_data() {
        let cache: QueryCache<&'static str, Vec<u32>> = QueryCache::new();
        cache.insert("top", vec![1]);
        cache.mark_fetching(&"top");
        cache.mark_error(&"top", "boom");
        let entry = cache.get(&"top").expect("entry");
        assert_eq!(entry.data, Some(vec![1]));
        assert_eq!(entry.status, FetchStatus::Error);
        assert_eq!(entry.error.as_deref(), Some("boom"));
    }

    #[test]
    fn invalidate_all_marks_entries_stale() {
        let cache: QueryCache<u8, u8> = QueryCache::new();
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.invalidate_all();
        assert!(cache.is_stale(&1, Duration::from_secs(3600)));
        assert_eq!(cache.data(&2), Some(20));
    }

    #[test]
    fn remove_drops_entry() {
        let cache: QueryCache<u8, u8> = QueryCache::new();
        cache.insert(1, 10);
        assert!(cache.remove(&1).is_some());
        assert!(cache.remove(&1).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn subscribers_receive_changed_keys() {
        let cache: QueryCache<u8, u8> = QueryCache::new();
        let mut changes = cache.subscribe();
        cache.insert(7, 1);
        cache.mark_error(&7, "nope");
        cache.remove(&7);
        assert_eq!(changes.recv().await.expect("insert"), 7);
        assert_eq!(changes.recv().await.expect("error"), 7);
        assert_eq!(changes.recv().await.expect("remove"), 7);
    }
}
