use crate::errors::{AppError, AppResult};
use crate::models::{NotesPage, QueryKey};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;

/// What one network read settles to. `stored` is false when invalidation
/// detached the read before it finished, so the page may predate a mutation.
#[derive(Debug, Clone)]
pub(crate) struct FetchOutcome {
    pub result: AppResult<NotesPage>,
    pub stored: bool,
}

pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Fetching,
    Success,
    Error,
}

#[derive(Default)]
struct CacheEntry {
    data: Option<NotesPage>,
    error: Option<AppError>,
    stale: bool,
    failed_last: bool,
    updated_at: Option<DateTime<Utc>>,
    in_flight: Option<(u64, SharedFetch)>,
}

impl CacheEntry {
    fn status(&self) -> QueryStatus {
        if self.in_flight.is_some() {
            QueryStatus::Fetching
        } else if self.failed_last {
            QueryStatus::Error
        } else if self.data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        }
    }
}

/// Read-only view of one cache entry handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySnapshot {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<NotesPage>,
    pub error: Option<AppError>,
    pub stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QuerySnapshot {
    pub fn is_fresh(&self) -> bool {
        self.data.is_some() && !self.stale && self.status != QueryStatus::Error
    }
}

#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    next_fetch_id: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the in-flight fetch for `key`, starting one with `start` if
    /// none is running. The boolean is true when this call started it.
    pub(crate) fn join_or_start<F>(&mut self, key: &QueryKey, start: F) -> (SharedFetch, bool)
    where
        F: FnOnce(u64) -> SharedFetch,
    {
        if let Some((_, fetch)) = self.entries.get(key).and_then(|entry| entry.in_flight.as_ref()) {
            return (fetch.clone(), false);
        }

        self.next_fetch_id += 1;
        let fetch_id = self.next_fetch_id;
        let fetch = start(fetch_id);
        let entry = self.entries.entry(key.clone()).or_default();
        entry.in_flight = Some((fetch_id, fetch.clone()));
        (fetch, true)
    }

    /// Records a finished fetch. Results from a fetch that was detached by
    /// invalidation are dropped. Returns whether the result was stored.
    pub fn complete(&mut self, key: &QueryKey, fetch_id: u64, result: &AppResult<NotesPage>) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.in_flight.as_ref().map(|(id, _)| *id) != Some(fetch_id) {
            return false;
        }

        entry.in_flight = None;
        match result {
            Ok(page) => {
                entry.data = Some(page.clone());
                entry.error = None;
                entry.stale = false;
                entry.failed_last = false;
                entry.updated_at = Some(Utc::now());
            }
            Err(error) => {
                entry.error = Some(error.clone());
                entry.failed_last = true;
            }
        }
        true
    }

    pub fn snapshot(&self, key: &QueryKey) -> QuerySnapshot {
        match self.entries.get(key) {
            Some(entry) => QuerySnapshot {
                key: key.clone(),
                status: entry.status(),
                data: entry.data.clone(),
                error: entry.error.clone(),
                stale: entry.stale,
                updated_at: entry.updated_at,
            },
            None => QuerySnapshot {
                key: key.clone(),
                status: QueryStatus::Idle,
                data: None,
                error: None,
                stale: false,
                updated_at: None,
            },
        }
    }

    /// Marks every entry stale and detaches in-flight fetches so the next
    /// read starts a fresh request. Returns the number of entries touched.
    pub fn invalidate_all(&mut self) -> usize {
        for entry in self.entries.values_mut() {
            entry.stale = true;
            entry.in_flight = None;
        }
        self.entries.len()
    }

    /// Drops the least recently updated idle entries until at most
    /// `max_entries` remain. `keep` and in-flight entries always survive.
    pub fn prune(&mut self, max_entries: usize, keep: &QueryKey) -> usize {
        if self.entries.len() <= max_entries {
            return 0;
        }

        let mut candidates = self
            .entries
            .iter()
            .filter(|(key, entry)| *key != keep && entry.in_flight.is_none())
            .map(|(key, entry)| (entry.updated_at, key.clone()))
            .collect::<Vec<_>>();
        candidates.sort();

        let excess = self.entries.len() - max_entries;
        let mut removed = 0usize;
        for (_, key) in candidates.into_iter().take(excess) {
            self.entries.remove(&key);
            removed += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn ready(result: AppResult<NotesPage>) -> SharedFetch {
        async move { FetchOutcome { result, stored: true } }.boxed().shared()
    }

    fn page(total_results: u32) -> NotesPage {
        NotesPage {
            results: Vec::new(),
            page: 1,
            total_pages: 1,
            total_results,
        }
    }

    #[test]
    fn second_join_reuses_in_flight_fetch() {
        let mut cache = QueryCache::new();
        let key = QueryKey::first_page();
        let (_, started) = cache.join_or_start(&key, |_| ready(Ok(page(1))));
        assert!(started);
        let (_, started) = cache.join_or_start(&key, |_| ready(Ok(page(2))));
        assert!(!started);
        assert_eq!(cache.snapshot(&key).status, QueryStatus::Fetching);
    }

    #[test]
    fn error_keeps_previous_data() {
        let mut cache = QueryCache::new();
        let key = QueryKey::first_page();
        let _ = cache.join_or_start(&key, |_| ready(Ok(page(3))));
        assert!(cache.complete(&key, 1, &Ok(page(3))));

        let _ = cache.join_or_start(&key, |_| ready(Ok(page(3))));
        assert!(cache.complete(&key, 2, &Err(AppError::ServerError("502".to_string()))));

        let snapshot = cache.snapshot(&key);
        assert_eq!(snapshot.status, QueryStatus::Error);
        assert_eq!(snapshot.data, Some(page(3)));
        assert!(!snapshot.is_fresh());
    }

    #[test]
    fn invalidation_detaches_in_flight_results() {
        let mut cache = QueryCache::new();
        let key = QueryKey::first_page();
        let _ = cache.join_or_start(&key, |_| ready(Ok(page(1))));
        assert_eq!(cache.invalidate_all(), 1);
        assert!(!cache.complete(&key, 1, &Ok(page(1))));

        let snapshot = cache.snapshot(&key);
        assert!(snapshot.stale);
        assert_eq!(snapshot.status, QueryStatus::Idle);
    }

    #[test]
    fn prune_keeps_current_key() {
        let mut cache = QueryCache::new();
        let current = QueryKey::new(1, "");
        for page_number in 1..=4 {
            let key = QueryKey::new(page_number, "");
            let _ = cache.join_or_start(&key, |_| ready(Ok(page(page_number))));
            let fetch_id = cache.next_fetch_id;
            cache.complete(&key, fetch_id, &Ok(page(page_number)));
        }
        assert_eq!(cache.prune(2, &current), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.snapshot(&current).data.is_some());
    }
}
