pub mod cache;

use crate::errors::AppResult;
use crate::models::{CreateNoteDto, Note, NotesPage, QueryKey};
use crate::service::NoteApi;
use cache::{FetchOutcome, QueryCache, SharedFetch};
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard};

pub use cache::{QuerySnapshot, QueryStatus};

/// Owns the notes cache. Reads go through `fetch`/`ensure`, writes through
/// the mutation methods; the UI only ever sees snapshots.
#[derive(Clone)]
pub struct NotesQuery {
    api: Arc<dyn NoteApi>,
    cache: Arc<Mutex<QueryCache>>,
    current: Arc<Mutex<QueryKey>>,
    per_page: u32,
    capacity: usize,
}

impl NotesQuery {
    pub fn new(api: Arc<dyn NoteApi>, per_page: u32, capacity: usize) -> Self {
        Self {
            api,
            cache: Arc::new(Mutex::new(QueryCache::new())),
            current: Arc::new(Mutex::new(QueryKey::first_page())),
            per_page: per_page.max(1),
            capacity: capacity.max(1),
        }
    }

    pub fn current_key(&self) -> QueryKey {
        lock(&self.current).clone()
    }

    pub fn set_current_key(&self, key: QueryKey) {
        *lock(&self.current) = key;
    }

    pub fn snapshot(&self, key: &QueryKey) -> QuerySnapshot {
        lock(&self.cache).snapshot(key)
    }

    /// Fetches `key` from the network. A fetch already running for the same
    /// key is joined instead of issuing a second request. A read detached by
    /// invalidation is never returned; the key is read again instead.
    pub async fn fetch(&self, key: QueryKey) -> AppResult<NotesPage> {
        loop {
            let outcome = self.fetch_once(&key).await;
            self.prune_unused();
            if outcome.stored {
                return outcome.result;
            }
            tracing::debug!(key = %key, "notes fetch detached by invalidation, reading again");
        }
    }

    fn fetch_once(&self, key: &QueryKey) -> SharedFetch {
        let (fetch, started) = {
            let mut cache = lock(&self.cache);
            cache.join_or_start(key, |fetch_id| {
                let api = Arc::clone(&self.api);
                let cache = Arc::clone(&self.cache);
                let params = key.params(self.per_page);
                let key = key.clone();
                async move {
                    let result = api.fetch_notes(params).await;
                    let stored = lock(&cache).complete(&key, fetch_id, &result);
                    FetchOutcome { result, stored }
                }
                .boxed()
                .shared()
            })
        };
        if started {
            tracing::debug!(key = %key, "fetching notes page");
        } else {
            tracing::debug!(key = %key, "joined in-flight notes fetch");
        }
        fetch
    }

    /// Serves fresh cached data without touching the network; anything
    /// missing, stale or failed is fetched.
    pub async fn ensure(&self, key: QueryKey) -> AppResult<NotesPage> {
        let snapshot = self.snapshot(&key);
        if snapshot.is_fresh() {
            if let Some(page) = snapshot.data {
                return Ok(page);
            }
        }
        self.fetch(key).await
    }

    /// Marks every notes entry stale. Returns the number of entries marked.
    pub fn invalidate_notes(&self) -> usize {
        let count = lock(&self.cache).invalidate_all();
        tracing::debug!(entries = count, "invalidated notes cache");
        count
    }

    pub async fn delete_note(&self, id: &str) -> AppResult<Note> {
        let deleted = self.api.delete_note(id.to_string()).await.map_err(|error| {
            tracing::warn!(note_id = %id, error = %error, "failed to delete note");
            error
        })?;
        tracing::info!(note_id = %deleted.id, "note deleted");
        self.after_mutation(self.current_key()).await;
        Ok(deleted)
    }

    /// Creates a note, then refetches `landing`, the key the caller shows
    /// once the create succeeds.
    pub async fn create_note(&self, dto: CreateNoteDto, landing: QueryKey) -> AppResult<Note> {
        let created = self.api.create_note(dto).await.map_err(|error| {
            tracing::warn!(error = %error, "failed to create note");
            error
        })?;
        tracing::info!(note_id = %created.id, tag = %created.tag, "note created");
        self.after_mutation(landing).await;
        Ok(created)
    }

    async fn after_mutation(&self, key: QueryKey) {
        self.invalidate_notes();
        if let Err(error) = self.fetch(key.clone()).await {
            tracing::warn!(key = %key, error = %error, "refetch after mutation failed");
        }
    }

    /// Bounds the cache to its configured capacity. Returns entries dropped.
    pub fn prune_unused(&self) -> usize {
        let keep = self.current_key();
        lock(&self.cache).prune(self.capacity, &keep)
    }

    pub fn cached_entries(&self) -> usize {
        lock(&self.cache).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::models::NoteTag;
    use crate::test_support::FakeNoteApi;
    use std::time::Duration;

    fn query(api: &Arc<FakeNoteApi>) -> NotesQuery {
        NotesQuery::new(api.clone(), 12, 32)
    }

    #[tokio::test]
    async fn concurrent_same_key_fetches_share_one_request() {
        let api = Arc::new(FakeNoteApi::with_notes(3).delayed(Duration::from_millis(50)));
        let query = query(&api);
        let key = QueryKey::first_page();

        let (first, second) = tokio::join!(query.fetch(key.clone()), query.fetch(key.clone()));
        assert_eq!(api.fetch_calls(), 1);
        assert_eq!(first.expect("first"), second.expect("second"));
        assert_eq!(query.snapshot(&key).status, QueryStatus::Success);
    }

    #[tokio::test]
    async fn different_keys_fetch_independently() {
        let api = Arc::new(FakeNoteApi::with_notes(30).delayed(Duration::from_millis(20)));
        let query = query(&api);

        let (first, second) = tokio::join!(
            query.fetch(QueryKey::new(1, "")),
            query.fetch(QueryKey::new(2, ""))
        );
        assert_eq!(api.fetch_calls(), 2);
        assert_eq!(first.expect("page 1").page, 1);
        assert_eq!(second.expect("page 2").page, 2);
    }

    #[tokio::test]
    async fn ensure_serves_fresh_cache_without_network() {
        let api = Arc::new(FakeNoteApi::with_notes(2));
        let query = query(&api);
        let key = QueryKey::first_page();

        query.ensure(key.clone()).await.expect("first load");
        query.ensure(key.clone()).await.expect("cached load");
        assert_eq!(api.fetch_calls(), 1);

        query.invalidate_notes();
        assert!(query.snapshot(&key).stale);
        query.ensure(key.clone()).await.expect("refetch");
        assert_eq!(api.fetch_calls(), 2);
        assert!(!query.snapshot(&key).stale);
    }

    #[tokio::test]
    async fn delete_refetches_current_page_without_the_note() {
        let api = Arc::new(FakeNoteApi::with_notes(5));
        let query = query(&api);
        let key = QueryKey::first_page();
        let page = query.fetch(key.clone()).await.expect("initial page");
        let victim = page.results[2].id.clone();

        query.delete_note(&victim).await.expect("delete");
        let snapshot = query.snapshot(&key);
        assert!(snapshot.is_fresh());
        let refreshed = snapshot.data.expect("refetched page");
        assert!(!refreshed.contains(&victim));
        assert_eq!(refreshed.results.len(), 4);

        let again = query.fetch(key).await.expect("later fetch");
        assert!(!again.contains(&victim));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_untouched() {
        let api = Arc::new(FakeNoteApi::with_notes(2));
        let query = query(&api);
        let key = QueryKey::first_page();
        let before = query.fetch(key.clone()).await.expect("initial page");

        let err = query.delete_note("missing").await.expect_err("unknown note");
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(api.mutation_calls(), 1);
        let snapshot = query.snapshot(&key);
        assert!(!snapshot.stale);
        assert_eq!(snapshot.data, Some(before));
        assert_eq!(api.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn create_invalidates_every_cached_key() {
        let api = Arc::new(FakeNoteApi::with_notes(1));
        let query = query(&api);
        let searched = QueryKey::new(1, "note");
        query.fetch(QueryKey::first_page()).await.expect("first page");
        query.fetch(searched.clone()).await.expect("searched page");

        let created = query
            .create_note(
                CreateNoteDto {
                    title: "Groceries".to_string(),
                    content: None,
                    tag: NoteTag::Shopping,
                },
                QueryKey::first_page(),
            )
            .await
            .expect("create");

        let current = query.snapshot(&QueryKey::first_page());
        assert!(current.data.expect("refetched").contains(&created.id));
        assert!(query.snapshot(&searched).stale);
    }

    #[tokio::test]
    async fn fetch_error_keeps_previous_page_visible() {
        let api = Arc::new(FakeNoteApi::with_notes(2));
        let query = query(&api);
        let key = QueryKey::first_page();
        let first = query.fetch(key.clone()).await.expect("first page");

        api.fail_with(Some(AppError::ServerError("500 Internal Server Error".to_string())));
        let err = query.fetch(key.clone()).await.expect_err("server down");
        assert!(matches!(err, AppError::ServerError(_)));

        let snapshot = query.snapshot(&key);
        assert_eq!(snapshot.status, QueryStatus::Error);
        assert_eq!(snapshot.data, Some(first));
    }

    #[tokio::test]
    async fn cache_is_bounded_by_capacity() {
        let api = Arc::new(FakeNoteApi::with_notes(40));
        let query = NotesQuery::new(api.clone(), 5, 3);
        for page in 1..=6 {
            query.fetch(QueryKey::new(page, "")).await.expect("page");
        }
        assert!(query.cached_entries() <= 3);
        assert!(query.snapshot(&QueryKey::first_page()).data.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn refetch_keeps_cached_page_visible_while_fetching() {
        let api = Arc::new(FakeNoteApi::with_notes(3));
        let query = query(&api);
        let key = QueryKey::first_page();
        let first = query.fetch(key.clone()).await.expect("first page");

        api.queue_delays([Duration::from_millis(300)]);
        let pending = tokio::spawn({
            let query = query.clone();
            let key = key.clone();
            async move { query.fetch(key).await }
        });
        while api.fetch_calls() < 2 {
            tokio::task::yield_now().await;
        }

        let snapshot = query.snapshot(&key);
        assert_eq!(snapshot.status, QueryStatus::Fetching);
        assert_eq!(snapshot.data, Some(first));

        pending.await.expect("fetch task").expect("refetch");
        assert_eq!(query.snapshot(&key).status, QueryStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_overtaken_by_delete_never_returns_the_deleted_note() {
        let api = Arc::new(FakeNoteApi::with_notes(4));
        let query = query(&api);
        let key = QueryKey::first_page();
        query.fetch(key.clone()).await.expect("first page");

        api.queue_delays([Duration::from_millis(1_000)]);
        let slow = tokio::spawn({
            let query = query.clone();
            let key = key.clone();
            async move { query.fetch(key).await }
        });
        while api.fetch_calls() < 2 {
            tokio::task::yield_now().await;
        }

        query.delete_note("note-2").await.expect("delete");
        let late = slow.await.expect("fetch task").expect("late fetch");
        assert!(!late.contains("note-2"));
        assert!(!query.snapshot(&key).data.expect("cached page").contains("note-2"));
    }

    #[tokio::test]
    async fn create_refetches_the_landing_key_only() {
        let api = Arc::new(FakeNoteApi::with_notes(30));
        let query = query(&api);
        let searched = QueryKey::new(2, "note");
        query.set_current_key(searched.clone());
        query.fetch(searched.clone()).await.expect("searched page");

        query
            .create_note(
                CreateNoteDto {
                    title: "Call plumber".to_string(),
                    content: None,
                    tag: NoteTag::Personal,
                },
                QueryKey::first_page(),
            )
            .await
            .expect("create");

        assert_eq!(api.fetch_calls(), 2);
        let refetched = api.fetched_params().pop().expect("refetch params");
        assert_eq!((refetched.page, refetched.search), (1, None));
        assert!(query.snapshot(&QueryKey::first_page()).is_fresh());
        assert!(query.snapshot(&searched).stale);
    }
}
