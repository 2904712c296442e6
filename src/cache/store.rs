//! The query store: owns every cache entry and the tag index

use std::collections::{hash_map, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;

use super::{
    key::QueryKey,
    state::{EntryState, Payload, QueryStatus},
    subscription::Subscription,
    Tag,
};
use crate::{
    api::{endpoints::BoxFuture, ApiClient, MutationEndpoint, QueryEndpoint},
    config::CacheConfig,
    error::ApiError,
};

type Fetcher = Arc<dyn Fn() -> BoxFuture<Payload> + Send + Sync>;

/// Outstanding request of an entry
#[derive(Debug, Clone, Copy)]
struct Request {
    id: u64,
    /// Write sequence when the request went out
    after_write: u64,
}

struct Entry {
    tags: &'static [Tag],
    state: watch::Sender<EntryState>,
    /// Re-issues the entry's read; captured at creation with its arguments
    fetcher: Fetcher,
    subscribers: usize,
    /// At most one per entry
    in_flight: Option<Request>,
    /// Invalidated since the last request went out: fetched again when the
    /// outstanding one lands, or on the next subscription if nobody watches
    stale: bool,
    idle_since: Option<Instant>,
}

impl Entry {
    fn new(tags: &'static [Tag], fetcher: Fetcher) -> Self {
        let (state, _) = watch::channel(EntryState::default());
        Self {
            tags,
            state,
            fetcher,
            subscribers: 0,
            in_flight: None,
            stale: false,
            idle_since: None,
        }
    }

    fn status(&self) -> QueryStatus {
        self.state.borrow().status
    }
}

#[derive(Default)]
struct StoreInner {
    entries: HashMap<QueryKey, Entry>,
    /// Reverse index: tag -> keys of the entries carrying it
    tag_index: HashMap<Tag, HashSet<QueryKey>>,
    next_request_id: u64,
    /// Bumped by every confirmed mutation
    write_seq: u64,
}

impl StoreInner {
    fn evict(&mut self, key: &QueryKey) {
        let Some(entry) = self.entries.remove(key) else {
            return;
        };
        for tag in entry.tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        tracing::debug!("Evicted cache entry {}", key);
    }

    /// Drop entries nobody has watched for at least `keep_unused_for`
    fn sweep(&mut self, keep_unused_for: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.subscribers == 0
                    && entry
                        .idle_since
                        .map(|since| now.duration_since(since) >= keep_unused_for)
                        .unwrap_or(false)
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.evict(key);
        }
        expired.len()
    }

    /// Record a finished request. Returns true when the entry was invalidated
    /// meanwhile and is still watched, so it must be fetched once more; the
    /// entry then stays `Loading` with the new data.
    fn complete(&mut self, key: &QueryKey, request_id: u64, result: Result<Payload, ApiError>) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            tracing::debug!("Discarding result for evicted cache entry {}", key);
            return false;
        };
        if entry.in_flight.map(|request| request.id) != Some(request_id) {
            return false;
        }
        entry.in_flight = None;
        let again = entry.stale && entry.subscribers > 0;

        match result {
            Ok(payload) => {
                tracing::debug!("Cache entry {} ready", key);
                entry.state.send_modify(|state| {
                    if !again {
                        state.status = QueryStatus::Ready;
                    }
                    state.data = Some(payload);
                    state.error = None;
                    state.fulfilled_at = Some(Utc::now());
                });
            }
            Err(error) => {
                tracing::warn!("Cache entry {} failed: {}", key, error);
                entry.state.send_modify(|state| {
                    if !again {
                        state.status = QueryStatus::Error;
                    }
                    state.error = Some(error);
                });
            }
        }

        if again {
            tracing::debug!("Cache entry {} invalidated while loading, fetching again", key);
        }
        again
    }

    /// Mark tagged entries stale and refetch the observed ones. An entry
    /// already loading is refetched after it lands, and only when its request
    /// predates the last confirmed mutation.
    fn invalidate(&mut self, store: &Arc<Mutex<StoreInner>>, tags: &[Tag]) -> usize {
        let keys: HashSet<QueryKey> = tags
            .iter()
            .filter_map(|tag| self.tag_index.get(tag))
            .flatten()
            .cloned()
            .collect();

        let mut started = 0;
        for key in &keys {
            let write_seq = self.write_seq;
            let Some(entry) = self.entries.get_mut(key) else {
                continue;
            };
            match entry.in_flight {
                Some(request) => {
                    if request.after_write < write_seq {
                        entry.stale = true;
                    }
                }
                None => {
                    entry.stale = true;
                    if entry.subscribers > 0 && start_fetch(store, self, key) {
                        started += 1;
                    }
                }
            }
        }

        tracing::debug!(
            "Invalidated {:?}: {} entries affected, {} refetches started",
            tags,
            keys.len(),
            started
        );
        started
    }
}

fn lock(inner: &Mutex<StoreInner>) -> MutexGuard<'_, StoreInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide query cache.
///
/// Create one at start-up and hand clones to whatever needs data; clones
/// share the same entries.
#[derive(Clone)]
pub struct QueryStore {
    client: ApiClient,
    inner: Arc<Mutex<StoreInner>>,
    keep_unused_for: Duration,
}

impl QueryStore {
    pub fn new(client: ApiClient, config: &CacheConfig) -> Self {
        Self {
            client,
            inner: Arc::new(Mutex::new(StoreInner::default())),
            keep_unused_for: config.keep_unused_for(),
        }
    }

    /// Subscribe to a read.
    ///
    /// Serves the cached value when there is one and starts a fetch when the
    /// entry is new, stale or failed. The subscription keeps the entry alive
    /// until dropped.
    pub fn subscribe<Q: QueryEndpoint>(&self, args: Q::Args) -> Subscription<Q::Output> {
        let key = QueryKey::new::<Q>(&args);
        let mut guard = lock(&self.inner);
        let inner = &mut *guard;

        let entry = match inner.entries.entry(key.clone()) {
            hash_map::Entry::Occupied(occupied) => occupied.into_mut(),
            hash_map::Entry::Vacant(vacant) => {
                for tag in Q::PROVIDES {
                    inner.tag_index.entry(*tag).or_default().insert(key.clone());
                }
                tracing::debug!("Created cache entry {}", key);
                vacant.insert(Entry::new(Q::PROVIDES, self.fetcher::<Q>(args)))
            }
        };

        entry.subscribers += 1;
        entry.idle_since = None;
        let receiver = entry.state.subscribe();
        let needs_fetch = entry.in_flight.is_none()
            && (entry.stale
                || matches!(entry.status(), QueryStatus::Uninitialized | QueryStatus::Error));

        if needs_fetch {
            start_fetch(&self.inner, inner, &key);
        } else {
            tracing::debug!("Cache hit for {}", key);
        }
        drop(guard);

        Subscription::new(self.clone(), key, receiver)
    }

    /// Subscribe, wait for the read to settle, then release the subscription
    pub async fn query<Q: QueryEndpoint>(&self, args: Q::Args) -> Result<Q::Output, ApiError> {
        let mut subscription = self.subscribe::<Q>(args);
        subscription.settled().await
    }

    /// Run a mutation and, once the server confirmed it, invalidate its tags.
    ///
    /// The call runs on its own task: if the caller stops waiting, the request
    /// still completes and still invalidates. A failed mutation leaves the
    /// cache untouched.
    pub async fn mutate<M>(&self, args: M::Args) -> Result<M::Output, ApiError>
    where
        M: MutationEndpoint,
    {
        let store = self.clone();
        let task = tokio::spawn(async move {
            let result = M::execute(store.client.clone(), args).await;
            match &result {
                Ok(_) => {
                    tracing::info!("{} succeeded, invalidating {:?}", M::NAME, M::INVALIDATES);
                    let mut guard = lock(&store.inner);
                    guard.write_seq += 1;
                    guard.invalidate(&store.inner, M::INVALIDATES);
                }
                Err(e) => tracing::warn!("{} failed: {}", M::NAME, e),
            }
            result
        });

        task.await
            .map_err(|e| ApiError::Cancelled(format!("{} task aborted: {}", M::NAME, e)))?
    }

    /// Mark every entry tagged with any of `tags` stale and refetch the
    /// observed ones. Entries already loading are not fetched a second time
    /// in parallel, so repeated invalidation does not stack requests.
    /// Returns the number of fetches started.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        lock(&self.inner).invalidate(&self.inner, tags)
    }

    /// Refetch one entry unless it is already loading
    pub(crate) fn refetch(&self, key: &QueryKey) -> bool {
        let mut guard = lock(&self.inner);
        start_fetch(&self.inner, &mut guard, key)
    }

    /// Called when a subscription is dropped
    pub(crate) fn release(&self, key: &QueryKey) {
        let mut guard = lock(&self.inner);
        let Some(entry) = guard.entries.get_mut(key) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers > 0 {
            return;
        }
        entry.idle_since = Some(Instant::now());

        if self.keep_unused_for.is_zero() {
            guard.evict(key);
            return;
        }
        drop(guard);

        // Schedule a sweep; without a runtime the entry waits for collect_garbage()
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let inner = Arc::downgrade(&self.inner);
            let delay = self.keep_unused_for;
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(inner) = inner.upgrade() {
                    lock(&inner).sweep(delay);
                }
            });
        }
    }

    /// Evict every entry that has gone unobserved for the configured period.
    /// Entries released outside a runtime have no scheduled sweep and wait
    /// for this.
    pub fn collect_garbage(&self) -> usize {
        lock(&self.inner).sweep(self.keep_unused_for)
    }

    /// Number of cache entries currently held
    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Status of the entry for `Q(args)`, if the store holds one
    pub fn status<Q: QueryEndpoint>(&self, args: &Q::Args) -> Option<QueryStatus> {
        let key = QueryKey::new::<Q>(args);
        lock(&self.inner).entries.get(&key).map(Entry::status)
    }

    fn fetcher<Q: QueryEndpoint>(&self, args: Q::Args) -> Fetcher {
        let client = self.client.clone();
        Arc::new(move || -> BoxFuture<Payload> {
            let future = Q::fetch(client.clone(), args.clone());
            Box::pin(async move { future.await.map(|output| Arc::new(output) as Payload) })
        })
    }

}

/// Move the entry to `Loading` and spawn its fetch. No-op when a request for
/// the entry is already outstanding, or when called outside a Tokio runtime.
fn start_fetch(store: &Arc<Mutex<StoreInner>>, inner: &mut StoreInner, key: &QueryKey) -> bool {
    let StoreInner {
        entries,
        next_request_id,
        write_seq,
        ..
    } = inner;
    let Some(entry) = entries.get_mut(key) else {
        return false;
    };
    if entry.in_flight.is_some() {
        tracing::debug!("Fetch already in flight for {}", key);
        return false;
    }
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::warn!("No Tokio runtime, not fetching {}", key);
        return false;
    };

    *next_request_id += 1;
    let request = Request {
        id: *next_request_id,
        after_write: *write_seq,
    };
    entry.in_flight = Some(request);
    entry.stale = false;
    entry.state.send_modify(|state| state.status = QueryStatus::Loading);

    let future = (entry.fetcher)();
    let key = key.clone();
    tracing::debug!("Fetching {}", key);
    runtime.spawn(run_fetch(Arc::downgrade(store), key, request.id, future));
    true
}

async fn run_fetch(
    store: Weak<Mutex<StoreInner>>,
    key: QueryKey,
    request_id: u64,
    future: BoxFuture<Payload>,
) {
    let result = future.await;
    let Some(store) = store.upgrade() else {
        return;
    };
    let mut guard = lock(&store);
    if guard.complete(&key, request_id, result) {
        start_fetch(&store, &mut guard, &key);
    }
}
