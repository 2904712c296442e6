//! Subscriptions: a view's read handle on one cache entry

use std::marker::PhantomData;

use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};

use super::{
    key::QueryKey,
    state::{EntryState, QueryResult},
    store::QueryStore,
};
use crate::error::ApiError;

/// Live binding to a cached read. Dropping it releases the entry, which is
/// then garbage-collected once it has gone unobserved long enough.
pub struct Subscription<T> {
    store: QueryStore,
    key: QueryKey,
    receiver: watch::Receiver<EntryState>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(store: QueryStore, key: QueryKey, receiver: watch::Receiver<EntryState>) -> Self {
        Self {
            store,
            key,
            receiver,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Ask for a fresh copy. Returns false when a fetch is already running.
    pub fn refetch(&self) -> bool {
        self.store.refetch(&self.key)
    }
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    /// Current state of the entry
    pub fn current(&self) -> QueryResult<T> {
        QueryResult::from_state(&self.receiver.borrow())
    }

    /// Wait for the next state change
    pub async fn changed(&mut self) -> Option<QueryResult<T>> {
        self.receiver.changed().await.ok()?;
        Some(QueryResult::from_state(&self.receiver.borrow_and_update()))
    }

    /// Wait until the entry is `Ready` or `Error` and return that outcome.
    /// Resolves immediately when it already is.
    pub async fn settled(&mut self) -> Result<T, ApiError> {
        let result = match self.receiver.wait_for(EntryState::is_settled).await {
            Ok(state) => Ok(QueryResult::<T>::from_state(&state)),
            Err(_) => Err(ApiError::Cancelled(format!("cache entry {} was dropped", self.key))),
        };
        result?.into_result()
    }

    /// Stream of states, starting with the current one. The subscription
    /// lives as long as the stream.
    pub fn into_stream(self) -> impl Stream<Item = QueryResult<T>> + Send + 'static {
        let receiver = self.receiver.clone();
        WatchStream::new(receiver).map(move |state| {
            let _subscription = &self;
            QueryResult::from_state(&state)
        })
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.store.release(&self.key);
    }
}
