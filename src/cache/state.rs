//! Cache entry state and the typed view subscribers get of it

use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::ApiError;

/// Type-erased result payload held by an entry
pub(crate) type Payload = Arc<dyn Any + Send + Sync>;

/// Lifecycle of a cache entry.
///
/// `Uninitialized -> Loading -> Ready | Error`, and back to `Loading` on
/// invalidation or refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    Uninitialized,
    Loading,
    Ready,
    Error,
}

/// What an entry holds. Data survives a failed refresh.
#[derive(Clone)]
pub(crate) struct EntryState {
    pub status: QueryStatus,
    pub data: Option<Payload>,
    pub error: Option<ApiError>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl Default for EntryState {
    fn default() -> Self {
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            fulfilled_at: None,
        }
    }
}

impl EntryState {
    pub fn is_settled(&self) -> bool {
        matches!(self.status, QueryStatus::Ready | QueryStatus::Error)
    }
}

/// Snapshot of a query as seen by one subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub status: QueryStatus,
    /// Last successfully fetched value, kept while a refresh is loading or failed
    pub data: Option<T>,
    /// Error of the last attempt, cleared by the next success
    pub error: Option<ApiError>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl<T: Clone + 'static> QueryResult<T> {
    pub(crate) fn from_state(state: &EntryState) -> Self {
        Self {
            status: state.status,
            data: state
                .data
                .as_ref()
                .and_then(|payload| payload.downcast_ref::<T>())
                .cloned(),
            error: state.error.clone(),
            fulfilled_at: state.fulfilled_at,
        }
    }
}

impl<T> QueryResult<T> {
    /// First load: nothing to show yet
    pub fn is_loading(&self) -> bool {
        self.is_fetching() && self.data.is_none()
    }

    /// A request is outstanding, with or without data to show meanwhile
    pub fn is_fetching(&self) -> bool {
        matches!(self.status, QueryStatus::Uninitialized | QueryStatus::Loading)
    }

    pub fn is_ready(&self) -> bool {
        self.status == QueryStatus::Ready
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Outcome of the last settled attempt
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.status, self.data, self.error) {
            (QueryStatus::Error, _, Some(error)) => Err(error),
            (_, Some(data), _) => Ok(data),
            (status, None, _) => Err(ApiError::Cancelled(format!(
                "no data available (status {:?})",
                status
            ))),
        }
    }
}
