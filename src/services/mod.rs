//! View-facing flows built on the query store

pub mod catalog;
pub mod loans;
pub mod notice;

use crate::cache::QueryStore;

pub use notice::{Notice, NoticeLevel};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services over one shared store
    pub fn new(store: QueryStore) -> Self {
        Self {
            catalog: catalog::CatalogService::new(store.clone()),
            loans: loans::LoansService::new(store),
        }
    }
}
