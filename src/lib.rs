//! Library management client
//!
//! Data access for the library REST API: a remote client with one call per
//! operation, and a query cache that serves repeated reads and refreshes them
//! when a mutation invalidates their tags.

use std::sync::Arc;

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use api::ApiClient;
pub use cache::{QueryStore, Subscription, Tag};
pub use config::AppConfig;
pub use error::{ApiError, AppError, AppResult};

/// Application state shared by every view
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: QueryStore,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Build the HTTP client, the store and the services from configuration
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let client = ApiClient::from_config(&config.api)?;
        Ok(Self::with_client(config, client))
    }

    /// Same as [`AppState::new`] over an existing client
    pub fn with_client(config: AppConfig, client: ApiClient) -> Self {
        let store = QueryStore::new(client, &config.cache);
        let services = services::Services::new(store.clone());
        Self {
            config: Arc::new(config),
            store,
            services: Arc::new(services),
        }
    }
}
