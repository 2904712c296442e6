//! Remote access client for the library REST API
//!
//! One method per API operation. Every call is a single round trip: no
//! retries, no batching, no input validation. All failures come back as
//! [`ApiError`].

pub mod books;
pub mod borrow;
pub mod endpoints;
pub mod transport;

use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{config::ApiConfig, error::ApiError};

pub use endpoints::{MutationEndpoint, QueryEndpoint};
pub use transport::{HttpTransport, Transport};

/// Request handed to a [`Transport`]. `path` is relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            body: None,
        }
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }

    pub fn put<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Ok(Self {
            method: Method::PUT,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// Status and body of an HTTP response, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Success envelope: every API payload is wrapped as `{ "data": ... }`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Client for the library API
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client talking HTTP to the configured base URL
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Perform the round trip and reject any non-2xx status
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let method = request.method.clone();
        let path = request.path.clone();
        tracing::debug!("API {} {}", method, path);

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!("API {} {} failed: {}", method, path, e);
            e
        })?;

        if !response.is_success() {
            let error = ApiError::from_response(response.status, &response.body);
            tracing::warn!("API {} {} returned {}: {}", method, path, response.status, error);
            return Err(error);
        }

        Ok(response)
    }

    /// Perform the round trip and decode the `data` field of the envelope
    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let envelope: Envelope<T> = serde_json::from_slice(&response.body).map_err(|e| {
            tracing::warn!("Failed to decode API response: {}", e);
            ApiError::from(e)
        })?;
        Ok(envelope.data)
    }
}
