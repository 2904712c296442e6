//! Borrow operations

use super::{ApiClient, ApiRequest};
use crate::{
    error::ApiError,
    models::borrow::{BorrowRecord, NewBorrow},
};

impl ApiClient {
    /// Record a borrow (`POST /borrow`)
    pub async fn create_borrow(&self, borrow: &NewBorrow) -> Result<BorrowRecord, ApiError> {
        self.fetch(ApiRequest::post("/borrow", borrow)?).await
    }

    /// Borrowed quantities aggregated per book (`GET /borrow`)
    pub async fn borrow_summary(&self) -> Result<Vec<BorrowRecord>, ApiError> {
        self.fetch(ApiRequest::get("/borrow")).await
    }
}
