//! Book operations

use super::{ApiClient, ApiRequest};
use crate::{
    error::ApiError,
    models::book::{Book, BookChanges, NewBook},
};

impl ApiClient {
    /// List all books (`GET /books`)
    pub async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        self.fetch(ApiRequest::get("/books")).await
    }

    /// Get one book (`GET /books/{id}`)
    pub async fn get_book(&self, id: &str) -> Result<Book, ApiError> {
        self.fetch(ApiRequest::get(format!("/books/{}", id))).await
    }

    /// Create a book (`POST /books`)
    pub async fn create_book(&self, book: &NewBook) -> Result<Book, ApiError> {
        self.fetch(ApiRequest::post("/books", book)?).await
    }

    /// Update a book with the fields set in `changes` (`PUT /books/{id}`)
    pub async fn update_book(&self, id: &str, changes: &BookChanges) -> Result<Book, ApiError> {
        self.fetch(ApiRequest::put(format!("/books/{}", id), changes)?).await
    }

    /// Delete a book (`DELETE /books/{id}`). Only the status matters.
    pub async fn delete_book(&self, id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(format!("/books/{}", id))).await?;
        Ok(())
    }
}
