//! Book catalog flows: what the book list, details, add and edit pages do

use validator::Validate;

use crate::{
    api::endpoints::{CreateBook, DeleteBook, GetBook, ListBooks, UpdateBook},
    cache::{QueryStore, Subscription},
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, NewBook},
};

#[derive(Clone)]
pub struct CatalogService {
    store: QueryStore,
}

impl CatalogService {
    pub fn new(store: QueryStore) -> Self {
        Self { store }
    }

    /// All books, from the cache when it holds a fresh copy
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.store.query::<ListBooks>(()).await?)
    }

    /// Live view of the book list
    pub fn watch_books(&self) -> Subscription<Vec<Book>> {
        self.store.subscribe::<ListBooks>(())
    }

    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        Ok(self.store.query::<GetBook>(id.to_string()).await?)
    }

    pub fn watch_book(&self, id: &str) -> Subscription<Book> {
        self.store.subscribe::<GetBook>(id.to_string())
    }

    /// Validate the add-book form, then create the book.
    /// Returns only after the server confirmed the creation.
    pub async fn create_book(&self, book: NewBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.store.mutate::<CreateBook>(book).await?;
        tracing::info!("Created book {} ({})", created.id, created.title);
        Ok(created)
    }

    /// Validate the edit-book form, then send the changed fields
    pub async fn update_book(&self, id: &str, changes: BookChanges) -> AppResult<Book> {
        changes.validate()?;
        if changes.is_empty() {
            return Err(AppError::BusinessRule("No changes to save".to_string()));
        }
        let updated = self
            .store
            .mutate::<UpdateBook>((id.to_string(), changes))
            .await?;
        tracing::info!("Updated book {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        self.store.mutate::<DeleteBook>(id.to_string()).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }
}
