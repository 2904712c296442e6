//! Static declarations of every API operation for the query cache.
//!
//! A query names the tags its cached result provides; a mutation names the
//! tags it invalidates once the server has confirmed it.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use super::ApiClient;
use crate::{
    cache::Tag,
    error::ApiError,
    models::{Book, BookChanges, BorrowRecord, NewBook, NewBorrow},
};

/// Owned future returned by endpoint calls
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'static>>;

/// A cacheable read
pub trait QueryEndpoint: 'static {
    /// Arguments; their JSON serialization is part of the cache key
    type Args: Serialize + Clone + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    const NAME: &'static str;
    const PROVIDES: &'static [Tag];

    fn fetch(client: ApiClient, args: Self::Args) -> BoxFuture<Self::Output>;
}

/// A write that invalidates cached reads on success
pub trait MutationEndpoint: 'static {
    type Args: Send + 'static;
    type Output: Send + 'static;

    const NAME: &'static str;
    const INVALIDATES: &'static [Tag];

    fn execute(client: ApiClient, args: Self::Args) -> BoxFuture<Self::Output>;
}

pub struct ListBooks;

impl QueryEndpoint for ListBooks {
    type Args = ();
    type Output = Vec<Book>;

    const NAME: &'static str = "list_books";
    const PROVIDES: &'static [Tag] = &[Tag::Book];

    fn fetch(client: ApiClient, _args: ()) -> BoxFuture<Vec<Book>> {
        Box::pin(async move { client.list_books().await })
    }
}

pub struct GetBook;

impl QueryEndpoint for GetBook {
    type Args = String;
    type Output = Book;

    const NAME: &'static str = "get_book";
    const PROVIDES: &'static [Tag] = &[Tag::Book];

    fn fetch(client: ApiClient, id: String) -> BoxFuture<Book> {
        Box::pin(async move { client.get_book(&id).await })
    }
}

pub struct BorrowSummary;

impl QueryEndpoint for BorrowSummary {
    type Args = ();
    type Output = Vec<BorrowRecord>;

    const NAME: &'static str = "borrow_summary";
    const PROVIDES: &'static [Tag] = &[Tag::Borrow];

    fn fetch(client: ApiClient, _args: ()) -> BoxFuture<Vec<BorrowRecord>> {
        Box::pin(async move { client.borrow_summary().await })
    }
}

pub struct CreateBook;

impl MutationEndpoint for CreateBook {
    type Args = NewBook;
    type Output = Book;

    const NAME: &'static str = "create_book";
    const INVALIDATES: &'static [Tag] = &[Tag::Book];

    fn execute(client: ApiClient, book: NewBook) -> BoxFuture<Book> {
        Box::pin(async move { client.create_book(&book).await })
    }
}

pub struct UpdateBook;

impl MutationEndpoint for UpdateBook {
    type Args = (String, BookChanges);
    type Output = Book;

    const NAME: &'static str = "update_book";
    const INVALIDATES: &'static [Tag] = &[Tag::Book];

    fn execute(client: ApiClient, (id, changes): (String, BookChanges)) -> BoxFuture<Book> {
        Box::pin(async move { client.update_book(&id, &changes).await })
    }
}

pub struct DeleteBook;

impl MutationEndpoint for DeleteBook {
    type Args = String;
    type Output = ();

    const NAME: &'static str = "delete_book";
    const INVALIDATES: &'static [Tag] = &[Tag::Book];

    fn execute(client: ApiClient, id: String) -> BoxFuture<()> {
        Box::pin(async move { client.delete_book(&id).await })
    }
}

pub struct CreateBorrow;

impl MutationEndpoint for CreateBorrow {
    type Args = NewBorrow;
    type Output = BorrowRecord;

    const NAME: &'static str = "create_borrow";
    const INVALIDATES: &'static [Tag] = &[Tag::Borrow];

    fn execute(client: ApiClient, borrow: NewBorrow) -> BoxFuture<BorrowRecord> {
        Box::pin(async move { client.create_borrow(&borrow).await })
    }
}
