//! Catalog and borrow flows, including the notices they produce

use std::time::Duration;

use chrono::{Days, Local};
use library_client::{
    models::{BookChanges, Genre, NewBook},
    services::{notice, Notice, NoticeLevel},
    AppError, Tag,
};
use tokio_stream::StreamExt;

use crate::support::{state_over, FakeLibrary};

fn form() -> NewBook {
    NewBook {
        title: "Kindred".to_string(),
        author: "Octavia E. Butler".to_string(),
        genre: Genre::Fiction,
        isbn: "978-0807083697".to_string(),
        description: Some("A time-travel novel".to_string()),
        copies: 2,
        available: Some(true),
    }
}

fn next_week() -> chrono::NaiveDate {
    Local::now().date_naive() + Days::new(7)
}

#[tokio::test]
async fn test_add_book_rejects_invalid_form_without_request() {
    let library = FakeLibrary::new();
    let state = state_over(&library);

    let mut book = form();
    book.isbn = "978#0807".to_string();
    let result = state.services.catalog.create_book(book).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    let notice = Notice::for_outcome(&result, notice::BOOK_ADDED, notice::BOOK_ADD_FAILED);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Please enter a valid ISBN");
    assert_eq!(library.calls("POST /books"), 0);
}

#[tokio::test]
async fn test_add_book_requires_a_copy() {
    let library = FakeLibrary::new();
    let state = state_over(&library);

    let mut book = form();
    book.copies = 0;
    let err = state.services.catalog.create_book(book).await.unwrap_err();

    assert_eq!(err.user_message(notice::BOOK_ADD_FAILED), "Must have at least 1 copy");
}

#[tokio::test]
async fn test_add_book_success_notice() {
    let library = FakeLibrary::new();
    let state = state_over(&library);

    let result = state.services.catalog.create_book(form()).await;
    let notice = Notice::for_outcome(&result, notice::BOOK_ADDED, notice::BOOK_ADD_FAILED);

    assert_eq!(notice, Notice::success("Book added successfully"));
    assert_eq!(state.services.catalog.list_books().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_server_failure_notice_uses_server_message() {
    let library = FakeLibrary::new();
    library.fail("POST /books", 500);
    let state = state_over(&library);

    let result = state.services.catalog.create_book(form()).await;
    let notice = Notice::for_outcome(&result, notice::BOOK_ADDED, notice::BOOK_ADD_FAILED);

    assert!(notice.is_error());
    assert_eq!(notice.message, "Something went wrong");
}

#[tokio::test]
async fn test_empty_edit_is_rejected() {
    let library = FakeLibrary::new();
    let id = library.seed_book("Dune", 3, true);
    let state = state_over(&library);

    let err = state
        .services
        .catalog
        .update_book(&id, BookChanges::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BusinessRule(_)));
    assert_eq!(library.calls("PUT /books/:id"), 0);
}

#[tokio::test]
async fn test_edit_sends_changed_fields_and_refreshes_details() {
    let library = FakeLibrary::new();
    let id = library.seed_book("Dune", 3, true);
    let state = state_over(&library);
    let catalog = &state.services.catalog;

    let mut details = catalog.watch_book(&id);
    details.settled().await.unwrap();

    let changes = BookChanges {
        copies: Some(7),
        ..Default::default()
    };
    catalog.update_book(&id, changes).await.unwrap();

    let book = details.settled().await.unwrap();
    assert_eq!(book.copies, 7);
    assert_eq!(book.title, "Dune");
}

#[tokio::test]
async fn test_delete_missing_book_reports_not_found() {
    let library = FakeLibrary::new();
    let state = state_over(&library);

    let result = state.services.catalog.delete_book("nope").await;
    let notice = Notice::for_outcome(&result, notice::BOOK_DELETED, notice::BOOK_DELETE_FAILED);

    assert!(notice.is_error());
    assert_eq!(notice.message, "Book not found");
}

#[tokio::test]
async fn test_borrow_updates_summary_and_book() {
    let library = FakeLibrary::new();
    let id = library.seed_book("Dune", 3, true);
    let state = state_over(&library);
    let loans = &state.services.loans;

    let mut summary = loans.watch_summary();
    let mut details = state.services.catalog.watch_book(&id);
    summary.settled().await.unwrap();
    details.settled().await.unwrap();

    let record = loans.borrow_book(&id, 2, next_week()).await.unwrap();
    assert_eq!(record.book.id(), Some(id.as_str()));
    assert_eq!(record.quantity, Some(2));

    let rows = summary.settled().await.unwrap();
    assert_eq!(rows[0].borrowed_quantity(), 2);
    let book = details.settled().await.unwrap();
    assert_eq!(book.copies, 1);
}

#[tokio::test]
async fn test_borrow_rejects_past_due_date() {
    let library = FakeLibrary::new();
    let id = library.seed_book("Dune", 3, true);
    let state = state_over(&library);

    let today = Local::now().date_naive();
    let err = state.services.loans.borrow_book(&id, 1, today).await.unwrap_err();

    assert_eq!(err.user_message(notice::BOOK_BORROW_FAILED), "Due date must be in the future");
    assert_eq!(library.calls("POST /borrow"), 0);
}

#[tokio::test]
async fn test_borrow_rejects_zero_quantity() {
    let library = FakeLibrary::new();
    let id = library.seed_book("Dune", 3, true);
    let state = state_over(&library);

    let err = state.services.loans.borrow_book(&id, 0, next_week()).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(library.calls("GET /books/:id"), 0);
}

#[tokio::test]
async fn test_borrow_rejects_unavailable_book() {
    let library = FakeLibrary::new();
    let id = library.seed_book("Dune", 3, false);
    let state = state_over(&library);

    let err = state.services.loans.borrow_book(&id, 1, next_week()).await.unwrap_err();

    assert!(matches!(err, AppError::BusinessRule(_)));
    assert_eq!(library.calls("POST /borrow"), 0);
}

#[tokio::test]
async fn test_borrow_rejects_more_than_available() {
    let library = FakeLibrary::new();
    let id = library.seed_book("Dune", 2, true);
    let state = state_over(&library);

    let err = state.services.loans.borrow_book(&id, 3, next_week()).await.unwrap_err();

    assert_eq!(err.user_message(notice::BOOK_BORROW_FAILED), "Only 2 copies available");
    assert_eq!(library.calls("POST /borrow"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_borrow_still_refreshes_book() {
    let library = FakeLibrary::new();
    let id = library.seed_book("Dune", 3, true);
    library.delay("POST /borrow", Duration::from_millis(50));
    let state = state_over(&library);

    let mut details = state.services.catalog.watch_book(&id);
    details.settled().await.unwrap();

    let borrow = state.services.loans.borrow_book(&id, 1, next_week());
    assert!(tokio::time::timeout(Duration::from_millis(10), borrow).await.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(library.calls("POST /borrow"), 1);
    assert_eq!(details.settled().await.unwrap().copies, 2);
}

#[tokio::test]
async fn test_book_list_stream_follows_refresh() {
    let library = FakeLibrary::new();
    library.seed_book("Dune", 3, true);
    let state = state_over(&library);

    let mut stream = Box::pin(state.services.catalog.watch_books().into_stream());

    let first = stream.next().await.unwrap();
    assert!(first.is_loading());
    assert!(first.fulfilled_at.is_none());

    let ready = stream.next().await.unwrap();
    assert!(ready.is_ready());
    assert_eq!(ready.data.as_ref().map(Vec::len), Some(1));
    assert!(ready.fulfilled_at.is_some());

    library.seed_book("Emma", 1, true);
    assert_eq!(state.store.invalidate(&[Tag::Book]), 1);

    let refreshing = stream.next().await.unwrap();
    assert!(refreshing.is_fetching());
    assert_eq!(refreshing.data.as_ref().map(Vec::len), Some(1));

    let refreshed = stream.next().await.unwrap();
    assert!(refreshed.is_ready());
    assert_eq!(refreshed.data.as_ref().map(Vec::len), Some(2));
    assert!(refreshed.fulfilled_at >= ready.fulfilled_at);
}
