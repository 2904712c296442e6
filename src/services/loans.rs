//! Borrow flows: the borrow form and the borrow summary page

use chrono::{Local, NaiveDate};
use validator::Validate;

use crate::{
    api::{
        endpoints::{BoxFuture, BorrowSummary, CreateBorrow, GetBook},
        ApiClient, MutationEndpoint,
    },
    cache::{QueryStore, Subscription, Tag},
    error::{AppError, AppResult},
    models::borrow::{BorrowRecord, NewBorrow},
};

/// Borrow creation as the borrow form issues it. The server takes copies off
/// the book, so book reads are refreshed along with the summary.
pub struct BorrowBook;

impl MutationEndpoint for BorrowBook {
    type Args = NewBorrow;
    type Output = BorrowRecord;

    const NAME: &'static str = "borrow_book";
    const INVALIDATES: &'static [Tag] = &[Tag::Borrow, Tag::Book];

    fn execute(client: ApiClient, borrow: NewBorrow) -> BoxFuture<BorrowRecord> {
        CreateBorrow::execute(client, borrow)
    }
}

#[derive(Clone)]
pub struct LoansService {
    store: QueryStore,
}

impl LoansService {
    pub fn new(store: QueryStore) -> Self {
        Self { store }
    }

    /// Borrow `quantity` copies of a book until `due_date`.
    ///
    /// Checks what the borrow form checks: at least one copy, a due date after
    /// today, a borrowable book with enough copies. The book is read through
    /// the cache.
    pub async fn borrow_book(
        &self,
        book_id: &str,
        quantity: u32,
        due_date: NaiveDate,
    ) -> AppResult<BorrowRecord> {
        let request = NewBorrow {
            book: book_id.to_string(),
            quantity,
            due_date,
        };
        request.validate()?;

        let today = Local::now().date_naive();
        if due_date <= today {
            return Err(AppError::BusinessRule(
                "Due date must be in the future".to_string(),
            ));
        }

        let book = self.store.query::<GetBook>(book_id.to_string()).await?;
        if !book.is_borrowable() {
            return Err(AppError::BusinessRule(format!(
                "\"{}\" is not available for borrowing",
                book.title
            )));
        }
        if !book.can_lend(quantity) {
            return Err(AppError::BusinessRule(format!(
                "Only {} copies available",
                book.copies
            )));
        }

        let record = self.store.mutate::<BorrowBook>(request).await?;
        tracing::info!("Borrowed {} x {} until {}", quantity, book.title, due_date);
        Ok(record)
    }

    /// Borrowed books with their aggregated quantities
    pub async fn borrow_summary(&self) -> AppResult<Vec<BorrowRecord>> {
        Ok(self.store.query::<BorrowSummary>(()).await?)
    }

    pub fn watch_summary(&self) -> Subscription<Vec<BorrowRecord>> {
        self.store.subscribe::<BorrowSummary>(())
    }
}
