//! Borrow record model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Book fields embedded in a borrow summary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub isbn: String,
}

/// Reference from a borrow record to its book.
///
/// Borrow creation answers with the bare book id; the summary embeds the
/// book's title and ISBN instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookRef {
    Id(String),
    Summary(BookSummary),
}

impl BookRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            BookRef::Id(id) => Some(id),
            BookRef::Summary(summary) => summary.id.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            BookRef::Id(_) => None,
            BookRef::Summary(summary) => Some(&summary.title),
        }
    }

    pub fn isbn(&self) -> Option<&str> {
        match self {
            BookRef::Id(_) => None,
            BookRef::Summary(summary) => Some(&summary.isbn),
        }
    }
}

/// Borrow record as returned by the API (creation result or summary row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub book: BookRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Aggregate quantity borrowed for the book, computed server-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<u32>,
}

impl BorrowRecord {
    /// Quantity to display: the aggregate when present, else this transaction's
    pub fn borrowed_quantity(&self) -> u32 {
        self.total_quantity.or(self.quantity).unwrap_or(0)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.map(|due| due < now).unwrap_or(false)
    }
}

/// Create borrow request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBorrow {
    /// Book id
    pub book: String,
    #[validate(range(min = 1, message = "Must borrow at least 1 copy"))]
    pub quantity: u32,
    /// Serialized as `YYYY-MM-DD`
    pub due_date: NaiveDate,
}
