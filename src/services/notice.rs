//! User-facing notices for the outcome of each flow

use crate::error::AppError;

pub const BOOK_ADDED: &str = "Book added successfully";
pub const BOOK_ADD_FAILED: &str = "Failed to add book";
pub const BOOK_UPDATED: &str = "Book updated successfully";
pub const BOOK_UPDATE_FAILED: &str = "Failed to update book";
pub const BOOK_DELETED: &str = "Book has been deleted.";
pub const BOOK_DELETE_FAILED: &str = "Failed to delete book";
pub const BOOK_BORROWED: &str = "Book borrowed successfully";
pub const BOOK_BORROW_FAILED: &str = "Failed to borrow book";
pub const FETCH_FAILED: &str = "Failed to fetch books";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message for the user, the terminal equivalent of a toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Error notice carrying the most specific message available
    pub fn from_error(error: &AppError, fallback: &str) -> Self {
        Self::error(error.user_message(fallback))
    }

    /// Notice for a finished flow: `success` only when the server confirmed it
    pub fn for_outcome<T>(result: &Result<T, AppError>, success: &str, fallback: &str) -> Self {
        match result {
            Ok(_) => Self::success(success),
            Err(e) => Self::from_error(e, fallback),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.level {
            NoticeLevel::Success => write!(f, "✔ {}", self.message),
            NoticeLevel::Error => write!(f, "✖ {}", self.message),
        }
    }
}
