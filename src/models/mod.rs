//! Data models exchanged with the library API

pub mod book;
pub mod borrow;
pub mod enums;

// Re-export commonly used types
pub use book::{Book, BookChanges, NewBook};
pub use borrow::{BookRef, BookSummary, BorrowRecord, NewBorrow};
pub use enums::Genre;
