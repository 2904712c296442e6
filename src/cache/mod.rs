//! Query cache with tag-based invalidation
//!
//! Reads are cached per (operation, arguments) and tagged with the entity
//! kinds they depend on. A confirmed mutation invalidates its tags, and every
//! entry carrying one of them that is still observed is fetched again.

pub mod key;
pub mod state;
pub mod store;
pub mod subscription;

use serde::{Deserialize, Serialize};

pub use key::QueryKey;
pub use state::{QueryResult, QueryStatus};
pub use store::QueryStore;
pub use subscription::Subscription;

/// Entity kind labels shared by cached reads and invalidating writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Book,
    Borrow,
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Book => f.write_str("Book"),
            Tag::Borrow => f.write_str("Borrow"),
        }
    }
}
