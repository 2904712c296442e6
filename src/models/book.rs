//! Book model and request payloads

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::Genre;

/// Characters accepted in an ISBN field: letters, digits, whitespace and hyphens
pub static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s-]+$").expect("valid ISBN pattern"));

/// Book as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub copies: u32,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// A book can be borrowed only while flagged available with copies left.
    pub fn is_borrowable(&self) -> bool {
        self.available && self.copies > 0
    }

    /// Whether `quantity` copies can be handed out in one borrow
    pub fn can_lend(&self, quantity: u32) -> bool {
        self.is_borrowable() && quantity >= 1 && quantity <= self.copies
    }

    /// Label shown next to the book in listings
    pub fn availability_label(&self) -> &'static str {
        if self.is_borrowable() {
            "Available"
        } else {
            "Unavailable"
        }
    }
}

/// Create book request (book fields minus id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub genre: Genre,
    #[validate(regex(path = *ISBN_PATTERN, message = "Please enter a valid ISBN"))]
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Must have at least 1 copy"))]
    pub copies: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

/// Update book request. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct BookChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<Genre>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *ISBN_PATTERN, message = "Please enter a valid ISBN"))]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Must have at least 1 copy"))]
    pub copies: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
