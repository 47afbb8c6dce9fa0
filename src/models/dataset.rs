use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A row of the books table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(rename = "ISBN")]
    pub isbn: String,
    #[serde(rename = "Book-Title")]
    pub title: String,
    #[serde(rename = "Book-Author")]
    pub author: String,
    #[serde(
        rename = "Year-Of-Publication",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub year_of_publication: Option<i32>,
    #[serde(rename = "Publisher", default, deserialize_with = "csv::invalid_option")]
    pub publisher: Option<String>,
    #[serde(rename = "Image-URL-S", default, deserialize_with = "csv::invalid_option")]
    pub image_url_small: Option<String>,
    /// Cover reference shown to clients
    #[serde(rename = "Image-URL-M")]
    pub image_url_medium: String,
    #[serde(rename = "Image-URL-L", default, deserialize_with = "csv::invalid_option")]
    pub image_url_large: Option<String>,
}

/// A row of the users table. Demographics are carried but never read by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "User-ID")]
    pub user_id: u64,
    #[serde(rename = "Location", default, deserialize_with = "csv::invalid_option")]
    pub location: Option<String>,
    #[serde(rename = "Age", default, deserialize_with = "csv::invalid_option")]
    pub age: Option<f32>,
}

/// A row of the ratings table. A rating of zero means "no opinion".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    #[serde(rename = "User-ID")]
    pub user_id: u64,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    #[serde(rename = "Book-Rating")]
    pub rating: i32,
}

/// The three raw source tables
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub books: Vec<BookRecord>,
    pub users: Vec<UserRecord>,
    pub ratings: Vec<RatingRecord>,
}

/// One positive rating joined with its user and book.
///
/// Every row has `rating > 0`, a known user and a known book.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRating {
    pub rating: i32,
    pub user: Arc<UserRecord>,
    pub book: Arc<BookRecord>,
}

impl JoinedRating {
    pub fn user_id(&self) -> u64 {
        self.user.user_id
    }

    pub fn isbn(&self) -> &str {
        &self.book.isbn
    }

    pub fn title(&self) -> &str {
        &self.book.title
    }
}
