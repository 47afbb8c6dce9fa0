use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod dataset;

pub use dataset::{BookRecord, Dataset, JoinedRating, RatingRecord, UserRecord};

/// Aggregate rating figures for one title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularityEntry {
    pub title: String,
    pub num_ratings: usize,
    pub avg_rating: f64,
}

/// Display attributes of a title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookMetadata {
    pub author: String,
    pub cover_url: String,
}

/// A neighbour of a title in the item-item similarity matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarTitle {
    pub title: String,
    pub similarity: f64,
}

/// A popular book enriched with its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopBook {
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub avg_rating: f64,
    pub num_ratings: usize,
}

/// A similar book enriched with its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedBook {
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub similarity: f64,
}

/// Row counts at each stage of the build, for operators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub raw_ratings: usize,
    pub positive_ratings: usize,
    pub kept_users: usize,
    pub kept_books: usize,
    pub joined_rows: usize,
    pub popular_titles: usize,
    pub similarity_users: usize,
    pub similarity_titles: usize,
    pub built_at: DateTime<Utc>,
}
