use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    config::Range,
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{EngineStats, RecommendedBook, TopBook},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct TopBooksQuery {
    pub n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub title: String,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopBookResponse {
    pub title: String,
    pub author: String,
    pub cover_url: String,
    /// Rounded to two decimals for display
    #[serde(rename = "average_rating")]
    pub avg_rating: f64,
    #[serde(rename = "rating_count")]
    pub num_ratings: usize,
}

impl From<TopBook> for TopBookResponse {
    fn from(book: TopBook) -> Self {
        Self {
            title: book.title,
            author: book.author,
            cover_url: book.cover_url,
            avg_rating: (book.avg_rating * 100.0).round() / 100.0,
            num_ratings: book.num_ratings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub similarity: f64,
}

impl From<RecommendedBook> for RecommendationResponse {
    fn from(book: RecommendedBook) -> Self {
        Self {
            title: book.title,
            author: book.author,
            cover_url: book.cover_url,
            similarity: book.similarity,
        }
    }
}

/// Unwraps query parameters, reporting malformed ones as JSON errors
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

fn checked_count(name: &str, value: Option<usize>, range: Range) -> AppResult<usize> {
    let value = value.unwrap_or(range.default);
    if !range.contains(value) {
        return Err(AppError::InvalidInput(format!(
            "{name} must be between {} and {}",
            range.min, range.max
        )));
    }
    Ok(value)
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Most popular books, best average rating first
pub async fn top_books(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<TopBooksQuery>, QueryRejection>,
) -> AppResult<Json<Vec<TopBookResponse>>> {
    let params = query_params(query)?;
    let n = checked_count("n", params.n, state.limits.top_n)?;

    let books = state.engine.top_books(n)?;
    tracing::info!(request_id = %request_id, n, returned = books.len(), "Top books served");

    Ok(Json(books.into_iter().map(TopBookResponse::from).collect()))
}

/// Titles that can be used as a recommendation seed
pub async fn search_titles(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Vec<String>>> {
    let params = query_params(query)?;
    Ok(Json(state.engine.search_titles(&params.q)))
}

/// Books similar to the given title
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<RecommendQuery>, QueryRejection>,
) -> AppResult<Json<Vec<RecommendationResponse>>> {
    let params = query_params(query)?;
    let k = checked_count("k", params.k, state.limits.recommend_k)?;

    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        k,
        "Processing recommendation request"
    );

    let books = state.engine.recommend(&params.title, k).map_err(|e| {
        tracing::info!(request_id = %request_id, error = %e, "No recommendations");
        e
    })?;

    Ok(Json(books.into_iter().map(RecommendationResponse::from).collect()))
}

/// Pipeline row counts from the last build
pub async fn stats(State(state): State<AppState>) -> Json<EngineStats> {
    Json(state.engine.stats().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_book_response_rounds_average() {
        let response = TopBookResponse::from(TopBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            cover_url: "http://images/dune.jpg".to_string(),
            avg_rating: 8.456_789,
            num_ratings: 212,
        });
        assert_eq!(response.avg_rating, 8.46);
        assert_eq!(response.num_ratings, 212);

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["average_rating"], 8.46);
        assert_eq!(body["rating_count"], 212);
        assert!(body.get("avg_rating").is_none());
    }

    #[test]
    fn test_checked_count() {
        let range = Range {
            min: 10,
            max: 50,
            default: 20,
        };
        assert_eq!(checked_count("n", None, range).unwrap(), 20);
        assert_eq!(checked_count("n", Some(50), range).unwrap(), 50);
        assert!(matches!(
            checked_count("n", Some(9), range),
            Err(AppError::InvalidInput(_))
        ));
        assert!(checked_count("n", Some(51), range).is_err());
    }
}
