use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::models::{BookRecord, Dataset, JoinedRating, RatingRecord, UserRecord};

/// Output of the cleaning pass, with the sizes of each intermediate table
#[derive(Debug, Clone, Default)]
pub struct CleanedRatings {
    pub rows: Vec<JoinedRating>,
    pub positive_ratings: usize,
    pub kept_users: usize,
    pub kept_books: usize,
}

/// Produces the denormalized rating table both engines read
///
/// 1. drops ratings that are not positive
/// 2. keeps users and books referenced by a surviving rating
/// 3. inner-joins ratings with users on user id, then with books on ISBN
///
/// Rows follow the order of the ratings table. Duplicate keys on either side
/// of a join fan out into one row per match, as a relational join does.
pub fn clean(
    books: &[BookRecord],
    users: &[UserRecord],
    ratings: &[RatingRecord],
) -> CleanedRatings {
    let positive: Vec<&RatingRecord> = ratings.iter().filter(|r| r.rating > 0).collect();

    let rated_users: HashSet<u64> = positive.iter().map(|r| r.user_id).collect();
    let rated_isbns: HashSet<&str> = positive.iter().map(|r| r.isbn.as_str()).collect();

    let mut users_by_id: HashMap<u64, Vec<Arc<UserRecord>>> = HashMap::new();
    let mut kept_users = 0;
    for user in users.iter().filter(|u| rated_users.contains(&u.user_id)) {
        users_by_id
            .entry(user.user_id)
            .or_default()
            .push(Arc::new(user.clone()));
        kept_users += 1;
    }

    let mut books_by_isbn: HashMap<&str, Vec<Arc<BookRecord>>> = HashMap::new();
    let mut kept_books = 0;
    for book in books.iter().filter(|b| rated_isbns.contains(b.isbn.as_str())) {
        books_by_isbn
            .entry(book.isbn.as_str())
            .or_default()
            .push(Arc::new(book.clone()));
        kept_books += 1;
    }

    let mut rows = Vec::with_capacity(positive.len());
    for rating in &positive {
        let Some(matched_users) = users_by_id.get(&rating.user_id) else {
            continue;
        };
        let Some(matched_books) = books_by_isbn.get(rating.isbn.as_str()) else {
            continue;
        };
        for user in matched_users {
            for book in matched_books {
                rows.push(JoinedRating {
                    rating: rating.rating,
                    user: Arc::clone(user),
                    book: Arc::clone(book),
                });
            }
        }
    }

    tracing::info!(
        raw_ratings = ratings.len(),
        positive_ratings = positive.len(),
        kept_users,
        kept_books,
        joined_rows = rows.len(),
        "Ratings cleaned"
    );

    CleanedRatings {
        rows,
        positive_ratings: positive.len(),
        kept_users,
        kept_books,
    }
}

/// Convenience wrapper over [`clean`] for a loaded dataset
pub fn clean_dataset(dataset: &Dataset) -> CleanedRatings {
    clean(&dataset.books, &dataset.users, &dataset.ratings)
}
