use ndarray::{Array2, Axis};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::{
    error::{AppError, AppResult},
    models::{JoinedRating, SimilarTitle},
};

/// Default minimum number of ratings for a user to enter the matrix
pub const DEFAULT_MIN_RATINGS_PER_USER: usize = 130;

/// Default minimum number of ratings for a title to enter the matrix
pub const DEFAULT_MIN_RATINGS_PER_BOOK: usize = 130;

/// Cosine of two vectors from their dot product and norms
///
/// Zero when either norm is zero.
fn cosine(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Item-item cosine similarity over a user-by-title rating matrix
///
/// Built once and read-only afterwards. Titles are held in lexical order and
/// that order indexes both dimensions of `matrix`.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    titles: Vec<String>,
    positions: HashMap<String, usize>,
    users: Vec<u64>,
    matrix: Array2<f64>,
}

impl SimilarityIndex {
    /// Builds the index from the joined rating table.
    ///
    /// A row survives when its user has at least `min_ratings_per_user` rows
    /// and its title has at least `min_ratings_per_book` rows, both counted on
    /// the unfiltered table. Repeated (user, title) pairs are averaged in the
    /// pivot; absent pairs are zero.
    pub fn build(
        rows: &[JoinedRating],
        min_ratings_per_user: usize,
        min_ratings_per_book: usize,
    ) -> Self {
        let mut user_counts: HashMap<u64, usize> = HashMap::new();
        let mut title_counts: HashMap<&str, usize> = HashMap::new();
        for row in rows {
            *user_counts.entry(row.user_id()).or_default() += 1;
            *title_counts.entry(row.title()).or_default() += 1;
        }

        let surviving: Vec<&JoinedRating> = rows
            .iter()
            .filter(|row| {
                user_counts[&row.user_id()] >= min_ratings_per_user
                    && title_counts[row.title()] >= min_ratings_per_book
            })
            .collect();

        let users: Vec<u64> = surviving
            .iter()
            .map(|row| row.user_id())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let titles: Vec<String> = surviving
            .iter()
            .map(|row| row.title())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let ratings = pivot(&surviving, &users, &titles);
        let matrix = column_similarities(&ratings);

        tracing::info!(
            min_ratings_per_user,
            min_ratings_per_book,
            surviving_rows = surviving.len(),
            users = users.len(),
            titles = titles.len(),
            "Similarity index built"
        );

        let positions = titles
            .iter()
            .enumerate()
            .map(|(i, title)| (title.clone(), i))
            .collect();

        Self {
            titles,
            positions,
            users,
            matrix,
        }
    }

    /// Up to `k` titles most similar to `title`, most similar first
    ///
    /// Never includes `title` itself. Equal scores are ordered by title.
    /// Fails with `NotFound` when `title` did not survive the support
    /// thresholds.
    pub fn recommend(&self, title: &str, k: usize) -> AppResult<Vec<SimilarTitle>> {
        let Some(&row) = self.positions.get(title) else {
            return Err(AppError::NotFound(format!(
                "no recommendations possible for this title: {title}"
            )));
        };

        let scores = self.matrix.row(row);
        let mut neighbours: Vec<usize> = (0..self.titles.len()).filter(|&j| j != row).collect();
        // Indices follow lexical title order, so the index is the tie-break.
        neighbours.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cmp(&b))
        });

        Ok(neighbours
            .into_iter()
            .take(k)
            .map(|j| SimilarTitle {
                title: self.titles[j].clone(),
                similarity: scores[j],
            })
            .collect())
    }

    /// Similarity between two indexed titles
    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.positions.get(a)?;
        let j = *self.positions.get(b)?;
        Some(self.matrix[[i, j]])
    }

    pub fn contains(&self, title: &str) -> bool {
        self.positions.contains_key(title)
    }

    /// Indexed titles in lexical order
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Users that contributed to the matrix, in ascending id order
    pub fn users(&self) -> &[u64] {
        &self.users
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

/// Dense users x titles matrix of mean ratings, zero where a user never rated
fn pivot(rows: &[&JoinedRating], users: &[u64], titles: &[String]) -> Array2<f64> {
    let user_index: HashMap<u64, usize> =
        users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
    let title_index: HashMap<&str, usize> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let mut sums = Array2::<f64>::zeros((users.len(), titles.len()));
    let mut counts = Array2::<f64>::zeros((users.len(), titles.len()));
    for row in rows {
        let cell = [user_index[&row.user_id()], title_index[row.title()]];
        sums[cell] += f64::from(row.rating);
        counts[cell] += 1.0;
    }

    sums.zip_mut_with(&counts, |sum, &count| {
        if count > 0.0 {
            *sum /= count;
        }
    });
    sums
}

/// Symmetric title x title cosine similarity of the matrix's columns
fn column_similarities(ratings: &Array2<f64>) -> Array2<f64> {
    let n = ratings.ncols();
    let norms: Vec<f64> = ratings
        .axis_iter(Axis(1))
        .map(|column| column.dot(&column).sqrt())
        .collect();

    let mut similarities = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        if norms[i] == 0.0 {
            continue;
        }
        similarities[[i, i]] = 1.0;

        let a = ratings.column(i);
        for j in (i + 1)..n {
            if norms[j] == 0.0 {
                continue;
            }
            let score = cosine(a.dot(&ratings.column(j)), norms[i], norms[j]);
            similarities[[i, j]] = score;
            similarities[[j, i]] = score;
        }
    }

    similarities
}
