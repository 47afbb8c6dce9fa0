use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{JoinedRating, PopularityEntry};

/// Default minimum support for a title to be ranked
pub const DEFAULT_MIN_RATINGS: usize = 200;

/// Titles ranked by average rating, then by rating volume
#[derive(Debug, Clone, Default)]
pub struct PopularityRanking {
    entries: Vec<PopularityEntry>,
}

impl PopularityRanking {
    /// Aggregates the joined table by title and keeps titles with at least
    /// `min_ratings` ratings.
    ///
    /// Groups are emitted in lexical title order before the stable sort, so
    /// titles tied on both keys stay alphabetical.
    pub fn build(rows: &[JoinedRating], min_ratings: usize) -> Self {
        let mut groups: BTreeMap<&str, (usize, i64)> = BTreeMap::new();
        for row in rows {
            let group = groups.entry(row.title()).or_insert((0, 0));
            group.0 += 1;
            group.1 += i64::from(row.rating);
        }

        let mut entries: Vec<PopularityEntry> = groups
            .into_iter()
            .filter(|(_, (count, _))| *count >= min_ratings)
            .map(|(title, (count, sum))| PopularityEntry {
                title: title.to_string(),
                num_ratings: count,
                avg_rating: sum as f64 / count as f64,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.avg_rating
                .partial_cmp(&a.avg_rating)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.num_ratings.cmp(&a.num_ratings))
        });

        tracing::info!(
            min_ratings,
            titles = entries.len(),
            "Popularity ranking built"
        );

        Self { entries }
    }

    /// The first `n` entries of the ranking; fewer if fewer titles qualify
    pub fn top(&self, n: usize) -> &[PopularityEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
