use chrono::Utc;
use std::time::Instant;

use crate::{
    error::AppResult,
    models::{Dataset, EngineStats, RecommendedBook, TopBook},
    services::{
        cleaner::clean_dataset,
        loader::{load_dataset, DatasetSource},
        metadata::MetadataResolver,
        popularity::{PopularityRanking, DEFAULT_MIN_RATINGS},
        similarity::{
            SimilarityIndex, DEFAULT_MIN_RATINGS_PER_BOOK, DEFAULT_MIN_RATINGS_PER_USER,
        },
        title_search,
    },
};

/// Support thresholds used when building the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub min_popularity_ratings: usize,
    pub min_ratings_per_user: usize,
    pub min_ratings_per_book: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_popularity_ratings: DEFAULT_MIN_RATINGS,
            min_ratings_per_user: DEFAULT_MIN_RATINGS_PER_USER,
            min_ratings_per_book: DEFAULT_MIN_RATINGS_PER_BOOK,
        }
    }
}

/// Book recommendations from a popularity ranking and an item-item
/// similarity index
///
/// Every derived structure is computed in [`RecommendationEngine::build`] and
/// never mutated afterwards, so one engine can serve concurrent queries
/// behind an `Arc` without locking. Queries perform no I/O.
#[derive(Debug)]
pub struct RecommendationEngine {
    popularity: PopularityRanking,
    similarity: SimilarityIndex,
    metadata: MetadataResolver,
    stats: EngineStats,
}

impl RecommendationEngine {
    /// Loads the source tables and builds the engine
    pub fn from_source(source: &dyn DatasetSource, settings: EngineSettings) -> AppResult<Self> {
        let dataset = load_dataset(source)?;
        Ok(Self::build(&dataset, settings))
    }

    pub fn build(dataset: &Dataset, settings: EngineSettings) -> Self {
        let start = Instant::now();

        let cleaned = clean_dataset(dataset);
        let popularity = PopularityRanking::build(&cleaned.rows, settings.min_popularity_ratings);
        let similarity = SimilarityIndex::build(
            &cleaned.rows,
            settings.min_ratings_per_user,
            settings.min_ratings_per_book,
        );
        let metadata = MetadataResolver::build(&cleaned.rows);

        let stats = EngineStats {
            raw_ratings: dataset.ratings.len(),
            positive_ratings: cleaned.positive_ratings,
            kept_users: cleaned.kept_users,
            kept_books: cleaned.kept_books,
            joined_rows: cleaned.rows.len(),
            popular_titles: popularity.len(),
            similarity_users: similarity.users().len(),
            similarity_titles: similarity.titles().len(),
            built_at: Utc::now(),
        };

        tracing::info!(
            joined_rows = stats.joined_rows,
            popular_titles = stats.popular_titles,
            similarity_titles = stats.similarity_titles,
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendation engine built"
        );

        Self {
            popularity,
            similarity,
            metadata,
            stats,
        }
    }

    /// The `n` highest ranked books with their metadata
    pub fn top_books(&self, n: usize) -> AppResult<Vec<TopBook>> {
        self.popularity
            .top(n)
            .iter()
            .map(|entry| {
                let meta = self.metadata.resolve(&entry.title)?;
                Ok(TopBook {
                    title: entry.title.clone(),
                    author: meta.author.clone(),
                    cover_url: meta.cover_url.clone(),
                    avg_rating: entry.avg_rating,
                    num_ratings: entry.num_ratings,
                })
            })
            .collect()
    }

    /// Titles of the similarity index containing `query`, ignoring case
    pub fn search_titles(&self, query: &str) -> Vec<String> {
        title_search::search_titles(self.similarity.titles(), query)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Up to `k` books most similar to `title`, most similar first
    pub fn recommend(&self, title: &str, k: usize) -> AppResult<Vec<RecommendedBook>> {
        self.similarity
            .recommend(title, k)?
            .into_iter()
            .map(|similar| {
                let meta = self.metadata.resolve(&similar.title)?;
                Ok(RecommendedBook {
                    author: meta.author.clone(),
                    cover_url: meta.cover_url.clone(),
                    title: similar.title,
                    similarity: similar.similarity,
                })
            })
            .collect()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn similarity_index(&self) -> &SimilarityIndex {
        &self.similarity
    }
}
