use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{BookMetadata, JoinedRating},
};

/// Title to display attributes, one entry per title
#[derive(Debug, Clone, Default)]
pub struct MetadataResolver {
    by_title: HashMap<String, BookMetadata>,
}

impl MetadataResolver {
    /// The first row carrying a title, in table order, supplies its metadata
    pub fn build(rows: &[JoinedRating]) -> Self {
        let mut by_title = HashMap::new();
        for row in rows {
            by_title
                .entry(row.title().to_string())
                .or_insert_with(|| BookMetadata {
                    author: row.book.author.clone(),
                    cover_url: row.book.image_url_medium.clone(),
                });
        }

        tracing::debug!(titles = by_title.len(), "Metadata resolver built");

        Self { by_title }
    }

    pub fn resolve(&self, title: &str) -> AppResult<&BookMetadata> {
        self.by_title
            .get(title)
            .ok_or_else(|| AppError::NotFound(format!("no metadata for title: {title}")))
    }

    /// Resolves every title, failing on the first one without metadata
    pub fn resolve_all<'a, I>(&self, titles: I) -> AppResult<HashMap<&'a str, &BookMetadata>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        titles
            .into_iter()
            .map(|title| Ok((title, self.resolve(title)?)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cleaner::{
        clean,
        fixtures::{book, rating, user},
    };

    fn sample_rows() -> Vec<JoinedRating> {
        let books = vec![
            book("1", "Dune", "Frank Herbert"),
            book("2", "Dune", "F. Herbert"),
            book("3", "Emma", "Jane Austen"),
        ];
        let users = vec![user(1), user(2)];
        let ratings = vec![rating(1, "2", 7), rating(2, "1", 9), rating(2, "3", 8)];
        clean(&books, &users, &ratings).rows
    }

    #[test]
    fn test_first_row_wins() {
        let resolver = MetadataResolver::build(&sample_rows());
        assert_eq!(resolver.len(), 2);

        let dune = resolver.resolve("Dune").unwrap();
        assert_eq!(dune.author, "F. Herbert");
        assert_eq!(dune.cover_url, "http://images/2.jpg");
    }

    #[test]
    fn test_resolve_all() {
        let resolver = MetadataResolver::build(&sample_rows());
        let resolved = resolver.resolve_all(["Emma", "Dune"]).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["Emma"].author, "Jane Austen");
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let resolver = MetadataResolver::build(&sample_rows());
        assert!(matches!(resolver.resolve("Ulysses"), Err(AppError::NotFound(_))));
        assert!(matches!(
            resolver.resolve_all(["Emma", "Ulysses"]),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_table() {
        let resolver = MetadataResolver::build(&[]);
        assert!(resolver.is_empty());
    }
}
