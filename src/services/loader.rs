use csv::{ErrorKind, ReaderBuilder};
use serde::de::DeserializeOwned;
use std::{
    io::Read,
    path::{Path, PathBuf},
    time::Instant,
};

use crate::{
    error::{AppError, AppResult},
    models::{BookRecord, Dataset, RatingRecord, UserRecord},
};

/// Source of the three raw tables the engine is built from
///
/// Implementations perform all of their I/O inside these calls; nothing is
/// read after the engine has been constructed.
#[cfg_attr(test, mockall::automock)]
pub trait DatasetSource: Send + Sync {
    fn load_books(&self) -> AppResult<Vec<BookRecord>>;

    fn load_users(&self) -> AppResult<Vec<UserRecord>>;

    fn load_ratings(&self) -> AppResult<Vec<RatingRecord>>;
}

/// Reads all three tables from a source, aborting on the first failure
pub fn load_dataset(source: &dyn DatasetSource) -> AppResult<Dataset> {
    let start = Instant::now();

    let books = source.load_books()?;
    let users = source.load_users()?;
    let ratings = source.load_ratings()?;

    tracing::info!(
        books = books.len(),
        users = users.len(),
        ratings = ratings.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Dataset loaded"
    );

    Ok(Dataset {
        books,
        users,
        ratings,
    })
}

/// CSV files in the Book-Crossing layout
#[derive(Debug, Clone)]
pub struct CsvDataset {
    pub books_path: PathBuf,
    pub users_path: PathBuf,
    pub ratings_path: PathBuf,
}

impl CsvDataset {
    pub fn new(
        books_path: impl Into<PathBuf>,
        users_path: impl Into<PathBuf>,
        ratings_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            books_path: books_path.into(),
            users_path: users_path.into(),
            ratings_path: ratings_path.into(),
        }
    }
}

impl DatasetSource for CsvDataset {
    fn load_books(&self) -> AppResult<Vec<BookRecord>> {
        read_table_from_path("books", &self.books_path)
    }

    fn load_users(&self) -> AppResult<Vec<UserRecord>> {
        read_table_from_path("users", &self.users_path)
    }

    fn load_ratings(&self) -> AppResult<Vec<RatingRecord>> {
        read_table_from_path("ratings", &self.ratings_path)
    }
}

pub fn read_books<R: Read>(reader: R) -> AppResult<Vec<BookRecord>> {
    read_table("books", reader)
}

pub fn read_users<R: Read>(reader: R) -> AppResult<Vec<UserRecord>> {
    read_table("users", reader)
}

pub fn read_ratings<R: Read>(reader: R) -> AppResult<Vec<RatingRecord>> {
    read_table("ratings", reader)
}

fn read_table_from_path<T: DeserializeOwned>(
    table: &'static str,
    path: &Path,
) -> AppResult<Vec<T>> {
    tracing::debug!(table, path = %path.display(), "Reading table");
    let file = std::fs::File::open(path).map_err(|e| {
        tracing::error!(table, path = %path.display(), error = %e, "Failed to open table");
        AppError::Io(e)
    })?;
    read_table(table, file)
}

/// Deserializes every record of a headed CSV table
///
/// Columns are matched by header name, so extra columns are ignored. A record
/// with a missing or malformed required field is a data integrity failure.
fn read_table<T: DeserializeOwned, R: Read>(table: &'static str, reader: R) -> AppResult<Vec<T>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut records = Vec::new();
    for result in reader.deserialize::<T>() {
        let record = result.map_err(|e| integrity_error(table, e))?;
        records.push(record);
    }

    Ok(records)
}

fn integrity_error(table: &'static str, err: csv::Error) -> AppError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    match err.kind() {
        ErrorKind::Deserialize { err: de, .. } => AppError::DataIntegrity {
            table,
            line,
            reason: de.to_string(),
        },
        ErrorKind::Utf8 { .. } => AppError::DataIntegrity {
            table,
            line,
            reason: "invalid UTF-8".to_string(),
        },
        _ => AppError::Csv(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKS_CSV: &str = "\
ISBN,Book-Title,Book-Author,Year-Of-Publication,Publisher,Image-URL-S,Image-URL-M,Image-URL-L
0195153448,Classical Mythology,Mark P. O. Morford,2002,Oxford University Press,http://s/1.jpg,http://m/1.jpg,http://l/1.jpg
0002005018,Clara Callan,Richard Bruce Wright,unknown,,http://s/2.jpg,http://m/2.jpg,http://l/2.jpg
";

    #[test]
    fn test_read_books() {
        let books = read_books(BOOKS_CSV.as_bytes()).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].isbn, "0195153448");
        assert_eq!(books[0].title, "Classical Mythology");
        assert_eq!(books[0].year_of_publication, Some(2002));
        assert_eq!(books[0].image_url_medium, "http://m/1.jpg");
        // Malformed and empty optional fields are read as absent
        assert_eq!(books[1].year_of_publication, None);
        assert_eq!(books[1].publisher, None);
    }

    #[test]
    fn test_empty_author_and_cover_load_as_empty_strings() {
        let csv = "\
ISBN,Book-Title,Book-Author,Year-Of-Publication,Publisher,Image-URL-S,Image-URL-M,Image-URL-L
0195153448,Classical Mythology,,2002,Oxford University Press,,,
";
        let books = read_books(csv.as_bytes()).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].author, "");
        assert_eq!(books[0].image_url_medium, "");
        assert_eq!(books[0].image_url_small, None);
    }

    #[test]
    fn test_read_users_tolerates_bad_demographics() {
        let csv = "User-ID,Location,Age\n1,\"nyc, new york, usa\",\n2,\"stockton, california, usa\",18.0\n3,somewhere,n/a\n";
        let users = read_users(csv.as_bytes()).unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].age, None);
        assert_eq!(users[1].age, Some(18.0));
        assert_eq!(users[2].age, None);
    }

    #[test]
    fn test_read_ratings_ignores_extra_columns() {
        let csv = "User-ID,ISBN,Book-Rating,Timestamp\n276725,034545104X,0,123\n276726,0155061224,5,456\n";
        let ratings = read_ratings(csv.as_bytes()).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[1].user_id, 276726);
        assert_eq!(ratings[1].rating, 5);
    }

    #[test]
    fn test_malformed_rating_is_data_integrity_error() {
        let csv = "User-ID,ISBN,Book-Rating\n1,0155061224,5\n2,0446520802,great\n";
        let err = read_ratings(csv.as_bytes()).unwrap_err();
        match err {
            AppError::DataIntegrity { table, line, .. } => {
                assert_eq!(table, "ratings");
                assert_eq!(line, 3);
            }
            other => panic!("expected data integrity error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_column_is_data_integrity_error() {
        let csv = "ISBN,Book-Author,Image-URL-M\n0195153448,Morford,http://m/1.jpg\n";
        let err = read_books(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::DataIntegrity { table: "books", .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = CsvDataset::new(
            "/nonexistent/Books.csv",
            "/nonexistent/Users.csv",
            "/nonexistent/Ratings.csv",
        );
        assert!(matches!(source.load_books(), Err(AppError::Io(_))));
    }

    #[test]
    fn test_load_dataset_stops_at_first_failure() {
        let mut source = MockDatasetSource::new();
        source.expect_load_books().times(1).returning(|| Ok(vec![]));
        source.expect_load_users().times(1).returning(|| {
            Err(AppError::DataIntegrity {
                table: "users",
                line: 2,
                reason: "missing field `User-ID`".to_string(),
            })
        });
        source.expect_load_ratings().times(0);

        let err = load_dataset(&source).unwrap_err();
        assert!(matches!(err, AppError::DataIntegrity { table: "users", .. }));
    }
}
