pub mod cleaner;
pub mod loader;
pub mod metadata;
pub mod popularity;
pub mod recommendations;
pub mod similarity;
pub mod title_search;

pub use loader::{CsvDataset, DatasetSource};
pub use recommendations::{EngineSettings, RecommendationEngine};
