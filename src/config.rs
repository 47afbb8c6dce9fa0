use serde::Deserialize;

use crate::services::EngineSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the books table (CSV)
    #[serde(default = "default_books_path")]
    pub books_path: String,

    /// Path to the users table (CSV)
    #[serde(default = "default_users_path")]
    pub users_path: String,

    /// Path to the ratings table (CSV)
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Minimum number of ratings before a title can appear in the popularity ranking
    #[serde(default = "default_min_popularity_ratings")]
    pub min_popularity_ratings: usize,

    /// Minimum number of ratings a user needs to enter the user-item matrix
    #[serde(default = "default_min_support")]
    pub min_ratings_per_user: usize,

    /// Minimum number of ratings a title needs to enter the user-item matrix
    #[serde(default = "default_min_support")]
    pub min_ratings_per_book: usize,

    #[serde(default = "default_top_n_min")]
    pub top_n_min: usize,

    #[serde(default = "default_top_n_max")]
    pub top_n_max: usize,

    #[serde(default = "default_top_n_default")]
    pub top_n_default: usize,

    #[serde(default = "default_recommend_k_min")]
    pub recommend_k_min: usize,

    #[serde(default = "default_recommend_k_max")]
    pub recommend_k_max: usize,

    #[serde(default = "default_recommend_k_default")]
    pub recommend_k_default: usize,
}

fn default_books_path() -> String {
    "Books.csv".to_string()
}

fn default_users_path() -> String {
    "Users.csv".to_string()
}

fn default_ratings_path() -> String {
    "Ratings.csv".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_min_popularity_ratings() -> usize {
    200
}

fn default_min_support() -> usize {
    130
}

fn default_top_n_min() -> usize {
    10
}

fn default_top_n_max() -> usize {
    50
}

fn default_top_n_default() -> usize {
    20
}

fn default_recommend_k_min() -> usize {
    1
}

fn default_recommend_k_max() -> usize {
    10
}

fn default_recommend_k_default() -> usize {
    5
}

/// Inclusive range a query parameter may take, with the value used when it is omitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

impl Range {
    pub fn contains(&self, value: usize) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Bounds for caller-supplied counts on the query endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub top_n: Range,
    pub recommend_k: Range,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            top_n: Range {
                min: default_top_n_min(),
                max: default_top_n_max(),
                default: default_top_n_default(),
            },
            recommend_k: Range {
                min: default_recommend_k_min(),
                max: default_recommend_k_max(),
                default: default_recommend_k_default(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects thresholds and ranges the engine cannot serve
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_popularity_ratings == 0
            || self.min_ratings_per_user == 0
            || self.min_ratings_per_book == 0
        {
            anyhow::bail!("Support thresholds must be at least 1");
        }

        let limits = self.query_limits();
        for (name, range) in [("TOP_N", limits.top_n), ("RECOMMEND_K", limits.recommend_k)] {
            if range.min == 0 || range.min > range.max {
                anyhow::bail!("{name} range {}..={} is invalid", range.min, range.max);
            }
            if !range.contains(range.default) {
                anyhow::bail!(
                    "{name} default {} is outside {}..={}",
                    range.default,
                    range.min,
                    range.max
                );
            }
        }

        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            min_popularity_ratings: self.min_popularity_ratings,
            min_ratings_per_user: self.min_ratings_per_user,
            min_ratings_per_book: self.min_ratings_per_book,
        }
    }

    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            top_n: Range {
                min: self.top_n_min,
                max: self.top_n_max,
                default: self.top_n_default,
            },
            recommend_k: Range {
                min: self.recommend_k_min,
                max: self.recommend_k_max,
                default: self.recommend_k_default,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(vars: Vec<(&str, &str)>) -> Config {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()));
        envy::from_iter::<_, Config>(vars).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config_from(vec![]);
        assert_eq!(config.books_path, "Books.csv");
        assert_eq!(config.port, 3000);
        assert_eq!(config.min_popularity_ratings, 200);
        assert_eq!(config.min_ratings_per_user, 130);
        assert_eq!(config.min_ratings_per_book, 130);
        assert_eq!(config.query_limits(), QueryLimits::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(vec![
            ("RATINGS_PATH", "/data/Ratings.csv"),
            ("MIN_RATINGS_PER_USER", "50"),
            ("TOP_N_MAX", "100"),
        ]);
        assert_eq!(config.ratings_path, "/data/Ratings.csv");
        assert_eq!(config.engine_settings().min_ratings_per_user, 50);
        assert_eq!(config.query_limits().top_n.max, 100);
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let config = config_from(vec![("MIN_RATINGS_PER_BOOK", "0")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_default_outside_range() {
        let config = config_from(vec![("RECOMMEND_K_DEFAULT", "11")]);
        assert!(config.validate().is_err());

        let config = config_from(vec![("TOP_N_MIN", "60")]);
        assert!(config.validate().is_err());
    }
}
