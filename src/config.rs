use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{Mood, Occasion, TimeBudget};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Movies CSV; the demo catalog is used when unset or unreadable
    #[serde(default)]
    pub movies_path: Option<String>,

    /// Ratings CSV; the demo ratings are used when unset or unreadable
    #[serde(default)]
    pub ratings_path: Option<String>,

    /// Share of the hybrid score driven by genre and mood similarity
    #[serde(default = "default_content_weight")]
    pub content_weight: f64,

    /// Share of the hybrid score driven by seed ratings
    #[serde(default = "default_collaborative_weight")]
    pub collaborative_weight: f64,

    /// Seed ratings a recommendation request must carry
    #[serde(default = "default_min_seed_ratings")]
    pub min_seed_ratings: usize,

    /// Genres a recommendation request must carry
    #[serde(default = "default_min_genre_selection")]
    pub min_genre_selection: usize,

    #[serde(default = "default_recommendation_count")]
    pub default_recommendation_count: usize,

    /// Metadata source used after ranking: `none`, `omdb` or `tmdb`
    #[serde(default = "default_metadata_provider")]
    pub metadata_provider: String,

    #[serde(default)]
    pub omdb_api_key: Option<String>,

    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Per-lookup timeout for metadata providers
    #[serde(default = "default_metadata_timeout_secs")]
    pub metadata_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_content_weight() -> f64 {
    0.7
}

fn default_collaborative_weight() -> f64 {
    0.3
}

fn default_min_seed_ratings() -> usize {
    3
}

fn default_min_genre_selection() -> usize {
    1
}

fn default_recommendation_count() -> usize {
    10
}

fn default_metadata_provider() -> String {
    "none".to_string()
}

fn default_omdb_api_url() -> String {
    "http://www.omdbapi.com/".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_metadata_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            movies_path: None,
            ratings_path: None,
            content_weight: default_content_weight(),
            collaborative_weight: default_collaborative_weight(),
            min_seed_ratings: default_min_seed_ratings(),
            min_genre_selection: default_min_genre_selection(),
            default_recommendation_count: default_recommendation_count(),
            metadata_provider: default_metadata_provider(),
            omdb_api_key: None,
            omdb_api_url: default_omdb_api_url(),
            tmdb_api_key: None,
            tmdb_api_url: default_tmdb_api_url(),
            tmdb_image_base_url: default_tmdb_image_base_url(),
            metadata_timeout_secs: default_metadata_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Engine settings with this configuration's weights applied
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            content_weight: self.content_weight,
            collaborative_weight: self.collaborative_weight,
            ..EngineConfig::default()
        }
    }
}

/// Invalid engine settings. The recommender refuses to build with any of these.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Hybrid weights must lie in [0, 1] and sum to 1 (content {content}, collaborative {collaborative})")]
    InvalidWeights { content: f64, collaborative: f64 },

    #[error("Mood expansion for {0} has no usable genre tags")]
    EmptyMoodExpansion(Mood),

    #[error("Occasion exclusion for {0} has no usable genre tags")]
    EmptyExclusionSet(Occasion),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(&'static str),
}

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Constants that shape ranking. Fixed for the lifetime of a recommender.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub content_weight: f64,
    pub collaborative_weight: f64,
    /// Ratings an item needs before it can rank by popularity
    pub min_support: usize,
    /// Nearest neighbors consulted per seed rating
    pub neighbor_cap: usize,
    /// Candidate pool size as a multiple of the requested count
    pub oversample_factor: usize,
    pub mood_genres: HashMap<Mood, Vec<String>>,
    pub occasion_exclusions: HashMap<Occasion, Vec<String>>,
    /// Strict runtime ceilings in minutes
    pub runtime_limits: HashMap<TimeBudget, u32>,
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mood_genres = HashMap::from([
            (Mood::Happy, tags(&["Comedy", "Adventure", "Family", "Musical"])),
            (Mood::Sad, tags(&["Drama", "Romance"])),
            (Mood::Adventurous, tags(&["Action", "Adventure", "Sci-Fi", "Thriller"])),
            (Mood::Relaxed, tags(&["Comedy", "Animation", "Romance", "Family"])),
        ]);

        let occasion_exclusions =
            HashMap::from([(Occasion::Family, tags(&["Horror", "Crime", "Thriller"]))]);

        let runtime_limits = HashMap::from([
            (TimeBudget::UnderNinetyMinutes, 90),
            (TimeBudget::UnderTwoHours, 120),
        ]);

        Self {
            content_weight: default_content_weight(),
            collaborative_weight: default_collaborative_weight(),
            min_support: 5,
            neighbor_cap: 10,
            oversample_factor: 3,
            mood_genres,
            occasion_exclusions,
            runtime_limits,
        }
    }
}

impl EngineConfig {
    /// Rejects settings that would silently bias rankings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [self.content_weight, self.collaborative_weight];
        let in_range = weights.iter().all(|w| w.is_finite() && (0.0..=1.0).contains(w));
        if !in_range || (weights.iter().sum::<f64>() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::InvalidWeights {
                content: self.content_weight,
                collaborative: self.collaborative_weight,
            });
        }

        for (mood, genres) in &self.mood_genres {
            if genres.is_empty() || genres.iter().any(|g| g.trim().is_empty()) {
                return Err(ConfigError::EmptyMoodExpansion(*mood));
            }
        }

        for (occasion, genres) in &self.occasion_exclusions {
            if genres.is_empty() || genres.iter().any(|g| g.trim().is_empty()) {
                return Err(ConfigError::EmptyExclusionSet(*occasion));
            }
        }

        if self.runtime_limits.values().any(|limit| *limit == 0) {
            return Err(ConfigError::InvalidThreshold("runtime limit must be positive"));
        }
        if self.min_support == 0 {
            return Err(ConfigError::InvalidThreshold("min_support must be at least 1"));
        }
        if self.neighbor_cap == 0 {
            return Err(ConfigError::InvalidThreshold("neighbor_cap must be at least 1"));
        }
        if self.oversample_factor == 0 {
            return Err(ConfigError::InvalidThreshold("oversample_factor must be at least 1"));
        }

        Ok(())
    }
}
