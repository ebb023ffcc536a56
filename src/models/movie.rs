use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog identifier of a movie
pub type MovieId = u32;

/// Identifier of a user in the interaction history
pub type UserId = u32;

/// A catalog entry. Immutable once the catalog is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Genre tags in catalog order, without duplicates
    pub genres: Vec<String>,
    /// `None` when the source did not say
    pub runtime_minutes: Option<u32>,
    pub year: i32,
    pub overview: String,
}

impl Movie {
    /// Creates a movie, trimming genre tags and dropping blanks and repeats
    pub fn new<G, S>(
        id: MovieId,
        title: impl Into<String>,
        genres: G,
        runtime_minutes: Option<u32>,
        year: i32,
        overview: impl Into<String>,
    ) -> Self
    where
        G: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<String> = Vec::new();
        for genre in genres {
            let genre = genre.as_ref().trim();
            if !genre.is_empty() && !tags.iter().any(|t| t == genre) {
                tags.push(genre.to_string());
            }
        }

        Self {
            id,
            title: title.into(),
            genres: tags,
            runtime_minutes,
            year,
            overview: overview.into(),
        }
    }

    /// Case-insensitive genre membership
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

/// One historical (user, movie, rating) interaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

impl Rating {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 5.0;

    pub fn new(user_id: UserId, movie_id: MovieId, rating: f64) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
        }
    }

    /// Whether a rating value lies in the accepted 1..=5 scale
    pub fn is_valid_value(value: f64) -> bool {
        value.is_finite() && (Self::MIN..=Self::MAX).contains(&value)
    }
}

/// A ranked movie with the score that placed it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub score: f64,
}

/// Third-party metadata attached to a ranked movie after ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// A ranked movie as returned to clients
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedMovie {
    #[serde(flatten)]
    pub item: ScoredMovie,
    pub details: Option<MovieDetails>,
}
