use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    config::{ConfigError, EngineConfig},
    models::{Movie, MovieId, Rating, RequestContext, ScoredMovie},
};

use super::{
    collaborative::CollaborativeIndex,
    content::ContentIndex,
    context_filter::ContextualFilter,
    dataset::Dataset,
    popularity::PopularityIndex,
    scoring::{fuse, normalize},
};

/// Which path produced a ranking
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RankingSource {
    Hybrid,
    Popularity,
}

/// Ranked movies, best first
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendations {
    pub source: RankingSource,
    pub movies: Vec<ScoredMovie>,
}

impl Recommendations {
    pub fn ids(&self) -> Vec<MovieId> {
        self.movies.iter().map(|m| m.movie.id).collect()
    }
}

/// Immutable recommender snapshot: the catalog plus every index built from it.
///
/// Ranking calls only read the snapshot, so one instance can serve any number
/// of concurrent requests. Refreshing data means building a new snapshot.
#[derive(Debug)]
pub struct Recommender {
    config: EngineConfig,
    movies: Vec<Movie>,
    positions: HashMap<MovieId, usize>,
    ratings_count: usize,
    content: ContentIndex,
    collaborative: CollaborativeIndex,
    popularity: PopularityIndex,
    filter: ContextualFilter,
}

impl Recommender {
    /// Validates the configuration and builds all indices.
    ///
    /// Duplicate catalog ids keep their first entry. Ratings of unknown movies
    /// or outside the 1..=5 scale are dropped.
    pub fn build(dataset: Dataset, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut positions = HashMap::with_capacity(dataset.movies.len());
        let mut movies = Vec::with_capacity(dataset.movies.len());
        for movie in dataset.movies {
            if positions.contains_key(&movie.id) {
                tracing::warn!(movie_id = movie.id, "Duplicate movie id in catalog, keeping first");
                continue;
            }
            positions.insert(movie.id, movies.len());
            movies.push(movie);
        }

        let total = dataset.ratings.len();
        let ratings: Vec<Rating> = dataset
            .ratings
            .into_iter()
            .filter(|r| positions.contains_key(&r.movie_id) && Rating::is_valid_value(r.rating))
            .collect();
        if ratings.len() < total {
            tracing::warn!(
                dropped = total - ratings.len(),
                "Dropped ratings for unknown movies or out-of-range values"
            );
        }

        let content = ContentIndex::build(&movies);
        let collaborative = CollaborativeIndex::build(&ratings, &movies, config.neighbor_cap);
        let popularity = PopularityIndex::build(&ratings, &movies, config.min_support);
        let filter = ContextualFilter::new(&config.occasion_exclusions, &config.runtime_limits);

        tracing::info!(
            movies = movies.len(),
            ratings = ratings.len(),
            vocabulary = content.dimension(),
            rated_movies = collaborative.len(),
            popular_movies = popularity.len(),
            "Recommender built"
        );

        Ok(Self {
            config,
            movies,
            positions,
            ratings_count: ratings.len(),
            content,
            collaborative,
            popularity,
            filter,
        })
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn movie(&self, movie_id: MovieId) -> Option<&Movie> {
        self.positions.get(&movie_id).map(|&i| &self.movies[i])
    }

    /// Ratings retained at build time
    pub fn ratings_count(&self) -> usize {
        self.ratings_count
    }

    /// Up to `n` most popular movies, for seeding and as the cold-start answer
    pub fn popular(&self, n: usize) -> Vec<ScoredMovie> {
        self.popular_excluding(n, &HashSet::new())
    }

    fn popular_excluding(&self, n: usize, excluded: &HashSet<MovieId>) -> Vec<ScoredMovie> {
        self.popularity
            .top_excluding(n, excluded)
            .into_iter()
            .filter_map(|(id, score)| self.scored(id, score))
            .collect()
    }

    fn scored(&self, movie_id: MovieId, score: f64) -> Option<ScoredMovie> {
        self.movie(movie_id).map(|movie| ScoredMovie {
            movie: movie.clone(),
            score,
        })
    }

    fn fallback(&self, top_n: usize, excluded: &HashSet<MovieId>, reason: &str) -> Recommendations {
        tracing::warn!(reason, "Falling back to popular movies");
        Recommendations {
            source: RankingSource::Popularity,
            movies: self.popular_excluding(top_n, excluded),
        }
    }

    /// Selected genres plus the tags implied by the mood
    fn expanded_genres<'a>(&'a self, context: &'a RequestContext) -> BTreeSet<&'a str> {
        let mut genres: BTreeSet<&str> = context.selected_genres.iter().map(String::as_str).collect();
        if let Some(extra) = context.mood.and_then(|m| self.config.mood_genres.get(&m)) {
            genres.extend(extra.iter().map(String::as_str));
        }
        genres
    }

    /// Ranks the catalog for one request.
    ///
    /// Movies the user seeded are never returned. When neither genres nor
    /// seeds produce a signal, or the contextual filter removes every
    /// candidate, the answer is the popularity ranking instead.
    pub fn recommend(&self, context: &RequestContext, top_n: usize) -> Recommendations {
        let excluded: HashSet<MovieId> = context.seed_ratings.keys().copied().collect();
        if top_n == 0 {
            return Recommendations {
                source: RankingSource::Hybrid,
                movies: Vec::new(),
            };
        }

        let query = self.expanded_genres(context);

        let content = normalize(self.content.score(query.iter().copied()));
        let collaborative = normalize(self.collaborative.score(&context.seed_ratings));

        tracing::debug!(
            query = ?query,
            seeds = context.seed_ratings.len(),
            content_signal = content.is_signal(),
            collaborative_signal = collaborative.is_signal(),
            "Scored catalog"
        );

        let mut combined: Vec<(MovieId, f64)> = fuse(
            self.movies.iter().map(|m| m.id),
            &content,
            &collaborative,
            self.config.content_weight,
            self.config.collaborative_weight,
        )
        .into_iter()
        .filter(|(id, _)| !excluded.contains(id))
        .collect();

        if combined.is_empty() || combined.iter().map(|(_, s)| s).sum::<f64>() == 0.0 {
            return self.fallback(top_n, &excluded, "no usable signal");
        }

        // Stable, so equal scores keep catalog order
        combined.sort_by(|a, b| b.1.total_cmp(&a.1));
        combined.truncate(top_n.saturating_mul(self.config.oversample_factor));

        let candidates: Vec<ScoredMovie> = combined
            .into_iter()
            .filter_map(|(id, score)| self.scored(id, score))
            .collect();

        let mut survivors = self.filter.apply(candidates, context.occasion, context.time_budget);
        if survivors.is_empty() {
            return self.fallback(top_n, &excluded, "contextual filter removed every candidate");
        }
        survivors.truncate(top_n);

        Recommendations {
            source: RankingSource::Hybrid,
            movies: survivors,
        }
    }
}
