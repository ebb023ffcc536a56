use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{EnrichedMovie, Movie, MovieId, Rating, RequestContext, ScoredMovie, GENRES},
    services::{enrichment, RankingSource},
};

use super::AppState;

const MAX_RESULTS: usize = 100;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    /// Movie id (as a JSON object key) to rating
    #[serde(default)]
    pub seed_ratings: HashMap<String, Value>,
    #[serde(default)]
    pub occasion: Option<String>,
    #[serde(default)]
    pub time_budget: Option<String>,
    #[serde(default)]
    pub n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub count: usize,
    pub source: RankingSource,
    pub recommendations: Vec<EnrichedMovie>,
    /// The request as the recommender understood it
    pub user_prefs: RequestContext,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PopularResponse {
    pub count: usize,
    pub movies: Vec<ScoredMovie>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub movies_loaded: usize,
    pub ratings_loaded: usize,
    pub metadata_provider: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub movies_loaded: usize,
    pub ratings_loaded: usize,
}

fn parse_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Keeps entries with an integer id and a rating on the 1..=5 scale
fn parse_seed_ratings(raw: &HashMap<String, Value>) -> BTreeMap<MovieId, f64> {
    raw.iter()
        .filter_map(|(key, value)| {
            let parsed = key
                .trim()
                .parse::<MovieId>()
                .ok()
                .zip(parse_rating(value))
                .filter(|(_, rating)| Rating::is_valid_value(*rating));
            if parsed.is_none() {
                tracing::warn!(movie_id = %key, rating = %value, "Dropping malformed seed rating");
            }
            parsed
        })
        .collect()
}

fn parse_optional<T: std::str::FromStr>(value: Option<&str>) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unrecognized context value");
            None
        }
    }
}

fn result_count(requested: Option<usize>, default: usize) -> AppResult<usize> {
    let n = requested.unwrap_or(default);
    if n == 0 || n > MAX_RESULTS {
        return Err(AppError::InvalidInput(format!(
            "n must be between 1 and {}",
            MAX_RESULTS
        )));
    }
    Ok(n)
}

impl RecommendationRequest {
    /// Normalizes the request and enforces the minimum genre and seed counts
    fn into_context(
        self,
        min_genre_selection: usize,
        min_seed_ratings: usize,
    ) -> AppResult<RequestContext> {
        let context = RequestContext {
            selected_genres: self
                .genres
                .iter()
                .map(|g| g.trim())
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect(),
            mood: parse_optional(self.mood.as_deref()),
            seed_ratings: parse_seed_ratings(&self.seed_ratings),
            occasion: parse_optional(self.occasion.as_deref()),
            time_budget: parse_optional(self.time_budget.as_deref()),
        };

        if context.selected_genres.len() < min_genre_selection {
            return Err(AppError::InvalidInput(format!(
                "Please select at least {} genre(s)",
                min_genre_selection
            )));
        }
        if context.seed_ratings.len() < min_seed_ratings {
            return Err(AppError::InvalidInput(format!(
                "Please rate at least {} movies",
                min_seed_ratings
            )));
        }

        Ok(context)
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.engine().await;
    Json(HealthResponse {
        status: "healthy",
        movies_loaded: engine.movies().len(),
        ratings_loaded: engine.ratings_count(),
        metadata_provider: state.metadata.as_ref().map(|p| p.name()).unwrap_or("none"),
    })
}

/// Genre vocabulary offered for preference selection
pub async fn get_genres() -> Json<Vec<&'static str>> {
    Json(GENRES.to_vec())
}

/// Most popular movies, used to pick titles for seed ratings
pub async fn get_popular(
    State(state): State<AppState>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<PopularResponse>> {
    let n = result_count(params.n, state.config.default_recommendation_count)?;
    let movies = state.engine().await.popular(n);

    Ok(Json(PopularResponse {
        count: movies.len(),
        movies,
    }))
}

/// Get a catalog entry by id
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<Movie>> {
    let engine = state.engine().await;
    let movie = engine
        .movie(movie_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

    Ok(Json(movie))
}

/// Ranks movies for the submitted preferences, then attaches metadata
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let n = result_count(request.n, state.config.default_recommendation_count)?;
    let context =
        request.into_context(state.config.min_genre_selection, state.config.min_seed_ratings)?;

    tracing::info!(
        request_id = %request_id,
        genres = context.selected_genres.len(),
        seeds = context.seed_ratings.len(),
        mood = ?context.mood,
        occasion = ?context.occasion,
        time_budget = ?context.time_budget,
        "Processing recommendation request"
    );

    let ranked = state.engine().await.recommend(&context, n);
    let source = ranked.source;
    let recommendations = enrichment::enrich(state.metadata.clone(), ranked.movies).await;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        source = ?source,
        "Recommendations generated"
    );

    Ok(Json(RecommendationResponse {
        count: recommendations.len(),
        source,
        recommendations,
        user_prefs: context,
    }))
}

/// Rebuilds the recommender from the configured dataset
pub async fn reload(State(state): State<AppState>) -> AppResult<Json<ReloadResponse>> {
    let engine = state.reload().await?;
    Ok(Json(ReloadResponse {
        movies_loaded: engine.movies().len(),
        ratings_loaded: engine.ratings_count(),
    }))
}
