//! TMDB API provider
//!
//! Uses `/search/movie` and takes the first hit. Poster paths are relative
//! and get joined onto the configured image base URL.

use chrono::Utc;
use std::time::Duration;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::MovieDetails,
    services::providers::{clean_title, MetadataProvider},
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
}

impl TmdbProvider {
    /// Every lookup gives up after `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        image_base_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            http_client: HttpClient::builder().timeout(timeout).build()?,
            api_key,
            api_url,
            image_base_url,
        })
    }

    fn to_details(&self, movie: TmdbMovie) -> MovieDetails {
        let poster_url = movie
            .poster_path
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", self.image_base_url.trim_end_matches('/'), p));

        MovieDetails {
            poster_url,
            overview: movie.overview.filter(|o| !o.is_empty()),
            release_date: movie.release_date.filter(|d| !d.is_empty()),
            vote_average: movie.vote_average,
            director: None,
            actors: None,
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_details(&self, title: &str) -> AppResult<Option<MovieDetails>> {
        let title = clean_title(title);
        if title.is_empty() {
            return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
        }

        let url = format!("{}/search/movie", self.api_url.trim_end_matches('/'));
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", title)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let search: TmdbSearchResponse = response.json().await?;
        let details = search.results.into_iter().next().map(|m| self.to_details(m));

        tracing::debug!(
            title = %title,
            found = details.is_some(),
            provider = "tmdb",
            "Metadata lookup completed"
        );

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> TmdbProvider {
        TmdbProvider::new(
            "key".to_string(),
            "https://api.themoviedb.org/3".to_string(),
            "https://image.tmdb.org/t/p/w500/".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_tmdb_search_deserialization() {
        let json = r#"{
            "page": 1,
            "results": [
                {
                    "id": 27205,
                    "title": "Inception",
                    "poster_path": "/inception.jpg",
                    "overview": "Cobb steals secrets from dreams.",
                    "release_date": "2010-07-15",
                    "vote_average": 8.4
                }
            ]
        }"#;

        let search: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(search.results.len(), 1);

        let details = provider().to_details(search.results.into_iter().next().unwrap());
        assert_eq!(
            details.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/inception.jpg")
        );
        assert_eq!(details.release_date.as_deref(), Some("2010-07-15"));
        assert_eq!(details.vote_average, Some(8.4));
    }

    #[test]
    fn test_tmdb_missing_poster() {
        let movie = TmdbMovie {
            poster_path: None,
            overview: Some(String::new()),
            release_date: None,
            vote_average: None,
        };

        let details = provider().to_details(movie);
        assert_eq!(details.poster_url, None);
        assert_eq!(details.overview, None);
    }

    #[test]
    fn test_tmdb_empty_results() {
        let search: TmdbSearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(search.results.is_empty());
    }
}
