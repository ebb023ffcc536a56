//! OMDb API provider
//!
//! Single request per title: `GET /?t={title}&type=movie&plot=short`.
//! OMDb reports misses in-band with `"Response": "False"` and fills unknown
//! fields with `"N/A"`.

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
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

/// Raw OMDb title response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbMovie {
    response: String,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    released: Option<String>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    actors: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "N/A")
}

impl OmdbMovie {
    fn into_details(self) -> Option<MovieDetails> {
        if self.response != "True" {
            return None;
        }

        Some(MovieDetails {
            poster_url: present(self.poster),
            overview: present(self.plot),
            release_date: present(self.released),
            vote_average: present(self.imdb_rating).and_then(|r| r.parse().ok()),
            director: present(self.director),
            actors: present(self.actors),
            fetched_at: Utc::now(),
        })
    }
}

impl OmdbProvider {
    /// Every lookup gives up after `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            http_client: HttpClient::builder().timeout(timeout).build()?,
            api_key,
            api_url,
        })
    }
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbProvider {
    async fn fetch_details(&self, title: &str) -> AppResult<Option<MovieDetails>> {
        let title = clean_title(title);
        if title.is_empty() {
            return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
        }

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("t", title),
                ("type", "movie"),
                ("plot", "short"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        let movie: OmdbMovie = response.json().await?;
        let details = movie.into_details();

        tracing::debug!(
            title = %title,
            found = details.is_some(),
            provider = "omdb",
            "Metadata lookup completed"
        );

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omdb_found_response() {
        let json = r#"{
            "Title": "Inception",
            "Released": "16 Jul 2010",
            "Director": "Christopher Nolan",
            "Actors": "Leonardo DiCaprio, Joseph Gordon-Levitt",
            "Plot": "A thief who steals corporate secrets through dream-sharing.",
            "Poster": "https://m.media-amazon.com/images/inception.jpg",
            "imdbRating": "8.8",
            "Response": "True"
        }"#;

        let movie: OmdbMovie = serde_json::from_str(json).unwrap();
        let details = movie.into_details().unwrap();

        assert_eq!(details.director.as_deref(), Some("Christopher Nolan"));
        assert_eq!(details.release_date.as_deref(), Some("16 Jul 2010"));
        assert_eq!(details.vote_average, Some(8.8));
        assert!(details.poster_url.unwrap().ends_with("inception.jpg"));
    }

    #[test]
    fn test_omdb_not_available_fields() {
        let json = r#"{
            "Title": "Obscure",
            "Poster": "N/A",
            "Plot": "N/A",
            "imdbRating": "N/A",
            "Response": "True"
        }"#;

        let details = serde_json::from_str::<OmdbMovie>(json)
            .unwrap()
            .into_details()
            .unwrap();

        assert_eq!(details.poster_url, None);
        assert_eq!(details.overview, None);
        assert_eq!(details.vote_average, None);
        assert_eq!(details.actors, None);
    }

    #[test]
    fn test_omdb_miss() {
        let json = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let movie: OmdbMovie = serde_json::from_str(json).unwrap();
        assert!(movie.into_details().is_none());
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let provider = OmdbProvider::new(
            "key".to_string(),
            "http://localhost:1".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        let result = provider.fetch_details(" (1999)").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
