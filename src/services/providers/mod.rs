//! Movie metadata provider abstraction
//!
//! Providers look up posters, plots and credits by title after ranking is
//! done. They never influence which movies are recommended or their order.

use std::{sync::Arc, time::Duration};

use crate::{config::Config, error::AppResult, models::MovieDetails};

pub mod omdb;
pub mod tmdb;

pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Looks up details for a movie title.
    ///
    /// `Ok(None)` means the provider answered but knows no such movie.
    async fn fetch_details(&self, title: &str) -> AppResult<Option<MovieDetails>>;

    /// Provider name for logging and health output
    fn name(&self) -> &'static str;
}

/// Drops a trailing "(year)" and surrounding whitespace from a catalog title
pub fn clean_title(title: &str) -> &str {
    title.split('(').next().unwrap_or(title).trim()
}

fn usable_key(key: &Option<String>) -> Option<String> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

fn shared<P>(built: AppResult<P>) -> Option<Arc<dyn MetadataProvider>>
where
    P: MetadataProvider + 'static,
{
    match built {
        Ok(provider) => {
            let provider: Arc<dyn MetadataProvider> = Arc::new(provider);
            Some(provider)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build metadata client, using local data only");
            None
        }
    }
}

/// Builds the provider selected by `metadata_provider`, if any.
///
/// A selected provider without an API key is treated as not configured.
pub fn from_config(config: &Config) -> Option<Arc<dyn MetadataProvider>> {
    let timeout = Duration::from_secs(config.metadata_timeout_secs);

    match config.metadata_provider.trim().to_ascii_lowercase().as_str() {
        "omdb" => match usable_key(&config.omdb_api_key) {
            Some(key) => shared(OmdbProvider::new(key, config.omdb_api_url.clone(), timeout)),
            None => {
                tracing::warn!("OMDb selected but OMDB_API_KEY is not set, using local data only");
                None
            }
        },
        "tmdb" => match usable_key(&config.tmdb_api_key) {
            Some(key) => shared(TmdbProvider::new(
                key,
                config.tmdb_api_url.clone(),
                config.tmdb_image_base_url.clone(),
                timeout,
            )),
            None => {
                tracing::warn!("TMDB selected but TMDB_API_KEY is not set, using local data only");
                None
            }
        },
        "" | "none" => None,
        other => {
            tracing::warn!(provider = %other, "Unknown metadata provider, using local data only");
            None
        }
    }
}
