use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    services::{providers::MetadataProvider, Dataset, Recommender},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Current recommender snapshot. Replaced wholesale on reload, never mutated.
    pub engine: Arc<RwLock<Arc<Recommender>>>,
    pub metadata: Option<Arc<dyn MetadataProvider>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        engine: Recommender,
        metadata: Option<Arc<dyn MetadataProvider>>,
        config: Config,
    ) -> Self {
        Self {
            engine: Arc::new(RwLock::new(Arc::new(engine))),
            metadata,
            config: Arc::new(config),
        }
    }

    /// The snapshot new requests should use
    pub async fn engine(&self) -> Arc<Recommender> {
        self.engine.read().await.clone()
    }

    /// Rebuilds the recommender from the configured dataset and swaps it in.
    ///
    /// Requests already holding the previous snapshot finish on it.
    pub async fn reload(&self) -> AppResult<Arc<Recommender>> {
        let config = self.config.clone();
        let rebuilt = tokio::task::spawn_blocking(move || {
            let dataset = Dataset::load_or_demo(
                config.movies_path.as_deref(),
                config.ratings_path.as_deref(),
            );
            Recommender::build(dataset, config.engine_config())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Reload task failed: {}", e)))??;

        let rebuilt = Arc::new(rebuilt);
        *self.engine.write().await = rebuilt.clone();

        tracing::info!(
            movies = rebuilt.movies().len(),
            ratings = rebuilt.ratings_count(),
            "Recommender snapshot swapped"
        );

        Ok(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::EngineConfig, models::Movie};

    fn small_engine() -> Recommender {
        let dataset = Dataset {
            movies: vec![Movie::new(1, "Heat", ["Crime"], Some(170), 1995, "")],
            ratings: Vec::new(),
        };
        Recommender::build(dataset, EngineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_reload_swaps_snapshot_without_touching_old_one() {
        let state = AppState::new(small_engine(), None, Config::default());

        let before = state.engine().await;
        let after = state.reload().await.unwrap();

        assert_eq!(before.movies().len(), 1);
        assert_eq!(after.movies().len(), 50);
        assert!(Arc::ptr_eq(&state.engine().await, &after));
    }

    #[tokio::test]
    async fn test_reload_refuses_invalid_config() {
        let config = Config {
            content_weight: 0.8,
            collaborative_weight: 0.8,
            ..Config::default()
        };
        let state = AppState::new(small_engine(), None, config);

        let result = state.reload().await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert_eq!(state.engine().await.movies().len(), 1);
    }
}
