use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelrank::{
    api::{create_router, AppState},
    config::Config,
    services::{providers, Dataset, Recommender},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelrank=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let dataset = Dataset::load_or_demo(config.movies_path.as_deref(), config.ratings_path.as_deref());
    let engine = Recommender::build(dataset, config.engine_config())
        .context("Refusing to start with an invalid engine configuration")?;
    tracing::info!(
        movies = engine.movies().len(),
        ratings = engine.ratings_count(),
        "Recommender ready"
    );

    let metadata = providers::from_config(&config);
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState::new(engine, metadata, config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
