use std::sync::Arc;

use crate::{
    models::{EnrichedMovie, ScoredMovie},
    services::providers::MetadataProvider,
};

/// Attaches provider metadata to an already ranked list.
///
/// Lookups run concurrently. A failed lookup leaves that movie without
/// details; the ranking itself is never reordered or shortened.
pub async fn enrich(
    provider: Option<Arc<dyn MetadataProvider>>,
    ranked: Vec<ScoredMovie>,
) -> Vec<EnrichedMovie> {
    let Some(provider) = provider else {
        return ranked
            .into_iter()
            .map(|item| EnrichedMovie {
                item,
                details: None,
            })
            .collect();
    };

    let tasks: Vec<_> = ranked
        .iter()
        .map(|scored| {
            let provider = provider.clone();
            let title = scored.movie.title.clone();
            tokio::spawn(async move { provider.fetch_details(&title).await })
        })
        .collect();

    let mut enriched = Vec::with_capacity(ranked.len());
    let mut failures = 0;

    for (item, task) in ranked.into_iter().zip(tasks) {
        let details = match task.await {
            Ok(Ok(details)) => details,
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    title = %item.movie.title,
                    provider = provider.name(),
                    "Metadata lookup failed"
                );
                failures += 1;
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Metadata task join error");
                failures += 1;
                None
            }
        };
        enriched.push(EnrichedMovie { item, details });
    }

    tracing::info!(
        movies = enriched.len(),
        failures,
        provider = provider.name(),
        "Metadata enrichment completed"
    );

    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{Movie, MovieDetails},
        services::providers::{MockMetadataProvider, OmdbProvider},
    };
    use chrono::Utc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn ranked(titles: &[&str]) -> Vec<ScoredMovie> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| ScoredMovie {
                movie: Movie::new(i as u32 + 1, *title, ["Drama"], Some(100), 2000, "Local overview."),
                score: 1.0 - i as f64 * 0.1,
            })
            .collect()
    }

    fn details(director: &str) -> MovieDetails {
        MovieDetails {
            poster_url: Some("https://img.example/poster.jpg".to_string()),
            overview: Some("Remote overview.".to_string()),
            release_date: None,
            vote_average: Some(8.0),
            director: Some(director.to_string()),
            actors: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_without_provider_keeps_local_data() {
        let result = tokio_test::block_on(enrich(None, ranked(&["Heat", "Up"])));

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|m| m.details.is_none()));
        assert_eq!(result[0].item.movie.overview, "Local overview.");
    }

    #[tokio::test]
    async fn test_enrich_preserves_order_and_tolerates_failures() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_fetch_details().returning(|title| match title {
            "Inception" => Ok(Some(details("Christopher Nolan"))),
            "Obscure" => Ok(None),
            _ => Err(AppError::ExternalApi("rate limited".to_string())),
        });
        mock.expect_name().return_const("mock");

        let provider: Arc<dyn MetadataProvider> = Arc::new(mock);
        let result = enrich(Some(provider), ranked(&["Inception", "Heat", "Obscure"])).await;

        let titles: Vec<&str> = result.iter().map(|m| m.item.movie.title.as_str()).collect();
        assert_eq!(titles, vec!["Inception", "Heat", "Obscure"]);
        assert_eq!(
            result[0].details.as_ref().and_then(|d| d.director.as_deref()),
            Some("Christopher Nolan")
        );
        assert!(result[1].details.is_none());
        assert!(result[2].details.is_none());
    }

    #[tokio::test]
    async fn test_enrich_looks_up_by_catalog_title() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_fetch_details()
            .withf(|title| title.to_string() == "Toy Story (1995)")
            .times(1)
            .returning(|_| Ok(Some(details("John Lasseter"))));
        mock.expect_name().return_const("mock");

        let provider: Arc<dyn MetadataProvider> = Arc::new(mock);
        let result = enrich(Some(provider), ranked(&["Toy Story (1995)"])).await;

        assert!(result[0].details.is_some());
    }

    #[tokio::test]
    async fn test_unresponsive_provider_times_out() {
        // Accepts connections and never writes a response
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let omdb = OmdbProvider::new(
            "key".to_string(),
            format!("http://{}/", addr),
            Duration::from_secs(1),
        )
        .unwrap();
        let provider: Arc<dyn MetadataProvider> = Arc::new(omdb);

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            enrich(Some(provider), ranked(&["Heat"])),
        )
        .await
        .expect("enrichment should give up on a silent provider");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].item.movie.title, "Heat");
        assert!(result[0].details.is_none());
    }
}
