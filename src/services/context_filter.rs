use std::collections::HashMap;

use crate::models::{Occasion, ScoredMovie, TimeBudget};

/// Order-preserving filter applying occasion and time-budget constraints.
///
/// Each rule is independent; a candidate must pass all of them. Values with
/// no configured rule impose nothing. A movie of unknown runtime fails every
/// runtime limit.
#[derive(Debug, Clone, Default)]
pub struct ContextualFilter {
    /// Lowercased genre tags to drop per occasion
    exclusions: HashMap<Occasion, Vec<String>>,
    runtime_limits: HashMap<TimeBudget, u32>,
}

impl ContextualFilter {
    pub fn new(
        exclusions: &HashMap<Occasion, Vec<String>>,
        runtime_limits: &HashMap<TimeBudget, u32>,
    ) -> Self {
        let exclusions = exclusions
            .iter()
            .map(|(occasion, genres)| {
                let genres = genres.iter().map(|g| g.trim().to_lowercase()).collect();
                (*occasion, genres)
            })
            .collect();

        Self {
            exclusions,
            runtime_limits: runtime_limits.clone(),
        }
    }

    pub fn apply(
        &self,
        candidates: Vec<ScoredMovie>,
        occasion: Option<Occasion>,
        time_budget: Option<TimeBudget>,
    ) -> Vec<ScoredMovie> {
        let excluded = occasion.and_then(|o| self.exclusions.get(&o));
        let runtime_limit = time_budget.and_then(|t| self.runtime_limits.get(&t)).copied();

        let before = candidates.len();
        let survivors: Vec<ScoredMovie> = candidates
            .into_iter()
            .filter(|candidate| {
                let movie = &candidate.movie;
                let allowed_genres = excluded
                    .map(|genres| !genres.iter().any(|g| movie.has_genre(g)))
                    .unwrap_or(true);
                let fits_runtime = runtime_limit
                    .map(|limit| movie.runtime_minutes.is_some_and(|r| r < limit))
                    .unwrap_or(true);
                allowed_genres && fits_runtime
            })
            .collect();

        tracing::debug!(
            before,
            after = survivors.len(),
            occasion = ?occasion,
            time_budget = ?time_budget,
            "Contextual filter applied"
        );

        survivors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::{Movie, MovieId};

    fn filter() -> ContextualFilter {
        let config = EngineConfig::default();
        ContextualFilter::new(&config.occasion_exclusions, &config.runtime_limits)
    }

    fn candidate(id: MovieId, genres: &[&str], runtime: u32) -> ScoredMovie {
        ScoredMovie {
            movie: Movie::new(id, format!("Movie {}", id), genres.iter().copied(), Some(runtime), 2000, ""),
            score: 1.0 / id as f64,
        }
    }

    fn ids(movies: &[ScoredMovie]) -> Vec<MovieId> {
        movies.iter().map(|m| m.movie.id).collect()
    }

    #[test]
    fn test_family_drops_excluded_genres() {
        let candidates = vec![
            candidate(1, &["Comedy"], 95),
            candidate(2, &["horror"], 95),
            candidate(3, &["Drama", "Crime"], 95),
            candidate(4, &["Animation", "Family"], 95),
            candidate(5, &["Action", "THRILLER"], 95),
        ];

        let result = filter().apply(candidates, Some(Occasion::Family), None);
        assert_eq!(ids(&result), vec![1, 4]);
    }

    #[test]
    fn test_under_ninety_minutes_is_strict() {
        let candidates = vec![
            candidate(1, &["Comedy"], 89),
            candidate(2, &["Comedy"], 90),
            candidate(3, &["Comedy"], 70),
        ];

        let result = filter().apply(candidates, None, Some(TimeBudget::UnderNinetyMinutes));
        assert_eq!(ids(&result), vec![1, 3]);
    }

    #[test]
    fn test_under_two_hours() {
        let candidates = vec![candidate(1, &["Drama"], 119), candidate(2, &["Drama"], 120)];
        let result = filter().apply(candidates, None, Some(TimeBudget::UnderTwoHours));
        assert_eq!(ids(&result), vec![1]);
    }

    #[test]
    fn test_unconstrained_values_pass_everything() {
        let candidates = vec![candidate(1, &["Horror"], 200), candidate(2, &["Crime"], 150)];

        let result = filter().apply(
            candidates.clone(),
            Some(Occasion::Friends),
            Some(TimeBudget::NoLimit),
        );
        assert_eq!(result, candidates);

        assert_eq!(filter().apply(candidates.clone(), None, None), candidates);
    }

    #[test]
    fn test_rules_are_conjunctive_and_order_preserving() {
        let candidates = vec![
            candidate(7, &["Comedy"], 80),
            candidate(3, &["Horror"], 80),
            candidate(5, &["Comedy"], 130),
            candidate(1, &["Romance"], 85),
            candidate(9, &["Family"], 60),
        ];

        let result = filter().apply(
            candidates,
            Some(Occasion::Family),
            Some(TimeBudget::UnderNinetyMinutes),
        );
        assert_eq!(ids(&result), vec![7, 1, 9]);
    }

    #[test]
    fn test_unknown_runtime_fails_limits_only() {
        let unknown = ScoredMovie {
            movie: Movie::new(1, "Mystery Reel", ["Comedy"], None, 2000, ""),
            score: 1.0,
        };

        let limited = filter().apply(
            vec![unknown.clone()],
            None,
            Some(TimeBudget::UnderNinetyMinutes),
        );
        assert!(limited.is_empty());

        let unlimited = filter().apply(vec![unknown.clone()], None, Some(TimeBudget::NoLimit));
        assert_eq!(unlimited, vec![unknown]);
    }
}
