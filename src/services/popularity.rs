use std::collections::{HashMap, HashSet};

use crate::models::{Movie, MovieId, Rating};

/// Catalog ranking by `mean_rating * ln(count + 1)`.
///
/// Movies with fewer than `min_support` ratings never rank, however high
/// their mean. The ranking is computed once at build time.
#[derive(Debug, Clone, Default)]
pub struct PopularityIndex {
    /// (movie id, popularity), best first, ties in catalog order
    ranked: Vec<(MovieId, f64)>,
}

impl PopularityIndex {
    pub fn build(ratings: &[Rating], movies: &[Movie], min_support: usize) -> Self {
        let mut totals: HashMap<MovieId, (f64, usize)> = HashMap::new();
        for rating in ratings {
            let entry = totals.entry(rating.movie_id).or_insert((0.0, 0));
            entry.0 += rating.rating;
            entry.1 += 1;
        }

        let mut ranked: Vec<(MovieId, f64)> = movies
            .iter()
            .filter_map(|movie| {
                let (sum, count) = totals.get(&movie.id).copied()?;
                if count < min_support {
                    return None;
                }
                let mean = sum / count as f64;
                Some((movie.id, mean * (count as f64 + 1.0).ln()))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        tracing::debug!(
            eligible = ranked.len(),
            min_support,
            "Popularity index built"
        );

        Self { ranked }
    }

    /// Number of movies meeting the support floor
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Up to `n` most popular movies, best first
    pub fn top(&self, n: usize) -> Vec<(MovieId, f64)> {
        self.ranked.iter().take(n).copied().collect()
    }

    /// Like [`top`](Self::top), skipping the given movies
    pub fn top_excluding(&self, n: usize, excluded: &HashSet<MovieId>) -> Vec<(MovieId, f64)> {
        self.ranked
            .iter()
            .filter(|(id, _)| !excluded.contains(id))
            .take(n)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movies(ids: &[MovieId]) -> Vec<Movie> {
        ids.iter()
            .map(|id| Movie::new(*id, format!("Movie {}", id), ["Drama"], Some(100), 2000, ""))
            .collect()
    }

    fn ratings_for(movie_id: MovieId, values: &[f64]) -> Vec<Rating> {
        values
            .iter()
            .enumerate()
            .map(|(user, value)| Rating::new(user as u32 + 1, movie_id, *value))
            .collect()
    }

    #[test]
    fn test_support_floor_excludes_sparse_favorites() {
        let mut ratings = ratings_for(1, &[5.0; 4]);
        ratings.extend(ratings_for(2, &[3.0; 5]));

        let index = PopularityIndex::build(&ratings, &movies(&[1, 2]), 5);

        assert_eq!(index.len(), 1);
        assert_eq!(index.top(10)[0].0, 2);
    }

    #[test]
    fn test_score_rewards_volume_with_diminishing_returns() {
        let mut ratings = ratings_for(1, &[4.0; 5]);
        ratings.extend(ratings_for(2, &[4.0; 20]));

        let index = PopularityIndex::build(&ratings, &movies(&[1, 2]), 5);
        let top = index.top(2);

        assert_eq!(top[0].0, 2);
        assert!((top[0].1 - 4.0 * 21f64.ln()).abs() < 1e-9);
        assert!((top[1].1 - 4.0 * 6f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let mut ratings = ratings_for(3, &[4.0; 5]);
        ratings.extend(ratings_for(1, &[4.0; 5]));

        let index = PopularityIndex::build(&ratings, &movies(&[3, 1]), 5);
        let ids: Vec<MovieId> = index.top(2).into_iter().map(|(id, _)| id).collect();

        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_top_returns_only_qualifying_movies() {
        let ratings = ratings_for(1, &[4.0; 6]);
        let index = PopularityIndex::build(&ratings, &movies(&[1, 2, 3]), 5);
        assert_eq!(index.top(10).len(), 1);
        assert!(index.top(0).is_empty());
    }

    #[test]
    fn test_top_excluding_skips_movies() {
        let mut ratings = ratings_for(1, &[5.0; 6]);
        ratings.extend(ratings_for(2, &[4.0; 6]));

        let index = PopularityIndex::build(&ratings, &movies(&[1, 2]), 5);
        let top = index.top_excluding(1, &HashSet::from([1]));

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, 2);
    }

    #[test]
    fn test_ratings_for_unknown_movies_are_ignored() {
        let ratings = ratings_for(42, &[5.0; 10]);
        let index = PopularityIndex::build(&ratings, &movies(&[1]), 5);
        assert!(index.is_empty());
    }
}
