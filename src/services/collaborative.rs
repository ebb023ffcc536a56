use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{Movie, MovieId, Rating, UserId};

use super::scoring::ScoreTable;

/// Item-by-user rating matrix with nearest-neighbor search over item rows.
///
/// Only movies with at least one rating get a row. Rows are dense over every
/// user seen at build time, 0 where the user did not rate the movie; repeated
/// (user, movie) pairs are averaged. Neighbor search is a brute-force cosine
/// scan, which is fine at catalog sizes in the low thousands.
#[derive(Debug, Clone, Default)]
pub struct CollaborativeIndex {
    items: Vec<MovieId>,
    positions: HashMap<MovieId, usize>,
    rows: Vec<Vec<f64>>,
    norms: Vec<f64>,
    users: usize,
    neighbor_cap: usize,
}

impl CollaborativeIndex {
    /// Builds the matrix from ratings of catalog movies. Ratings of movies
    /// outside the catalog are ignored.
    pub fn build(ratings: &[Rating], movies: &[Movie], neighbor_cap: usize) -> Self {
        let catalog: BTreeSet<MovieId> = movies.iter().map(|m| m.id).collect();
        let ratings: Vec<&Rating> = ratings
            .iter()
            .filter(|r| catalog.contains(&r.movie_id))
            .collect();

        let users: BTreeSet<UserId> = ratings.iter().map(|r| r.user_id).collect();
        let columns: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(i, u)| (*u, i)).collect();

        let rated: BTreeSet<MovieId> = ratings.iter().map(|r| r.movie_id).collect();
        let items: Vec<MovieId> = movies
            .iter()
            .map(|m| m.id)
            .filter(|id| rated.contains(id))
            .collect();
        let positions: HashMap<MovieId, usize> =
            items.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut cells: HashMap<(usize, usize), (f64, u32)> = HashMap::new();
        for rating in &ratings {
            let (Some(&row), Some(&column)) =
                (positions.get(&rating.movie_id), columns.get(&rating.user_id))
            else {
                continue;
            };
            let cell = cells.entry((row, column)).or_insert((0.0, 0));
            cell.0 += rating.rating;
            cell.1 += 1;
        }

        let mut rows = vec![vec![0.0; users.len()]; items.len()];
        for ((row, column), (sum, count)) in cells {
            rows[row][column] = sum / count as f64;
        }
        let norms = rows
            .iter()
            .map(|row| row.iter().map(|v| v * v).sum::<f64>().sqrt())
            .collect();

        tracing::debug!(
            items = items.len(),
            users = users.len(),
            "Collaborative index built"
        );

        Self {
            items,
            positions,
            rows,
            norms,
            users: users.len(),
            neighbor_cap,
        }
    }

    /// Number of movies with a rating row
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Length of every rating row
    pub fn user_count(&self) -> usize {
        self.users
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.positions.contains_key(&movie_id)
    }

    fn cosine(&self, a: usize, b: usize) -> f64 {
        let denominator = self.norms[a] * self.norms[b];
        if denominator == 0.0 {
            return 0.0;
        }
        let dot: f64 = self.rows[a]
            .iter()
            .zip(&self.rows[b])
            .map(|(x, y)| x * y)
            .sum();
        dot / denominator
    }

    /// Up to `k` most similar movies to `movie_id`, most similar first.
    ///
    /// Similarity is `1 - cosine distance`. The movie itself is never
    /// returned; an unindexed movie has no neighbors.
    pub fn neighbors(&self, movie_id: MovieId, k: usize) -> Vec<(MovieId, f64)> {
        let Some(&row) = self.positions.get(&movie_id) else {
            return Vec::new();
        };

        let mut candidates: Vec<(usize, f64)> = (0..self.items.len())
            .filter(|other| *other != row)
            .map(|other| (other, self.cosine(row, other)))
            .collect();
        // Stable, so equal similarities keep catalog order
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        candidates
            .into_iter()
            .take(k)
            .map(|(other, similarity)| (self.items[other], similarity))
            .collect()
    }

    /// Accumulates `similarity * rating` onto the neighbors of each seed.
    ///
    /// No seeded movie ever receives a score, including seeds whose rating is
    /// off the 1..=5 scale. Those, and seeds without a rating row, add nothing.
    pub fn score(&self, seed_ratings: &BTreeMap<MovieId, f64>) -> ScoreTable {
        let k = self.neighbor_cap.min(self.items.len().saturating_sub(1));
        let mut scores = ScoreTable::new();

        for (&seed, &rating) in seed_ratings {
            if !Rating::is_valid_value(rating) {
                tracing::warn!(movie_id = seed, rating, "Dropping out-of-range seed rating");
                continue;
            }
            if !self.contains(seed) {
                tracing::warn!(movie_id = seed, "Seed movie has no rating history, skipping");
                continue;
            }

            for (neighbor, similarity) in self.neighbors(seed, k) {
                if seed_ratings.contains_key(&neighbor) {
                    continue;
                }
                *scores.entry(neighbor).or_insert(0.0) += similarity * rating;
            }
        }

        scores
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

    /// Movies 1 and 2 share raters, 3 is rated by different users,
    /// 4 is only rated by user 1, 5 has no ratings.
    fn index() -> CollaborativeIndex {
        let ratings = vec![
            Rating::new(1, 1, 5.0),
            Rating::new(2, 1, 4.0),
            Rating::new(1, 2, 5.0),
            Rating::new(2, 2, 4.0),
            Rating::new(3, 3, 5.0),
            Rating::new(4, 3, 2.0),
            Rating::new(1, 4, 3.0),
            Rating::new(9, 99, 5.0),
        ];
        CollaborativeIndex::build(&ratings, &movies(&[1, 2, 3, 4, 5]), 10)
    }

    #[test]
    fn test_rows_cover_rated_catalog_movies_only() {
        let index = index();
        assert_eq!(index.len(), 4);
        assert!(!index.contains(5));
        assert!(!index.contains(99));
        // user 9 only rated a movie outside the catalog
        assert_eq!(index.user_count(), 4);
        assert!(index.rows.iter().all(|row| row.len() == index.user_count()));
    }

    #[test]
    fn test_neighbors_ordered_by_similarity() {
        let neighbors = index().neighbors(1, 10);

        assert_eq!(neighbors.len(), 3);
        assert_eq!(neighbors[0].0, 2);
        assert!((neighbors[0].1 - 1.0).abs() < 1e-9);
        assert_eq!(neighbors[1].0, 4);
        assert_eq!(neighbors[2], (3, 0.0));
        assert!(neighbors.iter().all(|(id, _)| *id != 1));
    }

    #[test]
    fn test_neighbors_respects_k() {
        assert_eq!(index().neighbors(1, 1).len(), 1);
    }

    #[test]
    fn test_neighbors_of_unindexed_movie_is_empty() {
        assert!(index().neighbors(5, 10).is_empty());
        assert!(index().neighbors(42, 10).is_empty());
    }

    #[test]
    fn test_score_weights_by_seed_rating() {
        let seeds = BTreeMap::from([(1, 4.0)]);
        let scores = index().score(&seeds);

        assert!((scores[&2] - 4.0).abs() < 1e-9);
        assert!(scores[&4] > 0.0);
        assert!(!scores.contains_key(&1));
    }

    #[test]
    fn test_score_excludes_seeded_neighbors() {
        let seeds = BTreeMap::from([(1, 5.0), (2, 3.0)]);
        let scores = index().score(&seeds);

        assert!(!scores.contains_key(&1));
        assert!(!scores.contains_key(&2));
        assert!(scores.contains_key(&4));
    }

    #[test]
    fn test_unindexed_seed_contributes_nothing() {
        let seeds = BTreeMap::from([(5, 5.0), (77, 4.0)]);
        assert!(index().score(&seeds).is_empty());
    }

    #[test]
    fn test_repeated_ratings_are_averaged() {
        let ratings = vec![Rating::new(1, 1, 2.0), Rating::new(1, 1, 4.0)];
        let index = CollaborativeIndex::build(&ratings, &movies(&[1]), 10);
        assert_eq!(index.rows[0], vec![3.0]);
    }

    #[test]
    fn test_empty_history_builds_empty_index() {
        let index = CollaborativeIndex::build(&[], &movies(&[1, 2]), 10);
        assert!(index.is_empty());
        assert!(index.score(&BTreeMap::from([(1, 5.0)])).is_empty());
    }

    #[test]
    fn test_score_caps_neighbors_per_seed() {
        let ids: Vec<MovieId> = (1..=20).collect();
        let ratings: Vec<Rating> = ids
            .iter()
            .flat_map(|&movie| {
                (1..=3).map(move |user| Rating::new(user, movie, ((movie + user) % 5 + 1) as f64))
            })
            .collect();
        let index = CollaborativeIndex::build(&ratings, &movies(&ids), 10);

        let scores = index.score(&BTreeMap::from([(1, 5.0)]));

        assert_eq!(scores.len(), 10);
        assert!(!scores.contains_key(&1));
    }

    #[test]
    fn test_out_of_range_seed_neither_scores_nor_is_scored() {
        // Movie 2 is a perfect neighbor of movie 1 but carries an invalid seed
        let seeds = BTreeMap::from([(1, 5.0), (2, 9.0)]);
        let scores = index().score(&seeds);

        assert!(!scores.contains_key(&2));
        assert!(scores.contains_key(&4));

        let only_invalid = BTreeMap::from([(2, 0.0)]);
        assert!(index().score(&only_invalid).is_empty());
    }
}
