use std::collections::HashMap;

use crate::models::MovieId;

/// Per-request mapping from movie to score
pub type ScoreTable = HashMap<MovieId, f64>;

/// Outcome of a scoring stage.
///
/// `NoSignal` stands in for an all-zero table over the whole catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Scores(ScoreTable),
    NoSignal,
}

impl Signal {
    /// Score of a movie, 0 when the stage said nothing about it
    pub fn get(&self, movie_id: MovieId) -> f64 {
        match self {
            Signal::Scores(table) => table.get(&movie_id).copied().unwrap_or(0.0),
            Signal::NoSignal => 0.0,
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, Signal::Scores(_))
    }
}

/// Scales a table so its maximum becomes 1.
///
/// Tables that are empty or have no positive maximum carry no signal.
/// Non-finite entries are treated as 0.
pub fn normalize(table: ScoreTable) -> Signal {
    let max = table
        .values()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    if !(max > 0.0 && max.is_finite()) {
        return Signal::NoSignal;
    }

    let scaled = table
        .into_iter()
        .map(|(id, v)| (id, if v.is_finite() { v / max } else { 0.0 }))
        .collect();

    Signal::Scores(scaled)
}

/// Weighted sum of two normalized signals over the catalog, in catalog order.
///
/// A movie missing from one side counts as 0 there.
pub fn fuse<I>(
    catalog: I,
    content: &Signal,
    collaborative: &Signal,
    content_weight: f64,
    collaborative_weight: f64,
) -> Vec<(MovieId, f64)>
where
    I: IntoIterator<Item = MovieId>,
{
    catalog
        .into_iter()
        .map(|id| {
            let combined =
                content_weight * content.get(id) + collaborative_weight * collaborative.get(id);
            (id, if combined.is_finite() { combined } else { 0.0 })
        })
        .collect()
}
