pub mod collaborative;
pub mod content;
pub mod context_filter;
pub mod dataset;
pub mod enrichment;
pub mod popularity;
pub mod providers;
pub mod recommender;
pub mod scoring;

pub use dataset::Dataset;
pub use recommender::{RankingSource, Recommendations, Recommender};
