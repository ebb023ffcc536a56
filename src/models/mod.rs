pub mod context;
pub mod movie;

pub use context::{Mood, Occasion, RequestContext, TimeBudget, UnknownValue};
pub use movie::{EnrichedMovie, Movie, MovieDetails, MovieId, Rating, ScoredMovie, UserId};

/// Genre vocabulary offered to users when picking preferences.
///
/// The engine itself does not depend on this list: catalog tags outside it
/// are indexed like any other.
pub const GENRES: [&str; 18] = [
    "Action",
    "Adventure",
    "Animation",
    "Comedy",
    "Crime",
    "Drama",
    "Family",
    "Fantasy",
    "Horror",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "War",
    "Western",
    "Musical",
    "Biography",
    "Sport",
];
