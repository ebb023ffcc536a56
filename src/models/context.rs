use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    str::FromStr,
};

use super::MovieId;

/// How the viewer feels, used to widen the genre query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mood {
    Happy,
    Sad,
    Adventurous,
    Relaxed,
}

/// Who the viewer is watching with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Occasion {
    Family,
    Friends,
    Date,
    Solo,
}

/// How much time the viewer has
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeBudget {
    #[serde(rename = "< 90 mins")]
    UnderNinetyMinutes,
    #[serde(rename = "< 2 hours")]
    UnderTwoHours,
    #[serde(rename = "No limit")]
    NoLimit,
}

/// Unrecognized context value
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unrecognized {kind}: {value:?}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Mood {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "adventurous" => Ok(Mood::Adventurous),
            "relaxed" => Ok(Mood::Relaxed),
            _ => Err(UnknownValue {
                kind: "mood",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Occasion {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "family" => Ok(Occasion::Family),
            "friends" => Ok(Occasion::Friends),
            "date" => Ok(Occasion::Date),
            "solo" => Ok(Occasion::Solo),
            _ => Err(UnknownValue {
                kind: "occasion",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for TimeBudget {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "< 90 mins" => Ok(TimeBudget::UnderNinetyMinutes),
            "< 2 hours" => Ok(TimeBudget::UnderTwoHours),
            "No limit" => Ok(TimeBudget::NoLimit),
            _ => Err(UnknownValue {
                kind: "time budget",
                value: s.to_string(),
            }),
        }
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Display for Occasion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Display for TimeBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TimeBudget::UnderNinetyMinutes => "< 90 mins",
            TimeBudget::UnderTwoHours => "< 2 hours",
            TimeBudget::NoLimit => "No limit",
        };
        write!(f, "{}", label)
    }
}

/// Per-request input to the recommender. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestContext {
    pub selected_genres: BTreeSet<String>,
    pub mood: Option<Mood>,
    /// Ratings the user gave in this session, keyed by movie
    pub seed_ratings: BTreeMap<MovieId, f64>,
    pub occasion: Option<Occasion>,
    pub time_budget: Option<TimeBudget>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_genres.extend(genres.into_iter().map(Into::into));
        self
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_seed(mut self, movie_id: MovieId, rating: f64) -> Self {
        self.seed_ratings.insert(movie_id, rating);
        self
    }

    pub fn with_occasion(mut self, occasion: Occasion) -> Self {
        self.occasion = Some(occasion);
        self
    }

    pub fn with_time_budget(mut self, time_budget: TimeBudget) -> Self {
        self.time_budget = Some(time_budget);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_parse_is_case_insensitive() {
        assert_eq!("happy".parse::<Mood>(), Ok(Mood::Happy));
        assert_eq!(" Adventurous ".parse::<Mood>(), Ok(Mood::Adventurous));
        assert!("grumpy".parse::<Mood>().is_err());
    }

    #[test]
    fn test_time_budget_labels() {
        assert_eq!("< 90 mins".parse::<TimeBudget>(), Ok(TimeBudget::UnderNinetyMinutes));
        assert_eq!("< 2 hours".parse::<TimeBudget>(), Ok(TimeBudget::UnderTwoHours));
        assert_eq!(TimeBudget::UnderTwoHours.to_string(), "< 2 hours");

        let json = serde_json::to_string(&TimeBudget::UnderNinetyMinutes).unwrap();
        assert_eq!(json, "\"< 90 mins\"");
    }

    #[test]
    fn test_unknown_occasion_error_message() {
        let err = "Wedding".parse::<Occasion>().unwrap_err();
        assert_eq!(err.to_string(), "unrecognized occasion: \"Wedding\"");
    }

    #[test]
    fn test_context_builder() {
        let ctx = RequestContext::new()
            .with_genres(["Comedy", "Drama", "Comedy"])
            .with_mood(Mood::Sad)
            .with_seed(3, 4.0)
            .with_occasion(Occasion::Family)
            .with_time_budget(TimeBudget::NoLimit);

        assert_eq!(ctx.selected_genres.len(), 2);
        assert_eq!(ctx.seed_ratings.get(&3), Some(&4.0));
        assert_eq!(ctx.mood, Some(Mood::Sad));
    }
}
