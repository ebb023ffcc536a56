use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::models::{Movie, MovieId, Rating, UserId};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Catalog and interaction history the recommender is built from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub movies: Vec<Movie>,
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    /// `|`-separated genre tags
    genres: String,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    overview: Option<String>,
}

impl From<MovieRecord> for Movie {
    fn from(record: MovieRecord) -> Self {
        Movie::new(
            record.movie_id,
            record.title,
            record.genres.split('|'),
            record.runtime,
            record.year.unwrap_or_default(),
            record.overview.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f64,
}

fn read_csv<T, P>(path: P) -> Result<Vec<T>, DatasetError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let wrap = |source| DatasetError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(wrap)?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(wrap)
}

impl Dataset {
    /// Reads `movieId,title,genres[,runtime,year,overview]` and
    /// `userId,movieId,rating` files
    pub fn from_csv<P: AsRef<Path>>(movies_path: P, ratings_path: P) -> Result<Self, DatasetError> {
        let movies = read_csv::<MovieRecord, _>(movies_path)?
            .into_iter()
            .map(Movie::from)
            .collect::<Vec<_>>();
        let ratings = read_csv::<RatingRecord, _>(ratings_path)?
            .into_iter()
            .map(|r| Rating::new(r.user_id, r.movie_id, r.rating))
            .collect::<Vec<_>>();

        tracing::info!(
            movies = movies.len(),
            ratings = ratings.len(),
            "Loaded dataset from CSV"
        );

        Ok(Self { movies, ratings })
    }

    /// Loads the CSV pair when both paths are given and readable, otherwise
    /// falls back to the demo dataset
    pub fn load_or_demo(movies_path: Option<&str>, ratings_path: Option<&str>) -> Self {
        match (movies_path, ratings_path) {
            (Some(movies), Some(ratings)) => match Self::from_csv(movies, ratings) {
                Ok(dataset) => dataset,
                Err(e) => {
                    tracing::warn!(error = %e, "Dataset not readable, using demo data");
                    Self::demo()
                }
            },
            _ => {
                tracing::info!("No dataset configured, using demo data");
                Self::demo()
            }
        }
    }

    /// Deterministic 50-title catalog rated by 100 synthetic users.
    ///
    /// Each user rates 10 to 29 distinct titles; ratings 1 through 5 are drawn
    /// with weights 5/10/20/35/30 percent. Runtimes are uniform in 80..180.
    pub fn demo() -> Self {
        let mut rng = StdRng::seed_from_u64(42);

        let movies: Vec<Movie> = DEMO_CATALOG
            .iter()
            .enumerate()
            .map(|(i, (title, genres, year, overview))| {
                Movie::new(
                    i as MovieId + 1,
                    *title,
                    genres.split('|'),
                    Some(rng.gen_range(80..180)),
                    *year,
                    *overview,
                )
            })
            .collect();

        let ids: Vec<MovieId> = movies.iter().map(|m| m.id).collect();
        let mut ratings = Vec::new();
        for user_id in 1..=100 {
            let count = rng.gen_range(10..30);
            for movie_id in ids.choose_multiple(&mut rng, count) {
                let rating = match rng.gen_range(0..100) {
                    0..=4 => 1.0,
                    5..=14 => 2.0,
                    15..=34 => 3.0,
                    35..=69 => 4.0,
                    _ => 5.0,
                };
                ratings.push(Rating::new(user_id, *movie_id, rating));
            }
        }

        Self { movies, ratings }
    }
}

const DEMO_CATALOG: [(&str, &str, i32, &str); 50] = [
    ("The Shawshank Redemption", "Drama", 1994, "Two imprisoned men bond over years, finding redemption through acts of decency."),
    ("The Godfather", "Crime|Drama", 1972, "The aging patriarch of an organized crime dynasty transfers control to his reluctant son."),
    ("The Dark Knight", "Action|Crime|Drama", 2008, "When the menace known as the Joker emerges, Batman must accept one of his greatest psychological tests."),
    ("Inception", "Action|Sci-Fi|Thriller", 2010, "A thief who steals secrets through dreams is given a chance at redemption."),
    ("Pulp Fiction", "Crime|Drama", 1994, "Various interconnected people grapple with questions of life, death, and meaning."),
    ("Forrest Gump", "Drama|Romance", 1994, "Decades of American history unfold through the perspective of an Alabama man."),
    ("The Matrix", "Action|Sci-Fi", 1999, "A computer hacker learns the true nature of his reality and his role in the war against its controllers."),
    ("Goodfellas", "Crime|Drama", 1990, "The story of Henry Hill and his life in the mob."),
    ("Se7en", "Crime|Mystery|Thriller", 1995, "Two detectives hunt a serial killer who uses the seven deadly sins as his motives."),
    ("Interstellar", "Sci-Fi|Drama|Adventure", 2014, "A team of explorers travel through a wormhole in space in an attempt to ensure survival."),
    ("Titanic", "Drama|Romance", 1997, "A seventeen-year-old aristocrat falls in love with a kind but poor artist aboard a luxurious ship."),
    ("Avatar", "Action|Adventure|Sci-Fi", 2009, "A paraplegic Marine is dispatched to the moon Pandora on a unique mission."),
    ("The Avengers", "Action|Adventure|Sci-Fi", 2012, "Earth's mightiest heroes must come together to stop an alien invasion."),
    ("Jurassic Park", "Adventure|Sci-Fi|Thriller", 1993, "Scientists clone dinosaurs to populate a theme park which suffers a major security breakdown."),
    ("Toy Story", "Animation|Adventure|Comedy", 1995, "A cowboy doll is profoundly threatened when a new spaceman figure supplants him."),
    ("Finding Nemo", "Animation|Adventure|Comedy", 2003, "After his son is captured, a timid clownfish sets out on a journey to bring him home."),
    ("The Lion King", "Animation|Adventure|Drama", 1994, "Lion prince Simba flees his kingdom only to learn the true meaning of responsibility."),
    ("Frozen", "Animation|Adventure|Comedy|Family", 2013, "A newly crowned queen accidentally turns her kingdom to ice."),
    ("Coco", "Animation|Adventure|Comedy|Family", 2017, "A young boy embarks on a magical adventure to the Land of the Dead."),
    ("Up", "Animation|Adventure|Comedy|Drama", 2009, "Elderly widower Carl goes on an adventure in his flying house."),
    ("Die Hard", "Action|Thriller", 1988, "An NYPD officer tries to save hostages taken during a Christmas party."),
    ("Terminator 2", "Action|Sci-Fi|Thriller", 1991, "A cyborg protector returns to prevent the death of future rebel leader John Connor."),
    ("Aliens", "Action|Adventure|Sci-Fi|Thriller", 1986, "Colonists fight hostile alien life forms and an android with a hidden agenda."),
    ("Predator", "Action|Adventure|Sci-Fi|Thriller", 1987, "A team of commandos is hunted by an extraterrestrial warrior in the jungle."),
    ("RoboCop", "Action|Crime|Sci-Fi|Thriller", 1987, "In a crime-ridden Detroit, a terminally wounded cop returns to the force as a cyborg."),
    ("The Notebook", "Drama|Romance", 2004, "A poor yet passionate young man falls in love with a rich young woman."),
    ("La La Land", "Drama|Musical|Romance", 2016, "A jazz pianist falls for an aspiring actress in Los Angeles."),
    ("Pride and Prejudice", "Drama|Romance", 2005, "Sparks fly when spirited Elizabeth Bennet meets the proud Mr. Darcy."),
    ("Casablanca", "Drama|Romance", 1942, "A cynical expatriate struggles to decide whether to help his former lover escape."),
    ("Roman Holiday", "Drama|Romance", 1953, "A princess falls in love with a reporter during her tour of European capitals."),
    ("The Exorcist", "Horror|Mystery|Thriller", 1973, "When a young girl is possessed by a mysterious entity, her mother seeks help from two priests."),
    ("The Shining", "Horror|Thriller", 1980, "A family heads to an isolated hotel where a sinister presence influences the father."),
    ("A Quiet Place", "Drama|Horror|Mystery|Thriller", 2018, "A family is forced to live in silence while hiding from creatures that hunt by sound."),
    ("Get Out", "Horror|Mystery|Thriller", 2017, "A young man visits his girlfriend's parents and uncovers a disturbing secret."),
    ("Hereditary", "Drama|Horror|Mystery|Thriller", 2018, "A grieving family is haunted by tragic and disturbing occurrences."),
    ("The Conjuring", "Horror|Mystery|Thriller", 2013, "Paranormal investigators work to help a family terrorized by a dark presence."),
    ("Superbad", "Comedy", 2007, "Two co-dependent high school seniors are forced to deal with separation anxiety."),
    ("The Hangover", "Comedy", 2009, "Three buddies wake up with no memory of the previous night and search for the missing groom."),
    ("Bridesmaids", "Comedy|Romance", 2011, "Competition between bridesmaids escalates to absurd heights."),
    ("Step Brothers", "Comedy", 2008, "Two aimless middle-aged men still living at home are forced to become roommates."),
    ("3 Idiots", "Comedy|Drama", 2009, "Three friends embark on a quest to change one engineer's life before graduation."),
    ("Dangal", "Biography|Drama|Sport", 2016, "A former wrestler coaches his daughters to fulfill his dream."),
    ("PK", "Comedy|Drama|Sci-Fi", 2014, "An alien on Earth poses difficult questions about life and humanity."),
    ("Lagaan", "Drama|Sport", 2001, "Villagers challenge British officers at cricket, their only hope for freedom."),
    ("Dilwale Dulhania Le Jayenge", "Drama|Romance|Musical", 1995, "Two lovers face disapproval and must win over a family to realize their dreams."),
    ("Parasite", "Drama|Thriller", 2019, "Greed and class discrimination threaten the newly formed relationship between two families."),
    ("Oldboy", "Crime|Drama|Mystery|Thriller", 2003, "After being kidnapped and imprisoned, a man seeks revenge on his captors."),
    ("Spirited Away", "Animation|Adventure|Fantasy", 2001, "A young girl enters a world ruled by gods, witches, and spirits."),
    ("Your Name", "Animation|Drama|Romance", 2016, "Two teenagers share a profound connection after discovering they are swapping bodies."),
    ("Train to Busan", "Action|Horror|Thriller", 2016, "Passengers on a train must fight for survival against a zombie outbreak."),
];
