use std::collections::{BTreeSet, HashMap};

use crate::models::{Movie, MovieId};

use super::scoring::ScoreTable;

/// Sparse, L2-normalized term vector: (term index, weight) sorted by index
type TermVector = Vec<(usize, f64)>;

/// TF-IDF index over movie genre tags.
///
/// Tags are lowercased and split on non-alphanumeric characters, keeping
/// tokens of two or more characters, so `Sci-Fi` contributes `sci` and `fi`.
/// IDF is smoothed: `ln((1 + n) / (1 + df)) + 1`.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<(MovieId, TermVector)>,
}

fn tokenize(tag: &str) -> impl Iterator<Item = String> + '_ {
    tag.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
}

fn document_tokens<'a, I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tags.into_iter().flat_map(|tag| tokenize(tag)).collect()
}

fn l2_normalize(mut vector: TermVector) -> TermVector {
    let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in vector.iter_mut() {
            *w /= norm;
        }
    }
    vector
}

/// Dot product of two index-sorted sparse vectors
fn dot(a: &TermVector, b: &TermVector) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

impl ContentIndex {
    /// Fits the vocabulary and per-movie vectors. Never fails; an empty
    /// catalog yields an index that scores nothing.
    pub fn build(movies: &[Movie]) -> Self {
        let documents: Vec<Vec<String>> = movies
            .iter()
            .map(|m| document_tokens(m.genres.iter().map(String::as_str)))
            .collect();

        let terms: BTreeSet<&str> = documents.iter().flatten().map(String::as_str).collect();
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term.to_string(), i))
            .collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for tokens in &documents {
            let unique: BTreeSet<usize> = tokens
                .iter()
                .filter_map(|t| vocabulary.get(t).copied())
                .collect();
            for index in unique {
                document_frequency[index] += 1;
            }
        }

        let n = movies.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|df| ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            vectors: Vec::with_capacity(movies.len()),
        };

        for (movie, tokens) in movies.iter().zip(&documents) {
            let vector = index.vectorize(tokens);
            index.vectors.push((movie.id, vector));
        }

        tracing::debug!(
            movies = movies.len(),
            vocabulary = index.dimension(),
            "Content index built"
        );

        index
    }

    /// Number of distinct terms fitted at build time
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Projects tokens into the fitted space; unseen terms are dropped
    fn vectorize(&self, tokens: &[String]) -> TermVector {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                *counts.entry(index).or_insert(0) += 1;
            }
        }

        let mut vector: TermVector = counts
            .into_iter()
            .map(|(index, count)| (index, count as f64 * self.idf[index]))
            .collect();
        vector.sort_by_key(|(index, _)| *index);

        l2_normalize(vector)
    }

    /// Cosine similarity of every movie against a tag query
    pub fn score<'a, I>(&self, query_tags: I) -> ScoreTable
    where
        I: IntoIterator<Item = &'a str>,
    {
        let query = self.vectorize(&document_tokens(query_tags));

        self.vectors
            .iter()
            .map(|(id, vector)| {
                let similarity = if query.is_empty() || vector.is_empty() {
                    0.0
                } else {
                    dot(&query, vector)
                };
                (*id, similarity)
            })
            .collect()
    }
}
