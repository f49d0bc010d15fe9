use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// Vectors with a norm below this are treated as zero.
pub const NORM_EPS: f32 = 1e-8;

/// One ranked similarity hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub token: String,
    pub score: f32,
}

/// Immutable token -> vector mapping backed by a single contiguous array.
///
/// Vocabulary keeps file order, which for pretrained embedding files means
/// most-frequent-first; `search_space` limits below rely on that. Rows are
/// unit-normalized at insertion, so a plain dot product against a normalized
/// query is the cosine similarity.
///
/// Token normalization policy: lookups try the token exactly as given, then
/// fall back to its lowercased form. GloVe vocabularies are all-lowercase
/// while Google News word2vec is case-sensitive; this policy serves both.
pub struct VectorStore {
    words: Vec<String>,               // vocabulary - index to word map
    word_map: HashMap<String, usize>, // word to index map
    vectors: Vec<f32>,                // flattened vector data
    dims: usize,
}

impl VectorStore {
    pub(crate) fn with_capacity(dims: usize, capacity: usize) -> Self {
        VectorStore {
            words: Vec::with_capacity(capacity),
            word_map: HashMap::with_capacity(capacity),
            vectors: Vec::with_capacity(capacity * dims),
            dims,
        }
    }

    /// Append a vector, normalizing it to unit length. Duplicate tokens keep
    /// their first occurrence; a dimension mismatch is an error.
    pub(crate) fn push(&mut self, word: String, mut vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dims {
            return Err(Error::DimensionMismatch {
                word,
                expected: self.dims,
                actual: vector.len(),
            });
        }
        if self.word_map.contains_key(&word) {
            log::debug!("duplicate token '{word}' ignored");
            return Ok(());
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > NORM_EPS {
            vector.iter_mut().for_each(|e| *e /= norm);
        }

        self.word_map.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.vectors.extend_from_slice(&vector);
        Ok(())
    }

    /// Build a store from (token, vector) pairs. Dimensionality is taken
    /// from the first entry.
    pub fn from_entries<I>(entries: I) -> Result<VectorStore>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut iter = entries.into_iter();
        let Some((first_word, first_vec)) = iter.next() else {
            return Err(Error::InvalidVector("no vectors supplied".into()));
        };
        if first_vec.is_empty() {
            return Err(Error::InvalidVector(format!(
                "vector for '{first_word}' has zero dimensions"
            )));
        }

        let mut store = VectorStore::with_capacity(first_vec.len(), iter.size_hint().0 + 1);
        store.push(first_word, first_vec)?;
        for (word, vector) in iter {
            store.push(word, vector)?;
        }
        Ok(store)
    }

    /// Rebuild from pre-normalized flat data (native cache path).
    pub(crate) fn from_flat(words: Vec<String>, vectors: Vec<f32>, dims: usize) -> Result<VectorStore> {
        if dims == 0 || words.is_empty() || vectors.len() != words.len() * dims {
            return Err(Error::InvalidVector(format!(
                "flat data of {} values does not cover {} words of dimension {dims}",
                vectors.len(),
                words.len()
            )));
        }
        let word_map = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();
        Ok(VectorStore {
            words,
            word_map,
            vectors,
            dims,
        })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn contains(&self, token: &str) -> bool {
        self.resolve(token).is_some()
    }

    pub fn word(&self, idx: usize) -> &str {
        &self.words[idx]
    }

    pub(crate) fn words(&self) -> &[String] {
        &self.words
    }

    pub(crate) fn flat(&self) -> &[f32] {
        &self.vectors
    }

    // Exact match first, lowercased form second.
    fn resolve(&self, token: &str) -> Option<usize> {
        if let Some(&idx) = self.word_map.get(token) {
            return Some(idx);
        }
        self.word_map.get(&token.to_lowercase()).copied()
    }

    fn vector(&self, idx: usize) -> &[f32] {
        &self.vectors[idx * self.dims..(idx + 1) * self.dims]
    }

    /// Look up a token's (unit-normalized) vector.
    pub fn lookup(&self, token: &str) -> Result<&[f32]> {
        self.resolve(token)
            .map(|idx| self.vector(idx))
            .ok_or_else(|| Error::NotFound(token.to_string()))
    }

    /// Rank the whole vocabulary (or its `search_space` most frequent
    /// entries) by cosine similarity to `query`, skipping `exclude` tokens,
    /// and return the `top_k` best hits in descending score order. Ties are
    /// broken by vocabulary insertion order, so results are deterministic
    /// even though the scan itself is parallel.
    pub fn nearest_neighbors(
        &self,
        query: &[f32],
        exclude: &[&str],
        top_k: usize,
        search_space: Option<usize>,
    ) -> Result<Vec<Neighbor>> {
        if query.len() != self.dims {
            return Err(Error::DimensionMismatch {
                word: "query".into(),
                expected: self.dims,
                actual: query.len(),
            });
        }

        let norm: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm <= NORM_EPS {
            return Err(Error::InvalidVector(
                "query vector has zero magnitude".into(),
            ));
        }
        let target: Vec<f32> = query.iter().map(|x| x / norm).collect();

        let excluded: HashSet<usize> = exclude.iter().filter_map(|t| self.resolve(t)).collect();

        let limit = search_space
            .map(|s| s.min(self.words.len()))
            .unwrap_or(self.words.len());

        // Parallel scan over contiguous memory; collect preserves index order.
        let mut scores: Vec<(usize, f32)> = self.vectors[..limit * self.dims]
            .par_chunks_exact(self.dims)
            .enumerate()
            .filter(|(i, _)| !excluded.contains(i))
            .map(|(i, v_slice)| {
                let score = v_slice
                    .iter()
                    .zip(&target)
                    .map(|(v, t)| v * t)
                    .sum::<f32>();
                (i, score)
            })
            .collect();

        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scores.truncate(top_k);

        Ok(scores
            .into_iter()
            .map(|(idx, score)| Neighbor {
                token: self.words[idx].clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity = dot(a, b) / (||a|| * ||b||). A zero-magnitude input
/// is an error rather than a silent 0 or NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            word: "cosine".into(),
            expected: a.len(),
            actual: b.len(),
        });
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= NORM_EPS || norm_b <= NORM_EPS {
        return Err(Error::InvalidVector(
            "cosine similarity of a zero vector is undefined".into(),
        ));
    }
    Ok(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VectorStore {
        VectorStore::from_entries([
            ("man".to_string(), vec![1.0, 0.0, 0.0]),
            ("woman".to_string(), vec![1.0, 1.0, 0.0]),
            ("king".to_string(), vec![1.0, 0.0, 1.0]),
            ("queen".to_string(), vec![1.0, 1.0, 1.0]),
            ("apple".to_string(), vec![0.0, 0.1, 0.9]),
        ])
        .unwrap()
    }

    #[test]
    fn lookup_is_deterministic() {
        let s = store();
        let first = s.lookup("king").unwrap().to_vec();
        let second = s.lookup("king").unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn lookup_falls_back_to_lowercase() {
        let s = store();
        assert!(s.lookup("King").is_ok());
        assert!(matches!(s.lookup("ghostword"), Err(Error::NotFound(w)) if w == "ghostword"));
    }

    #[test]
    fn self_similarity_is_one() {
        let s = store();
        let v = s.lookup("queen").unwrap();
        let sim = cosine_similarity(v, v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn neighbors_respect_exclusions_and_order() {
        let s = store();
        let query = s.lookup("queen").unwrap().to_vec();
        let hits = s
            .nearest_neighbors(&query, &["queen"], 10, None)
            .unwrap();
        assert!(hits.iter().all(|n| n.token != "queen"));
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let s = VectorStore::from_entries([
            ("first".to_string(), vec![0.0, 1.0]),
            ("second".to_string(), vec![0.0, 1.0]),
        ])
        .unwrap();
        let hits = s.nearest_neighbors(&[0.0, 1.0], &[], 2, None).unwrap();
        assert_eq!(hits[0].token, "first");
        assert_eq!(hits[1].token, "second");
    }

    #[test]
    fn search_space_limits_the_scan() {
        let s = store();
        // "apple" is the last entry; a prefix of 4 never returns it.
        let hits = s
            .nearest_neighbors(&[0.0, 0.1, 0.9], &[], 10, Some(4))
            .unwrap();
        assert!(hits.iter().all(|n| n.token != "apple"));
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn zero_query_is_invalid() {
        let s = store();
        let err = s.nearest_neighbors(&[0.0, 0.0, 0.0], &[], 5, None);
        assert!(matches!(err, Err(Error::InvalidVector(_))));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut s = store();
        let err = s.push("short".to_string(), vec![1.0]);
        assert!(matches!(err, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn cosine_of_zero_vector_fails() {
        assert!(matches!(
            cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]),
            Err(Error::InvalidVector(_))
        ));
    }
}
