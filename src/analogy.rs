//! Analogy evaluation: `v(b) - v(a) + v(c)` and friends.
//!
//! Every operation resolves its input tokens up front and fails with
//! `MissingToken` on the first out-of-vocabulary word; nothing is silently
//! skipped. When a search space smaller than the vocabulary is requested,
//! the true answer may lie outside the scanned prefix and the query simply
//! misses. That is documented approximate behavior, not a bug.

use crate::error::{Error, Result};
use crate::store::{Neighbor, VectorStore};

/// One analogy question: `a` is to `b` as `c` is to `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogyQuery {
    pub a: String,
    pub b: String,
    pub c: String,
    /// Known answer, used only for scoring.
    pub expected: Option<String>,
    pub category: String,
}

impl AnalogyQuery {
    pub fn new(a: &str, b: &str, c: &str, expected: Option<&str>, category: &str) -> Self {
        AnalogyQuery {
            a: a.to_string(),
            b: b.to_string(),
            c: c.to_string(),
            expected: expected.map(str::to_string),
            category: category.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalogyResult {
    pub query: AnalogyQuery,
    /// Ranked candidates, most similar first.
    pub neighbors: Vec<Neighbor>,
    /// Some(true) iff `expected` was supplied and appears among the
    /// candidates (case-insensitively); None when no answer was given.
    pub matched: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub top_k: usize,
    /// Scan only the N most frequent vocabulary entries when set.
    pub search_space: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            top_k: 10,
            search_space: None,
        }
    }
}

fn lookup_input<'a>(store: &'a VectorStore, token: &str) -> Result<&'a [f32]> {
    store
        .lookup(token)
        .map_err(|_| Error::MissingToken(token.to_string()))
}

/// Evaluate one analogy: rank candidates for `b - a + c`, excluding the
/// three input words.
pub fn evaluate(
    store: &VectorStore,
    query: AnalogyQuery,
    opts: &SearchOptions,
) -> Result<AnalogyResult> {
    let va = lookup_input(store, &query.a)?;
    let vb = lookup_input(store, &query.b)?;
    let vc = lookup_input(store, &query.c)?;

    let target: Vec<f32> = (0..store.dims())
        .map(|i| vb[i] - va[i] + vc[i])
        .collect();

    let neighbors = store.nearest_neighbors(
        &target,
        &[query.a.as_str(), query.b.as_str(), query.c.as_str()],
        opts.top_k,
        opts.search_space,
    )?;

    let matched = query.expected.as_deref().map(|expected| {
        let expected = expected.to_lowercase();
        neighbors.iter().any(|n| n.token.to_lowercase() == expected)
    });

    Ok(AnalogyResult {
        query,
        neighbors,
        matched,
    })
}

/// Nearest neighbors of a single word, the word itself excluded.
pub fn neighbors(store: &VectorStore, word: &str, opts: &SearchOptions) -> Result<Vec<Neighbor>> {
    let v = lookup_input(store, word)?.to_vec();
    store.nearest_neighbors(&v, &[word], opts.top_k, opts.search_space)
}

/// Vector arithmetic: sum of `positive` minus sum of `negative`, ranked
/// against the vocabulary with all input words excluded.
pub fn arithmetic(
    store: &VectorStore,
    positive: &[String],
    negative: &[String],
    opts: &SearchOptions,
) -> Result<Vec<Neighbor>> {
    if positive.is_empty() && negative.is_empty() {
        return Err(Error::InvalidVector("no input words supplied".into()));
    }

    let mut target = vec![0.0f32; store.dims()];
    for word in positive {
        let v = lookup_input(store, word)?;
        for (t, x) in target.iter_mut().zip(v) {
            *t += x;
        }
    }
    for word in negative {
        let v = lookup_input(store, word)?;
        for (t, x) in target.iter_mut().zip(v) {
            *t -= x;
        }
    }

    let exclude: Vec<&str> = positive
        .iter()
        .chain(negative)
        .map(String::as_str)
        .collect();
    store.nearest_neighbors(&target, &exclude, opts.top_k, opts.search_space)
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
    fn man_woman_king_gives_queen() {
        let s = store();
        let opts = SearchOptions {
            top_k: 1,
            search_space: None,
        };
        let query = AnalogyQuery::new("man", "woman", "king", Some("queen"), "family");
        let result = evaluate(&s, query, &opts).unwrap();
        assert_eq!(result.neighbors.len(), 1);
        assert_eq!(result.neighbors[0].token, "queen");
        assert_eq!(result.matched, Some(true));
    }

    #[test]
    fn unknown_word_is_missing_token() {
        let s = store();
        let query = AnalogyQuery::new("man", "woman", "ghostword", None, "family");
        let err = evaluate(&s, query, &SearchOptions::default());
        assert!(matches!(err, Err(Error::MissingToken(w)) if w == "ghostword"));
    }

    #[test]
    fn inputs_never_appear_in_candidates() {
        let s = store();
        let query = AnalogyQuery::new("man", "woman", "king", None, "family");
        let result = evaluate(&s, query, &SearchOptions::default()).unwrap();
        for n in &result.neighbors {
            assert!(!["man", "woman", "king"].contains(&n.token.as_str()));
        }
        assert_eq!(result.matched, None);
    }

    #[test]
    fn neighbors_exclude_the_word_itself() {
        let s = store();
        let hits = neighbors(&s, "king", &SearchOptions::default()).unwrap();
        assert!(hits.iter().all(|n| n.token != "king"));
        assert!(!hits.is_empty());
    }

    #[test]
    fn arithmetic_matches_the_analogy_form() {
        let s = store();
        let opts = SearchOptions {
            top_k: 1,
            search_space: None,
        };
        let hits = arithmetic(
            &s,
            &["woman".to_string(), "king".to_string()],
            &["man".to_string()],
            &opts,
        )
        .unwrap();
        assert_eq!(hits[0].token, "queen");
    }

    #[test]
    fn arithmetic_rejects_empty_input() {
        let s = store();
        assert!(matches!(
            arithmetic(&s, &[], &[], &SearchOptions::default()),
            Err(Error::InvalidVector(_))
        ));
    }
}
