//! TF-IDF model over intent patterns.
//!
//! Word unigrams + bigrams, tokens of two or more word characters, lowercase,
//! smoothed idf `ln((1 + n) / (1 + df)) + 1`, L2-normalized rows. Similarity is
//! the dot product of normalized vectors (cosine).

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

type SparseVec = Vec<(usize, f64)>;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static token regex"))
}

/// Lowercase, tokenize, then emit unigrams followed by bigrams.
pub fn analyze(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = token_regex().find_iter(&lower).map(|m| m.as_str()).collect();
    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    terms.extend(tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])));
    terms
}

#[derive(Debug, Clone)]
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<SparseVec>,
}

impl TfidfModel {
    /// Fit on a corpus. Returns `None` when the corpus is empty or yields no terms.
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Option<Self> {
        if corpus.is_empty() {
            return None;
        }
        let analyzed: Vec<Vec<String>> = corpus.iter().map(|d| analyze(d.as_ref())).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        for terms in &analyzed {
            let mut seen: Vec<usize> = Vec::new();
            for term in terms {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(term.clone()).or_insert(next);
                if idx == df.len() {
                    df.push(0);
                }
                if !seen.contains(&idx) {
                    seen.push(idx);
                    df[idx] += 1;
                }
            }
        }
        if vocabulary.is_empty() {
            tracing::warn!("TF-IDF corpus has no usable terms; semantic matching disabled");
            return None;
        }

        let n = corpus.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut model = Self {
            vocabulary,
            idf,
            rows: Vec::with_capacity(analyzed.len()),
        };
        let rows = analyzed.iter().map(|terms| model.vectorize(terms)).collect();
        model.rows = rows;
        Some(model)
    }

    /// Number of fitted documents.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn vectorize(&self, terms: &[String]) -> SparseVec {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in terms {
            if let Some(&idx) = self.vocabulary.get(term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        let mut vec: SparseVec = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        let norm = vec.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in vec.iter_mut() {
                *w /= norm;
            }
        }
        vec.sort_unstable_by_key(|(idx, _)| *idx);
        vec
    }

    /// Cosine similarity of `query` against every fitted document.
    pub fn similarities(&self, query: &str) -> Vec<f64> {
        let q = self.vectorize(&analyze(query));
        self.rows.iter().map(|row| dot(&q, row)).collect()
    }

    /// Best document `(index, similarity)`. Ties keep the earliest document.
    pub fn best_match(&self, query: &str) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, sim) in self.similarities(query).into_iter().enumerate() {
            if best.map_or(true, |(_, s)| sim > s) {
                best = Some((idx, sim));
            }
        }
        best
    }
}

/// Dot product of two index-sorted sparse vectors.
fn dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
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
