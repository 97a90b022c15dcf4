//! TF-IDF vector space over normalized documents + cosine similarity.
//!
//! Weighting matches the common "smooth idf, L2 rows" convention:
//! - tf(t, d): raw count of term `t` in `d`
//! - idf(t) = ln((1 + n) / (1 + df(t))) + 1
//! - each row is L2-normalized
//!
//! Vocabulary selection is deterministic: df pruning, then the `max_features`
//! most frequent terms (ties by term text), then indices in term-text order.

use internrank_core::VectorizerConfig;
use std::collections::{BTreeMap, HashMap};

/// Sparse row: `(vocabulary index, weight)` pairs sorted by index, zeros omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub(crate) fn from_sorted(entries: Vec<(usize, f64)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Walk the indices present in both vectors, yielding `(index, a_weight, b_weight)`.
    pub fn intersect<'a>(
        &'a self,
        other: &'a SparseVector,
    ) -> impl Iterator<Item = (usize, f64, f64)> + 'a {
        let mut i = 0usize;
        let mut j = 0usize;
        std::iter::from_fn(move || {
            while i < self.entries.len() && j < other.entries.len() {
                let (ia, wa) = self.entries[i];
                let (ib, wb) = other.entries[j];
                match ia.cmp(&ib) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        i += 1;
                        j += 1;
                        return Some((ia, wa, wb));
                    }
                }
            }
            None
        })
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        self.intersect(other).map(|(_, a, b)| a * b).sum()
    }
}

/// Cosine similarity in [0, 1] for non-negative vectors; 0 if either side is zero.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let na = a.norm();
    let nb = b.norm();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (na * nb)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    /// Terms in index order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> Option<&SparseVector> {
        self.rows.get(i)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
}

impl TfidfVectorizer {
    pub fn new(config: VectorizerConfig) -> Self {
        Self { config }
    }

    /// Term units of an already-normalized document: tokens of >= 2 chars, then n-grams.
    fn terms(&self, doc: &str) -> Vec<String> {
        let tokens = doc
            .split_whitespace()
            .filter(|t| t.chars().count() >= 2)
            .collect::<Vec<_>>();
        let (lo, hi) = self.config.ngram_range;
        let lo = lo.max(1);
        let mut out = Vec::new();
        for n in lo..=hi.max(lo) {
            if n > tokens.len() {
                break;
            }
            for w in tokens.windows(n) {
                out.push(w.join(" "));
            }
        }
        out
    }

    fn select_vocabulary(
        &self,
        n_docs: usize,
        total_counts: HashMap<String, usize>,
        doc_freq: &HashMap<String, usize>,
    ) -> Vec<String> {
        let max_doc_count = self.config.max_df * n_docs as f64;
        let mut kept = total_counts
            .into_iter()
            .filter(|(term, _)| {
                let df = doc_freq.get(term).copied().unwrap_or(0);
                df >= self.config.min_df && df as f64 <= max_doc_count
            })
            .collect::<Vec<_>>();
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        kept.truncate(self.config.max_features);
        let mut vocab = kept.into_iter().map(|(t, _)| t).collect::<Vec<_>>();
        vocab.sort();
        vocab
    }

    /// Fit the vocabulary on `documents` and return their weighted rows.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> TfidfMatrix {
        let n_docs = documents.len();
        let mut per_doc: Vec<HashMap<String, usize>> = Vec::with_capacity(n_docs);
        let mut total_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for term in self.terms(doc.as_ref()) {
                *counts.entry(term).or_insert(0) += 1;
            }
            for (term, c) in &counts {
                *total_counts.entry(term.clone()).or_insert(0) += c;
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            per_doc.push(counts);
        }

        let vocabulary = self.select_vocabulary(n_docs, total_counts, &doc_freq);
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();
        let idf = vocabulary
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect::<Vec<_>>();

        let rows = per_doc
            .iter()
            .map(|counts| {
                let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
                for (term, c) in counts {
                    if let Some(&i) = index.get(term.as_str()) {
                        weights.insert(i, *c as f64 * idf[i]);
                    }
                }
                let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
                let entries = if norm > 0.0 {
                    weights.into_iter().map(|(i, w)| (i, w / norm)).collect()
                } else {
                    Vec::new()
                };
                SparseVector::from_sorted(entries)
            })
            .collect();

        tracing::debug!(
            n_docs,
            vocabulary = vocabulary.len(),
            "fitted tf-idf space"
        );

        TfidfMatrix {
            vocabulary,
            idf,
            rows,
        }
    }
}

/// Fitted space for one ranking call: candidate rows followed by the query row.
#[derive(Debug, Clone)]
pub struct SimilaritySpace {
    matrix: TfidfMatrix,
    similarities: Vec<f64>,
}

impl SimilaritySpace {
    /// One score per candidate document, in input order.
    pub fn similarities(&self) -> &[f64] {
        &self.similarities
    }

    pub fn vocabulary(&self) -> &[String] {
        self.matrix.vocabulary()
    }

    pub fn query_vector(&self) -> &SparseVector {
        // The query is always the last fitted row.
        &self.matrix.rows()[self.similarities.len()]
    }

    pub fn document_vector(&self, i: usize) -> Option<&SparseVector> {
        if i < self.similarities.len() {
            self.matrix.row(i)
        } else {
            None
        }
    }
}

/// Fit a shared space over `document_texts + [query_text]` (all already normalized)
/// and score every document against the query.
pub fn build_and_score<S: AsRef<str>>(
    query_text: &str,
    document_texts: &[S],
    config: &VectorizerConfig,
) -> SimilaritySpace {
    let mut corpus: Vec<&str> = document_texts.iter().map(|d| d.as_ref()).collect();
    corpus.push(query_text);
    let matrix = TfidfVectorizer::new(config.clone()).fit_transform(&corpus);
    let query = &matrix.rows()[document_texts.len()];
    let similarities = matrix.rows()[..document_texts.len()]
        .iter()
        .map(|row| cosine(query, row))
        .collect();
    SimilaritySpace {
        matrix,
        similarities,
    }
}
