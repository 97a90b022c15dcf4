//! Score fusion: two scoring strategies behind one trait.
//!
//! - [`ColdStartPolicy`]: no usable query text; quality signals only.
//! - [`ContentBasedPolicy`]: text similarity blended with quality signals.
//!
//! [`select_policy`] picks one from the normalized query alone.

use crate::explain::top_terms;
use crate::textprep::normalize;
use crate::vectorize::build_and_score;
use internrank_core::{
    ColdStartWeights, ContentWeights, Explanation, InternshipCandidate, RankConfig,
    VectorizerConfig,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub score: f64,
    pub explanation: Explanation,
}

pub trait ScoringPolicy {
    fn name(&self) -> &'static str;
    /// One entry per candidate, in input order.
    fn score(&self, candidates: &[&InternshipCandidate]) -> Vec<Scored>;
}

/// `stipend / max_stipend` capped at 1; 0 when every stipend in the batch is 0.
pub fn normalized_stipend(stipend: u64, max_stipend: u64) -> f64 {
    if max_stipend == 0 {
        return 0.0;
    }
    (stipend as f64 / max_stipend as f64).min(1.0)
}

#[derive(Debug, Clone, Default)]
pub struct ColdStartPolicy {
    weights: ColdStartWeights,
}

impl ColdStartPolicy {
    pub fn new(weights: ColdStartWeights) -> Self {
        Self { weights }
    }

    pub fn score_one(&self, c: &InternshipCandidate) -> f64 {
        self.weights.popularity * (f64::from(c.popularity) / 100.0)
            + self.weights.rating * (c.rating / 5.0)
            + self.weights.prestige * (f64::from(c.prestige) / 10.0)
    }
}

impl ScoringPolicy for ColdStartPolicy {
    fn name(&self) -> &'static str {
        "cold_start"
    }

    fn score(&self, candidates: &[&InternshipCandidate]) -> Vec<Scored> {
        candidates
            .iter()
            .map(|c| Scored {
                score: self.score_one(c),
                explanation: Explanation::ColdStart,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ContentBasedPolicy {
    query: String,
    vectorizer: VectorizerConfig,
    weights: ContentWeights,
    explain_limit: usize,
}

impl ContentBasedPolicy {
    /// `normalized_query` must already have gone through [`normalize`].
    pub fn new(normalized_query: impl Into<String>, config: &RankConfig) -> Self {
        Self {
            query: normalized_query.into(),
            vectorizer: config.vectorizer.clone(),
            weights: config.weights.content.clone(),
            explain_limit: config.explain_limit,
        }
    }

    fn fuse(&self, similarity: f64, stipend_norm: f64, c: &InternshipCandidate) -> f64 {
        let w = &self.weights;
        w.similarity * similarity
            + w.popularity * (f64::from(c.popularity) / 100.0)
            + w.stipend * stipend_norm
            + w.rating * (c.rating / 5.0)
            + w.prestige * (f64::from(c.prestige) / 10.0)
    }
}

impl ScoringPolicy for ContentBasedPolicy {
    fn name(&self) -> &'static str {
        "content_based"
    }

    fn score(&self, candidates: &[&InternshipCandidate]) -> Vec<Scored> {
        let documents = candidates
            .iter()
            .map(|c| normalize(&c.document_text()))
            .collect::<Vec<_>>();
        let space = build_and_score(&self.query, &documents, &self.vectorizer);
        let max_stipend = candidates.iter().map(|c| c.stipend).max().unwrap_or(0);
        if max_stipend == 0 {
            tracing::debug!("all stipends are zero; stipend term is 0 for the batch");
        }

        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let similarity = space.similarities()[i];
                let stipend_norm = normalized_stipend(c.stipend, max_stipend);
                let terms = space
                    .document_vector(i)
                    .map(|doc| {
                        top_terms(
                            space.query_vector(),
                            doc,
                            space.vocabulary(),
                            self.explain_limit,
                        )
                    })
                    .unwrap_or_default();
                Scored {
                    score: self.fuse(similarity, stipend_norm, c),
                    explanation: Explanation::ContentBased {
                        similarity,
                        top_terms: terms,
                        stipend: c.stipend,
                        normalized_stipend: stipend_norm,
                        popularity: c.popularity,
                        rating: c.rating,
                        prestige: c.prestige,
                    },
                }
            })
            .collect()
    }
}

/// Cold start when the normalized query is empty, content-based otherwise.
pub fn select_policy(normalized_query: &str, config: &RankConfig) -> Box<dyn ScoringPolicy> {
    if normalized_query.trim().is_empty() {
        Box::new(ColdStartPolicy::new(config.weights.cold_start.clone()))
    } else {
        Box::new(ContentBasedPolicy::new(normalized_query.trim(), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candidate, quality};
    use proptest::prelude::*;

    #[test]
    fn cold_start_formula() {
        let c = quality(candidate("Tech Corp", "AI Research Intern"), 90, 4.8, 9);
        let s = ColdStartPolicy::default().score_one(&c);
        let expect = 0.4 * 0.9 + 0.3 * (4.8 / 5.0) + 0.3 * 0.9;
        assert!((s - expect).abs() < 1e-12, "s={s}");
    }

    #[test]
    fn cold_start_explanation_is_fixed_note() {
        let c = candidate("A", "B");
        let out = ColdStartPolicy::default().score(&[&c]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].explanation, Explanation::ColdStart);
        assert!(out[0].explanation.to_string().contains("cold start"));
    }

    #[test]
    fn normalized_stipend_guards_zero_batch_max() {
        assert_eq!(normalized_stipend(0, 0), 0.0);
        assert_eq!(normalized_stipend(3000, 6000), 0.5);
        assert_eq!(normalized_stipend(6000, 6000), 1.0);
    }

    #[test]
    fn content_based_zero_stipends_contribute_nothing() {
        let mut a = quality(candidate("A", "ML Intern"), 80, 4.0, 8);
        let mut b = quality(candidate("B", "Web Intern"), 60, 3.0, 5);
        a.stipend = 0;
        b.stipend = 0;
        let policy = ContentBasedPolicy::new("python", &RankConfig::default());
        for s in policy.score(&[&a, &b]) {
            match &s.explanation {
                Explanation::ContentBased {
                    normalized_stipend, ..
                } => assert_eq!(*normalized_stipend, 0.0),
                other => panic!("unexpected explanation: {other:?}"),
            }
            assert!(s.explanation.to_string().contains("(normalized: 0.00)"));
        }
    }

    #[test]
    fn content_based_fuses_documented_weights() {
        let mut a = quality(candidate("A", "Intern"), 50, 2.5, 5);
        a.stipend = 1000;
        let policy = ContentBasedPolicy::new("zzz", &RankConfig::default());
        let out = policy.score(&[&a]);
        // similarity is 0 (no shared vocabulary in a 2-document corpus).
        let expect = 0.2 * 0.5 + 0.2 * 1.0 + 0.1 * 0.5 + 0.1 * 0.5;
        assert!((out[0].score - expect).abs() < 1e-12, "score={}", out[0].score);
    }

    #[test]
    fn select_policy_branches_on_query_emptiness() {
        let cfg = RankConfig::default();
        assert_eq!(select_policy("", &cfg).name(), "cold_start");
        assert_eq!(select_policy("  ", &cfg).name(), "cold_start");
        assert_eq!(select_policy("python", &cfg).name(), "content_based");
    }

    proptest! {
        #[test]
        fn content_score_is_within_unit_interval(
            pops in prop::collection::vec(0u32..=100, 1..6),
            stipend in prop::collection::vec(0u64..20_000, 1..6),
            rating in 0.0f64..=5.0,
            prestige in 0u32..=10,
        ) {
            let cs = pops
                .iter()
                .zip(stipend.iter().cycle())
                .enumerate()
                .map(|(i, (p, s))| {
                    let base = candidate("Org", &format!("python intern {i}"));
                    let mut c = quality(base, *p, rating, prestige);
                    c.stipend = *s;
                    c
                })
                .collect::<Vec<_>>();
            let refs = cs.iter().collect::<Vec<_>>();
            let query = normalize("python intern");
            let policy = ContentBasedPolicy::new(query, &RankConfig::default());
            for s in policy.score(&refs) {
                prop_assert!((0.0..=1.0 + 1e-12).contains(&s.score), "score={}", s.score);
            }
        }
    }
}
