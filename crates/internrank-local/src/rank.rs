//! Ranking entrypoint: dedupe -> normalize query -> policy -> stable sort -> top-N.

use crate::dedup::dedupe;
use crate::fusion::select_policy;
use crate::textprep::normalize;
use internrank_core::{InternshipCandidate, RankConfig, RankedResult, StudentProfile};

#[derive(Debug, Clone, Default)]
pub struct Ranker {
    config: RankConfig,
}

impl Ranker {
    pub fn new(config: RankConfig) -> Self {
        Self { config }
    }

    /// Rank `candidates` for `profile`, returning at most `top_n` results.
    ///
    /// Equal scores keep their (deduplicated) input order.
    pub fn rank<'a>(
        &self,
        profile: &StudentProfile,
        candidates: &'a [InternshipCandidate],
        top_n: usize,
    ) -> Vec<RankedResult<'a>> {
        let unique = dedupe(candidates);
        if unique.is_empty() {
            return Vec::new();
        }
        if unique.len() < candidates.len() {
            tracing::debug!(
                dropped = candidates.len() - unique.len(),
                "dropped duplicate (organization, title) candidates"
            );
        }

        let query = normalize(&profile.query_text());
        let policy = select_policy(&query, &self.config);
        tracing::debug!(
            policy = policy.name(),
            candidates = unique.len(),
            query_terms = query.split_whitespace().count(),
            "ranking"
        );

        let mut ranked = unique
            .iter()
            .zip(policy.score(&unique))
            .map(|(c, s)| RankedResult {
                score: s.score,
                candidate: *c,
                explanation: s.explanation,
            })
            .collect::<Vec<_>>();
        // `sort_by` is stable, so ties keep input order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_n);
        ranked
    }
}

/// [`Ranker::rank`] with the default configuration.
pub fn rank<'a>(
    profile: &StudentProfile,
    candidates: &'a [InternshipCandidate],
    top_n: usize,
) -> Vec<RankedResult<'a>> {
    Ranker::default().rank(profile, candidates, top_n)
}
