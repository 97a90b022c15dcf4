use crate::vectorize::SparseVector;
use internrank_core::TermContribution;

/// Terms that contributed most to a query/document similarity.
///
/// Contribution is `query_weight * doc_weight` per vocabulary term. Only
/// positive contributions from terms longer than two characters are kept,
/// highest first (ties by vocabulary index), at most `limit` of them.
pub fn top_terms(
    query: &SparseVector,
    doc: &SparseVector,
    vocabulary: &[String],
    limit: usize,
) -> Vec<TermContribution> {
    let mut contributions = query
        .intersect(doc)
        .map(|(i, q, d)| (i, q * d))
        .filter(|(_, c)| *c > 0.0)
        .collect::<Vec<_>>();
    contributions.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    contributions
        .into_iter()
        .filter_map(|(i, contribution)| {
            let term = vocabulary.get(i)?;
            (term.chars().count() > 2).then(|| TermContribution {
                term: term.clone(),
                contribution,
            })
        })
        .take(limit)
        .collect()
}
