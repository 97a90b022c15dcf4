use internrank_core::InternshipCandidate;
use std::collections::HashSet;

/// Drop candidates whose (organization, title) was already seen.
///
/// First occurrence wins and input order is preserved.
pub fn dedupe<'a, I>(candidates: I) -> Vec<&'a InternshipCandidate>
where
    I: IntoIterator<Item = &'a InternshipCandidate>,
{
    let mut seen: HashSet<(&'a str, &'a str)> = HashSet::new();
    candidates
        .into_iter()
        .filter(|&c| seen.insert(c.identity_key()))
        .collect()
}
