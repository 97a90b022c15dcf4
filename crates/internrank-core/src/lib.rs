use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid record #{index}: {message}")]
    InvalidRecord { index: usize, message: String },
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("store error: {0}")]
    Store(String),
    #[error("extract failed: {0}")]
    Extract(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub skills: String,
    pub interests: String,
    /// Accepted and carried through, but not used by any scoring policy.
    #[serde(default)]
    pub field: Option<String>,
}

impl StudentProfile {
    pub fn new(skills: impl Into<String>, interests: impl Into<String>) -> Self {
        Self {
            skills: skills.into(),
            interests: interests.into(),
            field: None,
        }
    }

    /// Raw (un-normalized) query text: skills followed by interests.
    pub fn query_text(&self) -> String {
        format!("{} {}", self.skills, self.interests)
    }
}

/// One internship listing as supplied by a candidate store.
///
/// The engine treats this as read-only. Ranges (popularity 0-100, rating 0-5,
/// prestige 0-10) are the store's responsibility; see [`InternshipCandidate::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternshipCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    pub description: String,
    pub required_skills: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_skills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<String>,
    #[serde(alias = "company")]
    pub organization: String,
    pub duration: String,
    pub stipend: u64,
    pub popularity: u32,
    pub rating: f64,
    #[serde(alias = "company_prestige")]
    pub prestige: u32,
}

impl InternshipCandidate {
    /// Duplicate-detection key: (organization, title).
    pub fn identity_key(&self) -> (&str, &str) {
        (self.organization.as_str(), self.title.as_str())
    }

    /// Concatenated text fields used as this candidate's similarity document.
    pub fn document_text(&self) -> String {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.required_skills.as_str(),
            self.preferred_skills.as_deref().unwrap_or(""),
            self.responsibilities.as_deref().unwrap_or(""),
        ]
        .join(" ")
    }

    /// Store-side range check. The ranking engine never calls this.
    pub fn validate(&self) -> Result<()> {
        fn blank(field: &'static str) -> Error {
            Error::InvalidField {
                field,
                reason: "must not be empty".to_string(),
            }
        }
        if self.title.trim().is_empty() {
            return Err(blank("title"));
        }
        if self.organization.trim().is_empty() {
            return Err(blank("organization"));
        }
        if self.popularity > 100 {
            return Err(Error::InvalidField {
                field: "popularity",
                reason: format!("expected 0..=100, got {}", self.popularity),
            });
        }
        if !self.rating.is_finite() || !(0.0..=5.0).contains(&self.rating) {
            return Err(Error::InvalidField {
                field: "rating",
                reason: format!("expected 0..=5, got {}", self.rating),
            });
        }
        if self.prestige > 10 {
            return Err(Error::InvalidField {
                field: "prestige",
                reason: format!("expected 0..=10, got {}", self.prestige),
            });
        }
        Ok(())
    }
}

enum NumKind {
    Unsigned,
    Float,
}

// (canonical key, accepted aliases, kind)
const NUMERIC_FIELDS: &[(&str, &[&str], NumKind)] = &[
    ("id", &[], NumKind::Unsigned),
    ("stipend", &[], NumKind::Unsigned),
    ("popularity", &[], NumKind::Unsigned),
    ("rating", &[], NumKind::Float),
    ("prestige", &["company_prestige"], NumKind::Unsigned),
];

/// Decode one candidate from a JSON value, naming the offending field on failure.
///
/// serde alone reports a missing field by name, but a wrongly-typed number only
/// by its expected type; the numeric fields are checked up front so both cases
/// identify the field.
pub fn candidate_from_value(index: usize, value: serde_json::Value) -> Result<InternshipCandidate> {
    let Some(obj) = value.as_object() else {
        return Err(Error::InvalidRecord {
            index,
            message: "expected a JSON object".to_string(),
        });
    };
    for (key, aliases, kind) in NUMERIC_FIELDS {
        let found = std::iter::once(*key)
            .chain(aliases.iter().copied())
            .find_map(|k| obj.get(k).map(|v| (k, v)));
        let Some((k, v)) = found else {
            continue;
        };
        if v.is_null() && *key == "id" {
            continue;
        }
        let ok = match kind {
            NumKind::Unsigned => v.as_u64().is_some(),
            NumKind::Float => v.as_f64().is_some(),
        };
        if !ok {
            let expected = match kind {
                NumKind::Unsigned => "a non-negative integer",
                NumKind::Float => "a number",
            };
            return Err(Error::InvalidRecord {
                index,
                message: format!("field `{k}` must be {expected}, got {v}"),
            });
        }
    }
    serde_json::from_value(value).map_err(|e| Error::InvalidRecord {
        index,
        message: e.to_string(),
    })
}

/// Decode a JSON array of candidates (the catalog file format).
pub fn parse_candidates(json: &str) -> Result<Vec<InternshipCandidate>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| Error::Store(format!("catalog must be a JSON array: {e}")))?;
    raw.into_iter()
        .enumerate()
        .map(|(i, v)| candidate_from_value(i, v))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermContribution {
    pub term: String,
    pub contribution: f64,
}

/// Why a candidate received its score.
///
/// `Display` renders the human-readable explanation text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum Explanation {
    ColdStart,
    ContentBased {
        similarity: f64,
        top_terms: Vec<TermContribution>,
        stipend: u64,
        normalized_stipend: f64,
        popularity: u32,
        rating: f64,
        prestige: u32,
    },
}

pub const COLD_START_NOTE: &str =
    "Recommended based on overall popularity and ratings (cold start).";

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Explanation::ColdStart => f.write_str(COLD_START_NOTE),
            Explanation::ContentBased {
                similarity,
                top_terms,
                stipend,
                normalized_stipend,
                popularity,
                rating,
                prestige,
            } => {
                writeln!(f, "Similarity score: {similarity:.3}")?;
                if top_terms.is_empty() {
                    writeln!(f, "No strong term matches found")?;
                } else {
                    let terms = top_terms
                        .iter()
                        .map(|t| t.term.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(f, "Top matched terms: {terms}")?;
                }
                writeln!(f, "Stipend: ${stipend} (normalized: {normalized_stipend:.2})")?;
                writeln!(f, "Popularity: {popularity}/100")?;
                writeln!(f, "Rating: {rating:?}/5")?;
                write!(f, "Company Prestige: {prestige}/10")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedResult<'a> {
    pub score: f64,
    pub candidate: &'a InternshipCandidate,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub avg_rating: f64,
    pub avg_stipend: f64,
    /// Most recently added listings (highest id first).
    pub recent: Vec<InternshipCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Vocabulary cap (most frequent terms win).
    pub max_features: usize,
    /// Terms in fewer documents than this are dropped.
    pub min_df: usize,
    /// Terms in more than this fraction of documents are dropped.
    pub max_df: f64,
    /// Inclusive (min_n, max_n) word n-gram range.
    pub ngram_range: (usize, usize),
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            min_df: 2,
            max_df: 0.8,
            ngram_range: (1, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColdStartWeights {
    pub popularity: f64,
    pub rating: f64,
    pub prestige: f64,
}

impl Default for ColdStartWeights {
    fn default() -> Self {
        Self {
            popularity: 0.4,
            rating: 0.3,
            prestige: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentWeights {
    pub similarity: f64,
    pub popularity: f64,
    pub stipend: f64,
    pub rating: f64,
    pub prestige: f64,
}

impl Default for ContentWeights {
    fn default() -> Self {
        Self {
            similarity: 0.4,
            popularity: 0.2,
            stipend: 0.2,
            rating: 0.1,
            prestige: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub cold_start: ColdStartWeights,
    pub content: ContentWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    pub top_n: usize,
    /// Max explanatory terms per result.
    pub explain_limit: usize,
    pub vectorizer: VectorizerConfig,
    pub weights: FusionWeights,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            explain_limit: 5,
            vectorizer: VectorizerConfig::default(),
            weights: FusionWeights::default(),
        }
    }
}

impl RankConfig {
    /// Reject settings the vectorizer or fusion cannot honor.
    pub fn validate(&self) -> Result<()> {
        let v = &self.vectorizer;
        if v.max_features == 0 {
            return Err(Error::Config("vectorizer.max_features must be >= 1".to_string()));
        }
        if !(v.max_df > 0.0 && v.max_df <= 1.0) {
            return Err(Error::Config(format!(
                "vectorizer.max_df must be in (0, 1], got {}",
                v.max_df
            )));
        }
        let (lo, hi) = v.ngram_range;
        if lo == 0 || lo > hi {
            return Err(Error::Config(format!(
                "vectorizer.ngram_range must satisfy 1 <= min <= max, got ({lo}, {hi})"
            )));
        }
        let c = &self.weights.cold_start;
        let w = &self.weights.content;
        let all = [
            c.popularity,
            c.rating,
            c.prestige,
            w.similarity,
            w.popularity,
            w.stipend,
            w.rating,
            w.prestige,
        ];
        if all.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(Error::Config(
                "fusion weights must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Source of internship listings (database, file, remote service, ...).
#[async_trait::async_trait]
pub trait CandidateStore: Send + Sync {
    fn name(&self) -> &'static str;
    async fn list(&self) -> Result<Vec<InternshipCandidate>>;
    /// Persist a new listing and return its assigned id.
    async fn insert(&self, candidate: InternshipCandidate) -> Result<u64>;
}

/// Turns an uploaded document (e.g. a resume) into plain text.
#[async_trait::async_trait]
pub trait DocumentExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    async fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "title": "AI Research Intern",
            "company": "Tech Corp",
            "description": "machine learning research",
            "required_skills": "python",
            "duration": "3 months",
            "stipend": 5000,
            "popularity": 90,
            "rating": 4.8,
            "company_prestige": 9
        })
    }

    #[test]
    fn candidate_accepts_company_key_aliases() {
        let c = candidate_from_value(0, sample_json()).unwrap();
        assert_eq!(c.organization, "Tech Corp");
        assert_eq!(c.prestige, 9);
        assert_eq!(c.preferred_skills, None);
        assert_eq!(c.identity_key(), ("Tech Corp", "AI Research Intern"));
    }

    #[test]
    fn non_numeric_stipend_names_the_field() {
        let mut v = sample_json();
        v["stipend"] = serde_json::json!("lots");
        let err = candidate_from_value(3, v).unwrap_err().to_string();
        assert!(err.contains("#3"), "err={err}");
        assert!(err.contains("`stipend`"), "err={err}");
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let mut v = sample_json();
        v.as_object_mut().unwrap().remove("required_skills");
        let err = candidate_from_value(0, v).unwrap_err().to_string();
        assert!(err.contains("required_skills"), "err={err}");
    }

    #[test]
    fn negative_prestige_is_rejected_via_alias() {
        let mut v = sample_json();
        v["company_prestige"] = serde_json::json!(-1);
        let err = candidate_from_value(0, v).unwrap_err().to_string();
        assert!(err.contains("company_prestige"), "err={err}");
    }

    #[test]
    fn parse_candidates_rejects_non_array() {
        assert!(matches!(parse_candidates("{}"), Err(Error::Store(_))));
        assert!(parse_candidates("[]").unwrap().is_empty());
    }

    #[test]
    fn document_text_defaults_optional_fields_to_empty() {
        let c = candidate_from_value(0, sample_json()).unwrap();
        assert_eq!(
            c.document_text(),
            "AI Research Intern machine learning research python  "
        );
    }

    #[test]
    fn validate_checks_documented_ranges() {
        let mut c = candidate_from_value(0, sample_json()).unwrap();
        assert!(c.validate().is_ok());
        c.rating = 5.5;
        assert!(matches!(
            c.validate(),
            Err(Error::InvalidField { field: "rating", .. })
        ));
        c.rating = 4.0;
        c.popularity = 101;
        assert!(matches!(
            c.validate(),
            Err(Error::InvalidField { field: "popularity", .. })
        ));
    }

    #[test]
    fn content_explanation_renders_fixed_line_order() {
        let e = Explanation::ContentBased {
            similarity: 0.51234,
            top_terms: vec![
                TermContribution {
                    term: "python".to_string(),
                    contribution: 0.2,
                },
                TermContribution {
                    term: "learn".to_string(),
                    contribution: 0.1,
                },
            ],
            stipend: 5000,
            normalized_stipend: 0.8333,
            popularity: 90,
            rating: 4.8,
            prestige: 9,
        };
        let lines = e.to_string().lines().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "Similarity score: 0.512",
                "Top matched terms: python, learn",
                "Stipend: $5000 (normalized: 0.83)",
                "Popularity: 90/100",
                "Rating: 4.8/5",
                "Company Prestige: 9/10",
            ]
        );
    }

    #[test]
    fn content_explanation_without_terms_says_so() {
        let e = Explanation::ContentBased {
            similarity: 0.0,
            top_terms: Vec::new(),
            stipend: 0,
            normalized_stipend: 0.0,
            popularity: 75,
            rating: 4.0,
            prestige: 7,
        };
        let s = e.to_string();
        assert!(s.contains("\nNo strong term matches found\n"), "s={s}");
        assert!(s.contains("Rating: 4.0/5"), "s={s}");
    }

    #[test]
    fn rank_config_defaults_and_partial_json() {
        let c: RankConfig = serde_json::from_str(r#"{"top_n": 3}"#).unwrap();
        assert_eq!(c.top_n, 3);
        assert_eq!(c.vectorizer, VectorizerConfig::default());
        assert!((c.weights.content.similarity - 0.4).abs() < 1e-12);
        assert!((c.weights.cold_start.popularity - 0.4).abs() < 1e-12);
    }

    #[test]
    fn rank_config_validate_rejects_bad_settings() {
        assert!(RankConfig::default().validate().is_ok());

        let mut c = RankConfig::default();
        c.vectorizer.max_df = 0.0;
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let mut c = RankConfig::default();
        c.vectorizer.ngram_range = (2, 1);
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let mut c = RankConfig::default();
        c.weights.content.stipend = -0.1;
        assert!(matches!(c.validate(), Err(Error::Config(_))));
    }
}
