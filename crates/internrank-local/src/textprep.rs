//! Deterministic text normalization for query and listing text.
//!
//! lowercase -> UAX #29 word split -> drop stopwords / non-alphanumeric tokens
//! -> noun lemma -> single-space join.
//!
//! Lemmas follow WordNet's noun rules without its dictionary: plural suffixes are
//! detached ("networks" -> "network", "studies" -> "study", "classes" -> "class"),
//! irregular and look-alike words come from a small exception table, and
//! everything else ("learning", "machine") passes through unchanged.
//!
//! The stopword set and exception table are built once per process (see [`normalizer`]).

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// English stopwords (NLTK list, including the contraction fragments it carries).
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

// Irregular plurals, plus words whose trailing "s"/"men" is not an inflection.
const LEMMA_EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("analyses", "analysis"),
    ("hypotheses", "hypothesis"),
    ("theses", "thesis"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("quizzes", "quiz"),
    ("caches", "cache"),
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("series", "series"),
    ("species", "species"),
    ("news", "news"),
    ("physics", "physics"),
    ("mathematics", "mathematics"),
    ("economics", "economics"),
    ("electronics", "electronics"),
    ("robotics", "robotics"),
    ("analytics", "analytics"),
    ("graphics", "graphics"),
    ("linguistics", "linguistics"),
    ("statistics", "statistics"),
    ("pandas", "pandas"),
    ("kubernetes", "kubernetes"),
    ("devops", "devops"),
    ("specimen", "specimen"),
    ("abdomen", "abdomen"),
    ("regimen", "regimen"),
    ("acumen", "acumen"),
];

// First matching suffix wins.
const NOUN_SUFFIX_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("ies", "y"),
    ("men", "man"),
    ("s", ""),
];

// Singular words that happen to end in "s".
const SINGULAR_ENDINGS: &[&str] = &["ss", "us", "is"];

pub struct Normalizer {
    stop_words: HashSet<&'static str>,
    exceptions: HashMap<&'static str, &'static str>,
}

impl Normalizer {
    pub fn english() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            exceptions: LEMMA_EXCEPTIONS.iter().copied().collect(),
        }
    }

    /// Dictionary (noun) form of a lowercase token.
    pub fn lemmatize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if let Some(lemma) = self.exceptions.get(token) {
            return Cow::Borrowed(*lemma);
        }
        if token.len() <= 3
            || !token.bytes().all(|b| b.is_ascii_lowercase())
            || SINGULAR_ENDINGS.iter().any(|e| token.ends_with(e))
        {
            return Cow::Borrowed(token);
        }
        for (suffix, replacement) in NOUN_SUFFIX_RULES {
            if let Some(base) = token.strip_suffix(suffix) {
                if base.len() < 2 {
                    break;
                }
                return Cow::Owned(format!("{base}{replacement}"));
            }
        }
        Cow::Borrowed(token)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    fn keep(&self, token: &str) -> bool {
        let mut chars = token.chars();
        let single_punct = matches!(
            (chars.next(), chars.next()),
            (Some(c), None) if c.is_ascii_punctuation()
        );
        !token.is_empty()
            && token.chars().all(char::is_alphanumeric)
            && !self.is_stop_word(token)
            && !single_punct
    }

    /// Normalize free text into space-separated lemmas.
    ///
    /// Empty or all-stopword input yields `""`.
    pub fn normalize(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let mut out = String::with_capacity(lower.len());
        for tok in lower.unicode_words().filter(|t| self.keep(t)) {
            let lemma = self.lemmatize(tok);
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&lemma);
        }
        out
    }
}

static NORMALIZER: OnceLock<Normalizer> = OnceLock::new();

/// Process-wide normalizer, built on first use.
pub fn normalizer() -> &'static Normalizer {
    NORMALIZER.get_or_init(|| {
        tracing::debug!(
            stop_words = STOP_WORDS.len(),
            lemma_exceptions = LEMMA_EXCEPTIONS.len(),
            "initializing text normalizer"
        );
        Normalizer::english()
    })
}

pub fn normalize(text: &str) -> String {
    normalizer().normalize(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_lowercases_drops_stopwords_and_punctuation() {
        assert_eq!(
            normalize("I have experience with Python, and the Rust language!"),
            "experience python rust language"
        );
    }

    #[test]
    fn normalize_yields_dictionary_lemmas() {
        assert_eq!(normalize("networks studies"), "network study");
        assert_eq!(
            normalize("Machine Learning experience"),
            "machine learning experience"
        );
        assert_eq!(normalize("Classes boxes matches dishes"), "class box match dish");
        assert_eq!(normalize("courses databases sizes"), "course database size");
    }

    #[test]
    fn lemmatize_leaves_singulars_and_exceptions_alone() {
        let n = normalizer();
        for word in ["status", "analysis", "business", "css", "aws", "js", "learning"] {
            assert_eq!(n.lemmatize(word), word);
        }
        assert_eq!(n.lemmatize("children"), "child");
        assert_eq!(n.lemmatize("women"), "woman");
        assert_eq!(n.lemmatize("analyses"), "analysis");
        assert_eq!(n.lemmatize("statistics"), "statistics");
        assert_eq!(n.lemmatize("companies"), "company");
        assert_eq!(n.lemmatize("ties"), "ties");
    }

    #[test]
    fn normalize_empty_and_all_stopwords_yield_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
        assert_eq!(normalize("the and of it is"), "");
        assert_eq!(normalize("- , . !"), "");
    }

    #[test]
    fn normalize_drops_tokens_with_inner_punctuation() {
        // "node.js" stays one word under UAX #29 and is not alphanumeric.
        assert_eq!(normalize("node.js react"), "react");
    }

    #[test]
    fn normalizer_is_shared() {
        assert!(std::ptr::eq(normalizer(), normalizer()));
        assert!(normalizer().is_stop_word("the"));
        assert!(!normalizer().is_stop_word("python"));
    }

    proptest! {
        #[test]
        fn normalize_output_is_space_joined_alphanumeric_tokens(s in any::<String>()) {
            let out = normalize(&s);
            prop_assert!(!out.starts_with(' '));
            prop_assert!(!out.ends_with(' '));
            prop_assert!(!out.contains("  "));
            for tok in out.split(' ').filter(|t| !t.is_empty()) {
                prop_assert!(tok.chars().all(char::is_alphanumeric), "tok={tok:?}");
            }
        }

        #[test]
        fn normalize_is_deterministic(s in ".{0,200}") {
            prop_assert_eq!(normalize(&s), normalize(&s));
        }
    }
}
