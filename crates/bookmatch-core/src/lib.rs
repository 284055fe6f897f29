use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub mod authors;
pub mod config_file;
pub mod lexical;
pub mod normalize;
pub mod scoring;
pub mod semantic;
pub mod translation;
pub mod variation;

// Re-export for convenience
pub use authors::{
    AuthorPattern, ExtractedAuthor, calculate_author_similarity, extract_author,
    extract_author_from_text, is_likely_transliteration, normalize_author_name,
};
pub use config_file::ConfigError;
pub use normalize::normalize;
pub use scoring::{BookMatcher, CompositeWeights, TitleWeights, analyze_match_reasons};
pub use translation::{TranslationTable, detect_translation_pair};
pub use variation::{RegionalVariation, detect_regional_variation, regional_variation};

/// A bibliographic record. Every field is optional; an absent field and an
/// empty string mean the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub file_type: Option<String>,
}

impl BookRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// The trimmed author field, if non-empty.
    pub fn explicit_author(&self) -> Option<&str> {
        self.author.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }

    /// The explicit author, or one extracted from the title when absent.
    pub fn resolved_author(&self) -> String {
        match self.explicit_author() {
            Some(author) => author.to_string(),
            None => extract_author_from_text(self.title_text()),
        }
    }

    /// Whether the author is given explicitly or set apart in the title by a
    /// marker, suffix or punctuation. Names guessed from trailing title words
    /// do not count.
    pub fn has_marked_author(&self) -> bool {
        self.explicit_author().is_some()
            || extract_author(self.title_text()).is_some_and(|a| a.pattern.is_marked())
    }

    /// Lowercased, trimmed language; empty when absent.
    pub fn language_key(&self) -> String {
        metadata_key(self.language.as_deref())
    }

    /// Lowercased, trimmed file type; empty when absent.
    pub fn file_type_key(&self) -> String {
        metadata_key(self.file_type.as_deref())
    }
}

fn metadata_key(value: Option<&str>) -> String {
    value.unwrap_or("").trim().to_lowercase()
}

impl From<&str> for BookRecord {
    fn from(title: &str) -> Self {
        BookRecord::new(title)
    }
}

/// The five title metrics, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleScores {
    pub levenshtein_ratio: f64,
    pub token_sort_ratio: f64,
    pub token_set_ratio: f64,
    pub jaro_winkler: f64,
    pub semantic_similarity: f64,
}

impl TitleScores {
    pub fn values(&self) -> [f64; 5] {
        [
            self.levenshtein_ratio,
            self.token_sort_ratio,
            self.token_set_ratio,
            self.jaro_winkler,
            self.semantic_similarity,
        ]
    }

    pub fn max(&self) -> f64 {
        self.values().into_iter().fold(0.0, f64::max)
    }
}

/// Every signal compared between two book records. Serializes as one flat
/// object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityVector {
    #[serde(flatten)]
    pub title: TitleScores,
    pub author_similarity: f64,
    pub language_match: f64,
    pub file_type_match: f64,
    pub translation_bonus: f64,
    pub edition_bonus: f64,
    pub regional_penalty: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchCategory {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl MatchCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            MatchCategory::Excellent
        } else if score >= 0.7 {
            MatchCategory::Good
        } else if score >= 0.5 {
            MatchCategory::Moderate
        } else {
            MatchCategory::Poor
        }
    }
}

impl std::fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MatchCategory::Excellent => "Excellent",
            MatchCategory::Good => "Good",
            MatchCategory::Moderate => "Moderate",
            MatchCategory::Poor => "Poor",
        };
        f.write_str(label)
    }
}

/// A ranked candidate book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub book: BookRecord,
    pub score: f64,
    pub category: MatchCategory,
}

/// A ranked candidate title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMatch {
    pub title: String,
    pub score: f64,
    pub category: MatchCategory,
}

/// Why a pair of records scored the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchReason {
    StrongAuthor,
    ModerateAuthor,
    HighTitleSimilarity,
    /// Same words in a different order.
    ReorderedTitle,
    TranslationPair,
    HighSemanticSimilarity,
    EditionVariation,
    BasicSimilarity,
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MatchReason::StrongAuthor => "Strong author match",
            MatchReason::ModerateAuthor => "Moderate author match",
            MatchReason::HighTitleSimilarity => "High title similarity",
            MatchReason::ReorderedTitle => "High title similarity (reordered)",
            MatchReason::TranslationPair => "Translation pair",
            MatchReason::HighSemanticSimilarity => "High semantic similarity",
            MatchReason::EditionVariation => "Edition variation",
            MatchReason::BasicSimilarity => "Basic similarity",
        };
        f.write_str(label)
    }
}

/// Configuration for a [`BookMatcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    pub translations: TranslationTable,
    pub weights: CompositeWeights,
    pub title_weights: TitleWeights,
    /// Default shortlist length for ranking.
    pub top_k: usize,
    /// Default score floor for ranking.
    pub min_score: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            translations: TranslationTable::default(),
            weights: CompositeWeights::default(),
            title_weights: TitleWeights::default(),
            top_k: 5,
            min_score: 0.4,
        }
    }
}

static DEFAULT_MATCHER: Lazy<BookMatcher> = Lazy::new(BookMatcher::default);

/// The five title metrics with the built-in translation table.
pub fn similarities(a: &str, b: &str) -> TitleScores {
    DEFAULT_MATCHER.similarities(a, b)
}

pub fn semantic_similarity(a: &str, b: &str) -> f64 {
    DEFAULT_MATCHER.semantic_similarity(a, b)
}

pub fn check_translation_pairs(a: &str, b: &str) -> f64 {
    DEFAULT_MATCHER.check_translation_pairs(a, b)
}

pub fn title_similarity_score(a: &str, b: &str) -> f64 {
    DEFAULT_MATCHER.title_similarity_score(a, b)
}

pub fn detect_edition_variation(title1: &str, title2: &str) -> f64 {
    DEFAULT_MATCHER.detect_edition_variation(title1, title2)
}

pub fn enhanced_book_similarity(a: &BookRecord, b: &BookRecord) -> SimilarityVector {
    DEFAULT_MATCHER.enhanced_book_similarity(a, b)
}

pub fn comprehensive_book_similarity_score(a: &BookRecord, b: &BookRecord) -> f64 {
    DEFAULT_MATCHER.comprehensive_book_similarity_score(a, b)
}

pub fn find_best_book_matches(
    query: &BookRecord,
    candidates: &[BookRecord],
    top_k: usize,
    min_score: f64,
) -> Vec<MatchResult> {
    DEFAULT_MATCHER.find_best_book_matches(query, candidates, top_k, min_score)
}

pub fn find_best_matches<S: AsRef<str>>(
    query: &str,
    candidates: &[S],
    top_k: usize,
    min_score: f64,
) -> Vec<TitleMatch> {
    DEFAULT_MATCHER.find_best_matches(query, candidates, top_k, min_score)
}

pub fn similarity_matrix<S: AsRef<str> + Sync>(titles: &[S]) -> Vec<Vec<f64>> {
    DEFAULT_MATCHER.similarity_matrix(titles)
}

pub fn suggest_corrections<S: AsRef<str>>(
    query: &str,
    candidates: &[S],
    threshold: f64,
) -> Vec<String> {
    DEFAULT_MATCHER.suggest_corrections(query, candidates, threshold)
}
