use rayon::prelude::*;

use crate::authors::calculate_author_similarity;
use crate::lexical::{jaro_winkler, levenshtein_ratio, token_set_ratio, token_sort_ratio};
use crate::normalize::normalize;
use crate::semantic;
use crate::translation::{TranslationTable, detect_translation_pair};
use crate::variation::{RegionalVariation, detect_edition_variation_by, regional_variation};
use crate::{
    BookRecord, MatchCategory, MatchReason, MatchResult, MatcherConfig, SimilarityVector,
    TitleMatch, TitleScores,
};

// Title-only score adjustments
const PERFECT_METRIC: f64 = 0.99;
const MOSTLY_PERFECT_BOOST: f64 = 1.15;
const SEVERAL_PERFECT_BOOST: f64 = 1.08;
const TOP_METRIC_BOOST: f64 = 1.03;
const STRONG_METRIC_BOOST: f64 = 1.015;
/// Fraction of the regional penalty kept when a spelling swap fully explains
/// the difference.
const EXACT_REGIONAL_RESIDUAL: f64 = 0.1;
const SHORT_TITLE_CHARS: usize = 3;
const SHORT_TITLE_DAMPING: f64 = 0.85;

// Composite score adjustments, applied in this order
const REGIONAL_SCALE_STRONG_AUTHOR: f64 = 0.1;
const REGIONAL_SCALE_GOOD_AUTHOR: f64 = 0.2;
const REGIONAL_SCALE_FAIR_AUTHOR: f64 = 0.5;
const VERY_STRONG_AUTHOR_BOOST: f64 = 1.25;
const VERY_STRONG_AUTHOR_TITLE_BOOST: f64 = 1.1;
const STRONG_AUTHOR_BOOST: f64 = 1.15;
const STRONG_AUTHOR_TITLE_BOOST: f64 = 1.08;
const MODERATE_AUTHOR_BOOST: f64 = 1.05;
/// Author similarity below this means two named authors disagree.
const CONFLICTING_AUTHOR_SIMILARITY: f64 = 0.3;
const CONFLICTING_AUTHOR_PENALTY: f64 = 0.6;
const CONFIRMED_TRANSLATION_BOOST: f64 = 1.12;
const TRANSLATION_BOOST: f64 = 1.06;
const TOP_BASE_BOOST_CONFIRMED: f64 = 1.06;
const TOP_BASE_BOOST: f64 = 1.03;
const STRONG_BASE_BOOST_CONFIRMED: f64 = 1.04;
const STRONG_BASE_BOOST: f64 = 1.02;
const EDITION_CONFIRMED_BOOST: f64 = 1.05;
const WEAK_MATCH_DAMPING: f64 = 0.9;

/// Ranking drops candidates whose author similarity falls below this unless
/// the composite score is already high.
const AUTHOR_CONFLICT_FLOOR: f64 = 0.2;
const AUTHOR_CONFLICT_OVERRIDE: f64 = 0.8;

/// Suggestions stop short of this score; anything higher is already a match.
const SUGGESTION_CEILING: f64 = 0.9;
const MAX_SUGGESTIONS: usize = 10;

/// Weights of the five title metrics in the title-only score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleWeights {
    pub levenshtein: f64,
    pub token_sort: f64,
    pub token_set: f64,
    pub jaro_winkler: f64,
    pub semantic: f64,
}

impl Default for TitleWeights {
    fn default() -> Self {
        Self {
            levenshtein: 0.16,
            token_sort: 0.24,
            token_set: 0.24,
            jaro_winkler: 0.18,
            semantic: 0.18,
        }
    }
}

impl TitleWeights {
    pub fn weighted(&self, scores: &TitleScores) -> f64 {
        scores.levenshtein_ratio * self.levenshtein
            + scores.token_sort_ratio * self.token_sort
            + scores.token_set_ratio * self.token_set
            + scores.jaro_winkler * self.jaro_winkler
            + scores.semantic_similarity * self.semantic
    }

    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("levenshtein", self.levenshtein),
            ("token_sort", self.token_sort),
            ("token_set", self.token_set),
            ("jaro_winkler", self.jaro_winkler),
            ("semantic", self.semantic),
        ]
    }
}

/// Weights of the composite book score. Title metrics carry 0.40 and
/// metadata 0.60 by default, most of it on the author.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeWeights {
    pub levenshtein: f64,
    pub token_sort: f64,
    pub token_set: f64,
    pub jaro_winkler: f64,
    pub semantic: f64,
    pub author: f64,
    pub language: f64,
    pub file_type: f64,
    pub translation: f64,
    pub edition: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            levenshtein: 0.06,
            token_sort: 0.10,
            token_set: 0.10,
            jaro_winkler: 0.06,
            semantic: 0.08,
            author: 0.55,
            language: 0.015,
            file_type: 0.005,
            translation: 0.015,
            edition: 0.015,
        }
    }
}

impl CompositeWeights {
    pub fn weighted(&self, v: &SimilarityVector) -> f64 {
        let t = &v.title;
        t.levenshtein_ratio * self.levenshtein
            + t.token_sort_ratio * self.token_sort
            + t.token_set_ratio * self.token_set
            + t.jaro_winkler * self.jaro_winkler
            + t.semantic_similarity * self.semantic
            + v.author_similarity * self.author
            + v.language_match * self.language
            + v.file_type_match * self.file_type
            + v.translation_bonus * self.translation
            + v.edition_bonus * self.edition
    }

    pub fn named(&self) -> [(&'static str, f64); 10] {
        [
            ("levenshtein", self.levenshtein),
            ("token_sort", self.token_sort),
            ("token_set", self.token_set),
            ("jaro_winkler", self.jaro_winkler),
            ("semantic", self.semantic),
            ("author", self.author),
            ("language", self.language),
            ("file_type", self.file_type),
            ("translation", self.translation),
            ("edition", self.edition),
        ]
    }
}

/// Scores book records and titles against each other.
///
/// Holds only immutable configuration, so one matcher can be shared across
/// threads by reference.
#[derive(Debug, Clone, Default)]
pub struct BookMatcher {
    config: MatcherConfig,
}

impl BookMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn translations(&self) -> &TranslationTable {
        &self.config.translations
    }

    /// The five title metrics over the normalized forms of `a` and `b`.
    pub fn similarities(&self, a: &str, b: &str) -> TitleScores {
        let a_norm = normalize(a);
        let b_norm = normalize(b);
        TitleScores {
            levenshtein_ratio: levenshtein_ratio(&a_norm, &b_norm),
            token_sort_ratio: token_sort_ratio(&a_norm, &b_norm),
            token_set_ratio: token_set_ratio(&a_norm, &b_norm),
            jaro_winkler: jaro_winkler(&a_norm, &b_norm),
            semantic_similarity: self.semantic_similarity(a, b),
        }
    }

    pub fn semantic_similarity(&self, a: &str, b: &str) -> f64 {
        semantic::semantic_similarity(a, b, &self.config.translations)
    }

    pub fn check_translation_pairs(&self, a: &str, b: &str) -> f64 {
        self.config.translations.check_pair(a, b)
    }

    /// Title-only similarity used for edition detection and title ranking.
    pub fn title_similarity_score(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        let a_norm = normalize(a);
        let b_norm = normalize(b);
        if a_norm.is_empty() || b_norm.is_empty() {
            return 0.0;
        }
        if a_norm == b_norm {
            return 1.0;
        }

        let regional = regional_variation(a, b);
        if regional == RegionalVariation::Exact {
            // Identical once the spelling is harmonized
            return 1.0 - regional.penalty() * EXACT_REGIONAL_RESIDUAL;
        }

        let scores = self.similarities(a, b);
        let mut score = self.config.title_weights.weighted(&scores);
        if regional == RegionalVariation::Minor {
            score = (score - regional.penalty()).max(0.0);
        }

        let perfect = scores
            .values()
            .iter()
            .filter(|&&s| s >= PERFECT_METRIC)
            .count();
        if perfect >= 4 {
            score = f64::min(1.0, score * MOSTLY_PERFECT_BOOST);
        } else if perfect >= 3 {
            score = f64::min(1.0, score * SEVERAL_PERFECT_BOOST);
        }

        let best = scores.max();
        if best > 0.95 {
            score = f64::min(1.0, score * TOP_METRIC_BOOST);
        } else if best > 0.9 {
            score = f64::min(1.0, score * STRONG_METRIC_BOOST);
        }

        let short = a_norm.chars().count() <= SHORT_TITLE_CHARS
            || b_norm.chars().count() <= SHORT_TITLE_CHARS;
        if short && score > 0.8 {
            score *= SHORT_TITLE_DAMPING;
        }

        score.clamp(0.0, 1.0)
    }

    /// 0.3 if the titles differ only by edition qualifiers.
    pub fn detect_edition_variation(&self, title1: &str, title2: &str) -> f64 {
        detect_edition_variation_by(title1, title2, |a, b| self.title_similarity_score(a, b))
    }

    /// Every signal the composite score is built from. Authors missing from
    /// a record are extracted from its title.
    pub fn enhanced_book_similarity(&self, a: &BookRecord, b: &BookRecord) -> SimilarityVector {
        let title_a = a.title_text();
        let title_b = b.title_text();
        let author_a = a.resolved_author();
        let author_b = b.resolved_author();
        let lang_a = a.language_key();
        let lang_b = b.language_key();
        let file_a = a.file_type_key();
        let file_b = b.file_type_key();

        let author_similarity = if author_a.is_empty() || author_b.is_empty() {
            0.0
        } else {
            calculate_author_similarity(&author_a, &author_b)
        };

        let exact_match = |x: &str, y: &str| {
            if !x.is_empty() && !y.is_empty() && x == y {
                1.0
            } else {
                0.0
            }
        };

        SimilarityVector {
            title: self.similarities(title_a, title_b),
            author_similarity,
            language_match: exact_match(&lang_a, &lang_b),
            file_type_match: exact_match(&file_a, &file_b),
            translation_bonus: detect_translation_pair(title_a, title_b, &lang_a, &lang_b),
            edition_bonus: self.detect_edition_variation(title_a, title_b),
            regional_penalty: regional_variation(title_a, title_b).penalty(),
        }
    }

    /// Composite book similarity in `[0, 1]`.
    pub fn comprehensive_book_similarity_score(&self, a: &BookRecord, b: &BookRecord) -> f64 {
        let title_a = a.title_text();
        let title_b = b.title_text();

        let norm_a = normalize(title_a);
        let same_title = title_a == title_b || (!norm_a.is_empty() && norm_a == normalize(title_b));
        if same_title && !explicit_authors_conflict(a, b) {
            return 1.0;
        }

        let author_a = a.resolved_author();
        let author_b = b.resolved_author();
        if author_a.is_empty() && author_b.is_empty() {
            // Nothing for the author-weighted composite to work with
            return self.title_similarity_score(title_a, title_b);
        }

        let vector = self.enhanced_book_similarity(a, b);
        let both_authored = a.has_marked_author()
            && b.has_marked_author()
            && author_a.chars().count() > 2
            && author_b.chars().count() > 2;
        self.composite_score(&vector, both_authored)
    }

    /// Weighted sum of the vector followed by the boost/penalty pipeline.
    fn composite_score(&self, v: &SimilarityVector, both_authored: bool) -> f64 {
        let author = v.author_similarity;
        let mut score = self.config.weights.weighted(v);

        if v.regional_penalty > 0.0 {
            let scale = if author > 0.9 {
                REGIONAL_SCALE_STRONG_AUTHOR
            } else if author > 0.8 {
                REGIONAL_SCALE_GOOD_AUTHOR
            } else if author > 0.6 {
                REGIONAL_SCALE_FAIR_AUTHOR
            } else {
                1.0
            };
            score = (score - v.regional_penalty * scale).max(0.0);
        }

        let best_title = v
            .title
            .token_set_ratio
            .max(v.title.token_sort_ratio)
            .max(v.title.semantic_similarity);
        if author > 0.9 {
            score = f64::min(1.0, score * VERY_STRONG_AUTHOR_BOOST);
            if best_title > 0.5 {
                score = f64::min(1.0, score * VERY_STRONG_AUTHOR_TITLE_BOOST);
            }
        } else if author > 0.8 {
            score = f64::min(1.0, score * STRONG_AUTHOR_BOOST);
            if best_title > 0.6 {
                score = f64::min(1.0, score * STRONG_AUTHOR_TITLE_BOOST);
            }
        } else if author > 0.6 {
            score = f64::min(1.0, score * MODERATE_AUTHOR_BOOST);
        }

        if author < CONFLICTING_AUTHOR_SIMILARITY && both_authored {
            score *= CONFLICTING_AUTHOR_PENALTY;
        }

        if v.translation_bonus > 0.3 {
            let boost = if author > 0.7 {
                CONFIRMED_TRANSLATION_BOOST
            } else {
                TRANSLATION_BOOST
            };
            score = f64::min(1.0, score * boost);
        }

        let best_base = v.title.max();
        if best_base > 0.95 {
            let boost = if author > 0.8 {
                TOP_BASE_BOOST_CONFIRMED
            } else {
                TOP_BASE_BOOST
            };
            score = f64::min(1.0, score * boost);
        } else if best_base > 0.9 {
            let boost = if author > 0.8 {
                STRONG_BASE_BOOST_CONFIRMED
            } else {
                STRONG_BASE_BOOST
            };
            score = f64::min(1.0, score * boost);
        }

        // Same author, very different title: likely a retitled translation
        if author > 0.9 && best_base < 0.4 {
            score = f64::min(1.0, score + f64::min(0.2, author * 0.25));
        } else if author > 0.85 && best_base < 0.3 {
            score = f64::min(1.0, score + f64::min(0.15, author * 0.2));
        }

        if v.edition_bonus > 0.2 && author > 0.8 {
            score = f64::min(1.0, score * EDITION_CONFIRMED_BOOST);
        }

        if author < 0.5 && best_base < 0.7 {
            score *= WEAK_MATCH_DAMPING;
        }

        score.clamp(0.0, 1.0)
    }

    /// Rank `candidates` against `query`, best first.
    ///
    /// Candidates below `min_score` are dropped, as are candidates whose
    /// author clearly conflicts with the query's unless they already score
    /// at least 0.8.
    pub fn find_best_book_matches(
        &self,
        query: &BookRecord,
        candidates: &[BookRecord],
        top_k: usize,
        min_score: f64,
    ) -> Vec<MatchResult> {
        let query_author = query
            .has_marked_author()
            .then(|| query.resolved_author())
            .unwrap_or_default();

        let mut matches: Vec<MatchResult> = candidates
            .iter()
            .filter_map(|candidate| {
                let score = self.comprehensive_book_similarity_score(query, candidate);
                if score < min_score {
                    tracing::trace!(title = candidate.title_text(), score, "below min score");
                    return None;
                }

                if !query_author.is_empty() && candidate.has_marked_author() {
                    let candidate_author = candidate.resolved_author();
                    let author_sim = calculate_author_similarity(&query_author, &candidate_author);
                    if author_sim < AUTHOR_CONFLICT_FLOOR && score < AUTHOR_CONFLICT_OVERRIDE {
                        tracing::trace!(
                            title = candidate.title_text(),
                            author = %candidate_author,
                            author_sim,
                            "author conflict"
                        );
                        return None;
                    }
                }

                Some(MatchResult {
                    book: candidate.clone(),
                    score,
                    category: MatchCategory::from_score(score),
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);

        tracing::debug!(
            query = query.title_text(),
            candidates = candidates.len(),
            kept = matches.len(),
            "ranked book matches"
        );
        matches
    }

    /// Rank plain titles against `query` with the title-only score.
    pub fn find_best_matches<S: AsRef<str>>(
        &self,
        query: &str,
        candidates: &[S],
        top_k: usize,
        min_score: f64,
    ) -> Vec<TitleMatch> {
        let mut matches: Vec<TitleMatch> = candidates
            .iter()
            .filter_map(|candidate| {
                let title = candidate.as_ref();
                let score = self.title_similarity_score(query, title);
                (score >= min_score).then(|| TitleMatch {
                    title: title.to_string(),
                    score,
                    category: MatchCategory::from_score(score),
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        matches
    }

    /// Pairwise title-only scores. The result is symmetric with a unit
    /// diagonal; rows are computed in parallel.
    pub fn similarity_matrix<S: AsRef<str> + Sync>(&self, titles: &[S]) -> Vec<Vec<f64>> {
        let n = titles.len();
        let upper: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| self.title_similarity_score(titles[i].as_ref(), titles[j].as_ref()))
                    .collect()
            })
            .collect();

        let mut matrix = vec![vec![0.0; n]; n];
        for (i, row) in upper.into_iter().enumerate() {
            matrix[i][i] = 1.0;
            for (offset, score) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                matrix[i][j] = score;
                matrix[j][i] = score;
            }
        }
        matrix
    }

    /// Near-miss titles: at least `threshold` but short of a clear match.
    pub fn suggest_corrections<S: AsRef<str>>(
        &self,
        query: &str,
        candidates: &[S],
        threshold: f64,
    ) -> Vec<String> {
        self.find_best_matches(query, candidates, MAX_SUGGESTIONS, threshold)
            .into_iter()
            .filter(|m| m.score < SUGGESTION_CEILING)
            .map(|m| m.title)
            .collect()
    }
}

/// Both records name an author explicitly and the names disagree.
fn explicit_authors_conflict(a: &BookRecord, b: &BookRecord) -> bool {
    match (a.explicit_author(), b.explicit_author()) {
        (Some(x), Some(y)) => calculate_author_similarity(x, y) < CONFLICTING_AUTHOR_SIMILARITY,
        _ => false,
    }
}

/// Human-readable explanations for a similarity vector.
pub fn analyze_match_reasons(v: &SimilarityVector) -> Vec<MatchReason> {
    let mut reasons = Vec::new();

    if v.author_similarity > 0.8 {
        reasons.push(MatchReason::StrongAuthor);
    } else if v.author_similarity > 0.6 {
        reasons.push(MatchReason::ModerateAuthor);
    }

    if v.title.token_set_ratio > 0.9 {
        reasons.push(MatchReason::HighTitleSimilarity);
    } else if v.title.token_sort_ratio > 0.9 {
        reasons.push(MatchReason::ReorderedTitle);
    }

    if v.translation_bonus > 0.2 {
        reasons.push(MatchReason::TranslationPair);
    }
    if v.title.semantic_similarity > 0.8 {
        reasons.push(MatchReason::HighSemanticSimilarity);
    }
    if v.edition_bonus > 0.2 {
        reasons.push(MatchReason::EditionVariation);
    }

    if reasons.is_empty() {
        reasons.push(MatchReason::BasicSimilarity);
    }
    reasons
}
