use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{contains_cjk, normalize};

/// Score for a title pair found verbatim in the translation table.
pub const EXACT_TRANSLATION_SCORE: f64 = 0.8;
/// Score for a pair where both sides contain (or are contained by) a table
/// entry, e.g. a translated title carrying a subtitle.
pub const PARTIAL_TRANSLATION_SCORE: f64 = 0.6;

const BILINGUAL_PATTERN_BONUS: f64 = 0.3;
const DIFFERENT_LANGUAGE_BONUS: f64 = 0.2;
const CROSS_SCRIPT_BONUS: f64 = 0.2;
const MAX_TRANSLATION_BONUS: f64 = 0.5;

/// Curated English → Chinese title pairs used when no table is configured.
const DEFAULT_PAIRS: &[(&str, &str)] = &[
    ("the three-body problem", "三体"),
    ("three-body problem", "三体"),
    ("journey to the west", "西游记"),
    ("dream of the red chamber", "红楼梦"),
    ("water margin", "水浒传"),
    ("outlaws of the marsh", "水浒传"),
    ("romance of the three kingdoms", "三国演义"),
    ("harry potter and the philosopher's stone", "哈利·波特与魔法石"),
    ("harry potter and the sorcerer's stone", "哈利·波特与魔法石"),
    ("one hundred years of solitude", "百年孤独"),
    ("fortress besieged", "围城"),
    ("to live", "活着"),
];

/// Bilingual subtitle syntax: `Title = Translated`, a full-width colon
/// subtitle, or a trailing parenthetical/bracket carrying Latin text.
static BILINGUAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"=\s*[^=]+$",
        r"：[^：]+$",
        r"\([^)]*[a-zA-Z][^)]*\)$",
        r"\[[^\]]*[a-zA-Z][^\]]*\]$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Known English ↔ Chinese title translations.
///
/// Entries are stored in normalized form, so lookups are insensitive to case,
/// punctuation and simplified/traditional script variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTable {
    pairs: Vec<(String, String)>,
}

impl Default for TranslationTable {
    fn default() -> Self {
        Self::new(DEFAULT_PAIRS.iter().copied())
    }
}

impl TranslationTable {
    /// Build a table from `(english, chinese)` pairs. Pairs that normalize to
    /// an empty string on either side are dropped.
    pub fn new<I, E, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (E, C)>,
        E: AsRef<str>,
        C: AsRef<str>,
    {
        let mut table = Self { pairs: Vec::new() };
        table.extend(pairs);
        table
    }

    /// A table with no entries; only pattern-based detection applies.
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Add pairs, skipping duplicates.
    pub fn extend<I, E, C>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (E, C)>,
        E: AsRef<str>,
        C: AsRef<str>,
    {
        for (english, chinese) in pairs {
            let english = normalize(english.as_ref());
            let chinese = normalize(chinese.as_ref());
            if english.is_empty() || chinese.is_empty() {
                continue;
            }
            let pair = (english, chinese);
            if !self.pairs.contains(&pair) {
                self.pairs.push(pair);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Look the pair up in the table: 0.8 for an exact entry (either
    /// direction), 0.6 for a partial containment match, 0.0 otherwise.
    pub fn check_pair(&self, a: &str, b: &str) -> f64 {
        let a_norm = normalize(a);
        let b_norm = normalize(b);
        if a_norm.is_empty() || b_norm.is_empty() {
            return 0.0;
        }

        let exact = self.pairs.iter().any(|(english, chinese)| {
            (a_norm == *english && b_norm == *chinese) || (b_norm == *english && a_norm == *chinese)
        });
        if exact {
            return EXACT_TRANSLATION_SCORE;
        }

        let relates = |text: &str, english: &str| english.contains(text) || text.contains(english);
        let partial = self.pairs.iter().any(|(english, chinese)| {
            (relates(&a_norm, english) && b_norm.contains(chinese.as_str()))
                || (relates(&b_norm, english) && a_norm.contains(chinese.as_str()))
        });
        if partial {
            return PARTIAL_TRANSLATION_SCORE;
        }

        0.0
    }
}

/// Pattern-based translation bonus in `[0, 0.5]`.
///
/// +0.3 if either raw title carries bilingual subtitle syntax, +0.2 if both
/// languages are declared and differ, +0.2 if one title is CJK and the other
/// Latin-alphabetic.
pub fn detect_translation_pair(title1: &str, title2: &str, lang1: &str, lang2: &str) -> f64 {
    let lang1 = lang1.trim().to_lowercase();
    let lang2 = lang2.trim().to_lowercase();

    let has_pattern = BILINGUAL_PATTERNS
        .iter()
        .any(|re| re.is_match(title1) || re.is_match(title2));
    let different_langs = !lang1.is_empty() && !lang2.is_empty() && lang1 != lang2;

    let has_latin = |t: &str| t.chars().any(|c| c.is_ascii_alphabetic());
    let cross_script = (contains_cjk(title1) && has_latin(title2))
        || (has_latin(title1) && contains_cjk(title2));

    let mut bonus = 0.0;
    if has_pattern {
        bonus += BILINGUAL_PATTERN_BONUS;
    }
    if different_langs {
        bonus += DIFFERENT_LANGUAGE_BONUS;
    }
    if cross_script {
        bonus += CROSS_SCRIPT_BONUS;
    }
    f64::min(bonus, MAX_TRANSLATION_BONUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Table lookup
    // =========================================================================

    #[test]
    fn test_exact_pair_both_directions() {
        let table = TranslationTable::default();
        assert_eq!(table.check_pair("The Three-Body Problem", "三体"), 0.8);
        assert_eq!(table.check_pair("三体", "The Three-Body Problem"), 0.8);
    }

    #[test]
    fn test_exact_pair_traditional_script() {
        let table = TranslationTable::default();
        assert_eq!(table.check_pair("Water Margin", "水滸傳"), 0.8);
    }

    #[test]
    fn test_partial_pair_with_subtitle() {
        let table = TranslationTable::default();
        assert_eq!(table.check_pair("Fortress Besieged", "围城（新版）"), 0.6);
    }

    #[test]
    fn test_no_pair() {
        let table = TranslationTable::default();
        assert_eq!(table.check_pair("Clean Code", "代码整洁之道"), 0.0);
        assert_eq!(table.check_pair("", "三体"), 0.0);
    }

    #[test]
    fn test_custom_table() {
        let table = TranslationTable::new([("Clean Code", "代码整洁之道")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.check_pair("clean code", "代码整洁之道"), 0.8);
        assert_eq!(table.check_pair("Water Margin", "水浒传"), 0.0);
    }

    #[test]
    fn test_extend_skips_duplicates_and_empty() {
        let mut table = TranslationTable::empty();
        table.extend([("To Live", "活着"), ("to live", "活着"), ("!!!", "活着")]);
        assert_eq!(table.len(), 1);
    }

    // =========================================================================
    // Pattern bonus
    // =========================================================================

    #[test]
    fn test_bilingual_pattern() {
        assert_eq!(detect_translation_pair("Solaris = Solaris", "Solaris", "", ""), 0.3);
        assert_eq!(detect_translation_pair("Clean Code (Second Edition)", "Clean Code", "", ""), 0.3);
        assert_eq!(detect_translation_pair("三体：黑暗森林", "三体", "", ""), 0.3);
    }

    #[test]
    fn test_language_and_script_bonus_capped() {
        let bonus = detect_translation_pair(
            "三体 = The Three-Body Problem",
            "The Three-Body Problem",
            "Chinese",
            "English",
        );
        assert_eq!(bonus, 0.5);
    }

    #[test]
    fn test_cross_script_only() {
        assert_eq!(detect_translation_pair("Water Margin", "水浒传", "", ""), 0.2);
    }

    #[test]
    fn test_same_language_case_insensitive() {
        assert_eq!(
            detect_translation_pair("Clean Code", "Clean Code", " English", "english "),
            0.0
        );
    }
}
