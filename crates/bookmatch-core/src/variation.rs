use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

use crate::normalize::normalize;

/// Bonus for two titles that differ only in edition qualifiers.
pub const EDITION_BONUS: f64 = 0.3;
/// Core titles must score above this to count as the same work.
const EDITION_CORE_THRESHOLD: f64 = 0.85;

/// Edition qualifiers stripped before comparing core titles.
static EDITION_QUALIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)第\d+版|\d+(?:th|nd|rd|st)\s+edition|(?:revised|updated|anniversary|illustrated|deluxe)\s+edition|新版|修订版|增订版|纪念版|commemorative|插图版|图解版|精装版|豪华版",
    )
    .unwrap()
});
static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[()\[\]（）]\s*").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Title with edition qualifiers and bracket punctuation removed.
pub fn edition_core(title: &str) -> String {
    let stripped = EDITION_QUALIFIER_RE.replace_all(title, "");
    let stripped = BRACKET_RE.replace_all(&stripped, " ");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// 0.3 when the two titles are the same work once edition qualifiers are
/// removed, judged by `title_score` on the core titles; 0.0 otherwise.
pub fn detect_edition_variation_by<F>(title1: &str, title2: &str, title_score: F) -> f64
where
    F: Fn(&str, &str) -> f64,
{
    let core1 = edition_core(title1);
    let core2 = edition_core(title2);
    if core1.is_empty() || core2.is_empty() {
        return 0.0;
    }
    if title_score(&core1, &core2) > EDITION_CORE_THRESHOLD {
        EDITION_BONUS
    } else {
        0.0
    }
}

// =============================================================================
// Regional (US/UK) spelling variants
// =============================================================================

/// How strongly two titles look like regional editions of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RegionalVariation {
    None,
    /// Same word count, at most two words differ.
    Minor,
    /// A known US/UK spelling swap turns one title into the other.
    Exact,
}

impl RegionalVariation {
    pub fn penalty(self) -> f64 {
        match self {
            RegionalVariation::None => 0.0,
            RegionalVariation::Minor => 0.10,
            RegionalVariation::Exact => 0.15,
        }
    }
}

/// A US/UK spelling pair. Each pattern matches the phrase in normalized text;
/// within a match only the word itself is swapped.
struct SpellingVariant {
    us: Regex,
    us_word: &'static str,
    uk: Regex,
    uk_word: &'static str,
}

impl SpellingVariant {
    fn new(us: &str, us_word: &'static str, uk: &str, uk_word: &'static str) -> Self {
        Self {
            us: Regex::new(us).unwrap(),
            us_word,
            uk: Regex::new(uk).unwrap(),
            uk_word,
        }
    }

    /// Whether swapping the spelling in either direction on either title
    /// reproduces the other title.
    fn bridges(&self, a: &str, b: &str) -> bool {
        let directions = [
            (&self.us, self.us_word, self.uk_word),
            (&self.uk, self.uk_word, self.us_word),
        ];
        [(a, b), (b, a)].iter().any(|&(source, target)| {
            directions.iter().any(|&(re, from, to)| {
                let converted = swap_spelling(re, from, to, source);
                converted != source && converted == target
            })
        })
    }
}

fn swap_spelling(re: &Regex, from: &str, to: &str, text: &str) -> String {
    re.replace_all(text, |caps: &Captures| caps[0].replacen(from, to, 1))
        .into_owned()
}

static SPELLING_VARIANTS: Lazy<Vec<SpellingVariant>> = Lazy::new(|| {
    vec![
        SpellingVariant::new(
            r"\bsorcerer\s?s?\s+stone\b",
            "sorcerer",
            r"\bphilosopher\s?s?\s+stone\b",
            "philosopher",
        ),
        SpellingVariant::new(r"\bcolor\b", "color", r"\bcolour\b", "colour"),
        SpellingVariant::new(r"\bfavor\b", "favor", r"\bfavour\b", "favour"),
        SpellingVariant::new(r"\bhonor\b", "honor", r"\bhonour\b", "honour"),
        SpellingVariant::new(r"\blabor\b", "labor", r"\blabour\b", "labour"),
        SpellingVariant::new(r"organize", "organize", r"organise", "organise"),
        SpellingVariant::new(r"realize", "realize", r"realise", "realise"),
        SpellingVariant::new(r"analyze", "analyze", r"analyse", "analyse"),
        SpellingVariant::new(r"\bcenter\b", "center", r"\bcentre\b", "centre"),
        SpellingVariant::new(r"\btheater\b", "theater", r"\btheatre\b", "theatre"),
        SpellingVariant::new(r"\bgray\b", "gray", r"\bgrey\b", "grey"),
        SpellingVariant::new(r"\btires?\b", "tire", r"\btyres?\b", "tyre"),
        SpellingVariant::new(r"\bdefense\b", "defense", r"\bdefence\b", "defence"),
        SpellingVariant::new(r"\blicense\b", "license", r"\blicence\b", "licence"),
    ]
});

/// Classify two titles as regional variants of each other.
pub fn regional_variation(title1: &str, title2: &str) -> RegionalVariation {
    if title1 == title2 {
        return RegionalVariation::None;
    }
    let norm1 = normalize(title1);
    let norm2 = normalize(title2);
    if norm1 == norm2 {
        return RegionalVariation::None;
    }

    if SPELLING_VARIANTS.iter().any(|v| v.bridges(&norm1, &norm2)) {
        return RegionalVariation::Exact;
    }

    let words1: BTreeSet<&str> = norm1.split_whitespace().collect();
    let words2: BTreeSet<&str> = norm2.split_whitespace().collect();
    if words1.len() == words2.len() && words1.len() > 2 {
        let differing = words1.symmetric_difference(&words2).count();
        let common = words1.intersection(&words2).count();
        if differing <= 2 && common as f64 >= words1.len() as f64 * 0.8 {
            return RegionalVariation::Minor;
        }
    }

    RegionalVariation::None
}

/// Regional-variant penalty: 0.15, 0.10 or 0.0.
pub fn detect_regional_variation(title1: &str, title2: &str) -> f64 {
    regional_variation(title1, title2).penalty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_core_match(a: &str, b: &str) -> f64 {
        if normalize(a) == normalize(b) { 1.0 } else { 0.0 }
    }

    // =========================================================================
    // Edition variation
    // =========================================================================

    #[test]
    fn test_edition_core_strips_qualifiers() {
        assert_eq!(edition_core("Clean Code, 2nd Edition"), "Clean Code,");
        assert_eq!(
            edition_core("Thinking, Fast and Slow (Anniversary Edition)"),
            "Thinking, Fast and Slow"
        );
        assert_eq!(edition_core("围城（修订版）"), "围城");
        assert_eq!(edition_core("活着 第3版"), "活着");
    }

    #[test]
    fn test_edition_variation_detected() {
        assert_eq!(
            detect_edition_variation_by(
                "Thinking, Fast and Slow",
                "Thinking, Fast and Slow (Anniversary Edition)",
                exact_core_match
            ),
            0.3
        );
        assert_eq!(
            detect_edition_variation_by("Clean Code", "Clean Code, 2nd Edition", exact_core_match),
            0.3
        );
    }

    #[test]
    fn test_edition_variation_different_cores() {
        assert_eq!(
            detect_edition_variation_by("Clean Code", "Refactoring, 2nd Edition", exact_core_match),
            0.0
        );
    }

    #[test]
    fn test_edition_variation_empty_core() {
        assert_eq!(
            detect_edition_variation_by("Deluxe Edition", "Deluxe Edition", exact_core_match),
            0.0
        );
    }

    // =========================================================================
    // Regional variation
    // =========================================================================

    #[test]
    fn test_regional_identical_titles() {
        assert_eq!(regional_variation("Colour", "Colour"), RegionalVariation::None);
        assert_eq!(regional_variation("Colour!", "colour"), RegionalVariation::None);
    }

    #[test]
    fn test_regional_potter_titles() {
        let v = regional_variation(
            "Harry Potter and the Philosopher's Stone",
            "Harry Potter and the Sorcerer's Stone",
        );
        assert_eq!(v, RegionalVariation::Exact);
        assert_eq!(v.penalty(), 0.15);
    }

    #[test]
    fn test_regional_spelling_swaps() {
        assert_eq!(
            detect_regional_variation("The Color Purple", "The Colour Purple"),
            0.15
        );
        assert_eq!(
            detect_regional_variation("Centre of the World", "Center of the World"),
            0.15
        );
        assert_eq!(detect_regional_variation("Changing Tires", "Changing Tyres"), 0.15);
        assert_eq!(
            detect_regional_variation("How to Organise Anything", "How to Organize Anything"),
            0.15
        );
    }

    #[test]
    fn test_regional_minor_word_difference() {
        // Five words each, two differ, four shared
        assert_eq!(
            regional_variation("the quick brown fox jumps", "the quick brown fox leaps"),
            RegionalVariation::Minor
        );
    }

    #[test]
    fn test_regional_unrelated() {
        assert_eq!(detect_regional_variation("Clean Code", "The Pragmatic Programmer"), 0.0);
        // Two words only: too short for the minor tier
        assert_eq!(detect_regional_variation("Clean Code", "Clean Coder"), 0.0);
    }

    #[test]
    fn test_regional_symmetric() {
        let pairs = [
            ("Harry Potter and the Philosopher's Stone", "Harry Potter and the Sorcerer's Stone"),
            ("The Color Purple", "The Colour Purple"),
            ("Changing Tyres", "Changing Tires"),
            ("the quick brown fox jumps", "the quick brown fox leaps"),
        ];
        for (a, b) in pairs {
            assert_eq!(regional_variation(a, b), regional_variation(b, a), "{a} / {b}");
        }
    }
}
