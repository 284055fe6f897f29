use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexical::{jaro_winkler, token_set_ratio, token_sort_ratio};
use crate::normalize::{contains_cjk, normalize};

/// Base score when the surnames agree.
const SURNAME_MATCH: f64 = 0.7;
const FIRST_NAME_MATCH: f64 = 0.3;
const EXPANDED_INITIAL_MATCH: f64 = 0.25;
const SHARED_INITIAL_MATCH: f64 = 0.15;
const MIDDLE_NAME_MATCH: f64 = 0.05;
const MIDDLE_INITIAL_MATCH: f64 = 0.02;
/// "John Smith" vs "Smith John".
const NAME_ORDER_SWAP: f64 = 0.95;
/// A CJK name against a romanized one.
const TRANSLITERATION: f64 = 0.75;
/// Single-token names only count as a match at or above this token-set ratio.
const SINGLE_TOKEN_THRESHOLD: f64 = 0.8;
/// Structural scores below this fall through to the string-similarity blend.
const FALLBACK_BELOW: f64 = 0.5;
const FALLBACK_THRESHOLD: f64 = 0.85;
const FALLBACK_DISCOUNT: f64 = 0.8;

static HONORIFIC_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(dr\.?|prof\.?|professor|mr\.?|ms\.?|mrs\.?)\s+").unwrap());
static HONORIFIC_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(jr\.?|sr\.?|iii?|iv|phd|md|esq)\.?$").unwrap());

/// Translator/editor annotations: `；李继宏 译`, `(李继宏译)`, `[编]`.
static ROLE_ANNOTATION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\s*[；;]\s*.*?[译譯编編著写寫].*$",
        r"\s*\([^)]*[译譯编編著写寫][^)]*\).*$",
        r"\s*\[[^\]]*[译譯编編著写寫][^\]]*\].*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static PUBLISHER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(\b(press|publishing|publisher)\b|出版社|社).*$").unwrap()
});
static NAME_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[·・.,，]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static LIFE_DATES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\([^)]*(?:born|died|\d{4}|country|nation)[^)]*\)").unwrap()
});

/// Clean an author string for comparison.
///
/// Strips honorifics, translator/editor annotations, publisher tails and
/// life-date parentheticals, then turns name punctuation into spaces.
pub fn normalize_author_name(author: &str) -> String {
    let author = author.trim();
    if author.is_empty() {
        return String::new();
    }

    let mut author = HONORIFIC_PREFIX_RE.replace(author, "").to_string();
    author = HONORIFIC_SUFFIX_RE.replace(&author, "").to_string();

    for re in ROLE_ANNOTATION_RES.iter() {
        author = re.replace(&author, "").to_string();
    }
    author = PUBLISHER_RE.replace(&author, "").to_string();

    author = NAME_PUNCT_RE.replace_all(&author, " ").to_string();
    author = WHITESPACE_RE.replace_all(&author, " ").to_string();
    author = LIFE_DATES_RE.replace_all(&author, "").to_string();

    author.trim().to_string()
}

/// One name written in CJK (2–4 chars), the other romanized (3–25 chars).
pub fn is_likely_transliteration(name1: &str, name2: &str) -> bool {
    let has_latin = |t: &str| t.chars().any(|c| c.is_ascii_alphabetic());

    let (chinese, latin) = if contains_cjk(name1) && has_latin(name2) {
        (name1, name2)
    } else if has_latin(name1) && contains_cjk(name2) {
        (name2, name1)
    } else {
        return false;
    };

    let chinese_len = chinese.chars().count();
    let latin_len = latin.chars().count();
    (2..=4).contains(&chinese_len) && (3..=25).contains(&latin_len)
}

/// Similarity of two author names in `[0, 1]`.
///
/// Structural correspondence (surname, first name or initial, middle names,
/// order swap, transliteration) is rewarded over raw string similarity.
/// Single-token names must agree almost exactly to count at all.
pub fn calculate_author_similarity(author1: &str, author2: &str) -> f64 {
    let norm1 = normalize_author_name(author1);
    let norm2 = normalize_author_name(author2);
    if norm1.is_empty() || norm2.is_empty() {
        return 0.0;
    }

    let lower1 = norm1.to_lowercase();
    let lower2 = norm2.to_lowercase();
    if lower1 == lower2 {
        return 1.0;
    }

    if is_likely_transliteration(&norm1, &norm2) {
        return TRANSLITERATION;
    }

    let parts1: Vec<&str> = lower1.split_whitespace().collect();
    let parts2: Vec<&str> = lower2.split_whitespace().collect();

    if parts1.len() <= 1 || parts2.len() <= 1 {
        let ratio = token_set_ratio(&normalize(&norm1), &normalize(&norm2));
        return if ratio >= SINGLE_TOKEN_THRESHOLD {
            ratio
        } else {
            0.0
        };
    }

    let mut score = structural_score(&parts1, &parts2);

    if score < FALLBACK_BELOW {
        let a = normalize(&norm1);
        let b = normalize(&norm2);
        let blended =
            token_set_ratio(&a, &b) * 0.4 + token_sort_ratio(&a, &b) * 0.3 + jaro_winkler(&a, &b) * 0.3;
        if blended >= FALLBACK_THRESHOLD {
            score = score.max(blended * FALLBACK_DISCOUNT);
        }
    }

    score.clamp(0.0, 1.0)
}

/// Pattern score for two names of at least two tokens each.
fn structural_score(parts1: &[&str], parts2: &[&str]) -> f64 {
    let (first1, last1) = (parts1[0], parts1[parts1.len() - 1]);
    let (first2, last2) = (parts2[0], parts2[parts2.len() - 1]);

    let mut score = 0.0;
    if last1 == last2 {
        score += SURNAME_MATCH;

        if first1 == first2 {
            score += FIRST_NAME_MATCH;
        } else if first1.chars().next() == first2.chars().next() {
            let stem1 = first1.trim_end_matches('.');
            let stem2 = first2.trim_end_matches('.');
            if stem1 == stem2 || stem1.starts_with(stem2) || stem2.starts_with(stem1) {
                score += EXPANDED_INITIAL_MATCH;
            } else {
                score += SHARED_INITIAL_MATCH;
            }
        }
    }

    if score >= SURNAME_MATCH && parts1.len() >= 3 && parts2.len() >= 3 {
        let middle1 = parts1[1..parts1.len() - 1].join(" ");
        let middle2 = parts2[1..parts2.len() - 1].join(" ");
        if middle1 == middle2 {
            score = f64::min(1.0, score + MIDDLE_NAME_MATCH);
        } else if middle1.chars().next() == middle2.chars().next() {
            score = f64::min(1.0, score + MIDDLE_INITIAL_MATCH);
        }
    } else if parts1.len() == 2 && parts2.len() == 2 && first1 == last2 && last1 == first2 {
        score = NAME_ORDER_SWAP;
    }

    score
}

// =============================================================================
// Author extraction from free-text titles
// =============================================================================

/// Which matcher pulled an author out of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorPattern {
    /// `作者：X`, `author: X`, `by X`, `written by X`
    ExplicitMarker,
    /// `X 著`, `X 编`
    CreatorSuffix,
    /// `Title：X 著`
    ColonTail,
    /// `Title (X)`, `Title【X】`
    TrailingParenthetical,
    /// `Title Firstname Lastname`, `Title 鲁迅`
    TrailingName,
    /// `Title - X`
    SeparatorTail,
    /// `Title, X 编`
    RoleSuffix,
}

impl AuthorPattern {
    /// False for names guessed from trailing words alone, with no marker,
    /// suffix, or punctuation setting them apart from the title.
    pub fn is_marked(&self) -> bool {
        !matches!(self, AuthorPattern::TrailingName)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAuthor {
    pub name: String,
    pub pattern: AuthorPattern,
}

/// Matchers in priority order; the first validated candidate wins.
static AUTHOR_MATCHERS: Lazy<Vec<(AuthorPattern, Regex)>> = Lazy::new(|| {
    use AuthorPattern::*;
    [
        (
            ExplicitMarker,
            r"作者[：:]\s*([^,;()【】《》\n]+?)(?:\s*[,;()【】《》\n]|$)",
        ),
        (
            ExplicitMarker,
            r"(?i)author[：:]\s*([^,;()【】《》\n]+?)(?:\s*[,;()【】《》\n]|$)",
        ),
        (CreatorSuffix, r"([^,;()【】《》\s]+?)\s*著作?\s*$"),
        (CreatorSuffix, r"([^,;()【】《》]+?)\s*[编編写寫]\s*$"),
        (ColonTail, r"：\s*([^,;()【】《》]+?)\s*著?\s*$"),
        (
            ExplicitMarker,
            r"(?i)\bby\s+([^,;()【】《》\n]+?)(?:\s*[,;()【】《》\n]|$)",
        ),
        (TrailingParenthetical, r"\(([^)]+?)\)\s*$"),
        (TrailingParenthetical, r"【([^】]+?)】\s*$"),
        (TrailingName, r"\s+([A-Z][A-Za-z]*(?:\s+[A-Z][A-Za-z]*){1,3})\s*$"),
        (TrailingName, r"\s+([\x{4e00}-\x{9fff}]{2,4})\s*$"),
        (SeparatorTail, r"[：:\-–—]\s*([^,;()【】《》\n]+?)\s*$"),
        (
            RoleSuffix,
            r"(?i)[,;]\s*([^,;()【】《》\n]+?)\s*(?:著|编|編|write|寫)\s*$",
        ),
    ]
    .into_iter()
    .map(|(pattern, re)| (pattern, Regex::new(re).unwrap()))
    .collect()
});

/// Words that mark a candidate as edition/series noise rather than a name.
const NON_AUTHOR_WORDS: &[&str] = &[
    "edition",
    "版",
    "vol",
    "series",
    "translation",
    "revised",
    "updated",
    "illustrated",
    "complete",
];
const NON_AUTHOR_CHARS: &[char] = &[':', '：', '!', '?', '@', '#', '$', '%', '^', '&', '*'];

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
static PUBLICATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(第\d+版|edition|press|publishing)").unwrap());
static MARKER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(作者|by|author)\s*[：:]*\s*").unwrap());
static ROLE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(著|编|編|write|寫|译|譯)$").unwrap());
static PUBLISHER_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(press|publishing|publisher)$").unwrap());

fn is_plausible_author(candidate: &str) -> bool {
    let len = candidate.chars().count();
    if !(2..=50).contains(&len) {
        return false;
    }
    let lower = candidate.to_lowercase();
    !NON_AUTHOR_WORDS.iter().any(|w| lower.contains(w))
        && !candidate.contains(NON_AUTHOR_CHARS)
        && !YEAR_RE.is_match(candidate)
        && !PUBLICATION_RE.is_match(candidate)
}

/// Connecting words that only appear in capitalized titles, never in names.
const TITLE_WORDS: &[&str] = &["a", "an", "and", "at", "for", "in", "of", "on", "the", "to", "with"];

/// A trailing capitalized run is a name only when it holds no connecting
/// words and real title text precedes it: "The Pragmatic Programmer" and
/// "Introduction To Algorithms" carry no author.
fn is_trailing_name(text: &str, start: usize, candidate: &str) -> bool {
    let is_title_word = |w: &str| TITLE_WORDS.contains(&w.to_lowercase().as_str());
    if candidate.split_whitespace().any(is_title_word) {
        return false;
    }
    text[..start].split_whitespace().any(|w| !is_title_word(w))
}

fn clean_extracted(candidate: &str) -> String {
    let author = MARKER_PREFIX_RE.replace(candidate, "");
    let author = ROLE_SUFFIX_RE.replace(&author, "");
    let author = PUBLISHER_SUFFIX_RE.replace(&author, "");
    author.trim().to_string()
}

/// Try each matcher in priority order and return the first candidate that
/// passes validation (2–50 chars, no edition keywords, no years, no
/// publisher words).
pub fn extract_author(text: &str) -> Option<ExtractedAuthor> {
    if text.trim().is_empty() {
        return None;
    }

    AUTHOR_MATCHERS.iter().find_map(|(pattern, re)| {
        let found = re.captures(text)?.get(1)?;
        let candidate = found.as_str().trim();
        if !is_plausible_author(candidate) {
            return None;
        }
        if *pattern == AuthorPattern::TrailingName
            && !is_trailing_name(text, found.start(), candidate)
        {
            return None;
        }
        let name = clean_extracted(candidate);
        (name.chars().count() >= 2).then_some(ExtractedAuthor {
            name,
            pattern: *pattern,
        })
    })
}

/// Author name embedded in a title, or an empty string.
pub fn extract_author_from_text(text: &str) -> String {
    extract_author(text).map(|a| a.name).unwrap_or_default()
}
