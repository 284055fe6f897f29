//! Vector-space title similarity.
//!
//! A TF-IDF model is fit on exactly the two strings being compared, so no
//! corpus state is kept between calls. CJK text is analysed as raw character
//! n-grams (1–3), Latin text as word-bounded character n-grams (2–4).

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::lexical::jaccard;
use crate::normalize::{contains_cjk, normalize};
use crate::translation::TranslationTable;

/// Sparse, L2-normalized TF-IDF vector keyed by n-gram.
pub type TermVector = BTreeMap<String, f64>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorizeError {
    #[error("empty vocabulary: documents produced no n-grams")]
    EmptyVocabulary,
}

/// How a document is split into n-gram features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analyzer {
    /// Character n-grams over the whole string, spaces included.
    Char { min_n: usize, max_n: usize },
    /// Character n-grams inside each whitespace word, padded with one space on
    /// each side. Words shorter than `n` are counted once.
    CharWordBounded { min_n: usize, max_n: usize },
}

impl Analyzer {
    pub fn ngrams(&self, doc: &str) -> Vec<String> {
        match *self {
            Analyzer::Char { min_n, max_n } => {
                let chars: Vec<char> = doc.chars().collect();
                let mut grams = Vec::new();
                for n in min_n..=max_n {
                    if n == 0 || n > chars.len() {
                        continue;
                    }
                    grams.extend(chars.windows(n).map(|w| w.iter().collect::<String>()));
                }
                grams
            }
            Analyzer::CharWordBounded { min_n, max_n } => {
                let mut grams = Vec::new();
                for word in doc.split_whitespace() {
                    let padded: Vec<char> = std::iter::once(' ')
                        .chain(word.chars())
                        .chain(std::iter::once(' '))
                        .collect();
                    for n in min_n.max(1)..=max_n {
                        if n >= padded.len() {
                            // Short word: the whole padded word is one feature
                            grams.push(padded.iter().collect());
                            break;
                        }
                        grams.extend(padded.windows(n).map(|w| w.iter().collect::<String>()));
                    }
                }
                grams
            }
        }
    }
}

/// TF-IDF with smoothed IDF (`ln((1 + n) / (1 + df)) + 1`), raw term counts
/// and L2 row normalization.
#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    pub analyzer: Analyzer,
    /// Keep only the most frequent terms across the fitted documents.
    pub max_features: usize,
}

impl TfidfVectorizer {
    pub fn cjk() -> Self {
        Self {
            analyzer: Analyzer::Char { min_n: 1, max_n: 3 },
            max_features: 2000,
        }
    }

    pub fn latin() -> Self {
        Self {
            analyzer: Analyzer::CharWordBounded { min_n: 2, max_n: 4 },
            max_features: 1000,
        }
    }

    /// Fit on `docs` and return one vector per document.
    pub fn fit_transform(&self, docs: &[&str]) -> Result<Vec<TermVector>, VectorizeError> {
        let counts: Vec<BTreeMap<String, usize>> = docs
            .iter()
            .map(|doc| {
                let mut tf = BTreeMap::new();
                for gram in self.analyzer.ngrams(doc) {
                    *tf.entry(gram).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let vocabulary = self.vocabulary(&counts);
        if vocabulary.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }

        let n_docs = docs.len() as f64;
        let idf = |term: &str| {
            let df = counts.iter().filter(|tf| tf.contains_key(term)).count() as f64;
            ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
        };

        Ok(counts
            .iter()
            .map(|tf| {
                let mut vector: TermVector = tf
                    .iter()
                    .filter(|(term, _)| vocabulary.contains(term.as_str()))
                    .map(|(term, &count)| (term.clone(), count as f64 * idf(term)))
                    .collect();
                let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for w in vector.values_mut() {
                        *w /= norm;
                    }
                }
                vector
            })
            .collect())
    }

    /// Terms ranked by corpus frequency (ties broken alphabetically), capped at
    /// `max_features`.
    fn vocabulary(&self, counts: &[BTreeMap<String, usize>]) -> BTreeSet<String> {
        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for tf in counts {
            for (term, &count) in tf {
                *totals.entry(term.as_str()).or_insert(0) += count;
            }
        }
        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(self.max_features)
            .map(|(term, _)| term.to_string())
            .collect()
    }
}

/// Cosine of two L2-normalized vectors. A zero vector yields 0.0.
pub fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    a.iter()
        .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
        .sum()
}

/// TF-IDF cosine similarity of two titles, with translation-table lookup for
/// mixed-script pairs and set-overlap fallbacks. Never fails.
pub fn semantic_similarity(a: &str, b: &str, translations: &TranslationTable) -> f64 {
    let a_norm = normalize(a);
    let b_norm = normalize(b);

    if a_norm.is_empty() || b_norm.is_empty() {
        return 0.0;
    }
    if a_norm == b_norm {
        return 1.0;
    }

    let cjk_a = contains_cjk(&a_norm);
    let cjk_b = contains_cjk(&b_norm);

    // Mixed-script pair: likely a translation
    if cjk_a != cjk_b {
        let translation_score = translations.check_pair(a, b);
        if translation_score > 0.0 {
            return translation_score;
        }
        return char_overlap(&a_norm, &b_norm);
    }

    let vectorizer = if cjk_a {
        TfidfVectorizer::cjk()
    } else {
        TfidfVectorizer::latin()
    };

    match vectorizer.fit_transform(&[&a_norm, &b_norm]) {
        Ok(vectors) => cosine(&vectors[0], &vectors[1]).clamp(0.0, 1.0),
        Err(err) => {
            tracing::trace!(error = %err, "tf-idf degenerate, using set overlap");
            if cjk_a {
                char_overlap(&a_norm, &b_norm)
            } else {
                word_overlap(&a_norm, &b_norm)
            }
        }
    }
}

fn char_overlap(a: &str, b: &str) -> f64 {
    let chars_a: BTreeSet<char> = a.chars().collect();
    let chars_b: BTreeSet<char> = b.chars().collect();
    jaccard(&chars_a, &chars_b)
}

fn word_overlap(a: &str, b: &str) -> f64 {
    let words_a: BTreeSet<&str> = a.split_whitespace().collect();
    let words_b: BTreeSet<&str> = b.split_whitespace().collect();
    jaccard(&words_a, &words_b)
}
