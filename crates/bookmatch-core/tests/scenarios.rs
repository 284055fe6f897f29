//! End-to-end matching scenarios and invariants checked over a fixed corpus
//! of Latin, CJK, mixed and degenerate titles.

use bookmatch_core::{
    BookMatcher, BookRecord, MatchCategory, MatcherConfig, TranslationTable,
    calculate_author_similarity, comprehensive_book_similarity_score, detect_edition_variation,
    enhanced_book_similarity, find_best_book_matches, normalize, semantic_similarity,
    similarities,
};

const EPS: f64 = 1e-9;

const CORPUS: &[&str] = &[
    "Clean Code",
    "Clean Code, 2nd Edition",
    "The Clean Coder",
    "Harry Potter and the Philosopher's Stone",
    "Harry Potter and the Sorcerer's Stone",
    "哈利·波特与魔法石",
    "三体",
    "三體",
    "The Three-Body Problem",
    "三体：黑暗森林",
    "水浒传",
    "Water Margin",
    "Journey to the West",
    "Thinking, Fast and Slow (Anniversary Edition)",
    "Dune by Frank Herbert",
    "呐喊 鲁迅著",
    "Économie Politique",
    "",
    "!!!",
    "a",
];

fn titled(title: &str) -> BookRecord {
    BookRecord::new(title)
}

fn authored(title: &str, author: &str) -> BookRecord {
    BookRecord::new(title).with_author(author)
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn similarities_are_symmetric() {
    for a in CORPUS {
        for b in CORPUS {
            let ab = similarities(a, b).values();
            let ba = similarities(b, a).values();
            for (x, y) in ab.iter().zip(ba.iter()) {
                assert!((x - y).abs() < EPS, "{a:?} / {b:?}: {ab:?} vs {ba:?}");
            }
        }
    }
}

#[test]
fn self_comparison_is_perfect() {
    for a in CORPUS {
        assert_eq!(
            comprehensive_book_similarity_score(&titled(a), &titled(a)),
            1.0,
            "{a:?}"
        );
    }
}

#[test]
fn every_score_is_bounded() {
    for a in CORPUS {
        for b in CORPUS {
            let v = enhanced_book_similarity(&titled(a), &titled(b));
            let metadata = [
                v.author_similarity,
                v.language_match,
                v.file_type_match,
                v.translation_bonus,
                v.edition_bonus,
                v.regional_penalty,
            ];
            for x in v.title.values().into_iter().chain(metadata) {
                assert!((0.0..=1.0).contains(&x), "{a:?} / {b:?}: {v:?}");
            }
            let score = comprehensive_book_similarity_score(&titled(a), &titled(b));
            assert!((0.0..=1.0).contains(&score), "{a:?} / {b:?}: {score}");
        }
    }
}

#[test]
fn composite_is_symmetric() {
    for a in CORPUS {
        for b in CORPUS {
            let ab = comprehensive_book_similarity_score(&titled(a), &titled(b));
            let ba = comprehensive_book_similarity_score(&titled(b), &titled(a));
            assert!((ab - ba).abs() < EPS, "{a:?} / {b:?}: {ab} vs {ba}");
        }
    }
}

#[test]
fn normalize_is_idempotent() {
    for a in CORPUS {
        let once = normalize(a);
        assert_eq!(normalize(&once), once, "{a:?}");
    }
}

#[test]
fn empty_title_scores_low() {
    let empty = titled("");
    let absent = BookRecord::default();
    for b in CORPUS.iter().filter(|b| !normalize(b).is_empty()) {
        let with_empty = comprehensive_book_similarity_score(&empty, &titled(b));
        let with_absent = comprehensive_book_similarity_score(&absent, &titled(b));
        let best = comprehensive_book_similarity_score(&titled(b), &titled(b));
        assert!(with_empty <= best && with_empty < 0.5, "{b:?}: {with_empty}");
        assert!(with_absent <= best && with_absent < 0.5, "{b:?}: {with_absent}");
    }
}

#[test]
fn identical_titles_ignore_a_missing_author() {
    for a in CORPUS {
        let score = comprehensive_book_similarity_score(&titled(a), &authored(a, "Robert Martin"));
        assert_eq!(score, 1.0, "{a:?}");
    }
}

#[test]
fn punctuation_only_titles_do_not_match() {
    assert_eq!(comprehensive_book_similarity_score(&titled("!!!"), &titled("???")), 0.0);
}

#[test]
fn single_character_authors() {
    assert_eq!(calculate_author_similarity("A", "B"), 0.0);
    assert_eq!(calculate_author_similarity("A", "A"), 1.0);
    assert_eq!(calculate_author_similarity("鲁", "迅"), 0.0);
}

#[test]
fn edition_suffix_with_matching_authors() {
    let a = authored("Clean Code", "Robert C. Martin");
    let b = authored("Clean Code, 2nd Edition", "Robert C. Martin");
    assert_eq!(enhanced_book_similarity(&a, &b).edition_bonus, 0.3);
    let score = comprehensive_book_similarity_score(&a, &b);
    assert!(score >= 0.9, "got {score}");
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn clean_code_with_middle_initial() {
    let score = comprehensive_book_similarity_score(
        &authored("Clean Code", "Robert Martin"),
        &authored("Clean Code", "Robert C. Martin"),
    );
    assert!(score >= 0.95, "got {score}");
}

#[test]
fn potter_regional_titles() {
    let a = titled("Harry Potter and the Philosopher's Stone");
    let b = titled("Harry Potter and the Sorcerer's Stone");
    assert_eq!(enhanced_book_similarity(&a, &b).regional_penalty, 0.15);
    let score = comprehensive_book_similarity_score(&a, &b);
    assert!(score >= 0.85, "got {score}");
}

#[test]
fn three_body_translation_lookup() {
    assert_eq!(semantic_similarity("The Three-Body Problem", "三体"), 0.8);
}

#[test]
fn author_name_order_swap() {
    assert_eq!(calculate_author_similarity("John Smith", "Smith, John"), 0.95);
}

#[test]
fn water_margin_ranked_over_unrelated() {
    let query = authored("Water Margin", "Shi Nai'an");
    let candidates = vec![authored("水浒传", "施耐庵"), titled("Journey to the West")];
    let results = find_best_book_matches(&query, &candidates, 5, 0.4);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].book.title.as_deref(), Some("水浒传"));
    assert!(results[0].score >= 0.4);
    assert_ne!(results[0].category, MatchCategory::Excellent);
}

#[test]
fn anniversary_edition() {
    assert_eq!(
        detect_edition_variation(
            "Thinking, Fast and Slow",
            "Thinking, Fast and Slow (Anniversary Edition)"
        ),
        0.3
    );
}

// =============================================================================
// Configured matchers
// =============================================================================

#[test]
fn custom_translation_table() {
    let config = MatcherConfig {
        translations: TranslationTable::new([("Clean Code", "代码整洁之道")]),
        ..Default::default()
    };
    let matcher = BookMatcher::new(config);
    assert_eq!(matcher.semantic_similarity("Clean Code", "代码整洁之道"), 0.8);
    assert_eq!(matcher.semantic_similarity("The Three-Body Problem", "三体"), 0.0);
}

#[test]
fn matcher_is_shareable_across_threads() {
    let matcher = BookMatcher::default();
    let scores: Vec<f64> = std::thread::scope(|s| {
        let handles: Vec<_> = CORPUS
            .iter()
            .map(|t| {
                let matcher = &matcher;
                s.spawn(move || matcher.title_similarity_score(t, "Clean Code"))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(scores[0], 1.0);
    assert_eq!(scores.len(), CORPUS.len());
}
