use std::io::Write;

use bookmatch_core::{
    BookRecord, MatchCategory, MatchReason, MatchResult, SimilarityVector, TitleMatch,
};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn category_label(category: MatchCategory, color: ColorMode) -> String {
    let label = category.to_string();
    if !color.enabled() {
        return label;
    }
    match category {
        MatchCategory::Excellent => label.green().bold().to_string(),
        MatchCategory::Good => label.green().to_string(),
        MatchCategory::Moderate => label.yellow().to_string(),
        MatchCategory::Poor => label.red().to_string(),
    }
}

fn describe(book: &BookRecord) -> String {
    let mut text = format!("\"{}\"", book.title_text());
    if let Some(author) = book.author.as_deref().filter(|a| !a.trim().is_empty()) {
        text.push_str(&format!(" by {}", author));
    }
    let extras: Vec<&str> = [book.language.as_deref(), book.file_type.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !extras.is_empty() {
        text.push_str(&format!(" [{}]", extras.join(", ")));
    }
    text
}

/// Print every signal for one pair, then the composite verdict.
pub fn print_comparison(
    w: &mut dyn Write,
    a: &BookRecord,
    b: &BookRecord,
    vector: &SimilarityVector,
    score: f64,
    reasons: &[MatchReason],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "A: {}", describe(a))?;
    writeln!(w, "B: {}", describe(b))?;
    writeln!(w)?;

    let rows = [
        ("levenshtein_ratio", vector.title.levenshtein_ratio),
        ("token_sort_ratio", vector.title.token_sort_ratio),
        ("token_set_ratio", vector.title.token_set_ratio),
        ("jaro_winkler", vector.title.jaro_winkler),
        ("semantic_similarity", vector.title.semantic_similarity),
        ("author_similarity", vector.author_similarity),
        ("language_match", vector.language_match),
        ("file_type_match", vector.file_type_match),
        ("translation_bonus", vector.translation_bonus),
        ("edition_bonus", vector.edition_bonus),
        ("regional_penalty", vector.regional_penalty),
    ];
    for (name, value) in rows {
        if color.enabled() {
            writeln!(w, "  {:<20} {}", name.dimmed(), format!("{:.3}", value))?;
        } else {
            writeln!(w, "  {:<20} {:.3}", name, value)?;
        }
    }
    writeln!(w)?;

    let category = MatchCategory::from_score(score);
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({})",
            "Score:".bold(),
            format!("{:.3}", score).bold(),
            category_label(category, color)
        )?;
    } else {
        writeln!(w, "Score: {:.3} ({})", score, category)?;
    }

    let reasons: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
    writeln!(w, "Reasons: {}", reasons.join("; "))?;
    Ok(())
}

/// Print a ranked shortlist of books.
pub fn print_ranking(
    w: &mut dyn Write,
    query: &BookRecord,
    results: &[MatchResult],
    candidates: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Query: {}", describe(query))?;
    writeln!(w, "{} of {} candidates matched", results.len(), candidates)?;
    if results.is_empty() {
        return Ok(());
    }
    writeln!(w)?;

    for (i, result) in results.iter().enumerate() {
        writeln!(
            w,
            "{:>3}. {:.3}  {:<9}  {}",
            i + 1,
            result.score,
            category_label(result.category, color),
            describe(&result.book)
        )?;
    }
    Ok(())
}

/// Print near-miss title suggestions.
pub fn print_suggestions(
    w: &mut dyn Write,
    query: &str,
    suggestions: &[TitleMatch],
    color: ColorMode,
) -> std::io::Result<()> {
    if suggestions.is_empty() {
        writeln!(w, "No suggestions for \"{}\"", query)?;
        return Ok(());
    }
    writeln!(w, "Did you mean (for \"{}\"):", query)?;
    for m in suggestions {
        if color.enabled() {
            writeln!(w, "  {}  {}", format!("{:.3}", m.score).dimmed(), m.title)?;
        } else {
            writeln!(w, "  {:.3}  {}", m.score, m.title)?;
        }
    }
    Ok(())
}

/// Print the pairwise matrix with a numbered title legend.
pub fn print_matrix(
    w: &mut dyn Write,
    titles: &[String],
    matrix: &[Vec<f64>],
    color: ColorMode,
) -> std::io::Result<()> {
    for (i, title) in titles.iter().enumerate() {
        writeln!(w, "[{}] {}", i + 1, title)?;
    }
    writeln!(w)?;

    write!(w, "     ")?;
    for j in 0..titles.len() {
        write!(w, " {:>5}", format!("[{}]", j + 1))?;
    }
    writeln!(w)?;

    for (i, row) in matrix.iter().enumerate() {
        write!(w, "{:>5}", format!("[{}]", i + 1))?;
        for (j, value) in row.iter().enumerate() {
            let cell = format!("{:.2}", value);
            if color.enabled() && i != j && *value >= 0.7 {
                write!(w, " {:>5}", cell.green())?;
            } else {
                write!(w, " {:>5}", cell)?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}
