use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use bookmatch_core::config_file::{ConfigFile, load_config, read_config};
use bookmatch_core::{BookMatcher, BookRecord, MatcherConfig, analyze_match_reasons};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod output;

use output::ColorMode;

/// Book identity matcher - score how likely two records describe the same book
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the platform and working-directory cascade
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to output file (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two book records and explain the score
    Compare {
        /// First title
        title_a: String,

        /// Second title
        title_b: String,

        #[arg(long)]
        author_a: Option<String>,

        #[arg(long)]
        author_b: Option<String>,

        #[arg(long)]
        language_a: Option<String>,

        #[arg(long)]
        language_b: Option<String>,

        #[arg(long)]
        file_type_a: Option<String>,

        #[arg(long)]
        file_type_b: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Rank candidate records from a JSON array against a query record
    Rank {
        /// JSON file holding an array of {title, author, language, file_type}
        candidates: PathBuf,

        /// Query title
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        file_type: Option<String>,

        /// Maximum number of results (defaults to the configured value)
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum composite score (defaults to the configured value)
        #[arg(long)]
        min_score: Option<f64>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the pairwise title similarity matrix for a file of titles
    Matrix {
        /// Text file with one title per line
        titles: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Suggest near-miss titles from a file of known titles
    Suggest {
        /// Text file with one title per line
        titles: PathBuf,

        /// Title to correct
        #[arg(long)]
        title: String,

        /// Minimum title score for a suggestion
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging();

    // Resolve configuration: --config > BOOKMATCH_CONFIG > file cascade
    let config_path = cli
        .config
        .or_else(|| std::env::var("BOOKMATCH_CONFIG").ok().map(PathBuf::from));
    let matcher = build_matcher(config_path.as_deref())?;

    let color = ColorMode(!cli.no_color && cli.output.is_none() && std::io::stdout().is_terminal());
    let mut writer: Box<dyn Write> = if let Some(ref output_path) = cli.output {
        Box::new(
            std::fs::File::create(output_path)
                .with_context(|| format!("cannot create {}", output_path.display()))?,
        )
    } else {
        Box::new(std::io::stdout())
    };

    match cli.command {
        Command::Compare {
            title_a,
            title_b,
            author_a,
            author_b,
            language_a,
            language_b,
            file_type_a,
            file_type_b,
            json,
        } => {
            let a = record(title_a, author_a, language_a, file_type_a);
            let b = record(title_b, author_b, language_b, file_type_b);
            compare(&matcher, &a, &b, json, &mut writer, color)
        }
        Command::Rank {
            candidates,
            title,
            author,
            language,
            file_type,
            top_k,
            min_score,
            json,
        } => {
            let query = record(title, author, language, file_type);
            let candidates = read_candidates(&candidates)?;
            let top_k = top_k.unwrap_or(matcher.config().top_k);
            let min_score = min_score.unwrap_or(matcher.config().min_score);
            if !(0.0..=1.0).contains(&min_score) {
                anyhow::bail!("--min-score must be within [0, 1], got {}", min_score);
            }

            let results = matcher.find_best_book_matches(&query, &candidates, top_k, min_score);
            if json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&results)?)?;
            } else {
                output::print_ranking(&mut writer, &query, &results, candidates.len(), color)?;
            }
            Ok(())
        }
        Command::Matrix { titles, json } => {
            let titles = read_titles(&titles)?;
            let matrix = matcher.similarity_matrix(&titles);
            if json {
                let value = serde_json::json!({ "titles": titles, "matrix": matrix });
                writeln!(writer, "{}", serde_json::to_string_pretty(&value)?)?;
            } else {
                output::print_matrix(&mut writer, &titles, &matrix, color)?;
            }
            Ok(())
        }
        Command::Suggest {
            titles,
            title,
            threshold,
            json,
        } => {
            let known = read_titles(&titles)?;
            let suggestions = matcher.suggest_corrections(&title, &known, threshold);
            if json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&suggestions)?)?;
            } else {
                let ranked = matcher.find_best_matches(&title, &suggestions, suggestions.len(), 0.0);
                output::print_suggestions(&mut writer, &title, &ranked, color)?;
            }
            Ok(())
        }
    }
}

fn build_matcher(config_path: Option<&Path>) -> anyhow::Result<BookMatcher> {
    let file: ConfigFile = match config_path {
        Some(path) => read_config(path)?,
        None => load_config(),
    };
    let config = MatcherConfig::from_file(&file).context("invalid configuration")?;
    tracing::debug!(
        translations = config.translations.len(),
        top_k = config.top_k,
        min_score = config.min_score,
        "matcher configured"
    );
    Ok(BookMatcher::new(config))
}

fn record(
    title: String,
    author: Option<String>,
    language: Option<String>,
    file_type: Option<String>,
) -> BookRecord {
    BookRecord {
        title: Some(title),
        author,
        language,
        file_type,
    }
}

fn compare(
    matcher: &BookMatcher,
    a: &BookRecord,
    b: &BookRecord,
    json: bool,
    writer: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    let vector = matcher.enhanced_book_similarity(a, b);
    let score = matcher.comprehensive_book_similarity_score(a, b);
    let reasons = analyze_match_reasons(&vector);

    if json {
        let value = serde_json::json!({
            "similarities": vector,
            "score": score,
            "category": bookmatch_core::MatchCategory::from_score(score),
            "reasons": reasons.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        });
        writeln!(writer, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        output::print_comparison(writer, a, b, &vector, score, &reasons, color)?;
    }
    Ok(())
}

/// Read a JSON array of book records.
fn read_candidates(path: &Path) -> anyhow::Result<Vec<BookRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let records: Vec<BookRecord> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of book records", path.display()))?;
    Ok(records)
}

/// Read one title per line, skipping blank lines.
fn read_titles(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(parse_titles(&content))
}

fn parse_titles(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
