use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MatcherConfig;
use crate::scoring::{CompositeWeights, TitleWeights};
use crate::translation::TranslationTable;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid weight `{name}` = {value}: must be finite and non-negative")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("invalid min_score {0}: must lie in [0, 1]")]
    InvalidMinScore(f64),
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub translations: Option<TranslationsConfig>,
    pub weights: Option<WeightsConfig>,
    pub title_weights: Option<TitleWeightsConfig>,
    pub matching: Option<MatchingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationsConfig {
    /// English title → Chinese title.
    pub pairs: Option<BTreeMap<String, String>>,
    /// Drop the built-in pairs instead of extending them.
    pub replace_defaults: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightsConfig {
    pub levenshtein: Option<f64>,
    pub token_sort: Option<f64>,
    pub token_set: Option<f64>,
    pub jaro_winkler: Option<f64>,
    pub semantic: Option<f64>,
    pub author: Option<f64>,
    pub language: Option<f64>,
    pub file_type: Option<f64>,
    pub translation: Option<f64>,
    pub edition: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleWeightsConfig {
    pub levenshtein: Option<f64>,
    pub token_sort: Option<f64>,
    pub token_set: Option<f64>,
    pub jaro_winkler: Option<f64>,
    pub semantic: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub top_k: Option<usize>,
    pub min_score: Option<f64>,
}

/// Platform config directory path: `<config_dir>/bookmatch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bookmatch").join("config.toml"))
}

/// Load config by cascading CWD `.bookmatch.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".bookmatch.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed; parse failures are logged.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match read_config(path) {
        Ok(config) => Some(config),
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
            None
        }
    }
}

/// Read and parse a config file, surfacing every failure.
pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// First value present in `overlay`, else in `base`.
fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
/// Translation pairs are unioned, with overlay entries winning per key.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bt, ot) = (base.translations.as_ref(), overlay.translations.as_ref());
    let pairs = match (
        bt.and_then(|t| t.pairs.clone()),
        ot.and_then(|t| t.pairs.clone()),
    ) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(o)) => Some(o),
        (Some(mut b), Some(o)) => {
            b.extend(o);
            Some(b)
        }
    };

    let (bw, ow) = (base.weights.as_ref(), overlay.weights.as_ref());
    let (btw, otw) = (base.title_weights.as_ref(), overlay.title_weights.as_ref());
    let (bm, om) = (base.matching.as_ref(), overlay.matching.as_ref());

    ConfigFile {
        translations: Some(TranslationsConfig {
            pairs,
            replace_defaults: pick(ot, bt, |t| t.replace_defaults),
        }),
        weights: Some(WeightsConfig {
            levenshtein: pick(ow, bw, |w| w.levenshtein),
            token_sort: pick(ow, bw, |w| w.token_sort),
            token_set: pick(ow, bw, |w| w.token_set),
            jaro_winkler: pick(ow, bw, |w| w.jaro_winkler),
            semantic: pick(ow, bw, |w| w.semantic),
            author: pick(ow, bw, |w| w.author),
            language: pick(ow, bw, |w| w.language),
            file_type: pick(ow, bw, |w| w.file_type),
            translation: pick(ow, bw, |w| w.translation),
            edition: pick(ow, bw, |w| w.edition),
        }),
        title_weights: Some(TitleWeightsConfig {
            levenshtein: pick(otw, btw, |w| w.levenshtein),
            token_sort: pick(otw, btw, |w| w.token_sort),
            token_set: pick(otw, btw, |w| w.token_set),
            jaro_winkler: pick(otw, btw, |w| w.jaro_winkler),
            semantic: pick(otw, btw, |w| w.semantic),
        }),
        matching: Some(MatchingConfig {
            top_k: pick(om, bm, |m| m.top_k),
            min_score: pick(om, bm, |m| m.min_score),
        }),
    }
}

impl MatcherConfig {
    /// Apply a config file over the defaults, validating every weight.
    pub fn from_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        let mut config = MatcherConfig::default();

        if let Some(t) = &file.translations {
            if t.replace_defaults.unwrap_or(false) {
                config.translations = TranslationTable::empty();
            }
            if let Some(pairs) = &t.pairs {
                config.translations.extend(pairs.iter());
            }
        }

        if let Some(w) = &file.weights {
            let d = config.weights;
            config.weights = CompositeWeights {
                levenshtein: w.levenshtein.unwrap_or(d.levenshtein),
                token_sort: w.token_sort.unwrap_or(d.token_sort),
                token_set: w.token_set.unwrap_or(d.token_set),
                jaro_winkler: w.jaro_winkler.unwrap_or(d.jaro_winkler),
                semantic: w.semantic.unwrap_or(d.semantic),
                author: w.author.unwrap_or(d.author),
                language: w.language.unwrap_or(d.language),
                file_type: w.file_type.unwrap_or(d.file_type),
                translation: w.translation.unwrap_or(d.translation),
                edition: w.edition.unwrap_or(d.edition),
            };
        }

        if let Some(w) = &file.title_weights {
            let d = config.title_weights;
            config.title_weights = TitleWeights {
                levenshtein: w.levenshtein.unwrap_or(d.levenshtein),
                token_sort: w.token_sort.unwrap_or(d.token_sort),
                token_set: w.token_set.unwrap_or(d.token_set),
                jaro_winkler: w.jaro_winkler.unwrap_or(d.jaro_winkler),
                semantic: w.semantic.unwrap_or(d.semantic),
            };
        }

        if let Some(m) = &file.matching {
            config.top_k = m.top_k.unwrap_or(config.top_k);
            config.min_score = m.min_score.unwrap_or(config.min_score);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = self
            .weights
            .named()
            .into_iter()
            .chain(self.title_weights.named());
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ConfigError::InvalidMinScore(self.min_score));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[translations]
replace_defaults = true

[translations.pairs]
"Clean Code" = "代码整洁之道"

[weights]
author = 0.5

[title_weights]
semantic = 0.2

[matching]
top_k = 3
min_score = 0.5
"#;
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let t = parsed.translations.unwrap();
        assert_eq!(t.replace_defaults, Some(true));
        assert_eq!(t.pairs.unwrap()["Clean Code"], "代码整洁之道");
        assert_eq!(parsed.weights.unwrap().author, Some(0.5));
        assert_eq!(parsed.title_weights.unwrap().semantic, Some(0.2));
        assert_eq!(parsed.matching.unwrap().top_k, Some(3));
    }

    #[test]
    fn absent_sections_deserialize_as_none() {
        let parsed: ConfigFile = toml::from_str("[matching]\ntop_k = 2\n").unwrap();
        assert!(parsed.weights.is_none());
        assert!(parsed.matching.unwrap().min_score.is_none());
    }

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            matching: Some(MatchingConfig {
                top_k: Some(10),
                min_score: Some(0.3),
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            matching: Some(MatchingConfig {
                top_k: Some(3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).matching.unwrap();
        assert_eq!(merged.top_k, Some(3));
        assert_eq!(merged.min_score, Some(0.3));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            weights: Some(WeightsConfig {
                author: Some(0.6),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.weights.unwrap().author, Some(0.6));
    }

    #[test]
    fn merge_unions_translation_pairs() {
        let pairs = |entries: &[(&str, &str)]| ConfigFile {
            translations: Some(TranslationsConfig {
                pairs: Some(
                    entries
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                replace_defaults: None,
            }),
            ..Default::default()
        };
        let merged = merge(
            pairs(&[("Clean Code", "代码整洁之道"), ("To Live", "活着")]),
            pairs(&[("To Live", "活着（新版）")]),
        );
        let merged_pairs = merged.translations.unwrap().pairs.unwrap();
        assert_eq!(merged_pairs.len(), 2);
        assert_eq!(merged_pairs["To Live"], "活着（新版）");
    }

    // =========================================================================
    // MatcherConfig
    // =========================================================================

    #[test]
    fn empty_file_gives_defaults() {
        let config = MatcherConfig::from_file(&ConfigFile::default()).unwrap();
        assert_eq!(config.weights, CompositeWeights::default());
        assert_eq!(config.title_weights, TitleWeights::default());
        assert_eq!(config.translations, TranslationTable::default());
        assert_eq!(config.top_k, 5);
        assert_eq!(config.min_score, 0.4);
    }

    #[test]
    fn pairs_extend_defaults() {
        let file: ConfigFile =
            toml::from_str("[translations.pairs]\n\"Clean Code\" = \"代码整洁之道\"\n").unwrap();
        let config = MatcherConfig::from_file(&file).unwrap();
        assert_eq!(config.translations.len(), TranslationTable::default().len() + 1);
        assert_eq!(config.translations.check_pair("Clean Code", "代码整洁之道"), 0.8);
        assert_eq!(config.translations.check_pair("Water Margin", "水浒传"), 0.8);
    }

    #[test]
    fn replace_defaults_drops_builtin_pairs() {
        let file: ConfigFile = toml::from_str(
            "[translations]\nreplace_defaults = true\n[translations.pairs]\n\"Clean Code\" = \"代码整洁之道\"\n",
        )
        .unwrap();
        let config = MatcherConfig::from_file(&file).unwrap();
        assert_eq!(config.translations.len(), 1);
        assert_eq!(config.translations.check_pair("Water Margin", "水浒传"), 0.0);
    }

    #[test]
    fn partial_weights_keep_defaults() {
        let file: ConfigFile = toml::from_str("[weights]\nauthor = 0.4\n").unwrap();
        let config = MatcherConfig::from_file(&file).unwrap();
        assert_eq!(config.weights.author, 0.4);
        assert_eq!(config.weights.token_set, CompositeWeights::default().token_set);
    }

    #[test]
    fn negative_weight_rejected() {
        let file: ConfigFile = toml::from_str("[title_weights]\nsemantic = -0.1\n").unwrap();
        match MatcherConfig::from_file(&file) {
            Err(ConfigError::InvalidWeight { name, value }) => {
                assert_eq!(name, "semantic");
                assert_eq!(value, -0.1);
            }
            other => panic!("expected InvalidWeight, got {other:?}"),
        }
    }

    #[test]
    fn min_score_out_of_range_rejected() {
        let file: ConfigFile = toml::from_str("[matching]\nmin_score = 1.5\n").unwrap();
        assert!(matches!(
            MatcherConfig::from_file(&file),
            Err(ConfigError::InvalidMinScore(_))
        ));
    }

    // =========================================================================
    // Files on disk
    // =========================================================================

    #[test]
    fn load_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("absent.toml")).is_none());
    }

    #[test]
    fn load_from_unparsable_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[matching\ntop_k = ").unwrap();
        assert!(load_from_path(file.path()).is_none());
        assert!(matches!(
            read_config(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn read_config_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[matching]\nmin_score = 0.6").unwrap();
        let config = read_config(file.path()).unwrap();
        assert_eq!(config.matching.unwrap().min_score, Some(0.6));
    }
}
