//! Engine settings loaded from TOML.
//!
//! - `Settings::default()` parses the embedded `default_settings.toml`
//! - `parse_settings_toml(content)` parses and validates caller-provided TOML
//!
//! Settings are plain values handed to each component's constructor; there is
//! no process-wide instance.

use serde::Deserialize;

use crate::dict::FrequencyCeilings;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub composing: ComposingSettings,
    pub user_dictionary: StoreSettings,
    pub learning_dictionary: StoreSettings,
    pub query: QuerySettings,
    pub candidates: CandidateSettings,
    pub prediction: PredictionSettings,
    pub learning: LearningSettings,
    pub engine: EngineSettings,
}

impl Default for Settings {
    fn default() -> Self {
        // The embedded file is checked by build.rs and by `parse_default_toml`.
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("default settings TOML must be valid")
    }
}

impl Settings {
    /// Frequency ceilings of the user and learning stores for normal
    /// (non-symbol) dictionaries.
    pub fn frequency_ceilings(&self) -> FrequencyCeilings {
        FrequencyCeilings {
            user: FrequencyCeilings::from_range(
                self.user_dictionary.frequency_base,
                self.user_dictionary.frequency_high,
            ),
            learned: FrequencyCeilings::from_range(
                self.learning_dictionary.frequency_base,
                self.learning_dictionary.frequency_high,
            ),
        }
    }

    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_user_words: self.user_dictionary.max_words,
            max_learned_words: self.learning_dictionary.max_words,
            max_stroke_length: self.query.max_stroke_length,
            max_candidate_length: self.query.max_candidate_length,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComposingSettings {
    pub max_segments: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub max_words: usize,
    /// A negative or inverted base/high pair disables the store for ranking.
    pub frequency_base: i32,
    pub frequency_high: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuerySettings {
    pub max_approx_patterns: usize,
    pub max_key_length: usize,
    pub fast_key_length: usize,
    pub max_stroke_length: usize,
    pub max_candidate_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSettings {
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionSettings {
    pub enabled: bool,
    pub first_delay_ms: u64,
    pub showing_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LearningSettings {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Jp,
    En,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    pub default_language: Language,
}

/// Capacity limits enforced by `DictionaryStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_user_words: usize,
    pub max_learned_words: usize,
    pub max_stroke_length: usize,
    pub max_candidate_length: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_user_words: 100,
            max_learned_words: 2000,
            max_stroke_length: 50,
            max_candidate_length: 50,
        }
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive_usize!(composing.max_segments);
    check_positive_usize!(user_dictionary.max_words);
    check_positive_usize!(learning_dictionary.max_words);
    check_positive_usize!(query.max_approx_patterns);
    check_positive_usize!(query.max_key_length);
    check_positive_usize!(query.fast_key_length);
    check_positive_usize!(query.max_stroke_length);
    check_positive_usize!(query.max_candidate_length);
    check_positive_usize!(candidates.max_results);

    if s.query.fast_key_length > s.query.max_key_length {
        return Err(SettingsError::InvalidValue {
            field: "query.fast_key_length".to_string(),
            reason: "must not exceed query.max_key_length".to_string(),
        });
    }

    Ok(())
}
