//! Pre-conversion stage: derives the reading layer from raw input.
//!
//! The engine ships no transliteration table. Callers either pass input
//! through unchanged or supply their own `[mappings]` table.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::composing::StrSegment;

/// Derives layer-1 segments from layer-0 segments.
///
/// The output must tile the input: the first segment starts at 0, each
/// segment starts where the previous one ended, and the last ends at
/// `input.len()`. The derivation must be a pure function of `input`.
pub trait LetterConverter: Send + Sync {
    fn derive(&self, input: &[StrSegment]) -> Vec<StrSegment>;
}

/// One reading segment per raw segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl LetterConverter for PassThrough {
    fn derive(&self, input: &[StrSegment]) -> Vec<StrSegment> {
        input
            .iter()
            .enumerate()
            .map(|(i, seg)| StrSegment::with_range(seg.text.clone(), i, i + 1))
            .collect()
    }
}

#[derive(Deserialize)]
struct TableConfig {
    mappings: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConverterConfigError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("[mappings] table is empty")]
    Empty,
    #[error("empty key")]
    EmptyKey,
    #[error("empty value for key: {0}")]
    EmptyValue(String),
}

/// Parse TOML text into a sorted `BTreeMap<raw, reading>`.
pub fn parse_table_toml(toml_str: &str) -> Result<BTreeMap<String, String>, ConverterConfigError> {
    let config: TableConfig =
        toml::from_str(toml_str).map_err(|e| ConverterConfigError::Parse(e.to_string()))?;

    if config.mappings.is_empty() {
        return Err(ConverterConfigError::Empty);
    }

    for (key, value) in &config.mappings {
        if key.is_empty() {
            return Err(ConverterConfigError::EmptyKey);
        }
        if value.is_empty() {
            return Err(ConverterConfigError::EmptyValue(key.clone()));
        }
    }

    Ok(config.mappings)
}

/// Greedy longest-match converter over a caller-supplied table.
///
/// Raw segments are matched by their concatenated text; a match must end on
/// a raw segment boundary. Segments that start no match pass through alone.
#[derive(Debug, Clone)]
pub struct TableConverter {
    mappings: BTreeMap<String, String>,
    longest_key: usize,
}

impl TableConverter {
    pub fn new(mappings: BTreeMap<String, String>) -> Self {
        let longest_key = mappings.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        Self {
            mappings,
            longest_key,
        }
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConverterConfigError> {
        parse_table_toml(toml_str).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl LetterConverter for TableConverter {
    fn derive(&self, input: &[StrSegment]) -> Vec<StrSegment> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < input.len() {
            let mut key = String::new();
            let mut key_chars = 0;
            let mut best: Option<(usize, &str)> = None;
            for (j, seg) in input.iter().enumerate().skip(i) {
                key.push_str(&seg.text);
                key_chars += seg.text.chars().count();
                if key_chars > self.longest_key {
                    break;
                }
                if let Some(reading) = self.mappings.get(&key) {
                    best = Some((j + 1, reading.as_str()));
                }
            }
            match best {
                Some((end, reading)) => {
                    out.push(StrSegment::with_range(reading, i, end));
                    i = end;
                }
                None => {
                    out.push(StrSegment::with_range(input[i].text.clone(), i, i + 1));
                    i += 1;
                }
            }
        }
        out
    }
}
