use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::debug;

use super::approx::{ApproxRule, ApproxRules};
use super::native::{DictionaryTarget, NativeSearch, SymbolList};
use super::{DictError, NativeError, SearchMode, SearchOrder};
use crate::settings::QuerySettings;
use crate::word::{PartOfSpeech, WnnWord};

/// In-memory read-only dictionary implementing `NativeSearch`.
///
/// Entries are loaded per target from TSV lines of the form
/// `stroke\tcandidate\tfrequency[\tleft\tright]`; `#` starts a comment.
/// Symbol targets are served from the built-in lists.
pub struct FixedDictionary {
    tables: HashMap<DictionaryTarget, BTreeMap<String, Vec<WnnWord>>>,
    active: DictionaryTarget,
    rules: ApproxRules,
    results: VecDeque<WnnWord>,
    /// Last learned word, the predecessor for link search.
    prev: Option<WnnWord>,
    links: HashMap<(String, String), Vec<WnnWord>>,
}

impl FixedDictionary {
    pub fn new(query: &QuerySettings) -> Self {
        Self {
            tables: HashMap::new(),
            active: DictionaryTarget::Jp,
            rules: ApproxRules::new(query),
            results: VecDeque::new(),
            prev: None,
            links: HashMap::new(),
        }
    }

    pub fn insert(&mut self, target: DictionaryTarget, word: WnnWord) {
        let entries = self
            .tables
            .entry(target)
            .or_default()
            .entry(word.stroke.clone())
            .or_default();
        if !entries.iter().any(|w| w.same_word(&word)) {
            entries.push(word);
        }
    }

    /// Load TSV entries into `target`. Returns the number of lines loaded.
    pub fn load_tsv(&mut self, target: DictionaryTarget, content: &str) -> Result<usize, DictError> {
        let mut loaded = 0;
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let word = parse_tsv_line(line)
                .map_err(|reason| DictError::Parse(format!("line {}: {reason}", lineno + 1)))?;
            self.insert(target, word);
            loaded += 1;
        }
        debug!(?target, loaded, "fixed dictionary loaded");
        Ok(loaded)
    }

    pub fn active(&self) -> DictionaryTarget {
        self.active
    }

    pub fn previous_word(&self) -> Option<&WnnWord> {
        self.prev.as_ref()
    }

    fn has_table(&self, target: DictionaryTarget) -> bool {
        target.is_symbol() || self.tables.contains_key(&target)
    }

    fn symbol_words(list: SymbolList) -> Vec<WnnWord> {
        let entries = list.entries();
        entries
            .iter()
            .enumerate()
            .map(|(i, s)| WnnWord::new(*s, *s).with_frequency((entries.len() - i) as i32))
            .collect()
    }

    fn collect(&self, mode: SearchMode, key: &str) -> Vec<WnnWord> {
        if let DictionaryTarget::Symbol(list) = self.active {
            return Self::symbol_words(list);
        }
        let Some(table) = self.tables.get(&self.active) else {
            return Vec::new();
        };
        match mode {
            SearchMode::Exact => table.get(key).cloned().unwrap_or_default(),
            SearchMode::Prefix if key.is_empty() => Vec::new(),
            SearchMode::Prefix if self.rules.is_empty() => table
                .range(key.to_string()..)
                .take_while(|(stroke, _)| stroke.starts_with(key))
                .flat_map(|(_, words)| words.iter().cloned())
                .collect(),
            SearchMode::Prefix => table
                .iter()
                .filter(|(stroke, _)| self.rules.matches_prefix(stroke, key))
                .flat_map(|(_, words)| words.iter().cloned())
                .collect(),
            SearchMode::Link => {
                let Some(prev) = &self.prev else {
                    return Vec::new();
                };
                let linked = self
                    .links
                    .get(&(prev.stroke.clone(), prev.candidate.clone()))
                    .map(|v| v.as_slice())
                    .unwrap_or(&[]);
                linked
                    .iter()
                    .filter(|w| key.is_empty() || self.rules.matches_prefix(&w.stroke, key))
                    .cloned()
                    .collect()
            }
        }
    }
}

fn parse_tsv_line(line: &str) -> Result<WnnWord, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 3 && fields.len() != 5 {
        return Err(format!("expected 3 or 5 fields, got {}", fields.len()));
    }
    if fields[0].is_empty() || fields[1].is_empty() {
        return Err("empty stroke or candidate".to_string());
    }
    let frequency: i32 = fields[2]
        .parse()
        .map_err(|_| format!("invalid frequency: {}", fields[2]))?;
    let pos = if fields.len() == 5 {
        let left = fields[3]
            .parse()
            .map_err(|_| format!("invalid left id: {}", fields[3]))?;
        let right = fields[4]
            .parse()
            .map_err(|_| format!("invalid right id: {}", fields[4]))?;
        PartOfSpeech::new(left, right)
    } else {
        PartOfSpeech::default()
    };
    Ok(WnnWord::new(fields[1], fields[0])
        .with_frequency(frequency)
        .with_part_of_speech(pos))
}

impl NativeSearch for FixedDictionary {
    fn select_dictionary(&mut self, target: DictionaryTarget) -> Result<(), NativeError> {
        let resolved = if self.has_table(target) {
            target
        } else if self.has_table(target.fallback()) {
            target.fallback()
        } else {
            return Err(NativeError::UnknownTarget(target));
        };
        self.active = resolved;
        self.results.clear();
        Ok(())
    }

    fn search(&mut self, mode: SearchMode, order: SearchOrder, key: &str) -> Result<usize, NativeError> {
        let mut words = self.collect(mode, key);
        if !self.active.is_symbol() {
            match order {
                SearchOrder::Frequency => words.sort_by(|a, b| {
                    b.frequency.cmp(&a.frequency).then_with(|| a.stroke.cmp(&b.stroke))
                }),
                SearchOrder::Key => words.sort_by(|a, b| {
                    a.stroke.cmp(&b.stroke).then(b.frequency.cmp(&a.frequency))
                }),
            }
        }
        self.results = words.into();
        Ok(self.results.len())
    }

    fn next_result(&mut self) -> Option<WnnWord> {
        self.results.pop_front()
    }

    fn set_approx_pattern(&mut self, rule: ApproxRule) -> Result<(), NativeError> {
        self.rules.add(rule);
        Ok(())
    }

    fn clear_approx_pattern(&mut self) {
        self.rules.clear();
    }

    fn learn(&mut self, word: &WnnWord) -> Result<(), NativeError> {
        if let Some(prev) = self.prev.take() {
            let linked = self.links.entry((prev.stroke, prev.candidate)).or_default();
            if !linked.iter().any(|w| w.same_word(word)) {
                linked.push(word.clone());
            }
        }
        self.prev = Some(word.clone());
        Ok(())
    }

    fn break_sequence(&mut self) {
        self.prev = None;
    }
}
