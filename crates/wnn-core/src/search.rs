//! Merged candidate search over the native dictionary and the word store.
//!
//! The coordinator owns the native engine and shares the store with
//! maintenance tools. Faults on either side degrade to the other side's
//! results; nothing here fails a keystroke.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, RwLock};

use tracing::{debug, debug_span, warn};

use crate::composing::StrSegment;
use crate::dict::{
    ApproxProfile, ApproxRules, DictionaryStore, DictionaryTarget, FrequencyCeilings, NativeSearch,
    SearchMode, SearchOrder, StoreQuery,
};
use crate::settings::Settings;
use crate::word::WnnWord;

/// One phrase of a consecutive-clause conversion, covering reading
/// segments `from..to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub from: usize,
    pub to: usize,
    pub reading: String,
    pub word: WnnWord,
}

impl Clause {
    pub fn to_segment(&self) -> StrSegment {
        StrSegment::with_range(self.word.candidate.clone(), self.from, self.to)
    }
}

pub struct SearchCoordinator {
    native: Box<dyn NativeSearch>,
    store: Arc<RwLock<DictionaryStore>>,
    target: DictionaryTarget,
    /// Ceilings for ordinary targets, from settings.
    base_ceilings: FrequencyCeilings,
    /// Ceilings for the current target.
    ceilings: FrequencyCeilings,
    approx: ApproxRules,
    candidates: VecDeque<WnnWord>,
    previous: Option<WnnWord>,
    max_results: usize,
    max_key_length: usize,
    learning: bool,
}

impl SearchCoordinator {
    pub fn new(
        mut native: Box<dyn NativeSearch>,
        store: Arc<RwLock<DictionaryStore>>,
        settings: &Settings,
    ) -> Self {
        let target = match settings.engine.default_language {
            crate::settings::Language::Jp => DictionaryTarget::Jp,
            crate::settings::Language::En => DictionaryTarget::En,
        };
        if let Err(e) = native.select_dictionary(target) {
            warn!(error = %e, ?target, "native dictionary unavailable");
        }
        let base_ceilings = settings.frequency_ceilings();
        Self {
            native,
            store,
            target,
            base_ceilings,
            ceilings: base_ceilings,
            approx: ApproxRules::new(&settings.query),
            candidates: VecDeque::new(),
            previous: None,
            max_results: settings.candidates.max_results,
            max_key_length: settings.query.max_key_length,
            learning: settings.learning.enabled,
        }
    }

    pub fn store(&self) -> &Arc<RwLock<DictionaryStore>> {
        &self.store
    }

    pub fn target(&self) -> DictionaryTarget {
        self.target
    }

    pub fn ceilings(&self) -> FrequencyCeilings {
        self.ceilings
    }

    pub fn previous_word(&self) -> Option<&WnnWord> {
        self.previous.as_ref()
    }

    pub fn set_learning(&mut self, enabled: bool) {
        self.learning = enabled;
    }

    pub fn learning_enabled(&self) -> bool {
        self.learning
    }

    /// Switch the dictionary variant searched by both sides.
    ///
    /// Symbol lists disable the store; the user-word target searches the
    /// store's user rows only.
    pub fn select_target(&mut self, target: DictionaryTarget) {
        self.target = target;
        self.candidates.clear();
        self.ceilings = match target {
            DictionaryTarget::Symbol(_) => FrequencyCeilings::DISABLED,
            DictionaryTarget::UserWords => FrequencyCeilings {
                user: self.base_ceilings.user,
                learned: None,
            },
            _ => self.base_ceilings,
        };
        if target != DictionaryTarget::UserWords {
            if let Err(e) = self.native.select_dictionary(target) {
                warn!(error = %e, ?target, "native dictionary unavailable");
            }
        }
        debug!(?target, "dictionary target selected");
    }

    /// Replace the approximate-match rules on both sides.
    pub fn set_approx_profile(&mut self, profile: Option<ApproxProfile>) {
        self.approx.clear();
        self.native.clear_approx_pattern();
        let Some(profile) = profile else {
            return;
        };
        for rule in profile.rules() {
            if self.approx.add(rule) {
                if let Err(e) = self.native.set_approx_pattern(rule) {
                    warn!(error = %e, "native approx pattern rejected");
                }
            }
        }
    }

    /// Prediction for `key`. Candidates whose stroke is shorter than
    /// `min_len` or longer than `max_len` characters are dropped; a
    /// `max_len` equal to the key length asks for exact matches.
    pub fn predict(&mut self, key: &str, min_len: usize, max_len: Option<usize>) -> usize {
        let _span = debug_span!("predict", key).entered();
        let key_len = key.chars().count();
        let mode = if max_len.is_some_and(|m| m <= key_len) {
            SearchMode::Exact
        } else {
            SearchMode::Prefix
        };
        let merged = self.merged_search(mode, key, None);
        let filtered = merged.into_iter().filter(|w| {
            let len = w.stroke.chars().count();
            self.target.is_symbol() || (len >= min_len && max_len.map_or(true, |m| len <= m))
        });
        self.candidates = filtered.collect();
        self.candidates.len()
    }

    /// Prediction of words that followed the previously committed word.
    pub fn predict_link(&mut self) -> usize {
        let _span = debug_span!("predict_link").entered();
        let Some(prev) = self.previous.clone() else {
            self.candidates.clear();
            return 0;
        };
        self.candidates = self.merged_search(SearchMode::Link, "", Some(&prev)).into();
        self.candidates.len()
    }

    /// Consecutive-clause conversion over reading segments, by greedy
    /// longest match against the native dictionary. Segments with no match
    /// become single-segment clauses holding their own reading.
    pub fn convert(&mut self, reading: &[StrSegment]) -> Vec<Clause> {
        let _span = debug_span!("convert", segments = reading.len()).entered();
        let mut clauses = Vec::new();
        let mut i = 0;
        while i < reading.len() {
            let mut found = None;
            for j in (i + 1..=reading.len()).rev() {
                let key: String = reading[i..j].iter().map(|s| s.text.as_str()).collect();
                if key.chars().count() > self.max_key_length {
                    continue;
                }
                if let Some(word) = self.native_best(&key) {
                    found = Some((j, key, word));
                    break;
                }
            }
            let (to, key, word) = found.unwrap_or_else(|| {
                let text = reading[i].text.clone();
                (i + 1, text.clone(), WnnWord::new(text.clone(), text))
            });
            clauses.push(Clause {
                from: i,
                to,
                reading: key,
                word,
            });
            i = to;
        }
        self.candidates.clear();
        clauses
    }

    /// Alternatives for one clause: merged exact matches of its reading,
    /// followed by the reading itself.
    pub fn make_candidate_list_of(&mut self, clause: &Clause) -> usize {
        let _span = debug_span!("make_candidate_list_of", reading = %clause.reading).entered();
        let mut merged = self.merged_search(SearchMode::Exact, &clause.reading, None);
        if !merged.iter().any(|w| w.candidate == clause.reading) && merged.len() < self.max_results {
            merged.push(WnnWord::new(clause.reading.clone(), clause.reading.clone()));
        }
        self.candidates = merged.into();
        self.candidates.len()
    }

    /// Next merged candidate, or `None` when the stream is drained.
    pub fn next_candidate(&mut self) -> Option<WnnWord> {
        self.candidates.pop_front()
    }

    pub fn drain_candidates(&mut self) -> Vec<WnnWord> {
        self.candidates.drain(..).collect()
    }

    /// Record a committed word in the store and the native engine, and
    /// remember it as the link predecessor. A word that is not learned
    /// breaks the sequence instead.
    pub fn learn(&mut self, word: &WnnWord) {
        if !self.learning || self.target.is_symbol() {
            self.break_sequence();
            return;
        }
        match self.store.write() {
            Ok(mut store) => {
                if let Err(e) = store.learn(word, self.previous.as_ref()) {
                    warn!(error = %e, "store learning failed");
                }
            }
            Err(_) => warn!("word store lock poisoned, learning skipped"),
        }
        if let Err(e) = self.native.learn(word) {
            warn!(error = %e, "native learning failed");
        }
        self.previous = Some(word.clone());
    }

    pub fn break_sequence(&mut self) {
        self.previous = None;
        self.native.break_sequence();
    }

    fn native_enabled(&self) -> bool {
        self.target != DictionaryTarget::UserWords
    }

    /// Highest-ranked native exact match for `key`.
    fn native_best(&mut self, key: &str) -> Option<WnnWord> {
        match self.native.search(SearchMode::Exact, SearchOrder::Frequency, key) {
            Ok(0) => None,
            Ok(_) => self.native.next_result(),
            Err(e) => {
                warn!(error = %e, "native conversion failed");
                None
            }
        }
    }

    fn store_search(&self, mode: SearchMode, key: &str, prev: Option<&WnnWord>) -> Vec<WnnWord> {
        if !self.ceilings.any_enabled() {
            return Vec::new();
        }
        let query = StoreQuery::new(mode, key, self.ceilings)
            .prev(prev)
            .approx(Some(&self.approx));
        match self.store.read() {
            Ok(store) => store.search(&query),
            Err(_) => {
                warn!("word store lock poisoned, using native results only");
                Vec::new()
            }
        }
    }

    fn native_search(&mut self, mode: SearchMode, key: &str) -> Vec<WnnWord> {
        if !self.native_enabled() {
            return Vec::new();
        }
        match self.native.search(mode, SearchOrder::Frequency, key) {
            Ok(count) => {
                let mut words: Vec<WnnWord> = std::iter::from_fn(|| self.native.next_result())
                    .take(count)
                    .collect();
                // Stable: keeps the engine's order within equal frequency.
                words.sort_by(|a, b| b.frequency.cmp(&a.frequency));
                words
            }
            Err(e) => {
                warn!(error = %e, "native search failed, using store results only");
                Vec::new()
            }
        }
    }

    /// Interleave store and native results by frequency, store first on
    /// ties, dropping repeated `(stroke, candidate)` pairs.
    fn merged_search(&mut self, mode: SearchMode, key: &str, prev: Option<&WnnWord>) -> Vec<WnnWord> {
        let stored = self.store_search(mode, key, prev);
        let native = self.native_search(mode, key);
        merge_ranked(stored, native, self.max_results)
    }
}

fn merge_ranked(stored: Vec<WnnWord>, native: Vec<WnnWord>, limit: usize) -> Vec<WnnWord> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut merged = Vec::new();
    let mut stored = stored.into_iter().peekable();
    let mut native = native.into_iter().peekable();
    while merged.len() < limit {
        let take_stored = match (stored.peek(), native.peek()) {
            (Some(s), Some(n)) => s.frequency >= n.frequency,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_stored { stored.next() } else { native.next() };
        let Some(word) = next else { break };
        if seen.insert((word.stroke.clone(), word.candidate.clone())) {
            merged.push(word);
        }
    }
    merged
}
