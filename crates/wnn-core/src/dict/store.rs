//! Mutable word store for user-registered and learned words.
//!
//! Rows live in one table ordered by a monotonic id, mirroring a relational
//! `(id, type, stroke, candidate, pos, prev*)` schema. Every mutation is a
//! single `Transaction`: it is appended to the write-ahead log first (when
//! the store is persistent) and applied in memory only after the append
//! succeeded.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use super::approx::ApproxRules;
use super::wal::StoreWal;
use super::{DictError, FrequencyCeilings, SearchMode, SearchOrder};
use crate::settings::StoreLimits;
use crate::word::{PartOfSpeech, WnnWord, WordKind};

const MAGIC: &[u8; 4] = b"WNDS";
const VERSION: u8 = 1;

/// The word a learned row was committed after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevWord {
    pub stroke: String,
    pub candidate: String,
    pub part_of_speech: PartOfSpeech,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRow {
    pub id: i64,
    pub kind: WordKind,
    pub stroke: String,
    pub candidate: String,
    pub part_of_speech: PartOfSpeech,
    pub prev: Option<PrevWord>,
}

impl WordRow {
    fn to_word(&self, frequency: i32) -> WnnWord {
        WnnWord {
            stroke: self.stroke.clone(),
            candidate: self.candidate.clone(),
            part_of_speech: self.part_of_speech,
            frequency,
            id: self.id,
        }
    }

    fn is(&self, kind: WordKind, word: &WnnWord) -> bool {
        self.kind == kind && self.stroke == word.stroke && self.candidate == word.candidate
    }
}

/// One atomic unit of change, as logged to the WAL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Transaction {
    Apply {
        remove: Vec<i64>,
        insert: Vec<WordRow>,
    },
    Clear(WordKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddStatus {
    Added,
    Duplicate,
}

/// Per-word outcome of a batch add, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub statuses: Vec<AddStatus>,
}

impl AddReport {
    pub fn added(&self) -> usize {
        self.statuses.iter().filter(|s| **s == AddStatus::Added).count()
    }

    pub fn duplicates(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == AddStatus::Duplicate)
            .count()
    }
}

/// Parameters of one store search.
#[derive(Debug, Clone, Copy)]
pub struct StoreQuery<'a> {
    pub mode: SearchMode,
    pub order: SearchOrder,
    pub key: &'a str,
    /// Required for `SearchMode::Link`; ignored otherwise.
    pub prev: Option<&'a WnnWord>,
    pub ceilings: FrequencyCeilings,
    pub approx: Option<&'a ApproxRules>,
}

impl<'a> StoreQuery<'a> {
    pub fn new(mode: SearchMode, key: &'a str, ceilings: FrequencyCeilings) -> Self {
        Self {
            mode,
            order: SearchOrder::Frequency,
            key,
            prev: None,
            ceilings,
            approx: None,
        }
    }

    pub fn order(mut self, order: SearchOrder) -> Self {
        self.order = order;
        self
    }

    pub fn prev(mut self, prev: Option<&'a WnnWord>) -> Self {
        self.prev = prev;
        self
    }

    pub fn approx(mut self, approx: Option<&'a ApproxRules>) -> Self {
        self.approx = approx;
        self
    }

    fn key_matches(&self, stroke: &str) -> bool {
        match self.approx {
            Some(rules) if !rules.is_empty() => rules.matches_prefix(stroke, self.key),
            _ => stroke.starts_with(self.key),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoreData {
    next_id: i64,
    rows: Vec<WordRow>,
}

pub struct DictionaryStore {
    /// Ascending by id.
    rows: Vec<WordRow>,
    next_id: i64,
    limits: StoreLimits,
    wal: Option<StoreWal>,
}

impl DictionaryStore {
    /// In-memory store without persistence.
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            limits,
            wal: None,
        }
    }

    /// Open a persistent store: load the checkpoint (if any) and replay the
    /// WAL next to it.
    pub fn open(path: &Path, limits: StoreLimits) -> Result<Self, DictError> {
        let mut store = match fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes, limits)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::new(limits),
            Err(e) => return Err(e.into()),
        };
        let mut wal = StoreWal::new(path);
        let replayed = wal.replay(&mut store)?;
        debug!(path = %path.display(), rows = store.rows.len(), replayed, "dictionary store opened");
        store.wal = Some(wal);
        Ok(store)
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    pub fn is_persistent(&self) -> bool {
        self.wal.is_some()
    }

    pub fn len(&self, kind: WordKind) -> usize {
        self.rows.iter().filter(|r| r.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[WordRow] {
        &self.rows
    }

    pub fn user_words(&self) -> Vec<WnnWord> {
        self.words_of(WordKind::User)
    }

    pub fn learned_words(&self) -> Vec<WnnWord> {
        self.words_of(WordKind::Learned)
    }

    fn words_of(&self, kind: WordKind) -> Vec<WnnWord> {
        let mut words: Vec<WnnWord> = self
            .rows
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.to_word(0))
            .collect();
        words.sort_by(|a, b| a.stroke.cmp(&b.stroke).then(a.id.cmp(&b.id)));
        words
    }

    /// Words matching `query`, ranked. Rows of a kind whose ceiling is
    /// disabled are skipped; identical rows are reported once.
    pub fn search(&self, query: &StoreQuery<'_>) -> Vec<WnnWord> {
        if !query.ceilings.any_enabled() {
            return Vec::new();
        }
        if query.key.chars().count() > self.limits.max_stroke_length {
            debug!(len = query.key.chars().count(), "search key longer than any stroke");
            return Vec::new();
        }
        let link = match query.mode {
            SearchMode::Exact | SearchMode::Prefix if query.key.is_empty() => return Vec::new(),
            SearchMode::Exact | SearchMode::Prefix => None,
            SearchMode::Link => match query.prev {
                Some(prev) => Some(prev),
                None => return Vec::new(),
            },
        };

        type DistinctKey<'r> = (&'r str, &'r str, PartOfSpeech, WordKind);
        let mut distinct: HashMap<DistinctKey<'_>, (&WordRow, i32)> = HashMap::new();
        for row in &self.rows {
            let Some(frequency) = query.ceilings.for_kind(row.kind) else {
                continue;
            };
            let key_ok = match query.mode {
                SearchMode::Exact => row.stroke == query.key,
                SearchMode::Prefix | SearchMode::Link => query.key_matches(&row.stroke),
            };
            if !key_ok {
                continue;
            }
            if let Some(prev) = link {
                let linked = row
                    .prev
                    .as_ref()
                    .is_some_and(|p| p.stroke == prev.stroke && p.candidate == prev.candidate);
                if !linked {
                    continue;
                }
            }
            let k = (
                row.stroke.as_str(),
                row.candidate.as_str(),
                row.part_of_speech,
                row.kind,
            );
            // Rows are ascending by id, so the last one seen is the newest.
            distinct.insert(k, (row, frequency));
        }

        let mut hits: Vec<(&WordRow, i32)> = distinct.into_values().collect();
        match query.order {
            SearchOrder::Frequency => {
                hits.sort_by(|(a, fa), (b, fb)| fb.cmp(fa).then(b.id.cmp(&a.id)));
            }
            SearchOrder::Key => {
                hits.sort_by(|(a, fa), (b, fb)| {
                    b.kind
                        .cmp(&a.kind)
                        .then(a.stroke.cmp(&b.stroke))
                        .then(fb.cmp(fa))
                        .then(b.id.cmp(&a.id))
                });
            }
        }
        hits.into_iter().map(|(r, f)| r.to_word(f)).collect()
    }

    /// Register words in the user dictionary.
    ///
    /// The whole batch is rejected with `DictError::Full` when it would push
    /// the user count past the cap, and with `DictError::InvalidWord` when
    /// any word is empty or too long. Otherwise words already present are
    /// reported as `Duplicate` and the rest are added in one transaction.
    pub fn add_words(&mut self, words: &[WnnWord]) -> Result<AddReport, DictError> {
        let count = self.len(WordKind::User);
        if count + words.len() > self.limits.max_user_words {
            return Err(DictError::Full(self.limits.max_user_words));
        }
        for word in words {
            self.validate(word)?;
        }

        let mut report = AddReport::default();
        let mut insert: Vec<WordRow> = Vec::new();
        let mut next_id = self.next_id;
        for word in words {
            let exists = self.rows.iter().any(|r| r.is(WordKind::User, word))
                || insert
                    .iter()
                    .any(|r| r.stroke == word.stroke && r.candidate == word.candidate);
            if exists {
                report.statuses.push(AddStatus::Duplicate);
                continue;
            }
            insert.push(WordRow {
                id: next_id,
                kind: WordKind::User,
                stroke: word.stroke.clone(),
                candidate: word.candidate.clone(),
                part_of_speech: word.part_of_speech,
                prev: None,
            });
            next_id += 1;
            report.statuses.push(AddStatus::Added);
        }

        if !insert.is_empty() {
            self.commit(Transaction::Apply {
                remove: Vec::new(),
                insert,
            })?;
        }
        Ok(report)
    }

    /// Remove user words matching `(stroke, candidate)`. Returns the number
    /// of rows removed.
    pub fn remove_words(&mut self, words: &[WnnWord]) -> Result<usize, DictError> {
        let remove: Vec<i64> = self
            .rows
            .iter()
            .filter(|r| words.iter().any(|w| r.is(WordKind::User, w)))
            .map(|r| r.id)
            .collect();
        let removed = remove.len();
        if removed > 0 {
            self.commit(Transaction::Apply {
                remove,
                insert: Vec::new(),
            })?;
        }
        Ok(removed)
    }

    /// Record a committed word, optionally linked to the word committed
    /// before it.
    ///
    /// At the cap the oldest row with the same `(stroke, candidate)` is
    /// evicted, or the globally oldest learned row if there is none. The
    /// eviction and the insert form one transaction.
    pub fn learn(&mut self, word: &WnnWord, prev: Option<&WnnWord>) -> Result<(), DictError> {
        self.validate(word)?;
        let prev = prev.filter(|p| self.validate(p).is_ok()).map(|p| PrevWord {
            stroke: p.stroke.clone(),
            candidate: p.candidate.clone(),
            part_of_speech: p.part_of_speech,
        });

        let mut remove = Vec::new();
        if self.len(WordKind::Learned) >= self.limits.max_learned_words {
            let learned = || self.rows.iter().filter(|r| r.kind == WordKind::Learned);
            let victim = learned()
                .find(|r| r.is(WordKind::Learned, word))
                .or_else(|| learned().next());
            if let Some(victim) = victim {
                debug!(id = victim.id, stroke = %victim.stroke, "evicting learned word");
                remove.push(victim.id);
            }
        }

        let row = WordRow {
            id: self.next_id,
            kind: WordKind::Learned,
            stroke: word.stroke.clone(),
            candidate: word.candidate.clone(),
            part_of_speech: word.part_of_speech,
            prev,
        };
        self.commit(Transaction::Apply {
            remove,
            insert: vec![row],
        })
    }

    pub fn clear_user(&mut self) -> Result<(), DictError> {
        self.commit(Transaction::Clear(WordKind::User))
    }

    pub fn clear_learned(&mut self) -> Result<(), DictError> {
        self.commit(Transaction::Clear(WordKind::Learned))
    }

    /// Write the full state to the checkpoint file and truncate the WAL.
    /// No-op for an in-memory store.
    pub fn checkpoint(&mut self) -> Result<(), DictError> {
        if self.wal.is_none() {
            return Ok(());
        }
        let bytes = self.to_bytes()?;
        if let Some(wal) = self.wal.as_mut() {
            save_atomic(wal.checkpoint_path(), &bytes)?;
            wal.truncate_wal()?;
        }
        Ok(())
    }

    /// Serialize to bytes (WNDS format).
    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let data = StoreData {
            next_id: self.next_id,
            rows: self.rows.clone(),
        };
        let body = bincode::serialize(&data).map_err(DictError::Serialize)?;
        let mut buf = Vec::with_capacity(5 + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Deserialize from bytes (WNDS format).
    pub fn from_bytes(bytes: &[u8], limits: StoreLimits) -> Result<Self, DictError> {
        if bytes.len() < 5 {
            return Err(DictError::InvalidHeader);
        }
        if &bytes[0..4] != MAGIC {
            return Err(DictError::InvalidMagic);
        }
        if bytes[4] != VERSION {
            return Err(DictError::UnsupportedVersion(bytes[4]));
        }
        let mut data: StoreData =
            bincode::deserialize(&bytes[5..]).map_err(DictError::Deserialize)?;
        data.rows.sort_by_key(|r| r.id);
        let next_id = data
            .rows
            .last()
            .map_or(data.next_id, |r| data.next_id.max(r.id + 1));
        Ok(Self {
            rows: data.rows,
            next_id,
            limits,
            wal: None,
        })
    }

    fn validate(&self, word: &WnnWord) -> Result<(), DictError> {
        let stroke_len = word.stroke.chars().count();
        let candidate_len = word.candidate.chars().count();
        if stroke_len == 0 || candidate_len == 0 {
            return Err(DictError::InvalidWord("empty stroke or candidate".to_string()));
        }
        if stroke_len > self.limits.max_stroke_length {
            return Err(DictError::InvalidWord(format!(
                "stroke longer than {}",
                self.limits.max_stroke_length
            )));
        }
        if candidate_len > self.limits.max_candidate_length {
            return Err(DictError::InvalidWord(format!(
                "candidate longer than {}",
                self.limits.max_candidate_length
            )));
        }
        Ok(())
    }

    fn commit(&mut self, tx: Transaction) -> Result<(), DictError> {
        let _span = debug_span!("store_txn").entered();
        if let Some(wal) = self.wal.as_mut() {
            wal.append(&tx)?;
        }
        self.apply(tx);
        if self.wal.as_ref().is_some_and(|w| w.needs_compact()) {
            if let Err(e) = self.checkpoint() {
                warn!(error = %e, "store checkpoint failed, WAL kept");
            }
        }
        Ok(())
    }

    /// Apply a transaction to the in-memory table. Used by `commit` and by
    /// WAL replay.
    pub(crate) fn apply(&mut self, tx: Transaction) {
        match tx {
            Transaction::Apply { remove, insert } => {
                if !remove.is_empty() {
                    self.rows.retain(|r| !remove.contains(&r.id));
                }
                for row in insert {
                    self.next_id = self.next_id.max(row.id + 1);
                    self.rows.push(row);
                }
            }
            Transaction::Clear(kind) => {
                self.rows.retain(|r| r.kind != kind);
            }
        }
    }
}

/// Atomic write: write to .tmp then rename.
fn save_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
