//! Contract of the read-only "native" dictionary engine.
//!
//! The engine is a synchronous ranked-result iterator: `search` primes a
//! result set and returns its size, `next_result` drains it. Implementations
//! are owned by exactly one coordinator and are never called re-entrantly.
//! Resources they hold are released by `Drop`.

use super::approx::ApproxRule;
use super::{NativeError, SearchMode, SearchOrder};
use crate::word::WnnWord;

/// Built-in symbol lists, cycled by the symbol key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolList {
    Japanese,
    Face,
}

impl SymbolList {
    pub const ALL: [SymbolList; 2] = [SymbolList::Japanese, SymbolList::Face];

    /// The list after `self`, wrapping around.
    pub fn next(self) -> SymbolList {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn entries(self) -> &'static [&'static str] {
        match self {
            SymbolList::Japanese => &[
                "。", "、", "・", "「", "」", "『", "』", "【", "】", "〒", "※", "〜", "…", "ー",
                "！", "？", "☆", "★", "○", "●", "◎", "□", "■", "△", "▲", "→", "←", "↑", "↓",
            ],
            SymbolList::Face => &[
                "(^_^)", "(^^;", "(T_T)", "(>_<)", "(*^_^*)", "(^o^)", "(-_-)", "(;_;)",
                "m(_ _)m", "(^_^)v", "(o_o)", "(@_@)",
            ],
        }
    }
}

/// Which dictionary variant the native engine should search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictionaryTarget {
    Jp,
    JpPersonName,
    JpPostalAddress,
    /// Phrase conversion variant of the Japanese dictionary.
    JpReadingToKanji,
    En,
    EnEmailOrUri,
    Symbol(SymbolList),
    /// The user's registered words only.
    UserWords,
}

impl DictionaryTarget {
    /// Target to use when an engine has no dictionary for `self`.
    pub fn fallback(self) -> DictionaryTarget {
        match self {
            DictionaryTarget::JpPersonName
            | DictionaryTarget::JpPostalAddress
            | DictionaryTarget::JpReadingToKanji
            | DictionaryTarget::UserWords => DictionaryTarget::Jp,
            DictionaryTarget::EnEmailOrUri => DictionaryTarget::En,
            other => other,
        }
    }

    pub fn is_symbol(self) -> bool {
        matches!(self, DictionaryTarget::Symbol(_))
    }
}

pub trait NativeSearch: Send {
    fn select_dictionary(&mut self, target: DictionaryTarget) -> Result<(), NativeError>;

    /// Prime a result set. Returns the number of results available.
    fn search(&mut self, mode: SearchMode, order: SearchOrder, key: &str) -> Result<usize, NativeError>;

    /// Next result of the last search, or `None` when drained.
    fn next_result(&mut self) -> Option<WnnWord>;

    fn set_approx_pattern(&mut self, rule: ApproxRule) -> Result<(), NativeError>;

    fn clear_approx_pattern(&mut self);

    /// Record a committed word; also remembered as the link predecessor.
    fn learn(&mut self, word: &WnnWord) -> Result<(), NativeError>;

    /// Forget the link predecessor.
    fn break_sequence(&mut self);
}
