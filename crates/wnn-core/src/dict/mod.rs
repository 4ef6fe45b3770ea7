//! Dictionary storage and search contracts.
//!
//! `DictionaryStore` holds the mutable user and learned words.
//! `NativeSearch` is the contract of the read-only fixed dictionary, with
//! `FixedDictionary` as the in-memory implementation.

pub mod approx;
mod fixed;
pub mod native;
mod store;
#[cfg(test)]
mod tests;
mod wal;

pub use approx::{ApproxProfile, ApproxRule, ApproxRules, QueryPlan};
pub use fixed::FixedDictionary;
pub use native::{DictionaryTarget, NativeSearch, SymbolList};
pub use store::{AddReport, AddStatus, DictionaryStore, StoreQuery, WordRow};
pub use wal::StoreWal;

use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// stroke == key
    Exact,
    /// stroke starts with key, after approximate expansion
    Prefix,
    /// Prefix, restricted to words linked to the previous word
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOrder {
    Frequency,
    Key,
}

/// Errors raised by the dictionary store and its persistence.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("dictionary full ({0} words)")]
    Full(usize),

    #[error("invalid word: {0}")]
    InvalidWord(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected WNDS)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Faults reported by a native search module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeError {
    #[error("native dictionary not ready")]
    NotReady,
    #[error("native dictionary fault (code {0})")]
    Fault(i32),
    #[error("dictionary target not available: {0:?}")]
    UnknownTarget(DictionaryTarget),
}

/// Frequency assigned to user and learned rows. `None` disables the kind:
/// its rows are skipped during search regardless of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyCeilings {
    pub user: Option<i32>,
    pub learned: Option<i32>,
}

impl FrequencyCeilings {
    pub const DISABLED: FrequencyCeilings = FrequencyCeilings {
        user: None,
        learned: None,
    };

    /// Ceiling of a `[base, high]` range, or `None` when the range is
    /// negative or inverted.
    pub fn from_range(base: i32, high: i32) -> Option<i32> {
        if base < 0 || high < 0 || base > high {
            None
        } else {
            Some(high)
        }
    }

    pub fn for_kind(&self, kind: crate::word::WordKind) -> Option<i32> {
        match kind {
            crate::word::WordKind::User => self.user,
            crate::word::WordKind::Learned => self.learned,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.user.is_some() || self.learned.is_some()
    }
}
