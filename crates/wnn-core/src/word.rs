use serde::{Deserialize, Serialize};

/// Left/right connection attributes of a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartOfSpeech {
    pub left: i32,
    pub right: i32,
}

impl PartOfSpeech {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }
}

/// The value flowing through search, learning and commit.
///
/// `stroke` is the search key (the reading), `candidate` the committable
/// surface. Two words are the same dictionary word when both match; `id`
/// and `frequency` are assigned by whichever dictionary produced the word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WnnWord {
    pub stroke: String,
    pub candidate: String,
    pub part_of_speech: PartOfSpeech,
    pub frequency: i32,
    pub id: i64,
}

impl WnnWord {
    pub fn new(candidate: impl Into<String>, stroke: impl Into<String>) -> Self {
        Self {
            stroke: stroke.into(),
            candidate: candidate.into(),
            ..Self::default()
        }
    }

    pub fn with_frequency(mut self, frequency: i32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_part_of_speech(mut self, pos: PartOfSpeech) -> Self {
        self.part_of_speech = pos;
        self
    }

    pub fn same_word(&self, other: &WnnWord) -> bool {
        self.stroke == other.stroke && self.candidate == other.candidate
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.stroke, &self.candidate)
    }
}

/// Which mutable store a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WordKind {
    User,
    Learned,
}
