//! Candidate presentation boundary.

use wnn_core::word::WnnWord;

use crate::state::EngineState;

pub trait CandidateView {
    fn display(&mut self, candidates: &[WnnWord]);

    fn clear(&mut self);

    /// Move the highlight; `None` removes it.
    fn focus(&mut self, index: Option<usize>);

    fn focused_index(&self) -> Option<usize>;

    /// Called after a transition that had effects.
    fn state_changed(&mut self, _state: &EngineState) {}
}

/// A view that keeps the last displayed list in memory.
#[derive(Debug, Default)]
pub struct ListView {
    candidates: Vec<WnnWord>,
    focused: Option<usize>,
    state_changes: usize,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates(&self) -> &[WnnWord] {
        &self.candidates
    }

    pub fn surfaces(&self) -> Vec<&str> {
        self.candidates.iter().map(|w| w.candidate.as_str()).collect()
    }

    pub fn state_changes(&self) -> usize {
        self.state_changes
    }
}

impl CandidateView for ListView {
    fn display(&mut self, candidates: &[WnnWord]) {
        self.candidates = candidates.to_vec();
        self.focused = None;
    }

    fn clear(&mut self) {
        self.candidates.clear();
        self.focused = None;
    }

    fn focus(&mut self, index: Option<usize>) {
        self.focused = index.filter(|i| *i < self.candidates.len());
    }

    fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    fn state_changed(&mut self, _state: &EngineState) {
        self.state_changes += 1;
    }
}
