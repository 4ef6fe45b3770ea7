//! Tracks what the engine has written into the host buffer.
//!
//! Around every commit: `begin` anchors at the start of the composing
//! region, each commit is `record`ed, and `check` verifies the buffer still
//! holds exactly the recorded text at the anchor. Divergence drops the
//! anchor; the engine never tries to repair the host buffer.

use tracing::debug;

use crate::host::TextBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitCheck {
    Consistent,
    Diverged,
    /// No anchor: nothing to verify.
    Untracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Echo of one of our own commits.
    Expected,
    /// The caret stayed within the committed text.
    Inside,
    /// The caret left the committed text; tracking was dropped.
    Moved,
}

#[derive(Debug, Default)]
pub struct CommitWatcher {
    anchor: Option<usize>,
    pending: String,
    /// Commits whose selection echo has not arrived yet.
    commit_count: usize,
    diverged_this_turn: bool,
}

impl CommitWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking. `composing_len` is the length of the composing text
    /// currently shown before the cursor.
    pub fn begin(&mut self, buffer: &dyn TextBuffer, composing_len: usize) {
        self.anchor = Some(buffer.cursor_position().saturating_sub(composing_len));
        self.pending.clear();
    }

    /// Note text just committed into the buffer.
    pub fn record(&mut self, text: &str) {
        self.pending.push_str(text);
        self.commit_count += 1;
    }

    pub fn check(&mut self, buffer: &dyn TextBuffer, composing_len: usize) -> CommitCheck {
        let Some(anchor) = self.anchor else {
            return CommitCheck::Untracked;
        };
        let pending_len = self.pending.chars().count();
        let expected_cursor = anchor + pending_len + composing_len;
        let consistent = buffer.cursor_position() == expected_cursor && {
            let before = buffer.text_before_cursor(pending_len + composing_len);
            let committed: String = before.chars().take(pending_len).collect();
            committed == self.pending
        };
        if consistent {
            CommitCheck::Consistent
        } else {
            debug!(anchor, pending = %self.pending, "host buffer diverged");
            self.commit_count = 0;
            self.anchor = None;
            self.diverged_this_turn = true;
            CommitCheck::Diverged
        }
    }

    /// Selection change reported by the host while nothing is composing.
    pub fn on_selection_update(&mut self, old_end: usize, new_end: usize) -> SelectionOutcome {
        if self.commit_count > 0 {
            self.commit_count -= 1;
            return SelectionOutcome::Expected;
        }
        let Some(anchor) = self.anchor else {
            return SelectionOutcome::Inside;
        };
        let commit_end = anchor + self.pending.chars().count();
        if new_end < old_end || commit_end < new_end {
            self.anchor = None;
            SelectionOutcome::Moved
        } else {
            SelectionOutcome::Inside
        }
    }

    /// Mark the start of one event dispatch.
    pub fn start_turn(&mut self) {
        self.diverged_this_turn = false;
    }

    /// Whether an automatic commit may run in this turn.
    pub fn may_auto_commit(&self) -> bool {
        !self.diverged_this_turn
    }

    pub fn clear(&mut self) {
        self.anchor = None;
        self.pending.clear();
        self.commit_count = 0;
    }

    pub fn is_tracking(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn pending_text(&self) -> &str {
        &self.pending
    }

    pub fn commit_count(&self) -> usize {
        self.commit_count
    }
}
