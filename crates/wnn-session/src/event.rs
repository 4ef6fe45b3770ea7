use crate::state::Transition;
use crate::timer::TimerToken;

/// One dispatched input, each variant carrying only what it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Char(char),
    Backspace,
    CursorLeft,
    CursorRight,
    /// Start clause conversion, or move to the next candidate.
    Convert,
    Enter,
    Cancel,
    SelectCandidate(usize),
    FocusNext,
    SymbolKey,
    ChangeState(Transition),
    SetLearning(bool),
    /// Caret change reported by the host. `composing` is whether the host
    /// still has a composing region.
    SelectionUpdate {
        old_end: usize,
        new_end: usize,
        composing: bool,
    },
    TimerFired(TimerToken),
    FocusLost,
}

/// What the host should know after an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub consumed: bool,
    /// Everything committed into the buffer during this event.
    pub commit: Option<String>,
    /// An English delimiter triggered an automatic commit.
    pub auto_committed: bool,
    /// Token of a newly scheduled delayed prediction.
    pub prediction: Option<TimerToken>,
}

impl Response {
    pub(crate) fn consumed() -> Self {
        Self {
            consumed: true,
            ..Self::default()
        }
    }

    pub(crate) fn not_consumed() -> Self {
        Self::default()
    }
}

pub(crate) fn cyclic_index(current: usize, delta: isize, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let n = count as isize;
    ((current as isize + delta).rem_euclid(n)) as usize
}

/// Characters that end an English word.
pub(crate) fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || ".,;:!?()[]{}<>\"/@&*+=|_".contains(c)
}
