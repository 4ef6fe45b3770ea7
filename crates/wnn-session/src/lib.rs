//! Conversion session over a host-owned text buffer.
//!
//! `ConversionController` owns the composing buffer, the mode state machine
//! and the search coordinator for one input session. Each dispatched
//! `InputEvent` mutates the composing text, runs or schedules a search, and
//! commits through `CommitWatcher`, which detects when the host buffer has
//! changed behind the engine's back.

mod controller;
mod event;
pub mod host;
pub mod state;
pub mod timer;
pub mod view;
pub mod watcher;

#[cfg(test)]
mod tests;

pub use controller::{ConversionController, SessionContext};
pub use event::{InputEvent, Response};
pub use host::{MemoryBuffer, TextBuffer};
pub use state::{
    ConvertType, DictionarySet, EngineState, Keyboard, PreferenceDictionary, StateChange,
    StateEffect, TemporaryMode, Transition,
};
pub use timer::{TimerSlot, TimerToken};
pub use view::{CandidateView, ListView};
pub use watcher::{CommitCheck, CommitWatcher, SelectionOutcome};
