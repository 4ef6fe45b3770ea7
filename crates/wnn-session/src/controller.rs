//! Per-session orchestration: keystroke to buffer mutation to search to
//! candidate display to commit.

use std::time::{Duration, Instant};

use tracing::{debug, debug_span, warn};

use wnn_core::composing::{ComposingText, Layer, StrSegment};
use wnn_core::dict::ApproxProfile;
use wnn_core::letter::{LetterConverter, PassThrough};
use wnn_core::search::{Clause, SearchCoordinator};
use wnn_core::settings::Settings;
use wnn_core::word::WnnWord;

use crate::event::{cyclic_index, is_word_separator, InputEvent, Response};
use crate::host::TextBuffer;
use crate::state::{
    ConvertType, DictionarySet, EngineState, Keyboard, StateChange, StateEffect, TemporaryMode,
    Transition,
};
use crate::timer::{TimerSlot, TimerToken};
use crate::view::CandidateView;
use crate::watcher::{CommitCheck, CommitWatcher, SelectionOutcome};

/// Everything a session needs, handed over explicitly at construction.
pub struct SessionContext {
    pub settings: Settings,
    pub coordinator: SearchCoordinator,
    /// Converter for Japanese input; English input passes through.
    pub converter: Box<dyn LetterConverter>,
    pub view: Box<dyn CandidateView>,
}

pub struct ConversionController {
    settings: Settings,
    coordinator: SearchCoordinator,
    converter: Box<dyn LetterConverter>,
    view: Box<dyn CandidateView>,

    state: EngineState,
    composing: ComposingText,
    /// Live conversion result, aligned with layer 2.
    clauses: Vec<Clause>,
    /// Clause whose alternatives are listed.
    target_clause: usize,
    candidates: Vec<WnnWord>,
    focused: Option<usize>,

    watcher: CommitWatcher,
    timer: TimerSlot,
    /// A space we inserted after an English word may be eaten by a
    /// following delimiter.
    auto_delete_space: bool,
    /// Text committed during the current event.
    turn_commit: String,
}

fn approx_profile(keyboard: Keyboard) -> ApproxProfile {
    match keyboard {
        Keyboard::Qwerty => ApproxProfile::Qwerty,
        Keyboard::TwelveKey => ApproxProfile::TwelveKey,
    }
}

fn letter_converter<'a>(state: &EngineState, jp: &'a dyn LetterConverter) -> &'a dyn LetterConverter {
    match state.dictionary_set {
        DictionarySet::Jp => jp,
        DictionarySet::En => &PassThrough,
    }
}

impl ConversionController {
    pub fn new(ctx: SessionContext) -> Self {
        let SessionContext {
            settings,
            mut coordinator,
            converter,
            view,
        } = ctx;
        let state = EngineState::new(settings.engine.default_language.into());
        coordinator.select_target(state.active_target());
        coordinator.set_approx_profile(Some(approx_profile(state.keyboard)));
        let composing = ComposingText::new(settings.composing.max_segments);
        Self {
            settings,
            coordinator,
            converter,
            view,
            state,
            composing,
            clauses: Vec::new(),
            target_clause: 0,
            candidates: Vec::new(),
            focused: None,
            watcher: CommitWatcher::new(),
            timer: TimerSlot::new(),
            auto_delete_space: false,
            turn_commit: String::new(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn composing(&self) -> &ComposingText {
        &self.composing
    }

    pub fn is_composing(&self) -> bool {
        !self.composing.is_empty()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn candidates(&self) -> &[WnnWord] {
        &self.candidates
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn watcher(&self) -> &CommitWatcher {
        &self.watcher
    }

    pub fn coordinator(&self) -> &SearchCoordinator {
        &self.coordinator
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Run the delayed prediction if it is due at `now`. For hosts that
    /// poll instead of delivering `InputEvent::TimerFired`.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.timer.poll(now).is_none() {
            return false;
        }
        self.run_prediction();
        true
    }

    pub fn handle_event(&mut self, event: InputEvent, buffer: &mut dyn TextBuffer, now: Instant) -> Response {
        let _span = debug_span!("handle_event", ?event).entered();
        self.watcher.start_turn();
        self.turn_commit.clear();

        let mut resp = match event {
            InputEvent::Char(c) => self.on_char(c, buffer, now),
            InputEvent::Backspace => self.on_backspace(buffer, now),
            InputEvent::CursorLeft => self.on_cursor(-1, buffer),
            InputEvent::CursorRight => self.on_cursor(1, buffer),
            InputEvent::Convert => self.on_convert(buffer),
            InputEvent::Enter => self.on_enter(buffer),
            InputEvent::Cancel => self.on_cancel(buffer),
            InputEvent::SelectCandidate(index) => self.select_candidate(index, buffer),
            InputEvent::FocusNext => self.focus_next(buffer),
            InputEvent::SymbolKey => self.on_symbol_key(buffer),
            InputEvent::ChangeState(t) => self.on_change_state(t, buffer),
            InputEvent::SetLearning(enabled) => {
                self.coordinator.set_learning(enabled);
                Response::consumed()
            }
            InputEvent::SelectionUpdate {
                old_end,
                new_end,
                composing,
            } => self.on_selection_update(old_end, new_end, composing, buffer),
            InputEvent::TimerFired(token) => self.on_timer(token),
            InputEvent::FocusLost => self.on_focus_lost(buffer),
        };

        if !self.turn_commit.is_empty() {
            resp.commit = Some(std::mem::take(&mut self.turn_commit));
        }
        resp
    }

    // --- key handlers ---

    fn on_char(&mut self, c: char, buffer: &mut dyn TextBuffer, now: Instant) -> Response {
        if self.state.is_symbol_mode() {
            self.apply_transition(Transition::TemporaryMode(TemporaryMode::None));
        }
        if self.state.is_converting() {
            self.commit_converting(buffer);
        }

        if self.state.is_english() && is_word_separator(c) {
            let mut text = self.composing.to_string(Layer::Reading);
            text.push(c);
            let composing_len = self.display_len();
            self.watcher.begin(buffer, composing_len);
            self.reset_composing();
            self.commit_string(buffer, &text);
            let mut resp = Response::consumed();
            if self.watcher.check(buffer, 0) != CommitCheck::Diverged {
                resp.auto_committed = self.auto_commit_english(buffer);
                self.watcher.check(buffer, 0);
            }
            self.auto_delete_space = false;
            self.coordinator.break_sequence();
            self.clear_candidates();
            return resp;
        }

        let converter = letter_converter(&self.state, self.converter.as_ref());
        if !self.composing.insert(StrSegment::new(c.to_string()), converter) {
            return Response::consumed();
        }
        self.auto_delete_space = false;
        self.refresh_composing(buffer);
        let mut resp = Response::consumed();
        resp.prediction = self.schedule_prediction(now);
        resp
    }

    fn on_backspace(&mut self, buffer: &mut dyn TextBuffer, now: Instant) -> Response {
        if self.state.is_symbol_mode() {
            return self.on_cancel(buffer);
        }
        if self.state.is_converting() {
            self.cancel_conversion(buffer);
            return Response::consumed();
        }
        if self.composing.is_empty() {
            if !self.candidates.is_empty() {
                self.clear_candidates();
            }
            return Response::not_consumed();
        }
        let converter = letter_converter(&self.state, self.converter.as_ref());
        self.composing.delete(Layer::Reading, true, converter);
        if self.composing.is_empty() {
            buffer.set_composing_text("", 1);
            self.timer.cancel_all();
            self.clear_candidates();
            return Response::consumed();
        }
        self.refresh_composing(buffer);
        let mut resp = Response::consumed();
        resp.prediction = self.schedule_prediction(now);
        resp
    }

    fn on_cursor(&mut self, delta: isize, buffer: &mut dyn TextBuffer) -> Response {
        if self.state.is_converting() {
            let last = self.clauses.len().saturating_sub(1) as isize;
            let target = (self.target_clause as isize + delta).clamp(0, last) as usize;
            if target != self.target_clause {
                self.target_clause = target;
                self.show_clause_candidates();
            }
            return Response::consumed();
        }
        if self.composing.is_empty() {
            return Response::not_consumed();
        }
        self.composing.move_cursor(Layer::Reading, delta);
        self.refresh_composing(buffer);
        self.timer.cancel_all();
        if self.settings.prediction.enabled {
            self.run_prediction();
        } else {
            self.clear_candidates();
        }
        Response::consumed()
    }

    fn on_convert(&mut self, buffer: &mut dyn TextBuffer) -> Response {
        if self.composing.is_empty() || self.state.is_english() || self.state.is_symbol_mode() {
            if self.candidates.is_empty() {
                return Response::not_consumed();
            }
            return self.focus_next(buffer);
        }
        if self.state.is_converting() {
            return self.focus_next(buffer);
        }
        self.apply_transition(Transition::ConvertType(ConvertType::ConsecutiveClause));
        self.start_conversion(buffer);
        Response::consumed()
    }

    fn on_enter(&mut self, buffer: &mut dyn TextBuffer) -> Response {
        if self.state.is_converting() {
            self.commit_converting(buffer);
            return Response::consumed();
        }
        if let Some(index) = self.focused_candidate() {
            return self.select_candidate(index, buffer);
        }
        if self.composing.is_empty() {
            return Response::not_consumed();
        }
        self.commit_reading(buffer);
        Response::consumed()
    }

    fn on_cancel(&mut self, buffer: &mut dyn TextBuffer) -> Response {
        if self.state.is_symbol_mode() {
            self.apply_transition(Transition::TemporaryMode(TemporaryMode::None));
            return Response::consumed();
        }
        if self.state.is_converting() {
            self.cancel_conversion(buffer);
            return Response::consumed();
        }
        if !self.composing.is_empty() {
            buffer.set_composing_text("", 1);
            self.reset_composing();
            self.timer.cancel_all();
            self.clear_candidates();
            return Response::consumed();
        }
        if !self.candidates.is_empty() {
            self.clear_candidates();
            return Response::consumed();
        }
        Response::not_consumed()
    }

    fn on_symbol_key(&mut self, buffer: &mut dyn TextBuffer) -> Response {
        if self.state.is_symbol_mode() {
            let change = self.state.cycle_symbol_list();
            self.perform(change);
        } else {
            self.commit_all(buffer);
            self.apply_transition(Transition::TemporaryMode(TemporaryMode::Symbol));
        }
        Response::consumed()
    }

    fn on_change_state(&mut self, transition: Transition, buffer: &mut dyn TextBuffer) -> Response {
        match transition {
            Transition::DictionarySet(set) if set != self.state.dictionary_set => {
                self.commit_without_last_alphabet(buffer);
            }
            Transition::TemporaryMode(mode) if mode != self.state.temporary_mode => {
                self.commit_all(buffer);
            }
            _ => {}
        }
        self.apply_transition(transition);

        // Keep the live conversion in step with the convert-type axis.
        if self.state.is_converting() && self.clauses.is_empty() {
            if self.composing.is_empty() {
                self.apply_transition(Transition::ConvertType(ConvertType::None));
            } else {
                self.start_conversion(buffer);
            }
        } else if !self.state.is_converting() && !self.clauses.is_empty() {
            self.cancel_conversion(buffer);
        }
        Response::consumed()
    }

    fn on_selection_update(
        &mut self,
        old_end: usize,
        new_end: usize,
        host_composing: bool,
        buffer: &mut dyn TextBuffer,
    ) -> Response {
        if self.state.is_symbol_mode() {
            return Response::consumed();
        }
        if !self.composing.is_empty() && host_composing {
            return Response::consumed();
        }
        let outcome = self.watcher.on_selection_update(old_end, new_end);
        let lost_composing = !host_composing && !self.composing.is_empty();
        if outcome == SelectionOutcome::Moved || lost_composing {
            debug!(?outcome, lost_composing, "caret moved outside tracked text");
            self.coordinator.break_sequence();
            if lost_composing {
                buffer.finish_composing_text();
            }
            self.reset_screen();
        }
        Response::consumed()
    }

    fn on_timer(&mut self, token: TimerToken) -> Response {
        if !self.timer.fire(token) {
            return Response::not_consumed();
        }
        self.run_prediction();
        Response::consumed()
    }

    fn on_focus_lost(&mut self, buffer: &mut dyn TextBuffer) -> Response {
        self.timer.cancel_all();
        if !self.composing.is_empty() {
            buffer.finish_composing_text();
        }
        self.reset_screen();
        self.watcher.clear();
        self.coordinator.break_sequence();
        Response::consumed()
    }

    // --- candidates ---

    fn focus_next(&mut self, buffer: &mut dyn TextBuffer) -> Response {
        if self.candidates.is_empty() {
            return Response::not_consumed();
        }
        let next = match self.focused {
            None => 0,
            Some(i) => cyclic_index(i, 1, self.candidates.len()),
        };
        self.focused = Some(next);
        self.view.focus(self.focused);
        if self.state.is_converting() {
            let word = self.candidates[next].clone();
            self.set_clause_word(self.target_clause, word);
            self.refresh_composing(buffer);
        }
        Response::consumed()
    }

    fn focused_candidate(&self) -> Option<usize> {
        self.view
            .focused_index()
            .or(self.focused)
            .filter(|i| *i < self.candidates.len())
    }

    fn select_candidate(&mut self, index: usize, buffer: &mut dyn TextBuffer) -> Response {
        let Some(word) = self.candidates.get(index).cloned() else {
            return Response::not_consumed();
        };
        if self.state.is_converting() {
            self.commit_clauses_through(word, buffer);
        } else if self.state.is_symbol_mode() {
            self.watcher.begin(buffer, 0);
            self.commit_string(buffer, &word.candidate);
            self.watcher.check(buffer, 0);
        } else {
            self.commit_prediction(word, buffer);
        }
        Response::consumed()
    }

    fn show_candidates(&mut self) {
        self.candidates = self.coordinator.drain_candidates();
        self.focused = None;
        if self.candidates.is_empty() {
            self.view.clear();
        } else {
            self.view.display(&self.candidates);
        }
    }

    fn clear_candidates(&mut self) {
        self.candidates.clear();
        self.focused = None;
        self.view.clear();
    }

    fn schedule_prediction(&mut self, now: Instant) -> Option<TimerToken> {
        let prediction = &self.settings.prediction;
        if !prediction.enabled {
            self.clear_candidates();
            return None;
        }
        let delay = if self.candidates.is_empty() {
            prediction.first_delay_ms
        } else {
            prediction.showing_delay_ms
        };
        Some(self.timer.schedule_after(now, Duration::from_millis(delay)))
    }

    fn run_prediction(&mut self) {
        if self.state.is_converting() {
            return;
        }
        if self.composing.is_empty() {
            self.coordinator.predict_link();
        } else {
            // A selection commits the reading before the caret only.
            let cursor = self.composing.cursor(Layer::Reading);
            if !self.state.is_english() && cursor < self.composing.size(Layer::Reading) {
                let key = self.composing.to_string_range(Layer::Reading, 0, cursor);
                if key.is_empty() {
                    self.clear_candidates();
                    return;
                }
                let len = key.chars().count();
                self.coordinator.predict(&key, 0, Some(len));
            } else {
                let key = self.composing.to_string(Layer::Reading);
                self.coordinator.predict(&key, 0, None);
            }
        }
        self.show_candidates();
    }

    // --- conversion ---

    fn start_conversion(&mut self, buffer: &mut dyn TextBuffer) {
        self.timer.cancel_all();
        let reading = self.composing.segments(Layer::Reading).to_vec();
        let clauses = if self.state.convert_type == ConvertType::ReadingToKanji {
            let text = self.composing.to_string(Layer::Reading);
            vec![Clause {
                from: 0,
                to: reading.len(),
                reading: text.clone(),
                word: WnnWord::new(text.clone(), text),
            }]
        } else {
            self.coordinator.convert(&reading)
        };
        let segments = clauses.iter().map(Clause::to_segment).collect();
        if !self.composing.set_clauses(segments) {
            warn!("conversion result does not cover the reading, abandoned");
            self.apply_transition(Transition::ConvertType(ConvertType::None));
            return;
        }
        self.clauses = clauses;
        self.target_clause = 0;
        self.show_clause_candidates();
        if self.state.convert_type == ConvertType::ReadingToKanji {
            if let Some(best) = self.candidates.first().cloned() {
                self.set_clause_word(0, best);
            }
        }
        self.refresh_composing(buffer);
    }

    fn show_clause_candidates(&mut self) {
        if let Some(clause) = self.clauses.get(self.target_clause) {
            self.coordinator.make_candidate_list_of(clause);
            self.show_candidates();
        }
    }

    fn set_clause_word(&mut self, index: usize, word: WnnWord) {
        if let Some(clause) = self.clauses.get_mut(index) {
            self.composing.set_clause_text(index, word.candidate.clone());
            clause.word = word;
        }
    }

    fn cancel_conversion(&mut self, buffer: &mut dyn TextBuffer) {
        self.clauses.clear();
        self.target_clause = 0;
        self.composing.reset_clauses();
        if self.state.is_converting() {
            self.apply_transition(Transition::ConvertType(ConvertType::None));
        }
        self.refresh_composing(buffer);
        self.run_prediction();
    }

    // --- commits ---

    /// Commit `text` into the buffer and record it with the watcher.
    fn commit_string(&mut self, buffer: &mut dyn TextBuffer, text: &str) {
        if text.is_empty() {
            return;
        }
        buffer.commit_text(text, 1);
        self.watcher.record(text);
        self.turn_commit.push_str(text);
    }

    /// Commit clauses up to and including the target, the target as `word`.
    fn commit_clauses_through(&mut self, word: WnnWord, buffer: &mut dyn TextBuffer) {
        let target = self.target_clause.min(self.clauses.len().saturating_sub(1));
        self.watcher.begin(buffer, self.display_len());
        self.set_clause_word(target, word);

        let committed: Vec<Clause> = self.clauses.drain(..=target).collect();
        let text: String = committed.iter().map(|c| c.word.candidate.as_str()).collect();
        for clause in &committed {
            self.coordinator.learn(&clause.word);
        }
        let converter = letter_converter(&self.state, self.converter.as_ref());
        self.composing.delete_range(Layer::Clause, 0, target + 1, converter);
        let shift = committed.last().map_or(0, |c| c.to);
        for clause in &mut self.clauses {
            clause.from -= shift;
            clause.to -= shift;
        }
        self.commit_string(buffer, &text);

        if self.clauses.is_empty() {
            self.reset_composing();
            self.apply_transition(Transition::ConvertType(ConvertType::None));
            self.watcher.check(buffer, 0);
            self.run_prediction();
        } else if !self.composing.has_clauses() {
            // The rest of the reading re-derived differently; keep it as
            // plain composing text.
            self.clauses.clear();
            self.apply_transition(Transition::ConvertType(ConvertType::None));
            self.refresh_composing(buffer);
            self.watcher.check(buffer, self.display_len());
            self.run_prediction();
        } else {
            self.target_clause = 0;
            self.refresh_composing(buffer);
            self.watcher.check(buffer, self.display_len());
            self.show_clause_candidates();
        }
    }

    fn commit_converting(&mut self, buffer: &mut dyn TextBuffer) {
        if self.clauses.is_empty() {
            self.apply_transition(Transition::ConvertType(ConvertType::None));
            return;
        }
        self.target_clause = self.clauses.len() - 1;
        let word = self.clauses[self.target_clause].word.clone();
        self.commit_clauses_through(word, buffer);
    }

    fn commit_prediction(&mut self, word: WnnWord, buffer: &mut dyn TextBuffer) {
        self.timer.cancel_all();
        self.watcher.begin(buffer, self.display_len());
        self.coordinator.learn(&word);

        let cursor = self.composing.cursor(Layer::Reading);
        let converter = letter_converter(&self.state, self.converter.as_ref());
        if self.state.is_english() {
            self.composing.clear();
        } else {
            self.composing.delete_range(Layer::Reading, 0, cursor, converter);
            let size = self.composing.size(Layer::Reading);
            self.composing.set_cursor(Layer::Reading, size);
        }
        self.commit_string(buffer, &word.candidate);
        if self.state.is_english() {
            self.commit_space_just_one(buffer);
            self.auto_delete_space = true;
        }

        if self.composing.is_empty() {
            self.watcher.check(buffer, 0);
            self.run_prediction();
        } else {
            self.refresh_composing(buffer);
            self.watcher.check(buffer, self.display_len());
            self.run_prediction();
        }
    }

    /// Commit the reading as typed, without learning.
    fn commit_reading(&mut self, buffer: &mut dyn TextBuffer) {
        self.timer.cancel_all();
        let text = self.composing.to_string(Layer::Reading);
        self.watcher.begin(buffer, self.display_len());
        self.reset_composing();
        self.commit_string(buffer, &text);
        self.watcher.check(buffer, 0);
        self.clear_candidates();
    }

    fn commit_all(&mut self, buffer: &mut dyn TextBuffer) {
        if self.state.is_converting() {
            self.commit_converting(buffer);
        } else if !self.composing.is_empty() {
            self.commit_reading(buffer);
        }
        self.clear_candidates();
    }

    /// Commit the reading but keep a trailing unconverted letter composing.
    fn commit_without_last_alphabet(&mut self, buffer: &mut dyn TextBuffer) {
        if self.state.is_converting() || self.composing.is_empty() {
            self.commit_all(buffer);
            return;
        }
        let size = self.composing.size(Layer::Reading);
        let alphabet_last = self
            .composing
            .segment(Layer::Reading, -1)
            .and_then(|s| s.text.chars().last())
            .is_some_and(|c| c.is_ascii_alphabetic());
        if !alphabet_last || size < 2 {
            self.commit_all(buffer);
            return;
        }
        self.timer.cancel_all();
        let text = self.composing.to_string_range(Layer::Reading, 0, size - 1);
        self.watcher.begin(buffer, self.display_len());
        let converter = letter_converter(&self.state, self.converter.as_ref());
        self.composing.delete_range(Layer::Reading, 0, size - 1, converter);
        self.commit_string(buffer, &text);
        self.refresh_composing(buffer);
        self.watcher.check(buffer, self.display_len());
        self.clear_candidates();
    }

    fn commit_space_just_one(&mut self, buffer: &mut dyn TextBuffer) {
        if !buffer.text_before_cursor(1).ends_with(' ') {
            self.commit_string(buffer, " ");
        }
    }

    /// After an English delimiter: drop the space we inserted before it.
    fn auto_commit_english(&mut self, buffer: &mut dyn TextBuffer) -> bool {
        if !self.state.is_english() || !self.watcher.may_auto_commit() {
            return false;
        }
        let before: Vec<char> = buffer.text_before_cursor(2).chars().collect();
        let Some(&last) = before.last() else {
            return false;
        };
        if !is_word_separator(last) {
            return false;
        }
        if before.len() == 2 && before[0] == ' ' && self.auto_delete_space {
            buffer.delete_surrounding_text(2, 0);
            self.watcher.begin(buffer, 0);
            let delimiter = last.to_string();
            buffer.commit_text(&delimiter, 1);
            self.watcher.record(&delimiter);
            debug!(%delimiter, "auto-deleted space before delimiter");
        }
        self.timer.cancel_all();
        self.clear_candidates();
        true
    }

    // --- state ---

    fn apply_transition(&mut self, transition: Transition) {
        let change = self.state.apply(transition);
        self.perform(change);
    }

    fn perform(&mut self, change: StateChange) {
        if change.is_noop() {
            return;
        }
        let mut show_symbols = false;
        for effect in &change.effects {
            match *effect {
                StateEffect::SelectDictionary(target) => self.coordinator.select_target(target),
                StateEffect::BreakSequence => self.coordinator.break_sequence(),
                StateEffect::SelectKeyboard(keyboard) => {
                    self.coordinator.set_approx_profile(Some(approx_profile(keyboard)));
                }
                StateEffect::EnterSymbolList(_) => show_symbols = true,
                StateEffect::RestoreConverter => self.clear_candidates(),
            }
        }
        if show_symbols {
            self.coordinator.predict("", 0, None);
            self.show_candidates();
        }
        self.view.state_changed(&self.state);
    }

    // --- composing display ---

    fn display_text(&self) -> String {
        if self.composing.has_clauses() {
            self.composing.to_string(Layer::Clause)
        } else {
            self.composing.to_string(Layer::Reading)
        }
    }

    fn display_len(&self) -> usize {
        self.display_text().chars().count()
    }

    fn refresh_composing(&mut self, buffer: &mut dyn TextBuffer) {
        buffer.set_composing_text(&self.display_text(), 1);
    }

    fn reset_composing(&mut self) {
        self.composing.clear();
        self.clauses.clear();
        self.target_clause = 0;
    }

    /// Drop composing text, conversion and candidates without committing.
    fn reset_screen(&mut self) {
        self.reset_composing();
        if self.state.is_converting() {
            self.apply_transition(Transition::ConvertType(ConvertType::None));
        }
        self.timer.cancel_all();
        self.clear_candidates();
    }
}
