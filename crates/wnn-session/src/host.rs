//! The host-owned text buffer the engine commits into.

/// Editing surface of the host application.
///
/// Positions and lengths are in characters. The engine never owns the
/// buffer: anything may change between two calls.
pub trait TextBuffer {
    /// Replace the composing region (or insert at the cursor) with `text`
    /// and drop the region. `cursor_hint > 0` places the cursor relative to
    /// the end of `text` (1 = just after it); `<= 0` relative to its start.
    fn commit_text(&mut self, text: &str, cursor_hint: isize);

    /// Replace the composing region (or insert at the cursor) with `text`,
    /// which becomes the new composing region.
    fn set_composing_text(&mut self, text: &str, cursor_hint: isize);

    /// Keep the composing text as ordinary text.
    fn finish_composing_text(&mut self);

    fn text_before_cursor(&self, n: usize) -> String;

    fn text_after_cursor(&self, n: usize) -> String;

    fn delete_surrounding_text(&mut self, before: usize, after: usize);

    fn cursor_position(&self) -> usize;
}

/// In-memory `TextBuffer`.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    text: Vec<char>,
    cursor: usize,
    composing: Option<(usize, usize)>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `text` with the cursor at its end.
    pub fn with_text(text: &str) -> Self {
        let text: Vec<char> = text.chars().collect();
        let cursor = text.len();
        Self {
            text,
            cursor,
            composing: None,
        }
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn composing_text(&self) -> Option<String> {
        self.composing
            .map(|(from, to)| self.text[from..to].iter().collect())
    }

    /// Move the caret as a user tapping elsewhere would.
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.text.len());
    }

    /// Delete `len` characters at `at` as another editor would, shifting the
    /// cursor and dropping the composing region.
    pub fn external_delete(&mut self, at: usize, len: usize) {
        let from = at.min(self.text.len());
        let to = (at + len).min(self.text.len());
        self.text.drain(from..to);
        if self.cursor > from {
            self.cursor -= (self.cursor - from).min(to - from);
        }
        self.composing = None;
    }

    /// Insert `text` at `at` as another editor would.
    pub fn external_insert(&mut self, at: usize, text: &str) {
        let at = at.min(self.text.len());
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        self.text.splice(at..at, chars);
        if self.cursor >= at {
            self.cursor += n;
        }
        self.composing = None;
    }

    fn replace_region(&mut self, text: &str, cursor_hint: isize) -> (usize, usize) {
        let (from, to) = self.composing.unwrap_or((self.cursor, self.cursor));
        let chars: Vec<char> = text.chars().collect();
        let end = from + chars.len();
        self.text.splice(from..to, chars);
        let target = if cursor_hint > 0 {
            end as isize + cursor_hint - 1
        } else {
            from as isize + cursor_hint
        };
        self.cursor = target.clamp(0, self.text.len() as isize) as usize;
        (from, end)
    }
}

impl TextBuffer for MemoryBuffer {
    fn commit_text(&mut self, text: &str, cursor_hint: isize) {
        self.replace_region(text, cursor_hint);
        self.composing = None;
    }

    fn set_composing_text(&mut self, text: &str, cursor_hint: isize) {
        let (from, end) = self.replace_region(text, cursor_hint);
        self.composing = (from < end).then_some((from, end));
    }

    fn finish_composing_text(&mut self) {
        self.composing = None;
    }

    fn text_before_cursor(&self, n: usize) -> String {
        let from = self.cursor.saturating_sub(n);
        self.text[from..self.cursor].iter().collect()
    }

    fn text_after_cursor(&self, n: usize) -> String {
        let to = (self.cursor + n).min(self.text.len());
        self.text[self.cursor..to].iter().collect()
    }

    fn delete_surrounding_text(&mut self, before: usize, after: usize) {
        let from = self.cursor.saturating_sub(before);
        let to = (self.cursor + after).min(self.text.len());
        self.text.drain(from..to);
        self.cursor = from;
        self.composing = None;
    }

    fn cursor_position(&self) -> usize {
        self.cursor
    }
}
