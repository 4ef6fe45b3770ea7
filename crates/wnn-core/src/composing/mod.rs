//! Layered composing buffer.
//!
//! Layer 0 holds raw keystrokes, layer 1 the reading derived from layer 0 by
//! a `LetterConverter`, layer 2 the conversion clauses over layer 1. Each
//! segment of layer N+1 records the half-open range of layer-N segments it
//! was built from. Every mutation of a lower layer re-derives the layers above
//! it before returning, so no caller can observe a stale layer.


use tracing::debug;

use crate::letter::LetterConverter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Input = 0,
    Reading = 1,
    Clause = 2,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Input, Layer::Reading, Layer::Clause];

    fn index(self) -> usize {
        self as usize
    }
}

/// A run of text plus the range `[from, to)` of previous-layer segments it
/// came from. Layer-0 segments carry `0..0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrSegment {
    pub text: String,
    pub from: usize,
    pub to: usize,
}

impl StrSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            from: 0,
            to: 0,
        }
    }

    pub fn with_range(text: impl Into<String>, from: usize, to: usize) -> Self {
        Self {
            text: text.into(),
            from,
            to,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposingText {
    layers: [Vec<StrSegment>; 3],
    cursors: [usize; 3],
    max_segments: usize,
    /// Layer 2 holds conversion results rather than a mirror of layer 1.
    clauses_installed: bool,
}

impl ComposingText {
    pub fn new(max_segments: usize) -> Self {
        Self {
            layers: Default::default(),
            cursors: [0; 3],
            max_segments,
            clauses_installed: false,
        }
    }

    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    pub fn size(&self, layer: Layer) -> usize {
        self.layers[layer.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    pub fn cursor(&self, layer: Layer) -> usize {
        self.cursors[layer.index()]
    }

    pub fn segments(&self, layer: Layer) -> &[StrSegment] {
        &self.layers[layer.index()]
    }

    pub fn has_clauses(&self) -> bool {
        self.clauses_installed
    }

    /// Segment at `index`; negative indices count from the end (`-1` = last).
    pub fn segment(&self, layer: Layer, index: isize) -> Option<&StrSegment> {
        let segs = &self.layers[layer.index()];
        let idx = if index < 0 {
            segs.len().checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        segs.get(idx)
    }

    pub fn to_string(&self, layer: Layer) -> String {
        self.layers[layer.index()]
            .iter()
            .map(|s| s.text.as_str())
            .collect()
    }

    /// Concatenation of segments `from..to` (clamped).
    pub fn to_string_range(&self, layer: Layer, from: usize, to: usize) -> String {
        let segs = &self.layers[layer.index()];
        let to = to.min(segs.len());
        if from >= to {
            return String::new();
        }
        segs[from..to].iter().map(|s| s.text.as_str()).collect()
    }

    /// Set the cursor of `layer`, clamped to `0..=size(layer)`.
    ///
    /// Cursors of the other layers follow to the nearest segment boundary.
    pub fn set_cursor(&mut self, layer: Layer, pos: usize) -> usize {
        let pos = pos.min(self.size(layer));
        match layer {
            Layer::Input => {
                self.cursors[0] = pos;
                self.cursors[1] = self.reading_index_at_raw(pos);
                self.sync_clause_cursor();
            }
            Layer::Reading => {
                self.cursors[1] = pos;
                self.cursors[0] = self.raw_index_at_reading(pos);
                self.sync_clause_cursor();
            }
            Layer::Clause => {
                self.cursors[2] = pos;
            }
        }
        pos
    }

    /// Move the cursor of `layer` by `delta`, clamping at both ends.
    pub fn move_cursor(&mut self, layer: Layer, delta: isize) -> usize {
        let current = self.cursor(layer) as isize;
        let target = current.saturating_add(delta).max(0) as usize;
        self.set_cursor(layer, target)
    }

    /// Insert a raw segment at the layer-1 cursor and re-derive.
    ///
    /// Returns `false` and leaves the buffer untouched when layer 0 already
    /// holds `max_segments` segments.
    pub fn insert(&mut self, segment: StrSegment, converter: &dyn LetterConverter) -> bool {
        if self.layers[0].len() >= self.max_segments {
            debug!(max = self.max_segments, "composing buffer full, input dropped");
            return false;
        }
        let raw_index = self.raw_index_at_reading(self.cursors[1]);
        self.layers[0].insert(raw_index, StrSegment::new(segment.text));
        self.cursors[0] = raw_index + 1;
        self.rederive(converter);
        self.cursors[1] = self
            .layers[1]
            .iter()
            .position(|s| s.from <= raw_index && raw_index < s.to)
            .map_or(self.layers[1].len(), |i| i + 1);
        self.sync_clause_cursor();
        true
    }

    /// Remove the segment of `layer` next to its cursor.
    ///
    /// Returns `false` when there is nothing on that side of the cursor.
    pub fn delete(&mut self, layer: Layer, toward_start: bool, converter: &dyn LetterConverter) -> bool {
        let cursor = self.cursor(layer);
        let size = self.size(layer);
        let (from, to) = if toward_start {
            if cursor == 0 {
                return false;
            }
            (cursor - 1, cursor)
        } else {
            if cursor >= size {
                return false;
            }
            (cursor, cursor + 1)
        };
        self.delete_range(layer, from, to, converter)
    }

    /// Remove segments `from..to` of `layer` together with everything they
    /// were derived from. Installed clauses outside the range survive when
    /// the reading under them is unchanged.
    pub fn delete_range(
        &mut self,
        layer: Layer,
        from: usize,
        to: usize,
        converter: &dyn LetterConverter,
    ) -> bool {
        let to = to.min(self.size(layer));
        if from >= to {
            return false;
        }

        let (raw_from, raw_to, reading_range) = match layer {
            Layer::Input => (from, to, None),
            Layer::Reading => (
                self.layers[1][from].from,
                self.layers[1][to - 1].to,
                Some((from, to)),
            ),
            Layer::Clause => {
                let (rf, rt) = (self.layers[2][from].from, self.layers[2][to - 1].to);
                (self.layers[1][rf].from, self.layers[1][rt - 1].to, Some((rf, rt)))
            }
        };

        let kept_clauses = match reading_range {
            Some((rf, rt)) if self.clauses_installed => Some(self.clauses_outside(rf, rt)),
            _ => None,
        };

        self.layers[0].drain(raw_from..raw_to);
        self.rederive(converter);
        self.cursors[0] = raw_from;
        self.cursors[1] = self.reading_index_at_raw(raw_from);
        self.sync_clause_cursor();

        if let Some((kept, cursor)) = kept_clauses {
            let unchanged = kept
                .iter()
                .all(|(clause, reading)| self.to_string_range(Layer::Reading, clause.from, clause.to) == *reading);
            let clauses: Vec<StrSegment> = kept.into_iter().map(|(clause, _)| clause).collect();
            if unchanged && !clauses.is_empty() && self.tiles_reading(&clauses) {
                self.layers[2] = clauses;
                self.clauses_installed = true;
                self.cursors[2] = cursor;
            } else {
                debug!("remaining clauses no longer match the reading, dropped");
            }
        }
        true
    }

    /// Install conversion results as layer 2.
    ///
    /// Rejected (returns `false`) unless the clauses tile layer 1 exactly.
    pub fn set_clauses(&mut self, clauses: Vec<StrSegment>) -> bool {
        if clauses.is_empty() || !self.tiles_reading(&clauses) {
            return false;
        }
        self.cursors[2] = clauses.len();
        self.layers[2] = clauses;
        self.clauses_installed = true;
        true
    }

    /// Replace the text of one installed clause, keeping its range.
    pub fn set_clause_text(&mut self, index: usize, text: impl Into<String>) -> bool {
        if !self.clauses_installed {
            return false;
        }
        match self.layers[2].get_mut(index) {
            Some(seg) => {
                seg.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Drop installed clauses; layer 2 mirrors layer 1 again.
    pub fn reset_clauses(&mut self) {
        self.mirror_reading();
    }

    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
        self.cursors = [0; 3];
        self.clauses_installed = false;
    }

    fn rederive(&mut self, converter: &dyn LetterConverter) {
        self.layers[1] = converter.derive(&self.layers[0]);
        self.mirror_reading();
    }

    fn mirror_reading(&mut self) {
        self.layers[2] = self.layers[1]
            .iter()
            .enumerate()
            .map(|(i, s)| StrSegment::with_range(s.text.clone(), i, i + 1))
            .collect();
        self.clauses_installed = false;
        self.cursors[2] = self.cursors[1].min(self.layers[2].len());
    }

    fn sync_clause_cursor(&mut self) {
        if !self.clauses_installed {
            self.cursors[2] = self.cursors[1].min(self.layers[2].len());
        }
    }

    /// Raw index at which the reading segment `reading_pos` begins.
    fn raw_index_at_reading(&self, reading_pos: usize) -> usize {
        if reading_pos == 0 {
            return 0;
        }
        self.layers[1]
            .get(reading_pos - 1)
            .map_or(self.layers[0].len(), |s| s.to)
            .min(self.layers[0].len())
    }

    /// Number of reading segments that end at or before raw index `raw_pos`.
    fn reading_index_at_raw(&self, raw_pos: usize) -> usize {
        self.layers[1].iter().take_while(|s| s.to <= raw_pos).count()
    }

    /// Clauses entirely outside reading range `[from, to)`, shifted to close
    /// the gap and paired with their current reading, plus the clause cursor
    /// at the gap.
    fn clauses_outside(&self, from: usize, to: usize) -> (Vec<(StrSegment, String)>, usize) {
        let removed = to - from;
        let mut kept = Vec::new();
        let mut cursor = 0;
        for clause in &self.layers[2] {
            let reading = self.to_string_range(Layer::Reading, clause.from, clause.to);
            if clause.to <= from {
                kept.push((clause.clone(), reading));
                cursor += 1;
            } else if clause.from >= to {
                let shifted = StrSegment::with_range(
                    clause.text.clone(),
                    clause.from - removed,
                    clause.to - removed,
                );
                kept.push((shifted, reading));
            }
        }
        (kept, cursor)
    }

    fn tiles_reading(&self, clauses: &[StrSegment]) -> bool {
        let mut expected = 0;
        for clause in clauses {
            if clause.from != expected || clause.to <= clause.from {
                return false;
            }
            expected = clause.to;
        }
        expected == self.layers[1].len()
    }
}

impl Default for ComposingText {
    fn default() -> Self {
        Self::new(30)
    }
}
