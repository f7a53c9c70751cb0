// Input window
// Buffered input with a read cursor. Requeued characters are written just
// ahead of the cursor so the next rule lookup reads them first.

use crate::limits::WINDOW_COMPACT_THRESHOLD;

#[derive(Debug, Default)]
pub struct InputWindow {
    buf: Vec<u32>,
    cursor: usize,
    /// Characters consumed since the last reset
    consumed: usize,
    /// Characters written back since the last reset
    requeued: usize,
}

impl InputWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append input, dropping the consumed prefix once it gets large
    pub fn feed(&mut self, data: &[u32]) {
        if self.cursor >= WINDOW_COMPACT_THRESHOLD && self.cursor * 2 >= self.buf.len() {
            self.buf.drain(..self.cursor);
            self.cursor = 0;
        }
        self.buf.extend_from_slice(data);
    }

    /// Unconsumed input, starting at the cursor
    #[inline(always)]
    pub fn pending(&self) -> &[u32] {
        &self.buf[self.cursor..]
    }

    pub fn is_empty(&self) -> bool {
        self.cursor >= self.buf.len()
    }

    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.buf.len() - self.cursor);
        self.cursor += n;
        self.consumed += n;
    }

    /// Put `values` in front of the pending input, in order
    pub fn push_back(&mut self, values: &[u32]) {
        if values.is_empty() {
            return;
        }
        if self.cursor >= values.len() {
            // Reuse the consumed region behind the cursor
            self.cursor -= values.len();
            self.buf[self.cursor..self.cursor + values.len()].copy_from_slice(values);
        } else {
            self.buf.splice(self.cursor..self.cursor, values.iter().copied());
        }
        self.requeued += values.len();
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Net consumption: characters consumed minus characters requeued.
    /// Negative while push-backs have grown the pending input.
    pub fn progress(&self) -> i64 {
        self.consumed as i64 - self.requeued as i64
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.cursor = 0;
        self.consumed = 0;
        self.requeued = 0;
    }
}
