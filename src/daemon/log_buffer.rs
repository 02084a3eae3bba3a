use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

pub const DEFAULT_MAX_LINES: usize = 1_000;

/// Ring buffer of the most recent daemon stdout/stderr lines.
pub struct LogBuffer {
    max_lines: usize,
    lines: Mutex<VecDeque<String>>,
}

impl LogBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            max_lines: max_lines.max(1),
            lines: Mutex::new(VecDeque::new()),
        }
    }

    /// Append a line, evicting the oldest if over capacity.
    pub fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.push_back(line);
        while lines.len() > self.max_lines {
            lines.pop_front();
        }
    }

    /// Return the last `n` lines (or all if `n` exceeds the stored count).
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        let start = lines.len().saturating_sub(n);
        lines.iter().skip(start).cloned().collect()
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}
