//! Bounded line history for a single source.
//!
//! When the buffer is full, appending a new line silently evicts the
//! oldest one. Memory usage is bounded at `capacity` lines regardless of
//! how much output a source produces.

// Rust guideline compliant 2026-01

use std::collections::VecDeque;

use crate::constants::MAX_LINES;

/// Fixed-capacity, append-only line buffer with FIFO eviction.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a new buffer holding at most `capacity` lines.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LogBuffer capacity must be > 0");
        Self {
            // VecDeque grows lazily; most sources never reach the cap.
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Create a buffer with [`MAX_LINES`] capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(MAX_LINES)
    }

    /// Append `line` to the tail, evicting from the head if needed.
    ///
    /// Returns the number of lines evicted (0 or 1).
    pub fn push(&mut self, line: String) -> usize {
        self.lines.push_back(line);
        let mut evicted = 0;
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Line at `index` (0 = oldest retained line).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Iterate over retained lines, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.lines.iter().map(String::as_str)
    }

    /// Iterate over `count` lines starting at `start`, clamped to the buffer.
    pub fn window(&self, start: usize, count: usize) -> impl Iterator<Item = &str> {
        self.lines.range(start.min(self.lines.len())..).take(count).map(String::as_str)
    }

    /// Newest retained line.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Number of retained lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if no lines are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Configured maximum number of lines.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
