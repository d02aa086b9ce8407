//! Per-source tab state: history, follow mode, unread flag, scroll offset.
//!
//! The scroll offset is the index of the first visible line. A tab is "at
//! the bottom" when the offset reaches `len - height`, i.e. the newest
//! line is on screen. Follow mode keeps it there on every append.

// Rust guideline compliant 2026-01

use crate::buffer::LogBuffer;

use super::actions::Scroll;

/// UI projection of one source.
#[derive(Debug, Clone)]
pub struct Tab {
    name: String,
    buffer: LogBuffer,
    follow: bool,
    unread: bool,
    exited: bool,
    offset: usize,
}

impl Tab {
    /// Create an empty tab in follow mode retaining `max_lines` lines.
    pub fn new(name: impl Into<String>, max_lines: usize) -> Self {
        Self {
            name: name.into(),
            buffer: LogBuffer::new(max_lines),
            follow: true,
            unread: false,
            exited: false,
            offset: 0,
        }
    }

    /// Display name of the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retained history.
    pub fn lines(&self) -> &LogBuffer {
        &self.buffer
    }

    /// Whether appends keep the newest line in view.
    pub fn follow(&self) -> bool {
        self.follow
    }

    /// Whether lines arrived while this tab was inactive.
    pub fn unread(&self) -> bool {
        self.unread
    }

    /// Whether the source's process has exited.
    pub fn exited(&self) -> bool {
        self.exited
    }

    /// Index of the first visible line.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Largest valid offset for a viewport of `height` rows.
    pub fn max_offset(&self, height: usize) -> usize {
        self.buffer.len().saturating_sub(height.max(1))
    }

    /// Whether the newest line is visible.
    pub fn at_bottom(&self, height: usize) -> bool {
        self.offset >= self.max_offset(height)
    }

    /// Lines visible in a viewport of `height` rows.
    pub fn visible(&self, height: usize) -> impl Iterator<Item = &str> {
        self.buffer.window(self.offset, height)
    }

    /// Append a line to the history.
    ///
    /// When not following, the offset moves up with evictions so the
    /// lines on screen stay where they are.
    pub(super) fn push(&mut self, line: String) {
        let evicted = self.buffer.push(line);
        if !self.follow {
            self.offset = self.offset.saturating_sub(evicted);
        }
    }

    /// Re-derive the offset from the history, follow mode and `height`.
    pub(super) fn sync(&mut self, height: usize) {
        let max = self.max_offset(height);
        self.offset = if self.follow { max } else { self.offset.min(max) };
    }

    pub(super) fn set_unread(&mut self, unread: bool) {
        self.unread = unread;
    }

    pub(super) fn mark_exited(&mut self) {
        self.exited = true;
    }

    /// Oldest line at the top; follow off.
    pub(super) fn scroll_to_top(&mut self) {
        self.follow = false;
        self.offset = 0;
    }

    /// Newest line at the bottom; follow on.
    pub(super) fn scroll_to_bottom(&mut self, height: usize) {
        self.follow = true;
        self.offset = self.max_offset(height);
    }

    /// Relative scroll; follow becomes "ended at the bottom".
    pub(super) fn scroll(&mut self, step: Scroll, height: usize) {
        let max = self.max_offset(height);
        let delta = step.delta(height);
        self.offset = self.offset.saturating_add_signed(delta).min(max);
        self.follow = self.at_bottom(height);
    }
}
