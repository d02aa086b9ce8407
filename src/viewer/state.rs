//! Viewer state and its event transitions.
//!
//! [`ViewerState`] is the only mutable state of a viewer session. It is
//! owned by the event loop and changed exclusively through
//! [`ViewerState::apply`], one event at a time. Rendering reads it but
//! never writes it.
//!
//! # Transitions
//!
//! | Event | Effect |
//! |---|---|
//! | `Line` | append; active tab re-synced, other tabs marked unread |
//! | `Exited` | append a status line, mark the tab exited |
//! | `NextTab` / `PrevTab` / `SelectTab` | change active tab, clear its unread flag |
//! | `ScrollToTop` / `ScrollToBottom` / `Scroll` | move the active tab's viewport |
//! | `Resize` | record geometry, re-sync every tab |
//! | `Quit` | set `quitting`, stop the loop |

// Rust guideline compliant 2026-01

use crate::constants::{HELP_HEIGHT, TAB_BAR_HEIGHT};
use crate::source::SourceId;

use super::actions::{Scroll, ViewerAction};
use super::events::ViewerEvent;
use super::tab::Tab;

/// Whether the event loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep processing events.
    Continue,
    /// Quit was requested.
    Quit,
}

/// All UI state of one viewer session.
#[derive(Debug, Clone)]
pub struct ViewerState {
    tabs: Vec<Tab>,
    active: usize,
    width: u16,
    height: u16,
    ready: bool,
    quitting: bool,
}

impl ViewerState {
    /// Create one tab per name, each retaining at most `max_lines` lines.
    ///
    /// The first tab is active. Geometry is unknown until the first resize.
    pub fn new<I, S>(names: I, max_lines: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tabs: names
                .into_iter()
                .map(|name| Tab::new(name, max_lines))
                .collect(),
            active: 0,
            width: 0,
            height: 0,
            ready: false,
            quitting: false,
        }
    }

    /// Apply one event.
    pub fn apply(&mut self, event: ViewerEvent) -> Flow {
        match event {
            ViewerEvent::Line { source, line } => self.append_line(source, line),
            ViewerEvent::Exited { source, error } => {
                let status = match error {
                    None => "[process exited]".to_string(),
                    Some(e) => format!("[process exited: {e:#}]"),
                };
                self.source_exited(source, status);
            }
            ViewerEvent::Resize { width, height } => self.resize(width, height),
            ViewerEvent::Action(action) => return self.handle_action(action),
        }
        Flow::Continue
    }

    fn handle_action(&mut self, action: ViewerAction) -> Flow {
        match action {
            ViewerAction::Quit => {
                self.quitting = true;
                return Flow::Quit;
            }
            ViewerAction::NextTab => self.next_tab(),
            ViewerAction::PrevTab => self.prev_tab(),
            ViewerAction::SelectTab(index) => self.select_tab(index),
            ViewerAction::ScrollToTop => {
                if let Some(tab) = self.tabs.get_mut(self.active) {
                    tab.scroll_to_top();
                }
            }
            ViewerAction::ScrollToBottom => {
                let height = self.viewport_height();
                if let Some(tab) = self.tabs.get_mut(self.active) {
                    tab.scroll_to_bottom(height);
                }
            }
            ViewerAction::Scroll(step) => self.scroll(step),
        }
        Flow::Continue
    }

    // === Sources ===

    fn append_line(&mut self, source: SourceId, line: String) {
        let height = self.viewport_height();
        let is_active = source == self.active;
        let Some(tab) = self.tabs.get_mut(source) else {
            log::warn!("line for unknown source {source} dropped");
            return;
        };
        tab.push(line);
        tab.sync(height);
        if !is_active {
            tab.set_unread(true);
        }
    }

    fn source_exited(&mut self, source: SourceId, status: String) {
        let Some(tab) = self.tabs.get_mut(source) else {
            log::warn!("exit for unknown source {source} dropped");
            return;
        };
        tab.mark_exited();
        self.append_line(source, status);
    }

    // === Tabs ===

    fn next_tab(&mut self) {
        if self.tabs.is_empty() {
            return;
        }
        self.activate((self.active + 1) % self.tabs.len());
    }

    fn prev_tab(&mut self) {
        if self.tabs.is_empty() {
            return;
        }
        let count = self.tabs.len();
        self.activate((self.active + count - 1) % count);
    }

    fn select_tab(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.activate(index);
        }
    }

    fn activate(&mut self, index: usize) {
        let height = self.viewport_height();
        self.active = index;
        if let Some(tab) = self.tabs.get_mut(index) {
            tab.set_unread(false);
            tab.sync(height);
        }
    }

    // === Viewport ===

    fn scroll(&mut self, step: Scroll) {
        let height = self.viewport_height();
        if let Some(tab) = self.tabs.get_mut(self.active) {
            tab.scroll(step, height);
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.ready = true;
        let viewport = self.viewport_height();
        for tab in &mut self.tabs {
            tab.sync(viewport);
        }
    }

    /// Rows available to the log window (terminal height minus chrome).
    #[must_use]
    pub fn viewport_height(&self) -> usize {
        usize::from(self.height.saturating_sub(TAB_BAR_HEIGHT + HELP_HEIGHT)).max(1)
    }

    // === Accessors ===

    /// All tabs, in source order.
    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Index of the active tab.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    /// The active tab, if there is one.
    #[must_use]
    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    /// Terminal width in columns.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Terminal height in rows.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Whether geometry is known.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Whether quit was requested.
    #[must_use]
    pub fn quitting(&self) -> bool {
        self.quitting
    }
}
