//! Events consumed by the viewer's event loop.
//!
//! Every state change flows through one queue of [`ViewerEvent`]s:
//!
//! ```text
//! LineSource tasks ──Line / Exited──┐
//! input thread ─────Action / Resize─┼──> mpsc ──> event loop ──> ViewerState
//! ```

// Rust guideline compliant 2026-01

use super::actions::ViewerAction;
use crate::source::SourceId;

/// A single unit of work for the event loop.
#[derive(Debug)]
pub enum ViewerEvent {
    /// A line of output arrived from a source.
    Line {
        /// Tab index of the source.
        source: SourceId,
        /// Line text without its terminator.
        line: String,
    },

    /// A source's process is gone. Always the last event for that source.
    Exited {
        /// Tab index of the source.
        source: SourceId,
        /// Why it stopped, if it was not a clean exit.
        error: Option<anyhow::Error>,
    },

    /// The user asked for something.
    Action(ViewerAction),

    /// The terminal changed size.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },
}

impl ViewerEvent {
    /// Create a line event.
    #[must_use]
    pub fn line(source: SourceId, line: impl Into<String>) -> Self {
        Self::Line {
            source,
            line: line.into(),
        }
    }

    /// Create an exit event.
    #[must_use]
    pub fn exited(source: SourceId, error: Option<anyhow::Error>) -> Self {
        Self::Exited { source, error }
    }

    /// Create a resize event.
    #[must_use]
    pub fn resize(width: u16, height: u16) -> Self {
        Self::Resize { width, height }
    }
}

impl From<ViewerAction> for ViewerEvent {
    fn from(action: ViewerAction) -> Self {
        Self::Action(action)
    }
}
