//! User-level actions the viewer understands.
//!
//! Key bindings are resolved to these in [`super::input`]; the event loop
//! only ever sees actions, never raw key codes.

// Rust guideline compliant 2026-01

/// Actions triggered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    /// Stop every source and leave the viewer.
    Quit,

    // === Tabs ===
    /// Activate the next tab (wrapping).
    NextTab,
    /// Activate the previous tab (wrapping).
    PrevTab,
    /// Activate the tab at this 0-based index.
    SelectTab(usize),

    // === Scrolling ===
    /// Jump to the oldest line and disable follow.
    ScrollToTop,
    /// Jump to the newest line and enable follow.
    ScrollToBottom,
    /// Relative scroll; follow is re-derived from the resulting position.
    Scroll(Scroll),
}

/// Relative scroll steps, sized against the current viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// One line towards older output.
    LineUp,
    /// One line towards newer output.
    LineDown,
    /// Half a viewport towards older output.
    HalfPageUp,
    /// Half a viewport towards newer output.
    HalfPageDown,
    /// A full viewport towards older output.
    PageUp,
    /// A full viewport towards newer output.
    PageDown,
}

impl Scroll {
    /// Signed line delta for a viewport of `height` rows.
    #[must_use]
    pub fn delta(self, height: usize) -> isize {
        let height = isize::try_from(height.max(1)).unwrap_or(isize::MAX);
        match self {
            Self::LineUp => -1,
            Self::LineDown => 1,
            Self::HalfPageUp => -(height / 2).max(1),
            Self::HalfPageDown => (height / 2).max(1),
            Self::PageUp => -height,
            Self::PageDown => height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_deltas() {
        assert_eq!(Scroll::LineUp.delta(20), -1);
        assert_eq!(Scroll::LineDown.delta(20), 1);
        assert_eq!(Scroll::HalfPageUp.delta(20), -10);
        assert_eq!(Scroll::HalfPageDown.delta(21), 10);
        assert_eq!(Scroll::PageUp.delta(20), -20);
        assert_eq!(Scroll::PageDown.delta(20), 20);
    }

    #[test]
    fn test_half_page_moves_at_least_one_line() {
        assert_eq!(Scroll::HalfPageDown.delta(1), 1);
        assert_eq!(Scroll::HalfPageUp.delta(0), -1);
    }
}
