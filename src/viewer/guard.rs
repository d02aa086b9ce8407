//! Terminal state guard for RAII cleanup.
//!
//! Raw mode and the alternate screen must be undone however the viewer
//! exits: normal return, error, or panic. [`TerminalGuard`] does that on
//! drop; [`restore_terminal`] is the same routine for the panic hook.

// Rust guideline compliant 2026-01

use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};

/// Guard struct that restores the terminal on drop (including panics).
///
/// When dropped, this guard:
/// - Disables raw mode
/// - Leaves the alternate screen
/// - Shows the cursor
///
/// # Example
///
/// ```ignore
/// enable_raw_mode()?;
/// execute!(stdout(), EnterAlternateScreen)?;
/// let _guard = TerminalGuard::new();
/// // run the viewer; the guard cleans up when this scope ends
/// ```
#[derive(Debug)]
pub struct TerminalGuard;

impl TerminalGuard {
    /// Creates a new terminal guard.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Best-effort terminal restore; errors are ignored.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen, Show);
}
