//! Application-wide constants for logdeck.
//!
//! Magic numbers live here, grouped by domain.
//!
//! # Categories
//!
//! - **Retention**: Per-tab history and per-line size limits
//! - **Event loop**: Channel sizing and polling intervals
//! - **Teardown**: Cancellation deadlines
//! - **UI**: Layout dimensions

// Rust guideline compliant 2026-01

use std::time::Duration;

// ============================================================================
// Retention
// ============================================================================

/// Maximum number of lines retained per tab.
///
/// Older lines are evicted first once a tab's history reaches this size.
pub const MAX_LINES: usize = 10_000;

/// Maximum size of a single decoded line in bytes (1 MiB).
///
/// Longer lines are truncated so a source emitting huge unbroken output
/// cannot grow memory without bound.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

// ============================================================================
// Event loop
// ============================================================================

/// Capacity of the viewer's event queue.
///
/// When the queue is full, source tasks suspend on `send` until the loop
/// catches up.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum number of queued events applied before a redraw.
pub const MAX_EVENTS_PER_FRAME: usize = 512;

/// How long the input thread blocks in `crossterm::event::poll` before
/// re-checking its stop and signal flags.
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Teardown
// ============================================================================

/// Deadline for all source tasks to finish after cancellation.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Deadline for reaping a single killed child.
pub const REAP_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// UI
// ============================================================================

/// Rows used by the tab bar (labels plus bottom border).
pub const TAB_BAR_HEIGHT: u16 = 2;

/// Rows used by the help/status line.
pub const HELP_HEIGHT: u16 = 1;

/// Default `--tail` value used by the interactive viewer.
pub const DEFAULT_TAIL: &str = "100";
