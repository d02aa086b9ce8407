//! Viewer - tabs, input, rendering and the event loop.
//!
//! The viewer owns one [`ViewerState`] per session and mutates it only
//! from its event loop. Sources and the input thread never touch it; they
//! enqueue [`ViewerEvent`]s instead.
//!
//! # Modules
//!
//! - [`actions`] - User-level actions (`ViewerAction`, `Scroll`)
//! - [`events`] - Event queue message type (`ViewerEvent`)
//! - [`guard`] - Terminal state RAII guard for cleanup
//! - [`input`] - Key mapping and the input reader thread
//! - [`render`] - Pure rendering of `ViewerState`
//! - [`runner`] - `Viewer` construction and event loop
//! - [`state`] - `ViewerState` and its transitions
//! - [`tab`] - Per-source tab state and viewport logic

// Rust guideline compliant 2026-01

pub mod actions;
pub mod events;
pub mod guard;
pub mod input;
pub mod render;
pub mod runner;
pub mod state;
pub mod tab;

#[doc(inline)]
pub use actions::{Scroll, ViewerAction};
#[doc(inline)]
pub use events::ViewerEvent;
#[doc(inline)]
pub use guard::{restore_terminal, TerminalGuard};
#[doc(inline)]
pub use render::render;
#[doc(inline)]
pub use runner::Viewer;
#[doc(inline)]
pub use state::{Flow, ViewerState};
#[doc(inline)]
pub use tab::Tab;
