//! logdeck - interactive multi-source log tailing viewer.
//!
//! This crate tails the merged stdout/stderr of several long-running
//! processes at once and presents one tab per source in a full-screen
//! terminal UI.
//!
//! # Architecture
//!
//! The viewer follows a single-writer event loop:
//!
//! - **Line Source** - one task per child process, reading its merged
//!   output pipe line by line and enqueueing events
//! - **Viewer** - owns all UI state, applies events one at a time, redraws
//! - **Supervisor** - cancels every source on quit and reclaims children
//!
//! # Modules
//!
//! - [`buffer`] - Bounded per-source line history
//! - [`source`] - Child process spawning and line streaming
//! - [`lifecycle`] - Source supervision and teardown
//! - [`viewer`] - Tab state, input mapping, rendering and the event loop
//! - [`config`] - Configuration loading and command building
//! - [`plain`] - Non-interactive fallback output

// Rust guideline compliant 2026-01

// Library modules
pub mod buffer;
pub mod config;
pub mod constants;
pub mod lifecycle;
pub mod plain;
pub mod source;
pub mod viewer;

// Re-export commonly used types
pub use buffer::LogBuffer;
pub use config::Config;
pub use lifecycle::SourceSupervisor;
pub use source::{LineSource, SourceId};
pub use viewer::{Viewer, ViewerEvent, ViewerState};
