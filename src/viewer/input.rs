//! Terminal input handling for the viewer.
//!
//! Converts crossterm events into [`ViewerEvent`]s and runs the blocking
//! input reader on its own thread.
//!
//! # Architecture
//!
//! ```text
//! crossterm::Event ──► event_to_viewer_event() ──► ViewerEvent ──► mpsc
//!                                                                   │
//!                                       event loop (ViewerState) ◄──┘
//! ```
//!
//! The reader thread polls with a short timeout so it can notice both its
//! stop flag and a raised signal flag. A raised signal flag is turned into
//! [`ViewerAction::Quit`], so external termination goes through the same
//! teardown as a user quit.

// Rust guideline compliant 2026-01

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::constants::INPUT_POLL_INTERVAL;

use super::actions::{Scroll, ViewerAction};
use super::events::ViewerEvent;

/// Convert a crossterm event into a viewer event.
///
/// Returns `None` for events the viewer ignores (mouse, focus, paste,
/// key releases, unbound keys).
#[must_use]
pub fn event_to_viewer_event(event: &Event) -> Option<ViewerEvent> {
    match event {
        Event::Key(key) => key_to_action(key).map(ViewerEvent::from),
        Event::Resize(width, height) => Some(ViewerEvent::resize(*width, *height)),
        _ => None,
    }
}

/// Map a key press to an action.
///
/// Key bindings:
/// - `q`, `Esc`, `Ctrl+C` - quit
/// - `Tab`, `→`, `l` / `Shift+Tab`, `←`, `h` - next / previous tab
/// - `1`-`9` - jump to tab
/// - `↑`, `k` / `↓`, `j` - one line
/// - `PgUp`, `b` / `PgDn`, `f`, `Space` - one page
/// - `u`, `Ctrl+U` / `d`, `Ctrl+D` - half a page
/// - `g`, `Home` / `G`, `End` - top / bottom (follow)
#[must_use]
pub fn key_to_action(key: &KeyEvent) -> Option<ViewerAction> {
    // Only process key press events
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let action = match key.code {
        KeyCode::Char('c') if ctrl => ViewerAction::Quit,
        KeyCode::Char('u') if ctrl => ViewerAction::Scroll(Scroll::HalfPageUp),
        KeyCode::Char('d') if ctrl => ViewerAction::Scroll(Scroll::HalfPageDown),
        _ if ctrl => return None,

        KeyCode::Char('q') | KeyCode::Esc => ViewerAction::Quit,

        // === Tabs ===
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => ViewerAction::NextTab,
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => ViewerAction::PrevTab,
        KeyCode::Char(c @ '1'..='9') => {
            ViewerAction::SelectTab(usize::from(c as u8 - b'1'))
        }

        // === Scrolling ===
        KeyCode::Up | KeyCode::Char('k') => ViewerAction::Scroll(Scroll::LineUp),
        KeyCode::Down | KeyCode::Char('j') => ViewerAction::Scroll(Scroll::LineDown),
        KeyCode::PageUp | KeyCode::Char('b') => ViewerAction::Scroll(Scroll::PageUp),
        KeyCode::PageDown | KeyCode::Char('f' | ' ') => ViewerAction::Scroll(Scroll::PageDown),
        KeyCode::Char('u') => ViewerAction::Scroll(Scroll::HalfPageUp),
        KeyCode::Char('d') => ViewerAction::Scroll(Scroll::HalfPageDown),
        KeyCode::Home | KeyCode::Char('g') => ViewerAction::ScrollToTop,
        KeyCode::End | KeyCode::Char('G') => ViewerAction::ScrollToBottom,

        _ => return None,
    };
    Some(action)
}

/// Handle to the input reader thread.
#[derive(Debug)]
pub struct InputThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl InputThread {
    /// Start reading terminal input into `events`.
    ///
    /// The thread exits when stopped, when the queue is closed, or after
    /// forwarding a quit. `signal_flag` is checked on every poll.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(events: mpsc::Sender<ViewerEvent>, signal_flag: Arc<AtomicBool>) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("logdeck-input".to_string())
            .spawn(move || read_loop(&events, &thread_stop, &signal_flag))
            .context("failed to spawn input thread")?;
        Ok(Self { stop, handle })
    }

    /// Stop the thread and wait for it (at most one poll interval).
    pub fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.handle.join().is_err() {
            log::error!("input thread panicked");
        }
    }
}

fn read_loop(events: &mpsc::Sender<ViewerEvent>, stop: &AtomicBool, signal_flag: &AtomicBool) {
    log::debug!("input thread started");
    while !stop.load(Ordering::SeqCst) {
        if signal_flag.load(Ordering::SeqCst) {
            log::info!("termination signal received");
            // Best effort: the loop may already be gone.
            let _ = events.blocking_send(ViewerAction::Quit.into());
            break;
        }

        match event::poll(INPUT_POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                log::error!("input poll failed: {e}");
                break;
            }
        }
        let event = match event::read() {
            Ok(event) => event,
            Err(e) => {
                log::error!("input read failed: {e}");
                break;
            }
        };
        let Some(event) = event_to_viewer_event(&event) else {
            continue;
        };
        let quit = matches!(event, ViewerEvent::Action(ViewerAction::Quit));
        if events.blocking_send(event).is_err() || quit {
            break;
        }
    }
    log::debug!("input thread stopped");
}
