//! Viewer construction and the event loop.
//!
//! # Architecture
//!
//! ```text
//! current-thread runtime
//! ├── event loop (this module) ── owns ViewerState, draws every batch
//! ├── LineSource task × N ────── Line / Exited ──► mpsc
//! └── SourceSupervisor ────────── cancels and reaps on quit
//!
//! input thread (blocking crossterm reads) ── Action / Resize ──► mpsc
//! ```
//!
//! The loop waits for one event, applies it, then drains whatever else is
//! already queued (up to [`MAX_EVENTS_PER_FRAME`]) before drawing, so a
//! chatty source costs one redraw per batch rather than one per line.

// Rust guideline compliant 2026-01

use std::io::stdout;
use std::process::Command;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use crossterm::{
    execute,
    terminal::{self, enable_raw_mode, EnterAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::sync::mpsc;

use crate::constants::{EVENT_CHANNEL_CAPACITY, MAX_EVENTS_PER_FRAME, MAX_LINES, MAX_LINE_BYTES};
use crate::lifecycle::SourceSupervisor;
use crate::source::LineSource;

use super::events::ViewerEvent;
use super::guard::TerminalGuard;
use super::input::InputThread;
use super::render::render;
use super::state::{Flow, ViewerState};

/// Interactive multi-source log viewer.
///
/// Built from an ordered list of source names and a capability that turns
/// a name into a not-yet-started command.
#[derive(Debug)]
pub struct Viewer {
    sources: Vec<(String, Command)>,
    max_lines: usize,
    max_line_bytes: usize,
}

impl Viewer {
    /// Build one command per name, in order.
    ///
    /// `build` is called exactly once per name.
    ///
    /// # Errors
    ///
    /// Returns an error if `names` is empty, contains a duplicate, or if
    /// any `build` call fails.
    pub fn new<I, S, F>(names: I, mut build: F) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(&str) -> Result<Command>,
    {
        let mut sources: Vec<(String, Command)> = Vec::new();
        for name in names {
            let name = name.into();
            if sources.iter().any(|(existing, _)| *existing == name) {
                bail!("duplicate source name: {name}");
            }
            let command =
                build(&name).with_context(|| format!("failed to build log command for {name}"))?;
            sources.push((name, command));
        }
        if sources.is_empty() {
            bail!("no sources to show logs for");
        }
        Ok(Self {
            sources,
            max_lines: MAX_LINES,
            max_line_bytes: MAX_LINE_BYTES,
        })
    }

    /// Override the per-tab line cap (minimum 1).
    #[must_use]
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines.max(1);
        self
    }

    /// Override the per-line byte cap (minimum 1).
    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes.max(1);
        self
    }

    /// Source names in tab order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|(name, _)| name.as_str())
    }

    /// Take over the terminal and run until the user quits.
    ///
    /// `signal_flag` is raised by SIGINT/SIGTERM/SIGHUP handlers; it is
    /// treated like a quit key.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up or drawn to.
    /// Failures of individual sources only show up in their tabs.
    pub async fn run(self, signal_flag: Arc<AtomicBool>) -> Result<()> {
        let (width, height) = terminal::size().context("failed to read terminal size")?;

        enable_raw_mode().context("failed to enable raw mode")?;
        let _guard = TerminalGuard::new();
        let mut out = stdout();
        execute!(out, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let mut terminal =
            Terminal::new(CrosstermBackend::new(out)).context("failed to create terminal")?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tx.try_send(ViewerEvent::resize(width, height))
            .context("failed to queue initial size")?;
        let input = InputThread::spawn(tx.clone(), signal_flag)?;

        log::info!("viewer started with {} source(s)", self.sources.len());
        let result = self.run_with(&mut terminal, tx, rx).await;
        input.stop();

        if let Err(e) = terminal.show_cursor() {
            log::warn!("failed to show cursor: {e}");
        }
        result.map(|_| ())
    }

    /// Run the event loop against `terminal`, fed by `rx`.
    ///
    /// Sources are started on the current runtime with clones of `tx`;
    /// callers keep their own clones to inject input. Returns the final
    /// state once a quit was applied (or every sender is gone), after all
    /// sources have been torn down.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails. Sources are torn down either way.
    pub async fn run_with<B>(
        self,
        terminal: &mut Terminal<B>,
        tx: mpsc::Sender<ViewerEvent>,
        mut rx: mpsc::Receiver<ViewerEvent>,
    ) -> Result<ViewerState>
    where
        B: Backend,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let Self {
            sources,
            max_lines,
            max_line_bytes,
        } = self;

        let mut state = ViewerState::new(sources.iter().map(|(name, _)| name.clone()), max_lines);
        let sources = sources
            .into_iter()
            .enumerate()
            .map(|(id, (name, command))| {
                LineSource::new(id, name, command).with_max_line_bytes(max_line_bytes)
            })
            .collect();
        let supervisor = SourceSupervisor::start(sources, &tx);
        drop(tx);

        let result = event_loop(terminal, &mut state, &mut rx).await;
        if result.is_err() {
            log::error!("event loop failed, stopping sources");
        }
        supervisor.shutdown().await;
        result.map(|()| state)
    }
}

async fn event_loop<B>(
    terminal: &mut Terminal<B>,
    state: &mut ViewerState,
    rx: &mut mpsc::Receiver<ViewerEvent>,
) -> Result<()>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    terminal.draw(|f| render(f, state))?;

    loop {
        let Some(event) = rx.recv().await else {
            log::info!("event queue closed");
            return Ok(());
        };

        let mut flow = state.apply(event);
        let mut applied = 1;
        while flow == Flow::Continue && applied < MAX_EVENTS_PER_FRAME {
            let Ok(event) = rx.try_recv() else {
                break;
            };
            flow = state.apply(event);
            applied += 1;
        }

        terminal.draw(|f| render(f, state))?;
        if flow == Flow::Quit {
            log::info!("quit requested");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::ViewerAction;
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[test]
    fn test_new_requires_sources() {
        let err = Viewer::new(Vec::<String>::new(), |_| Ok(sh("true"))).unwrap_err();
        assert_eq!(err.to_string(), "no sources to show logs for");
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = Viewer::new(["a", "b", "a"], |_| Ok(sh("true"))).unwrap_err();
        assert!(err.to_string().contains("duplicate source name: a"));
    }

    #[test]
    fn test_new_calls_build_once_per_name() {
        let mut built = Vec::new();
        let viewer = Viewer::new(["a", "b"], |name| {
            built.push(name.to_string());
            Ok(sh("true"))
        })
        .unwrap();
        assert_eq!(built, vec!["a", "b"]);
        assert_eq!(viewer.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_new_reports_build_failure() {
        let err = Viewer::new(["a", "b"], |name| {
            if name == "b" {
                anyhow::bail!("boom");
            }
            Ok(sh("true"))
        })
        .unwrap_err();
        assert_eq!(format!("{err:#}"), "failed to build log command for b: boom");
    }

    #[tokio::test]
    async fn test_run_with_quits_and_reaps() {
        let viewer = Viewer::new(["a"], |_| Ok(sh("echo hello; sleep 30"))).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tx.send(ViewerEvent::resize(60, 10)).await.unwrap();

        let input = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = input.send(ViewerEvent::Action(ViewerAction::Quit)).await;
        });

        let state = tokio::time::timeout(Duration::from_secs(10), viewer.run_with(&mut terminal, tx, rx))
            .await
            .expect("viewer did not quit")
            .unwrap();

        assert!(state.quitting());
        let lines: Vec<&str> = state.tabs()[0].lines().iter().collect();
        assert_eq!(lines, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_long_lines_are_cut_at_the_byte_cap() {
        let viewer = Viewer::new(["a"], |_| Ok(sh("echo abcdefgh; echo ok")))
            .unwrap()
            .with_max_line_bytes(4);
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let state = tokio::time::timeout(Duration::from_secs(10), viewer.run_with(&mut terminal, tx, rx))
            .await
            .expect("viewer did not finish")
            .unwrap();

        let lines: Vec<&str> = state.tabs()[0].lines().iter().collect();
        assert_eq!(lines[..2], ["abcd", "ok"]);
    }

    #[tokio::test]
    async fn test_run_with_ends_when_all_senders_are_gone() {
        let viewer = Viewer::new(["a"], |_| Ok(sh("echo one"))).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let state = tokio::time::timeout(Duration::from_secs(10), viewer.run_with(&mut terminal, tx, rx))
            .await
            .expect("viewer did not finish")
            .unwrap();

        assert!(!state.quitting());
        let lines: Vec<&str> = state.tabs()[0].lines().iter().collect();
        assert_eq!(lines, vec!["one", "[process exited]"]);
    }
}
