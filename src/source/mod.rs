//! Line sources - one child process tailed as a stream of lines.
//!
//! A [`LineSource`] starts its child with merged output (see [`pipe`]),
//! then repeatedly reads one line and hands it to the viewer's event
//! queue. The next read only starts after the previous line was queued,
//! so per-source order is preserved. When the stream ends the child is
//! reaped and a final [`ViewerEvent::Exited`] is queued; nothing is sent
//! for that source afterwards.
//!
//! # Cancellation
//!
//! Every await point is raced against a [`CancellationToken`]. On
//! cancellation the child's process group is killed, the read end is
//! closed, and the child is reaped within [`REAP_TIMEOUT`].

// Rust guideline compliant 2026-01

pub mod codec;
pub mod pipe;

use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use futures_util::StreamExt;
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use crate::constants::{MAX_LINE_BYTES, REAP_TIMEOUT};
use crate::viewer::ViewerEvent;

pub use codec::LogLineDecoder;
pub use pipe::{kill_process_group, spawn_merged, MergedChild};

/// Stable identity of a source: its index in the viewer's tab list.
pub type SourceId = usize;

/// Why a source's read loop stopped.
enum Stop {
    /// The stream ended or a read failed.
    Ended(Option<std::io::Error>),
    /// Cancellation was requested (or the viewer went away).
    Cancelled,
}

/// One monitored process, not yet started.
#[derive(Debug)]
pub struct LineSource {
    id: SourceId,
    name: String,
    command: Command,
    max_line_bytes: usize,
}

impl LineSource {
    /// Create a source for tab `id` that will run `command`.
    pub fn new(id: SourceId, name: impl Into<String>, command: Command) -> Self {
        Self {
            id,
            name: name.into(),
            command,
            max_line_bytes: MAX_LINE_BYTES,
        }
    }

    /// Override the per-line byte cap.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Tab index this source feeds.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Display name of this source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the process and stream its output until it exits or `cancel`
    /// fires.
    ///
    /// `pid` is set to the child's pid once it has started and reset to 0
    /// once it has been reaped, so the supervisor can reach stragglers.
    pub async fn run(
        self,
        events: mpsc::Sender<ViewerEvent>,
        cancel: CancellationToken,
        pid: Arc<AtomicU32>,
    ) {
        let Self {
            id,
            name,
            command,
            max_line_bytes,
        } = self;

        let MergedChild { mut child, output } = match spawn_merged(command) {
            Ok(merged) => merged,
            Err(e) => {
                log::warn!("[{name}] could not start: {e:#}");
                deliver(&events, &cancel, ViewerEvent::exited(id, Some(e))).await;
                return;
            }
        };

        if let Some(child_pid) = child.id() {
            pid.store(child_pid, Ordering::SeqCst);
            log::info!("[{name}] started pid {child_pid}");
        }

        let mut lines = FramedRead::new(output, LogLineDecoder::new(max_line_bytes));

        let stop = loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                next = lines.next() => Some(next),
            };
            let Some(next) = next else {
                break Stop::Cancelled;
            };
            match next {
                Some(Ok(line)) => {
                    if !deliver(&events, &cancel, ViewerEvent::line(id, line)).await {
                        break Stop::Cancelled;
                    }
                }
                Some(Err(e)) => break Stop::Ended(Some(e)),
                None => break Stop::Ended(None),
            }
        };

        match stop {
            Stop::Cancelled => {
                terminate(&name, &mut child);
                // Closes the read end.
                drop(lines);
                reap(&name, &mut child).await;
                pid.store(0, Ordering::SeqCst);
            }
            Stop::Ended(read_error) => {
                drop(lines);
                let waited = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    status = child.wait() => Some(status),
                };
                let Some(status) = waited else {
                    terminate(&name, &mut child);
                    reap(&name, &mut child).await;
                    pid.store(0, Ordering::SeqCst);
                    return;
                };
                pid.store(0, Ordering::SeqCst);

                let error = match status {
                    Ok(status) => exit_error(status).or_else(|| {
                        read_error.map(|e| anyhow::Error::new(e).context("read failed"))
                    }),
                    Err(e) => Some(anyhow::Error::new(e).context("failed to wait for process")),
                };
                match &error {
                    Some(e) => log::info!("[{name}] exited: {e:#}"),
                    None => log::info!("[{name}] exited cleanly"),
                }
                deliver(&events, &cancel, ViewerEvent::exited(id, error)).await;
            }
        }
    }
}

/// Queue `event`, giving up if cancelled or if the viewer is gone.
async fn deliver(
    events: &mpsc::Sender<ViewerEvent>,
    cancel: &CancellationToken,
    event: ViewerEvent,
) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = events.send(event) => sent.is_ok(),
    }
}

/// Map a non-success exit status to an error.
fn exit_error(status: ExitStatus) -> Option<anyhow::Error> {
    (!status.success()).then(|| anyhow!("{status}"))
}

/// Kill the child's whole process group, falling back to the child alone.
fn terminate(name: &str, child: &mut Child) {
    if let Some(pid) = child.id() {
        if let Err(e) = kill_process_group(pid) {
            log::warn!("[{name}] failed to kill process group {pid}: {e}");
        }
    }
    if let Err(e) = child.start_kill() {
        // Already exited and reaped is the common case here.
        log::debug!("[{name}] start_kill: {e}");
    }
}

async fn reap(name: &str, child: &mut Child) {
    match tokio::time::timeout(REAP_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) => log::info!("[{name}] stopped ({status})"),
        Ok(Err(e)) => log::warn!("[{name}] wait failed: {e}"),
        Err(_) => log::warn!("[{name}] not reaped within {REAP_TIMEOUT:?}"),
    }
}
