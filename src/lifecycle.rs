//! Source supervision and teardown.
//!
//! [`SourceSupervisor`] starts one task per [`LineSource`] and owns their
//! cancellation. On quit it cancels every source and waits, with a
//! deadline, for each task to kill its process group, close its read end
//! and reap its child.
//!
//! # Architecture
//!
//! ```text
//! SourceSupervisor
//! ├── cancel: CancellationToken (parent)
//! └── handles: [SourceHandle]
//!     ├── child token ──► LineSource::run task
//!     └── pid (shared) ◄── set on spawn, cleared on reap
//! ```
//!
//! A task still running after [`SHUTDOWN_TIMEOUT`] gets its process group
//! killed directly and is aborted. Aborting drops the child handle, which
//! was spawned with `kill_on_drop`, and the read end with it.

// Rust guideline compliant 2026-01

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::constants::SHUTDOWN_TIMEOUT;
use crate::source::{kill_process_group, LineSource, SourceId};
use crate::viewer::ViewerEvent;

/// A started source task.
#[derive(Debug)]
struct SourceHandle {
    id: SourceId,
    name: String,
    pid: Arc<AtomicU32>,
    task: JoinHandle<()>,
}

/// Owns every running source and tears them all down on request.
#[derive(Debug)]
pub struct SourceSupervisor {
    cancel: CancellationToken,
    handles: Vec<SourceHandle>,
    timeout: Duration,
}

impl SourceSupervisor {
    /// Spawn a task for each source, all feeding `events`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(sources: Vec<LineSource>, events: &mpsc::Sender<ViewerEvent>) -> Self {
        let cancel = CancellationToken::new();
        let handles = sources
            .into_iter()
            .map(|source| {
                let id = source.id();
                let name = source.name().to_string();
                let pid = Arc::new(AtomicU32::new(0));
                let task = tokio::spawn(source.run(
                    events.clone(),
                    cancel.child_token(),
                    Arc::clone(&pid),
                ));
                SourceHandle { id, name, pid, task }
            })
            .collect::<Vec<_>>();
        log::info!("started {} source(s)", handles.len());
        Self {
            cancel,
            handles,
            timeout: SHUTDOWN_TIMEOUT,
        }
    }

    /// Override the teardown deadline.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of supervised sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True if no sources are supervised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of source tasks that have not finished yet.
    #[must_use]
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.task.is_finished()).count()
    }

    /// Pids of children that are started and not yet reaped.
    #[must_use]
    pub fn pids(&self) -> Vec<u32> {
        self.handles
            .iter()
            .map(|h| h.pid.load(Ordering::SeqCst))
            .filter(|pid| *pid != 0)
            .collect()
    }

    /// Cancel every source and wait for all of them to finish.
    ///
    /// Returns once every task has completed or been aborted; never waits
    /// longer than the deadline plus the time to abort stragglers.
    pub async fn shutdown(mut self) {
        let handles = std::mem::take(&mut self.handles);
        if handles.is_empty() {
            return;
        }
        log::info!("stopping {} source(s)", handles.len());
        self.cancel.cancel();

        let deadline = Instant::now() + self.timeout;
        let mut stragglers = Vec::new();
        for mut handle in handles {
            match tokio::time::timeout_at(deadline, &mut handle.task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("[{}] source task failed: {e}", handle.name),
                Err(_) => stragglers.push(handle),
            }
        }

        for handle in stragglers {
            log::warn!(
                "[{}] source {} did not stop within {:?}, forcing",
                handle.name,
                handle.id,
                self.timeout
            );
            let pid = handle.pid.load(Ordering::SeqCst);
            if pid != 0 {
                if let Err(e) = kill_process_group(pid) {
                    log::warn!("[{}] failed to kill process group {pid}: {e}", handle.name);
                }
            }
            handle.task.abort();
            // Cancelled is the expected outcome here.
            let _ = handle.task.await;
        }
        log::info!("all sources stopped");
    }
}

impl Drop for SourceSupervisor {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.cancel.cancel();
        for handle in &self.handles {
            let pid = handle.pid.load(Ordering::SeqCst);
            if pid != 0 {
                let _ = kill_process_group(pid);
            }
            handle.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    /// Running means present in `/proc` and not a zombie.
    fn process_alive(pid: u32) -> bool {
        let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
            return false;
        };
        // Format: "pid (comm) S ..."; comm may contain spaces.
        let state = stat.rsplit_once(')').and_then(|(_, rest)| rest.trim_start().chars().next());
        !matches!(state, Some('Z' | 'X') | None)
    }

    async fn wait_for_pids(supervisor: &SourceSupervisor, count: usize) -> Vec<u32> {
        for _ in 0..200 {
            let pids = supervisor.pids();
            if pids.len() == count {
                return pids;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("sources did not start");
    }

    #[tokio::test]
    async fn test_shutdown_reaps_blocked_children() {
        let (tx, mut rx) = mpsc::channel(16);
        let sources = vec![
            LineSource::new(0, "a", sh("sleep 30")),
            LineSource::new(1, "b", sh("while true; do echo tick; sleep 0.05; done")),
        ];
        let supervisor = SourceSupervisor::start(sources, &tx);
        drop(tx);
        assert_eq!(supervisor.len(), 2);

        let pids = wait_for_pids(&supervisor, 2).await;
        assert_eq!(supervisor.running(), 2);

        let started = std::time::Instant::now();
        supervisor.shutdown().await;
        assert!(started.elapsed() < SHUTDOWN_TIMEOUT + Duration::from_secs(1));

        for pid in pids {
            assert!(!process_alive(pid), "child {pid} still running");
        }

        // Every sender is gone once all tasks finished.
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn test_shutdown_kills_grandchildren() {
        let (tx, mut rx) = mpsc::channel(16);
        let sources = vec![LineSource::new(0, "a", sh("sleep 30 & echo $!; wait"))];
        let supervisor = SourceSupervisor::start(sources, &tx);
        wait_for_pids(&supervisor, 1).await;

        // The first line is the grandchild's pid.
        let grandchild = match rx.recv().await {
            Some(ViewerEvent::Line { line, .. }) => line.trim().parse::<u32>().unwrap(),
            other => panic!("expected pid line, got {other:?}"),
        };

        supervisor.shutdown().await;

        // Killed by the group signal; reaped by init, so allow a moment.
        for _ in 0..100 {
            if !process_alive(grandchild) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("grandchild {grandchild} survived shutdown");
    }

    #[tokio::test]
    async fn test_shutdown_after_sources_finished() {
        let (tx, mut rx) = mpsc::channel(16);
        let supervisor = SourceSupervisor::start(vec![LineSource::new(0, "a", sh("echo done"))], &tx);
        drop(tx);

        let mut saw_exit = false;
        while let Some(event) = rx.recv().await {
            if let ViewerEvent::Exited { error, .. } = event {
                assert!(error.is_none());
                saw_exit = true;
            }
        }
        assert!(saw_exit);
        assert!(supervisor.pids().is_empty());
        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_expired_deadline_forces_stragglers() {
        let (tx, _rx) = mpsc::channel(16);
        let sources = vec![LineSource::new(0, "a", sh("trap '' TERM; sleep 30"))];
        let supervisor = SourceSupervisor::start(sources, &tx).with_timeout(Duration::ZERO);
        let pids = wait_for_pids(&supervisor, 1).await;

        let started = std::time::Instant::now();
        supervisor.shutdown().await;
        assert!(started.elapsed() < Duration::from_secs(1));

        // Killed by the group signal; the zombie is reaped in the background.
        for _ in 0..100 {
            if !process_alive(pids[0]) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("straggler {} survived shutdown", pids[0]);
    }

    #[tokio::test]
    async fn test_empty_supervisor() {
        let (tx, _rx) = mpsc::channel(1);
        let supervisor = SourceSupervisor::start(Vec::new(), &tx);
        assert!(supervisor.is_empty());
        supervisor.shutdown().await;
    }
}
