//! Quit must close every merged-output read end.
//!
//! Counts pipe descriptors of this test process before and after a viewer
//! session, so it lives in its own file: no other test may open pipes
//! concurrently in the same process.
//!
//! Run with: cargo test --test pipe_descriptors_test

use std::process::Command;
use std::time::{Duration, Instant};

use logdeck::constants::EVENT_CHANNEL_CAPACITY;
use logdeck::viewer::{ViewerAction, ViewerEvent};
use logdeck::Viewer;
use ratatui::{backend::TestBackend, Terminal};
use tokio::sync::mpsc;

fn sh(script: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(script);
    command
}

/// Number of open descriptors of this process that refer to a pipe.
fn open_pipes() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(Result::ok)
        .filter_map(|entry| std::fs::read_link(entry.path()).ok())
        .filter(|target| target.to_string_lossy().starts_with("pipe:"))
        .count()
}

#[tokio::test]
async fn test_quit_closes_every_read_end() {
    let before = open_pipes();

    let viewer = Viewer::new(["idle", "chatty", "closed"], |name| {
        Ok(match name {
            // Blocked mid-read with nothing to say.
            "idle" => sh("sleep 30"),
            "chatty" => sh("while true; do echo tick; sleep 0.01; done"),
            // Output closed, process still alive.
            _ => sh("exec >/dev/null 2>&1; sleep 30"),
        })
    })
    .unwrap();

    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tx.send(ViewerEvent::resize(80, 24)).await.unwrap();

    let input = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = input.send(ViewerEvent::Action(ViewerAction::Quit)).await;
    });

    let started = Instant::now();
    let state = tokio::time::timeout(Duration::from_secs(15), viewer.run_with(&mut terminal, tx, rx))
        .await
        .expect("viewer did not quit in time")
        .unwrap();

    assert!(state.quitting());
    assert!(
        !state.tabs()[1].lines().is_empty(),
        "chatty source produced no output"
    );
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(open_pipes(), before, "pipe descriptors leaked");
}
