//! Spawning a child with stdout and stderr merged into one pipe.
//!
//! Both output channels of the child are pointed at the write end of a
//! single OS pipe, so they share one ordered byte stream and the reader
//! only ever drains one descriptor. The parent keeps only the read end.

// Rust guideline compliant 2026-01

use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::net::unix::pipe;
use tokio::process::Child;

/// A started child together with the read end of its merged output pipe.
#[derive(Debug)]
pub struct MergedChild {
    /// Child process handle (`kill_on_drop` is set).
    pub child: Child,
    /// Read end of the pipe shared by the child's stdout and stderr.
    pub output: pipe::Receiver,
}

/// Start `command` with stdout and stderr redirected into one pipe.
///
/// The child gets `/dev/null` for stdin and is placed in its own process
/// group, so [`kill_process_group`] reaches anything it spawns as well.
///
/// # Errors
///
/// Fails if the pipe cannot be allocated, the process cannot be started,
/// or the read end cannot be registered with the runtime.
pub fn spawn_merged(mut command: Command) -> Result<MergedChild> {
    let (reader, writer) = io::pipe().context("failed to allocate output pipe")?;
    let stderr_writer = writer
        .try_clone()
        .context("failed to duplicate pipe write end")?;

    command
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer)
        .process_group(0);

    let mut command = tokio::process::Command::from(command);
    command.kill_on_drop(true);
    let spawned = command.spawn();

    // The command still holds the parent's copies of the write end. They
    // must be closed, otherwise the reader never sees EOF after the child
    // exits.
    drop(command);

    let child = spawned.context("failed to spawn process")?;
    let output = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))
        .context("failed to register output pipe")?;

    Ok(MergedChild { child, output })
}

/// Send `SIGKILL` to the process group led by `pid`.
///
/// A group that no longer exists is not an error.
pub fn kill_process_group(pid: u32) -> io::Result<()> {
    let Ok(raw) = i32::try_from(pid) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("pid {pid} out of range"),
        ));
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}
