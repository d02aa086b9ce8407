//! Non-interactive fallback: print each source's logs and exit.
//!
//! Sources run one after another with inherited stdio. With more than one
//! source, each gets a `=== Logs: <name> ===` header and a failure is
//! reported inline so the remaining sources still print.

// Rust guideline compliant 2026-01

use std::io::Write;

use anyhow::{bail, Context, Result};

use crate::config::Config;

/// Options for a plain run.
#[derive(Debug, Clone)]
pub struct PlainOptions {
    /// Tail value passed to the command templates.
    pub tail: String,
    /// Use the streaming `command` instead of `plain_command`.
    pub follow: bool,
}

/// Run every source in `names` to completion, writing headers and inline
/// errors to `out`.
///
/// # Errors
///
/// With a single source, returns that source's failure. With several,
/// only fails if `out` cannot be written.
pub fn run_plain(
    config: &Config,
    names: &[String],
    options: &PlainOptions,
    out: &mut impl Write,
) -> Result<()> {
    let multiple = names.len() > 1;
    for (i, name) in names.iter().enumerate() {
        if multiple {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "=== Logs: {name} ===")?;
            out.flush()?;
        }
        if let Err(e) = run_one(config, name, options) {
            if multiple {
                log::warn!("[{name}] {e:#}");
                writeln!(out, "Error: {e:#}")?;
                continue;
            }
            return Err(e);
        }
    }
    Ok(())
}

fn run_one(config: &Config, name: &str, options: &PlainOptions) -> Result<()> {
    let mut command = if options.follow {
        config.command_for(name, &options.tail)?
    } else {
        config.plain_command_for(name, &options.tail)?
    };
    let status = command
        .status()
        .with_context(|| format!("failed to run logs for {name}"))?;
    if !status.success() {
        bail!("logs for {name} failed: {status}");
    }
    Ok(())
}
