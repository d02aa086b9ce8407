//! logdeck - tail several processes' logs in one terminal.
//!
//! This is the main binary entry point. See the `logdeck` library for the
//! viewer itself.

// Rust guideline compliant 2026-01

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use logdeck::config::{validate_tail, TAIL_ALL};
use logdeck::plain::{run_plain, PlainOptions};
use logdeck::viewer::restore_terminal;
use logdeck::{Config, Viewer};
use mimalloc::MiMalloc;

/// mimalloc as the global allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser, Debug)]
#[command(name = "logdeck")]
#[command(version)]
#[command(about = "Tail the logs of several processes in one tabbed terminal view")]
#[command(long_about = "Tail the logs of several processes in one tabbed terminal view.

By default, launches an interactive TUI with one tab per source, tailing logs
in real time. Use --no-tui to fall back to plain output.")]
struct Cli {
    /// Sources to show (default: every configured source)
    #[arg(value_name = "SOURCE")]
    sources: Vec<String>,

    /// Config file (default: $LOGDECK_CONFIG, ./logdeck.json, then the user config dir)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of lines to show from the end of the logs, or "all"
    #[arg(long, value_name = "N|all")]
    tail: Option<String>,

    /// Disable the interactive TUI and print logs to stdout
    #[arg(long)]
    no_tui: bool,

    /// Follow log output (only with --no-tui)
    #[arg(short, long, requires = "no_tui")]
    follow: bool,

    /// List configured sources and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    init_logging()?;
    install_panic_hook();

    let cli = Cli::parse();
    if let Some(tail) = &cli.tail {
        validate_tail(tail)?;
    }

    let config = Config::load(cli.config.as_deref())?;

    if cli.list {
        let mut out = std::io::stdout().lock();
        for name in config.source_names() {
            writeln!(out, "{name}")?;
        }
        return Ok(());
    }

    let names = config.select(&cli.sources)?;
    if names.is_empty() {
        println!("No sources defined.");
        return Ok(());
    }

    if cli.no_tui {
        let options = PlainOptions {
            tail: cli.tail.unwrap_or_else(|| TAIL_ALL.to_string()),
            follow: cli.follow,
        };
        return run_plain(&config, &names, &options, &mut std::io::stdout().lock());
    }

    run_viewer(&config, names, cli.tail.as_deref())
}

/// Run the interactive viewer on a current-thread runtime.
fn run_viewer(config: &Config, names: Vec<String>, tail: Option<&str>) -> Result<()> {
    // Set up signal handlers
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::flag;
    let shutdown = Arc::new(AtomicBool::new(false));
    flag::register(SIGINT, Arc::clone(&shutdown))?;
    flag::register(SIGTERM, Arc::clone(&shutdown))?;
    flag::register(SIGHUP, Arc::clone(&shutdown))?;

    // Build every command BEFORE entering raw mode so errors are visible
    let tail = config.viewer_tail(tail);
    let viewer = Viewer::new(names, |name| config.command_for(name, &tail))?
        .with_max_lines(config.max_lines)
        .with_max_line_bytes(config.max_line_bytes);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    log::info!("logdeck v{} starting", env!("CARGO_PKG_VERSION"));
    let result = runtime.block_on(viewer.run(shutdown));
    log::info!("logdeck exiting");
    result
}

/// Log to a file so the TUI's screen is left alone.
///
/// Uses `LOGDECK_LOG_FILE`, or `logdeck.log` in the temp dir.
fn init_logging() -> Result<()> {
    let log_path = std::env::var_os("LOGDECK_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("logdeck.log"));
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file at {}", log_path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .format_timestamp_secs()
        .init();
    Ok(())
}

/// Log panics and restore the terminal before the default hook prints.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        log::error!("PANIC: {panic_info}");
        restore_terminal();
        default_hook(panic_info);
    }));
}
