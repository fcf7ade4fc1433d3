//! companion-watch - print debounced project change notifications
//!
//! Runs the change coalescer on a project and prints one line per
//! notification until interrupted.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/companion/companion.log.YYYY-MM-DD (~/.local/state/companion/)
//! - Config: $XDG_CONFIG_HOME/companion/config.toml (~/.config/companion/config.toml)

use anyhow::{Context, Result};
use clap::Parser;
use companion_core::monitor::{Category, FileMonitor, Notification};
use companion_core::Config;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "companion-watch")]
#[command(about = "Print debounced change notifications for a project")]
#[command(version)]
struct Args {
    /// Project directory
    project: PathBuf,

    /// Also watch this directory (relative to the project); repeatable
    #[arg(long, value_name = "DIR")]
    expand: Vec<PathBuf>,

    /// Only print these channels (e.g. git-status, working-tree); repeatable
    #[arg(long, value_name = "CATEGORY")]
    only: Vec<String>,

    /// Print notifications as JSON lines
    #[arg(long)]
    json: bool,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long, value_name = "SECONDS")]
    exit_after: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        companion_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("companion-watch starting");

    let project = std::fs::canonicalize(&args.project)
        .with_context(|| format!("Project not found: {}", args.project.display()))?;
    let categories = parse_categories(&args.only)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        eprintln!("\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let mut monitor = FileMonitor::new(&project, config.monitor.clone());

    let mut directories = vec![project.clone()];
    directories.extend(args.expand.iter().map(|dir| project.join(dir)));
    for dir in &directories {
        if !monitor.add_working_tree_watch(dir) {
            eprintln!("Warning: not watching {}", dir.display());
        }
    }

    for category in categories {
        let json = args.json;
        monitor.connect(
            category,
            Box::new(move |notification: &Notification| print_notification(notification, json)),
        );
    }

    println!(
        "Watching {} (git: {}, {} fixed watch(es), {} director(ies)). Press Ctrl+C to stop.",
        project.display(),
        if monitor.is_git_repo() { "yes" } else { "no" },
        monitor.fixed_watch_count(),
        monitor.watched_directories().len()
    );

    let stop_at = args
        .exit_after
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    while running.load(Ordering::SeqCst) {
        if stop_at.is_some_and(|t| Instant::now() >= t) {
            break;
        }
        monitor.wait_and_dispatch(Duration::from_millis(250));
    }

    monitor.shutdown();
    println!("Watch stopped.");
    tracing::info!("companion-watch stopped");

    Ok(())
}

/// Channels selected with `--only`, or all of them.
fn parse_categories(names: &[String]) -> Result<Vec<Category>> {
    if names.is_empty() {
        return Ok(Category::ALL.to_vec());
    }

    names
        .iter()
        .map(|name| {
            let name = name.trim_end_matches("-changed");
            Category::ALL
                .into_iter()
                .find(|c| c.as_str() == name)
                .with_context(|| format!("unknown category: {}", name))
        })
        .collect()
}

fn print_notification(notification: &Notification, json: bool) {
    if json {
        match serde_json::to_string(notification) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "Failed to encode notification"),
        }
        return;
    }

    let timestamp = chrono::Local::now().format("%H:%M:%S");
    println!("[{}] {}", timestamp, notification);
}
