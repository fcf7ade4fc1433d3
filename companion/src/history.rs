//! companion-history - browse AI assistant session history
//!
//! Lists projects with history and the sessions recorded for each, and
//! dumps reconstructed transcripts as JSON.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/companion/companion.log.YYYY-MM-DD (~/.local/state/companion/)
//! - Config: $XDG_CONFIG_HOME/companion/config.toml (~/.config/companion/config.toml)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use companion_core::format::format_relative_time;
use companion_core::history::{load_full, provider_from_config, scan_metadata};
use companion_core::types::{ContentBlock, Message, Session};
use companion_core::Config;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "companion-history")]
#[command(about = "Browse AI assistant session history")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List sessions recorded for a project, newest first
    List {
        /// Project directory
        project: PathBuf,

        /// Only show sessions whose preview or date contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Print sessions as JSON
        #[arg(long)]
        json: bool,
    },

    /// List projects that have recorded history
    Projects {
        /// Print projects as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconstruct one session file and print it as JSON
    Show {
        /// Path to a session JSONL file
        file: PathBuf,

        /// Compact JSON output (default: pretty)
        #[arg(long)]
        compact: bool,

        /// Show only summary statistics (no messages)
        #[arg(long)]
        summary: bool,
    },
}

/// Output structure for `show`
#[derive(Serialize)]
struct ShowOutput {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<Session>,
    stats: Stats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<Message>,
}

/// Summary statistics
#[derive(Serialize)]
struct Stats {
    message_count: usize,
    by_role: BTreeMap<String, usize>,
    by_block: BTreeMap<String, usize>,
    tool_uses: usize,
    tool_errors: usize,
    unanswered_tool_uses: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        companion_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("companion-history starting");

    match args.command {
        Command::List {
            project,
            filter,
            json,
        } => list_sessions(&config, &project, filter.as_deref(), json),
        Command::Projects { json } => list_projects(&config, json),
        Command::Show {
            file,
            compact,
            summary,
        } => show_session(&file, compact, summary),
    }
}

fn list_sessions(
    config: &Config,
    project: &Path,
    filter: Option<&str>,
    json: bool,
) -> Result<()> {
    let project = resolve_project(project);
    let provider = provider_from_config(&config.history).context("failed to select provider")?;

    let sessions: Vec<Session> = provider
        .sessions_for_path(&project)
        .into_iter()
        .filter(|s| filter.map_or(true, |q| s.matches_filter(q)))
        .collect();

    tracing::info!(
        project = %project.display(),
        provider = provider.name(),
        count = sessions.len(),
        "Listed sessions"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions found for {}", project.display());
        return Ok(());
    }

    println!("{} session(s) for {}:", sessions.len(), project.display());
    for session in &sessions {
        let when = session
            .timestamp
            .map(format_relative_time)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {:>9}  {:>4} msgs  {:<50}  {}",
            session.display_date(),
            when,
            session.message_count,
            session.short_preview().replace('\n', " "),
            session.id
        );
    }

    Ok(())
}

fn list_projects(config: &Config, json: bool) -> Result<()> {
    let provider = provider_from_config(&config.history).context("failed to select provider")?;
    let projects = provider.projects();

    tracing::info!(
        provider = provider.name(),
        count = projects.len(),
        "Listed projects"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    if projects.is_empty() {
        println!("No {} history found", provider.name());
        return Ok(());
    }

    println!("{} project(s) with {} history:", projects.len(), provider.name());
    for project in &projects {
        let marker = if project.is_dir() { "" } else { "  (missing)" };
        println!("  {}{}", project.display(), marker);
    }

    Ok(())
}

fn show_session(file: &Path, compact: bool, summary: bool) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let messages = load_full(file);
    let output = ShowOutput {
        file: file.display().to_string(),
        session: scan_metadata(file),
        stats: compute_stats(&messages),
        messages: if summary { Vec::new() } else { messages },
    };

    if compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

/// Absolute form of the project path, which is how history directories are named.
fn resolve_project(project: &Path) -> PathBuf {
    std::fs::canonicalize(project).unwrap_or_else(|_| {
        if project.is_absolute() {
            project.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(project))
                .unwrap_or_else(|_| project.to_path_buf())
        }
    })
}

fn compute_stats(messages: &[Message]) -> Stats {
    let mut by_role: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_block: BTreeMap<String, usize> = BTreeMap::new();
    let mut tool_uses = 0;
    let mut tool_errors = 0;
    let mut unanswered_tool_uses = 0;

    for msg in messages {
        *by_role.entry(msg.role.as_str().to_string()).or_insert(0) += 1;

        for block in &msg.blocks {
            *by_block.entry(block.type_name().to_string()).or_insert(0) += 1;

            if let ContentBlock::ToolUse(tool) = block {
                tool_uses += 1;
                if tool.is_error {
                    tool_errors += 1;
                }
                if !tool.has_result() {
                    unanswered_tool_uses += 1;
                }
            }
        }
    }

    Stats {
        message_count: messages.len(),
        by_role,
        by_block,
        tool_uses,
        tool_errors,
        unanswered_tool_uses,
    }
}
