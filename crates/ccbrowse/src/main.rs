//! ccbrowse - Browse, group and manage Claude Code session transcripts

mod cli;

use anyhow::{bail, Context, Result};
use ccbrowse_core::models::{SessionId, Transcript};
use ccbrowse_core::{
    AnySource, BrowsePreferences, GroupMode, HttpSessionSource, LocalSessionStore,
    SessionDataController, SessionSource,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "ccbrowse.log";

#[derive(Parser)]
#[command(
    name = "ccbrowse",
    version,
    about = "Browse, group and manage Claude Code session transcripts",
    long_about = "Browse the session transcripts Claude Code records under ~/.claude/projects.\n\
                  \n\
                  Sessions can be listed flat or grouped by folder or by date, opened to read\n\
                  the full transcript, marked as favorites and deleted. The same data is\n\
                  available over a small JSON API.\n\
                  \n\
                  Examples:\n\
                    ccbrowse                               # Run TUI (default)\n\
                    ccbrowse serve --open                  # Web server on 127.0.0.1:8765\n\
                    ccbrowse --server http://host:8765     # TUI against a remote server\n\
                    ccbrowse list --group date             # Sessions grouped by date\n\
                    ccbrowse show <session-id> --json      # One transcript as JSON\n\
                  \n\
                  Environment Variables:\n\
                    CCBROWSE_CLAUDE_HOME                   # Override Claude home directory\n\
                    CCBROWSE_SERVER                        # Remote server base URL\n\
                    CCBROWSE_LIMIT                         # Sessions fetched by `list`\n\
                    CCBROWSE_NO_COLOR                      # Disable table colors\n\
                    RUST_LOG                               # Log filter (default ccbrowse=info)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Path to Claude home directory (default: ~/.claude)
    #[arg(long, global = true, env = "CCBROWSE_CLAUDE_HOME")]
    claude_home: Option<PathBuf>,

    /// Read sessions from a running `ccbrowse serve` instead of the local disk
    #[arg(long, global = true, env = "CCBROWSE_SERVER")]
    server: Option<String>,

    /// Disable table colors
    #[arg(long, global = true, env = "CCBROWSE_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the terminal browser (default)
    Tui,
    /// Serve the JSON API for local sessions
    Serve {
        /// Port for web server
        #[arg(long, default_value = "8765")]
        port: u16,
        /// Open the server in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Print sessions and exit
    List {
        /// Maximum sessions (default: saved preference, 50)
        #[arg(long, short = 'n', env = "CCBROWSE_LIMIT")]
        limit: Option<usize>,
        /// Grouping: none, folder or date
        #[arg(long, short = 'g', default_value = "none")]
        group: GroupMode,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one transcript and exit
    Show {
        /// Session ID
        session_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let claude_home = cli
        .claude_home
        .or_else(|| dirs::home_dir().map(|h: PathBuf| h.join(".claude")))
        .context("Could not determine Claude home directory")?;
    let cache_dir = claude_home.join("cache");

    let mode = cli.mode.unwrap_or(Mode::Tui);
    init_logging(&mode, &cache_dir)?;

    match mode {
        Mode::Tui => run_tui(&claude_home, cli.server.as_deref(), cache_dir).await,
        Mode::Serve { port, open } => {
            if cli.server.is_some() {
                bail!("`serve` publishes local sessions; drop --server");
            }
            run_serve(claude_home, port, open).await
        }
        Mode::List { limit, group, json } => {
            let source = build_source(&claude_home, cli.server.as_deref())?;
            let limit = limit.unwrap_or_else(|| BrowsePreferences::load(&cache_dir).limit);
            run_list(&source, limit, group, json, cli.no_color).await
        }
        Mode::Show { session_id, json } => {
            let source = build_source(&claude_home, cli.server.as_deref())?;
            run_show(&source, SessionId::from(session_id), json).await
        }
    }
}

/// Install the tracing subscriber
///
/// The TUI owns the terminal, so its logs go to `<cache_dir>/ccbrowse.log`.
/// Everything else logs to stderr; one-shot commands default to warnings only.
fn init_logging(mode: &Mode, cache_dir: &Path) -> Result<()> {
    let default_directive = match mode {
        Mode::Tui | Mode::Serve { .. } => "ccbrowse=info",
        Mode::List { .. } | Mode::Show { .. } => "ccbrowse=warn",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    if let Mode::Tui = mode {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create {}", cache_dir.display()))?;
        let path = cache_dir.join(LOG_FILE);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

fn build_source(claude_home: &Path, server: Option<&str>) -> Result<AnySource> {
    let source = match server {
        Some(url) => AnySource::Remote(
            HttpSessionSource::new(url, HttpSessionSource::DEFAULT_TIMEOUT)
                .with_context(|| format!("Invalid server {}", url))?,
        ),
        None => AnySource::Local(LocalSessionStore::new(claude_home)),
    };
    info!(source = %source.describe(), "Session source ready");
    Ok(source)
}

async fn run_tui(claude_home: &Path, server: Option<&str>, cache_dir: PathBuf) -> Result<()> {
    let source = Arc::new(build_source(claude_home, server)?);
    let controller = Arc::new(SessionDataController::new(source));
    let preferences = BrowsePreferences::load(&cache_dir);

    ccbrowse_tui::run(controller, preferences, Some(cache_dir)).await
}

async fn run_serve(claude_home: PathBuf, port: u16, open: bool) -> Result<()> {
    let store = Arc::new(LocalSessionStore::new(claude_home));
    let listener = tokio::net::TcpListener::bind(ccbrowse_web::bind_addr(port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    if open {
        let url = format!("http://{}", ccbrowse_web::bind_addr(port));
        if let Err(e) = open::that(&url) {
            warn!(%url, error = %e, "Could not open browser");
        }
    }

    ccbrowse_web::serve(listener, store).await
}

async fn run_list(
    source: &AnySource,
    limit: usize,
    group: GroupMode,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let sessions = source
        .list_sessions(limit)
        .await
        .with_context(|| format!("Failed to list sessions from {}", source.describe()))?;

    if json {
        println!("{}", cli::format_sessions_json(&sessions));
    } else {
        println!(
            "{}",
            cli::format_sessions(&sessions, group, &Local::now(), no_color)
        );
    }
    Ok(())
}

async fn run_show(source: &AnySource, id: SessionId, json: bool) -> Result<()> {
    let response = source
        .transcript(&id)
        .await
        .with_context(|| format!("Failed to load session {}", id))?;
    let transcript = Transcript::from_response(id, response);

    if json {
        println!("{}", cli::format_transcript_json(&transcript));
    } else {
        println!("{}", cli::format_transcript(&transcript));
    }
    Ok(())
}
