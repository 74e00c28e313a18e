//! evalog CLI: ask a model, judge its answers and analyse the history.

mod commands;
mod render;
mod session;

use clap::Parser;
use evalog_core::record::MetricColumn;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// evalog: score chatbot answers against reference answers and track them over time
#[derive(Parser, Debug)]
#[command(name = "evalog", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds `.evalog/config.toml` and relative database paths)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Model used for generation
    #[arg(short, long)]
    model: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Ask the model a question and record your judgement of the answer
    Ask {
        /// First question (prompted for when omitted)
        question: Option<String>,
        /// Stop after one exchange
        #[arg(long)]
        once: bool,
    },
    /// Score an answer against a reference without storing it
    Score {
        /// Answer to score
        #[arg(short, long)]
        candidate: String,
        /// Reference answer
        #[arg(short, long)]
        reference: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Browse stored exchanges, newest first
    History {
        #[arg(short, long, value_enum, default_value_t = commands::HistoryFilter::All)]
        filter: commands::HistoryFilter,
        /// Page number (clamped to the available pages)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Statistics over judged exchanges
    Stats {
        /// Entries in the efficiency ranking
        #[arg(long)]
        top: Option<usize>,
        /// Only compare this metric against response time
        #[arg(long)]
        metric: Option<MetricColumn>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Add the sample evaluations
    Seed,
    /// Delete every stored exchange
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Number of stored exchanges
    Count,
    /// Explain the recorded metrics
    Metrics,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default `.evalog/config.toml` in the workspace
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "evalog", "evalog")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "evalog.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if !evalog_core::config::config_exists(Some(&workspace)) {
        tracing::debug!(workspace = %workspace.display(), "No config file found; using defaults");
    }

    let mut config = evalog_core::load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    if let Some(db) = cli.db {
        config.store.db_path = db;
    }
    if let Some(model) = cli.model {
        config.generation.model = model;
    }

    let ctx = commands::Context::new(config, workspace);
    commands::handle_command(cli.command, &ctx).await
}
