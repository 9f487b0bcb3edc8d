//! # Study Harness CLI (`study`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `study serve` | Start the JSON HTTP API |
//! | `study chunk <file>` | Print the chunks a note would be split into |
//! | `study scan <file>` | Run the injection detector over a file |
//! | `study ask "<question>" --note <file>...` | Answer from local note files |
//! | `study plan --goals ... --start ...` | Export a weekly study plan as `.ics` |
//!
//! ## Examples
//!
//! ```bash
//! study serve --config ./config/study.toml
//! study ask "AND gate" --note notes/logic.txt --top-k 3
//! study plan --goals "Digital logic" --start 2026-03-02 --output week.ics
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use study_harness::chunk::{self, ChunkOptions};
use study_harness::planner::{self, PlanArgs};
use study_harness::{ask, config, detect, server};

/// Study Harness CLI: notes in, grounded answers and study calendars out.
#[derive(Parser)]
#[command(name = "study", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(
        long,
        global = true,
        env = "STUDY_CONFIG",
        default_value = "./config/study.toml"
    )]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Override `[server].bind`.
        #[arg(long, env = "STUDY_BIND")]
        bind: Option<String>,
    },

    /// Split a note file into chunks and print them.
    Chunk {
        path: PathBuf,

        /// Override `[chunking].max_chars`.
        #[arg(long)]
        max_chars: Option<usize>,

        /// Override `[chunking].overlap_chars`.
        #[arg(long)]
        overlap_chars: Option<usize>,
    },

    /// Scan a file for injection signatures. Exits non-zero when blocked.
    Scan { path: PathBuf },

    /// Answer a question from one or more note files.
    Ask {
        question: String,

        /// Note file to load (repeatable).
        #[arg(long = "note", required = true)]
        notes: Vec<PathBuf>,

        /// Number of citations (defaults to `[retrieval].default_top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Build a weekly study plan and export it as iCalendar.
    Plan {
        /// What the sessions are for.
        #[arg(long)]
        goals: String,

        /// Start date, `YYYY-MM-DD` or an ISO-8601 date-time.
        #[arg(long)]
        start: String,

        /// Timezone label written into the calendar.
        #[arg(long)]
        timezone: Option<String>,

        /// Minutes per session.
        #[arg(long)]
        minutes: Option<u32>,

        /// Sessions per week (1-7).
        #[arg(long)]
        sessions: Option<u32>,

        /// Write the calendar here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            server::run_server(&cfg).await?;
        }
        Commands::Chunk {
            path,
            max_chars,
            overlap_chars,
        } => {
            let mut opts = ChunkOptions::from(&cfg.chunking);
            if let Some(max_chars) = max_chars {
                opts.max_chars = max_chars;
            }
            if let Some(overlap_chars) = overlap_chars {
                opts.overlap_chars = overlap_chars;
            }
            if opts.max_chars == 0 {
                anyhow::bail!("--max-chars must be > 0");
            }
            chunk::run_chunk(&path, &opts)?;
        }
        Commands::Scan { path } => {
            detect::run_scan(&path)?;
        }
        Commands::Ask {
            question,
            notes,
            top_k,
        } => {
            ask::run_ask(&cfg, &question, &notes, top_k)?;
        }
        Commands::Plan {
            goals,
            start,
            timezone,
            minutes,
            sessions,
            output,
        } => {
            planner::run_plan(
                &cfg,
                PlanArgs {
                    goals,
                    start,
                    timezone,
                    minutes,
                    sessions,
                    output,
                },
            )?;
        }
    }

    Ok(())
}
