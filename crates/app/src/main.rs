//! `simulado`: terminal exam simulator.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use quiz_core::QuestionBank;
use services::{SessionManager, StartView};
use storage::Storage;
use storage::bank_file::{load_question_bank, parse_question_bank};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod play;
mod render;

const DEFAULT_DB_URL: &str = "sqlite://simulado.sqlite3";
const DEFAULT_LOG_FILTER: &str = "simulado=info,services=info,storage=warn";
const SAMPLE_BANK: &str = include_str!("../assets/sample_bank.json");

#[derive(Debug, Parser)]
#[command(name = "simulado", version, about = "Timed multiple-choice exam simulator")]
struct Cli {
    /// SQLite database URL or path; `memory` keeps progress in memory only
    #[arg(long, global = true, env = "SIMULADO_DB_URL", default_value = DEFAULT_DB_URL)]
    db: String,

    /// Question bank JSON file; the bundled sample bank is used when omitted
    #[arg(long, global = true, env = "SIMULADO_BANK")]
    bank: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Answer questions interactively (default)
    Play,

    /// Show saved progress per module
    Status {
        /// Print the progress as JSON
        #[arg(long)]
        json: bool,
    },

    /// Discard all saved progress
    Reset,

    /// Load the question bank and report what it contains
    ValidateBank,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_bank(path: Option<&Path>) -> anyhow::Result<QuestionBank> {
    match path {
        Some(path) => load_question_bank(path)
            .with_context(|| format!("failed to load question bank {}", path.display())),
        None => parse_question_bank(SAMPLE_BANK).context("bundled sample bank is invalid"),
    }
}

fn is_memory_url(raw: &str) -> bool {
    matches!(raw.trim(), "memory" | ":memory:" | "sqlite::memory:")
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directory if needed.
fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
    }
    Ok(())
}

async fn open_storage(raw: &str) -> anyhow::Result<Storage> {
    if is_memory_url(raw) {
        info!("keeping progress in memory only");
        return Ok(Storage::in_memory());
    }
    let url = normalize_sqlite_url(raw);
    prepare_sqlite_file(&url)?;
    let storage = Storage::sqlite(&url)
        .await
        .with_context(|| format!("failed to open database {url}"))?;
    info!(%url, "opened database");
    Ok(storage)
}

fn status(manager: &SessionManager, json: bool) -> anyhow::Result<()> {
    let view = StartView::from_state(manager.state(), manager.bank());
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for card in &view.modules {
        let resumable = if card.resumable { ", in progress" } else { "" };
        println!(
            "module {}: {} questions, {}% answered{resumable}",
            card.id, card.question_count, card.answered_percent
        );
    }
    let resumable = if view.random_mix.resumable { ", in progress" } else { "" };
    println!(
        "random mix: {} questions{resumable}",
        view.random_mix.pool_size
    );
    println!("selected: {}", view.selected);
    Ok(())
}

fn validate_bank(bank: &QuestionBank) {
    for (number, questions) in bank.modules() {
        let explained = questions
            .iter()
            .filter(|q| q.explanation().is_some())
            .count();
        println!(
            "module {number}: {} questions ({explained} with explanations)",
            questions.len()
        );
    }
    println!("total: {} questions", bank.all_questions().len());
    if bank.is_empty() {
        println!("warning: the bank has no questions");
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let bank = load_bank(cli.bank.as_deref())?;

    match cli.command.unwrap_or(Command::Play) {
        Command::ValidateBank => {
            validate_bank(&bank);
            Ok(())
        }
        Command::Play => {
            let storage = open_storage(&cli.db).await?;
            play::run(Arc::new(bank), storage.quiz_state()).await
        }
        Command::Status { json } => {
            let storage = open_storage(&cli.db).await?;
            let manager = SessionManager::initialize(Arc::new(bank), storage.quiz_state()).await;
            status(&manager, json)
        }
        Command::Reset => {
            let storage = open_storage(&cli.db).await?;
            let mut manager =
                SessionManager::initialize(Arc::new(bank), storage.quiz_state()).await;
            manager.reset_all().await;
            manager
                .flush()
                .await
                .context("failed to save the reset state")?;
            println!("all progress discarded");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
