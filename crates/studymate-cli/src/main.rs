//! StudyMate CLI
//!
//! Command-line interface for the StudyMate keyed store and progress engine.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Local, TimeZone};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use studymate_core::{
    ActionContext, ActionKind, KeyedStore, Notification, ProgressEngine, Role, SpecialEvent,
    SqliteSubstrate, StoreConfig, StoreOptions, SystemClock,
};
use tracing_subscriber::EnvFilter;

/// StudyMate - local study store and progress CLI
#[derive(Parser)]
#[command(name = "studymate")]
#[command(author = "StudyMate Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect the StudyMate store and drive learner progress")]
struct Cli {
    /// Directory holding studymate.db (defaults to the platform data dir)
    #[arg(long, env = "STUDYMATE_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Identity to run as: learner, owner or judge
    #[arg(long, env = "STUDYMATE_ROLE", default_value = "learner", global = true)]
    role: Role,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show storage statistics
    Stats,

    /// Print the value stored under a key
    Get {
        key: String,
        /// Print the raw stored text instead of the decoded value
        #[arg(long)]
        raw: bool,
    },

    /// Store a JSON value under a key
    Set {
        key: String,
        /// JSON value (bare words are stored as strings)
        value: String,
        /// Run-length compress large values
        #[arg(long)]
        compress: bool,
        /// Obfuscate the stored text (not encryption)
        #[arg(long)]
        encrypt: bool,
        /// Expire after this many seconds
        #[arg(long)]
        ttl_secs: Option<i64>,
        /// Schema version tag
        #[arg(long)]
        schema: Option<String>,
    },

    /// Delete a key
    Rm { key: String },

    /// List stored keys
    Keys,

    /// Write a backup of every stored value
    Export {
        /// Output file path
        output: PathBuf,
    },

    /// Replace all stored values with a backup
    Import {
        /// Backup file path
        file: PathBuf,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Remove expired and undecodable values
    Cleanup,

    /// Show level, streak and activity
    Progress {
        /// Print the full progress state as JSON
        #[arg(long)]
        json: bool,
    },

    /// List badges
    Badges {
        /// Include locked badges
        #[arg(long)]
        all: bool,
    },

    /// Award experience points
    Xp { amount: u64 },

    /// Log a learner action (note, quiz, deck, exam)
    Log {
        action: ActionKind,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        words: Option<u64>,
        /// Bytes
        #[arg(long)]
        file_size: Option<u64>,
        #[arg(long)]
        minutes: Option<u32>,
        #[arg(long)]
        score: Option<u32>,
    },

    /// Record that a feature was used today
    Feature { name: String },

    /// Record a session length in minutes
    Session {
        minutes: u32,
        /// The session was spent in exam mode
        #[arg(long)]
        exam: bool,
    },

    /// Enter the secret code
    Konami,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let store = open_store(cli.data_dir)?;

    match cli.command {
        Commands::Stats => run_stats(&store),
        Commands::Get { key, raw } => run_get(&store, &key, raw),
        Commands::Set {
            key,
            value,
            compress,
            encrypt,
            ttl_secs,
            schema,
        } => run_set(&store, &key, &value, compress, encrypt, ttl_secs, schema),
        Commands::Rm { key } => run_rm(&store, &key),
        Commands::Keys => run_keys(&store),
        Commands::Export { output } => run_export(&store, output),
        Commands::Import { file, yes } => run_import(&store, file, yes),
        Commands::Cleanup => run_cleanup(&store),
        Commands::Progress { json } => run_progress(store, cli.role, json),
        Commands::Badges { all } => run_badges(store, cli.role, all),
        Commands::Xp { amount } => with_engine(store, cli.role, |engine| {
            engine.add_experience(amount);
            println!("{} +{} XP", "Awarded".green(), amount);
        }),
        Commands::Log {
            action,
            topic,
            difficulty,
            words,
            file_size,
            minutes,
            score,
        } => {
            let context = ActionContext {
                difficulty,
                topic,
                word_count: words,
                file_size,
                session_minutes: minutes,
                score,
            };
            with_engine(store, cli.role, |engine| {
                engine.log_action(action, &context);
                println!("{} {}", "Logged".green(), action);
            })
        }
        Commands::Feature { name } => with_engine(store, cli.role, |engine| {
            engine.track_feature_use(&name);
            println!("{} {}", "Tracked feature".green(), name);
        }),
        Commands::Session { minutes, exam } => with_engine(store, cli.role, |engine| {
            let event = if exam {
                SpecialEvent::ExamSession { minutes }
            } else {
                SpecialEvent::SessionLength { minutes }
            };
            engine.track_special_event(event);
            println!("{} {} minutes", "Recorded session of".green(), minutes);
        }),
        Commands::Konami => with_engine(store, cli.role, |engine| {
            engine.trigger_easter_egg();
            println!("{}", "\u{2191}\u{2191}\u{2193}\u{2193}\u{2190}\u{2192}\u{2190}\u{2192}BA".magenta());
        }),
    }
}

fn open_store(data_dir: Option<PathBuf>) -> anyhow::Result<Arc<KeyedStore>> {
    let substrate = SqliteSubstrate::open(data_dir).context("failed to open the StudyMate database")?;
    tracing::debug!(path = %substrate.path().display(), "Using database");
    Ok(Arc::new(KeyedStore::with_parts(
        Box::new(substrate),
        StoreConfig::from_env(),
        Arc::new(SystemClock),
    )))
}

// ============================================================================
// STORE COMMANDS
// ============================================================================

fn run_stats(store: &KeyedStore) -> anyhow::Result<()> {
    let stats = store.stats();

    println!("{}", "=== StudyMate Storage ===".cyan().bold());
    println!();
    println!("{}: {}", "Items".white().bold(), stats.item_count);
    println!("{}: {}", "Total Size".white().bold(), format_bytes(stats.total_size));
    match &stats.largest_item {
        Some((key, size)) => println!(
            "{}: {} ({})",
            "Largest Item".white().bold(),
            key,
            format_bytes(*size)
        ),
        None => println!("{}: {}", "Largest Item".white().bold(), "none".dimmed()),
    }

    Ok(())
}

fn run_get(store: &KeyedStore, key: &str, raw: bool) -> anyhow::Result<()> {
    let output = if raw {
        store.raw(key)
    } else {
        store
            .get::<Value>(key)
            .map(|value| serde_json::to_string_pretty(&value))
            .transpose()?
    };

    match output {
        Some(text) => println!("{text}"),
        None => println!("{}", format!("No value stored under {key:?}").dimmed()),
    }
    Ok(())
}

fn run_set(
    store: &KeyedStore,
    key: &str,
    value: &str,
    compress: bool,
    encrypt: bool,
    ttl_secs: Option<i64>,
    schema: Option<String>,
) -> anyhow::Result<()> {
    let value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let mut options = StoreOptions {
        compress,
        encrypt,
        ..StoreOptions::default()
    };
    if let Some(secs) = ttl_secs {
        let Some(ttl) = Duration::try_seconds(secs) else {
            anyhow::bail!("--ttl-secs {secs} is out of range");
        };
        options = options.with_ttl(ttl);
    }
    if let Some(schema) = schema {
        options = options.with_version(schema);
    }

    if !store.set(key, &value, &options) {
        anyhow::bail!("failed to store {key:?} (see log output)");
    }
    println!("{} {}", "Stored".green(), key);
    Ok(())
}

fn run_rm(store: &KeyedStore, key: &str) -> anyhow::Result<()> {
    if !store.remove(key) {
        anyhow::bail!("failed to remove {key:?}");
    }
    println!("{} {}", "Removed".green(), key);
    Ok(())
}

fn run_keys(store: &KeyedStore) -> anyhow::Result<()> {
    let keys = store.keys();
    if keys.is_empty() {
        println!("{}", "No keys stored.".dimmed());
    }
    for key in keys {
        println!("{key}");
    }
    Ok(())
}

fn run_export(store: &KeyedStore, output: PathBuf) -> anyhow::Result<()> {
    let backup = store.export_all();
    anyhow::ensure!(!backup.is_empty(), "export produced no data");

    std::fs::write(&output, &backup)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} {} keys to {}",
        "Exported".green(),
        store.keys().len(),
        output.display()
    );
    Ok(())
}

fn run_import(store: &KeyedStore, file: PathBuf, yes: bool) -> anyhow::Result<()> {
    let backup = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    if !yes {
        print!(
            "{} Replace all {} stored keys with {}? [y/N] ",
            "WARNING:".red().bold(),
            store.keys().len(),
            file.display()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    if !store.import_all(&backup) {
        anyhow::bail!("backup {} was rejected or only partly restored", file.display());
    }
    println!("{} {} keys", "Restored".green(), store.keys().len());
    Ok(())
}

fn run_cleanup(store: &KeyedStore) -> anyhow::Result<()> {
    let report = store.cleanup();
    println!("{}", "=== StudyMate Cleanup ===".cyan().bold());
    println!("{}: {}", "Scanned".white().bold(), report.scanned);
    println!("{}: {}", "Expired".white().bold(), report.expired);
    println!("{}: {}", "Corrupt".white().bold(), report.corrupt);
    Ok(())
}

// ============================================================================
// PROGRESS COMMANDS
// ============================================================================

/// Open the engine, reconcile the session, run `action`, print notifications.
fn with_engine(
    store: Arc<KeyedStore>,
    role: Role,
    action: impl FnOnce(&mut ProgressEngine),
) -> anyhow::Result<()> {
    let mut engine = ProgressEngine::open(role, store);
    engine.start_session();
    action(&mut engine);
    print_notifications(&engine.drain_notifications());
    Ok(())
}

fn print_notifications(notifications: &[Notification]) {
    for note in notifications {
        println!("{} {}", note.title.yellow().bold(), note.message);
    }
}

fn run_progress(store: Arc<KeyedStore>, role: Role, json: bool) -> anyhow::Result<()> {
    let mut engine = ProgressEngine::open(role, store);
    engine.start_session();

    if json {
        println!("{}", serde_json::to_string_pretty(engine.state())?);
        return Ok(());
    }

    print_notifications(&engine.drain_notifications());

    let state = engine.state();
    let level = engine.level_details();

    println!("{}", "=== StudyMate Progress ===".cyan().bold());
    if role != Role::Learner {
        println!("{}: {}", "Role".white().bold(), role.to_string().magenta());
    }
    println!();
    println!("{}: {}", "Level".white().bold(), level.level);
    println!("{}: {}", "XP".white().bold(), state.xp);
    print_progress_bar(level.progress_percent, level.xp_to_next_level);
    println!("{}: {} days", "Streak".white().bold(), state.streak);
    println!("{}: {}", "Days Used".white().bold(), state.total_days_used);
    if let Some(first_use) = state.first_use {
        println!("{}: {}", "First Use".white().bold(), first_use);
    }
    println!("{}: {}", "Badges".white().bold(), state.badges.len());

    println!();
    println!("{}", "=== Actions ===".yellow().bold());
    for kind in ActionKind::ALL {
        println!("  {:22} {:>5}", kind.to_string(), state.actions.get(kind));
    }

    if state.special_events.button_mash_timestamp > 0 {
        if let Some(last) = Local
            .timestamp_millis_opt(state.special_events.button_mash_timestamp)
            .single()
        {
            println!();
            println!(
                "{}: {}",
                "Last Rapid Input".white().bold(),
                last.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
            );
        }
    }

    Ok(())
}

fn print_progress_bar(percent: u64, to_next: u64) {
    let bar_width: u64 = 30;
    let filled = (percent * bar_width / 100) as usize;
    let empty = (bar_width as usize).saturating_sub(filled);
    println!(
        "  [{}{}] {:>3}% ({} XP to next level)",
        "#".repeat(filled).green(),
        "-".repeat(empty).dimmed(),
        percent,
        to_next
    );
}

fn run_badges(store: Arc<KeyedStore>, role: Role, all: bool) -> anyhow::Result<()> {
    let mut engine = ProgressEngine::open(role, store);
    engine.start_session();
    print_notifications(&engine.drain_notifications());

    let view = engine.catalog_view();
    let unlocked = view.iter().filter(|b| b.unlocked).count();

    println!(
        "{} ({}/{})",
        "=== Badges ===".cyan().bold(),
        unlocked,
        studymate_core::progress::catalog().len()
    );
    for badge in view.iter().filter(|b| all || b.unlocked) {
        let name = if badge.unlocked {
            badge.name.green().bold()
        } else {
            badge.name.dimmed()
        };
        println!("  {} {:24} {}", badge.icon, name, badge.description.dimmed());
    }
    if !all && unlocked == 0 {
        println!("{}", "No badges yet. Use --all to see what is available.".dimmed());
    }
    Ok(())
}

fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}
