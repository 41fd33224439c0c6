//! # Rusty-Journal Binary
//!
//! The entry point that assembles the application based on compile-time features.
//!
//! # Subcommands
//! - `save`    write today's (or `--date`) entry, staged as a draft when offline
//! - `sync`    offer a staged draft for syncing (`--yes`) or discarding (`--discard`)
//! - `streak`  show the current streak
//! - `show`    print the entry for a date
//! - `history` list past entries, newest first
//! - `delete`  delete an entry by id
//! - `remind`  run the daily reminder until Ctrl-C

mod app;

use app::{App, Overrides};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use configs::{AppConfig, LogConfig};
use rj_core::streak::celebration;
use rj_core::{EntryId, JournalEntry, JournalEntryInput, SaveError};
use rj_services::{
    ReconcileOutcome, ReminderScheduler, ReminderSink, SaveOutcome, SavedEntry, SyncDecision,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "rusty-journal", version, about = "Daily journal with offline drafts and streaks")]
struct Cli {
    /// TOML configuration file layered over the built-in defaults
    #[arg(short, long, env = "RJ_CONFIG")]
    config: Option<PathBuf>,

    /// Treat the device as offline
    #[arg(long)]
    offline: bool,

    /// Local profile to sign in as
    #[arg(long)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Save a journal entry
    Save(SaveArgs),

    /// Reconcile a draft left from an offline session
    Sync {
        /// Write the draft now
        #[arg(long, conflicts_with = "discard")]
        yes: bool,

        /// Throw the draft away
        #[arg(long)]
        discard: bool,
    },

    /// Show the current streak
    Streak,

    /// Print the entry for a date
    Show {
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List past entries, newest first
    History {
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Only entries for this date (YYYY-MM-DD)
        #[arg(long, conflicts_with_all = ["limit", "offset"])]
        date: Option<NaiveDate>,
    },

    /// Delete an entry
    Delete {
        #[arg(long)]
        id: EntryId,
    },

    /// Send a daily reminder at a local time
    Remind {
        /// HH:MM
        #[arg(long, value_parser = parse_time)]
        at: NaiveTime,
    },
}

#[derive(Debug, Args)]
struct SaveArgs {
    /// YYYY-MM-DD, defaults to today
    #[arg(long)]
    date: Option<String>,

    /// 1 to 10
    #[arg(long)]
    rating: Option<f64>,

    #[arg(long, default_value = "")]
    liked: String,

    #[arg(long, default_value = "")]
    didnt_like: String,

    #[arg(long, default_value = "")]
    other_thoughts: String,

    #[arg(long, default_value = "")]
    tomorrow_plans: String,

    /// Update this entry instead of creating a new one
    #[arg(long)]
    id: Option<EntryId>,

    /// Run the text cleaner over every field first
    #[arg(long)]
    cleanup: bool,
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

fn init_tracing(cfg: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if cfg.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

struct StdoutSink;

impl ReminderSink for StdoutSink {
    fn notify(&self, title: &str, body: &str) {
        println!("🔔 {title}: {body}");
    }
}

fn fail(err: SaveError) -> ! {
    eprintln!("{err}");
    std::process::exit(1);
}

fn print_saved(saved: &SavedEntry) {
    let verb = if saved.is_new_entry { "Saved" } else { "Updated" };
    println!("{verb} journal entry {}", saved.id);
    if let Some(update) = &saved.streak {
        if let Some(c) = celebration(update) {
            if c.is_festive() {
                println!("\n✨ {} ✨\n", c.message());
            } else {
                println!("{}", c.message());
            }
        }
        println!("Current streak: {} days", update.current_streak());
    }
}

async fn save(app: &App, args: SaveArgs) {
    let date = args.date.unwrap_or_else(|| {
        app.calendar
            .local_date(app.clock.now())
            .format("%Y-%m-%d")
            .to_string()
    });

    let mut input = JournalEntryInput {
        date,
        rating: args.rating,
        liked: args.liked,
        didnt_like: args.didnt_like,
        other_thoughts: args.other_thoughts,
        tomorrow_plans: args.tomorrow_plans,
    };
    if args.cleanup {
        input.liked = app.cleaner.clean(&input.liked).await;
        input.didnt_like = app.cleaner.clean(&input.didnt_like).await;
        input.other_thoughts = app.cleaner.clean(&input.other_thoughts).await;
        input.tomorrow_plans = app.cleaner.clean(&input.tomorrow_plans).await;
    }

    match app.orchestrator.save_entry(&input, args.id).await {
        Ok(SaveOutcome::Saved(saved)) => print_saved(&saved),
        Ok(SaveOutcome::Staged { entry_id }) => {
            println!("You're offline. Your journal has been saved as a draft and will sync when you reconnect.");
            println!("Draft id: {entry_id}");
        }
        Err(err) => fail(err),
    }
}

fn print_summary(entry: &JournalEntry) {
    let rating = entry
        .rating
        .map(|r| format!("{r:.1}/10"))
        .unwrap_or_else(|| "-".to_string());
    let preview: String = entry
        .liked
        .as_deref()
        .or(entry.other_thoughts.as_deref())
        .unwrap_or("")
        .chars()
        .take(60)
        .collect();
    println!("{}  {:>7}  {}  {}", entry.date, rating, entry.id, preview);
}

async fn history(app: &App, limit: u32, offset: u32, date: Option<NaiveDate>) {
    if let Some(date) = date {
        match app.orchestrator.entries_for_date(date).await {
            Ok(entries) if entries.is_empty() => println!("No entries for {date}."),
            Ok(entries) => entries.iter().for_each(print_summary),
            Err(err) => fail(err),
        }
        return;
    }

    match app.orchestrator.history(limit, offset).await {
        Ok(page) => {
            page.entries.iter().for_each(print_summary);
            let shown = u64::from(offset) + page.entries.len() as u64;
            println!("Showing {shown} of {} entries.", page.total);
            if page.has_more {
                println!("More with `rusty-journal history --offset {shown}`.");
            }
        }
        Err(err) => fail(err),
    }
}

async fn sync(app: &App, yes: bool, discard: bool) {
    let Some(prompt) = app.reconcile.pending().await else {
        println!("Nothing to sync.");
        return;
    };
    println!(
        "You have an unsaved journal entry for {} from {}.",
        prompt.draft.entry.date, prompt.age_text
    );

    let decision = match (yes, discard) {
        (true, _) => SyncDecision::SyncNow,
        (_, true) => SyncDecision::Discard,
        _ => {
            println!("Run `rusty-journal sync --yes` to sync it or `--discard` to drop it.");
            return;
        }
    };

    match app.reconcile.resolve(decision).await {
        ReconcileOutcome::Synced(saved) => print_saved(&saved),
        ReconcileOutcome::Discarded => println!("Draft discarded."),
        ReconcileOutcome::NothingPending => println!("Nothing to sync."),
        ReconcileOutcome::Retry { reason } => {
            match reason {
                Some(err) => eprintln!("{err}"),
                None => eprintln!("Still offline. The draft is kept."),
            }
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&cfg.log);

    let app = App::build(
        cfg,
        Overrides {
            offline: cli.offline,
            profile: cli.profile,
        },
    )
    .await?;

    match cli.command {
        Commands::Save(args) => save(&app, args).await,
        Commands::Sync { yes, discard } => sync(&app, yes, discard).await,
        Commands::Streak => {
            let record = app.streaks.current().await;
            println!("Current streak: {} days", record.current_streak);
            println!("Longest streak: {} days", record.longest_streak);
            if let Some(last) = record.last_journal_created_at {
                println!("Last entry: {}", app.calendar.local_date(last));
            }
        }
        Commands::Show { date } => {
            let date = date.unwrap_or_else(|| app.calendar.local_date(app.clock.now()));
            match app.orchestrator.entry_for_date(date).await {
                Ok(Some(entry)) => println!("{}", serde_json::to_string_pretty(&entry)?),
                Ok(None) => println!("No entry for {date}."),
                Err(err) => fail(err),
            }
        }
        Commands::History { limit, offset, date } => history(&app, limit, offset, date).await,
        Commands::Delete { id } => match app.orchestrator.delete_entry(id).await {
            Ok(()) => println!("Deleted journal entry {id}"),
            Err(err) => fail(err),
        },
        Commands::Remind { at } => {
            let scheduler = ReminderScheduler::new(app.clock.clone(), app.calendar.clone(), Arc::new(StdoutSink));
            scheduler.schedule_daily(
                at,
                "Time to journal",
                "Take a few minutes to reflect on your day.",
            );
            println!("Reminding you daily at {}. Press Ctrl-C to stop.", at.format("%H:%M"));
            tokio::signal::ctrl_c().await?;
            scheduler.cancel_all();
        }
    }

    Ok(())
}
