//! checkin-sync - inspect and drain the offline check-in queue.

mod app;
mod probe;

use std::path::PathBuf;

use checkin_config_and_utils::{init_logging, Config, Paths};
use clap::{Args, Parser, Subcommand};

/// Check-in sync command-line interface.
#[derive(Parser)]
#[command(name = "checkin-sync")]
#[command(about = "Offline queue and sync for guided check-ins")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (database, logs, config). Defaults to ~/.checkin-sync
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Supabase access token of the signed-in user
    #[arg(long, env = "CHECKIN_ACCESS_TOKEN", global = true, hide_env_values = true)]
    access_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show queued operations
    Status,
    /// Queue a write without contacting the remote store
    Enqueue {
        #[command(subcommand)]
        operation: EnqueueCommand,
    },
    /// Drain the queue once against Supabase
    Flush,
    /// Classify a remote error message
    Classify {
        /// Error text as reported by the remote store
        message: String,
    },
    /// Keep the queue flushed while connectivity comes and goes
    Run,
}

#[derive(Subcommand)]
pub(crate) enum EnqueueCommand {
    /// Queue a new check-in
    Create(CheckinArgs),
    /// Queue an edit of an existing check-in
    Update {
        /// Remote id of the check-in
        target_id: String,
        #[command(flatten)]
        checkin: CheckinArgs,
    },
    /// Queue removal of a check-in
    Delete {
        /// Remote id of the check-in
        target_id: String,
    },
}

#[derive(Args)]
pub(crate) struct CheckinArgs {
    /// What was on your mind
    #[arg(long, default_value = "")]
    pub thoughts: String,

    /// Emotion label (repeatable)
    #[arg(long = "emotion")]
    pub emotions: Vec<String>,

    /// Body sensation (repeatable)
    #[arg(long = "sensation")]
    pub body_sensations: Vec<String>,

    /// Energy level from 1 to 10
    #[arg(long)]
    pub energy: u8,

    /// What you did about it
    #[arg(long, default_value = "")]
    pub behavior: String,

    /// Free-form note
    #[arg(long)]
    pub note: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    // Initialize logging
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(&paths, level, matches!(cli.command, Commands::Run));

    let open = || app::AppContext::open(config, paths, cli.access_token);
    match cli.command {
        Commands::Status => app::status(&open()?)?,
        Commands::Enqueue { operation } => app::enqueue(&open()?, operation)?,
        Commands::Flush => app::flush(&open()?).await?,
        Commands::Run => app::run(&open()?).await?,
        Commands::Classify { message } => app::classify(&message)?,
    }

    Ok(())
}
