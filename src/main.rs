use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use progression::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "progression")]
#[command(about = "Progression rewards engine - XP, coins, streaks, badges and challenges")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.progression/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database (overrides [store] path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Award the reward for a business event
    Award {
        user: String,
        /// Event kind, e.g. lesson_completed
        kind: String,
        /// Id of the business object behind the event
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Record daily activity
    Streak {
        user: String,
        /// Activity date as YYYY-MM-DD (defaults to today, UTC)
        #[arg(long)]
        date: Option<String>,
    },

    /// Evaluate badge rules and grant newly earned badges
    Badges { user: String },

    /// Seed the badge catalog
    Seed,

    /// Manage challenges
    Challenge {
        #[command(subcommand)]
        command: ChallengeCommands,
    },

    /// Enroll a user in all active challenges
    Enroll { user: String },

    /// Advance a user's challenges for an event
    Progress { user: String, kind: String },

    /// Show a user's progression
    Show {
        user: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Number of recent ledger entries to include
        #[arg(long, default_value_t = 10)]
        recent: usize,
    },

    /// Rebuild a user's totals from the ledger
    Reconcile { user: String },

    /// Initialize a new config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ChallengeCommands {
    /// Create a challenge starting now
    Add {
        /// Challenge type: lessons, quizzes, reviews, referrals, logins, teaching, streak
        #[arg(long)]
        kind: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        target: u32,
        #[arg(long, default_value_t = 0)]
        xp: i64,
        #[arg(long, default_value_t = 0)]
        coins: i64,
        /// Duration in days
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// List active challenges
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    if let Commands::Init { force } = cli.command {
        return cli::init::init_command(cli.config.as_deref(), force).await;
    }

    let config = Config::load(cli.config.as_deref())?;
    let engine = cli::open_engine(&config, cli.db.as_deref())?;

    match cli.command {
        Commands::Award {
            user,
            kind,
            reference,
            description,
        } => {
            cli::events::award_command(
                &engine,
                &user,
                &kind,
                reference.as_deref(),
                description.as_deref(),
            )
            .await?;
        }
        Commands::Streak { user, date } => {
            cli::events::streak_command(&engine, &user, date.as_deref()).await?;
        }
        Commands::Badges { user } => {
            cli::events::badges_command(&engine, &user).await?;
        }
        Commands::Seed => {
            cli::show::seed_command(engine.engine()).await?;
        }
        Commands::Challenge { command } => match command {
            ChallengeCommands::Add {
                kind,
                title,
                target,
                xp,
                coins,
                days,
            } => {
                let args = cli::challenge::ChallengeArgs {
                    kind,
                    title,
                    target,
                    xp,
                    coins,
                    days,
                };
                cli::challenge::add_command(engine.engine(), args).await?;
            }
            ChallengeCommands::List => {
                cli::challenge::list_command(engine.engine()).await?;
            }
        },
        Commands::Enroll { user } => {
            cli::events::enroll_command(&engine, &user).await?;
        }
        Commands::Progress { user, kind } => {
            cli::events::progress_command(&engine, &user, &kind).await?;
        }
        Commands::Show { user, json, recent } => {
            cli::show::show_command(engine.engine(), &user, json, recent).await?;
        }
        Commands::Reconcile { user } => {
            cli::show::reconcile_command(engine.engine(), &user).await?;
        }
        Commands::Init { .. } => {} // Handled before the store is opened
    }

    Ok(())
}
