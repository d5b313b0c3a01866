//! Challenge management commands

use anyhow::{Result, bail};
use chrono::{Duration, Utc};

use progression::RewardEngine;
use progression::models::{ChallengeKind, NewChallenge};

use super::report_error;

/// Settings for a new challenge, straight from the command line
pub struct ChallengeArgs {
    pub kind: String,
    pub title: Option<String>,
    pub target: u32,
    pub xp: i64,
    pub coins: i64,
    pub days: i64,
}

/// Create a challenge that starts now and runs for `days`
pub async fn add_command(engine: &RewardEngine, args: ChallengeArgs) -> Result<()> {
    if args.target == 0 {
        bail!("Challenge target must be at least 1");
    }
    if args.days <= 0 {
        bail!("Challenge must run for at least one day");
    }

    let kind = ChallengeKind::parse(&args.kind);
    if let ChallengeKind::Other(name) = &kind {
        eprintln!("Warning: unknown challenge type '{}' will never progress", name);
    }

    let start = Utc::now();
    let challenge = NewChallenge {
        title: args
            .title
            .unwrap_or_else(|| format!("{} {} in {} days", args.target, kind.as_str(), args.days)),
        kind,
        target_value: args.target,
        xp_reward: args.xp,
        coin_reward: args.coins,
        start_time: start,
        end_time: start + Duration::days(args.days),
        active: true,
    };

    let outcome = engine.create_challenge(&challenge);
    if let Some(created) = &outcome.value {
        println!("Created challenge #{}: {}", created.id, created.title);
        println!(
            "  {} x{} until {} (+{} XP, +{} coins)",
            created.kind.as_str(),
            created.target_value,
            created.end_time.format("%Y-%m-%d %H:%M UTC"),
            created.xp_reward,
            created.coin_reward
        );
    }
    report_error(&outcome);
    Ok(())
}

/// List challenges that are currently open for enrollment
pub async fn list_command(engine: &RewardEngine) -> Result<()> {
    let active = engine.store().active_challenges(Utc::now())?;
    if active.is_empty() {
        println!("No active challenges.");
        return Ok(());
    }

    println!("Active challenges ({}):\n", active.len());
    for challenge in active {
        println!(
            "  #{} [{}] {} - target {}, ends {}",
            challenge.id,
            challenge.kind.as_str(),
            challenge.title,
            challenge.target_value,
            challenge.end_time.format("%Y-%m-%d")
        );
    }
    Ok(())
}
