//! Read-side and maintenance commands: show, reconcile, seed

use anyhow::Result;

use progression::RewardEngine;
use progression::levels::Level;

use super::report_error;

/// Print a user's progression profile
pub async fn show_command(
    engine: &RewardEngine,
    user: &str,
    json: bool,
    recent: usize,
) -> Result<()> {
    let outcome = engine.profile(user, recent);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let profile = &outcome.value;
    println!("Progression for {}:\n", user);

    match &profile.aggregate {
        Some(agg) => {
            println!(
                "  Level {} - {} ({} XP, {} coins)",
                agg.level, profile.title, agg.total_xp, agg.coins
            );
            match Level::xp_for_next(agg.level) {
                Some(next) => println!(
                    "  Next level at {} XP ({:.0}%)",
                    next,
                    profile.progress_to_next * 100.0
                ),
                None => println!("  Max level reached"),
            }
        }
        None => println!("  No rewards yet"),
    }

    if let Some(streak) = &profile.streak {
        println!(
            "  Streak: {} days (longest {}, last active {})",
            streak.current, streak.longest, streak.last_activity
        );
    }

    if !profile.badges.is_empty() {
        println!("\n  Badges ({}):", profile.badges.len());
        for held in &profile.badges {
            println!(
                "    {} [{}] - {}",
                held.badge.name,
                held.badge.rarity.as_str(),
                held.earned_at.format("%Y-%m-%d")
            );
        }
    }

    if !profile.challenges.is_empty() {
        println!("\n  Challenges:");
        for enrolled in &profile.challenges {
            let marker = if enrolled.progress.completed { "x" } else { " " };
            println!(
                "    [{}] {} {}/{} ({:.0}%)",
                marker,
                enrolled.challenge.title,
                enrolled.progress.current_value,
                enrolled.challenge.target_value,
                enrolled.progress_percent() * 100.0
            );
        }
    }

    if !profile.recent.is_empty() {
        println!("\n  Recent rewards:");
        for entry in &profile.recent {
            println!(
                "    {} {:<24} +{} XP +{} coins  {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.kind,
                entry.xp,
                entry.coins,
                entry.description
            );
        }
    }

    report_error(&outcome);
    Ok(())
}

/// Rebuild a user's aggregate from their ledger
pub async fn reconcile_command(engine: &RewardEngine, user: &str) -> Result<()> {
    let outcome = engine.reconcile(user);
    let report = &outcome.value;

    if report.drifted {
        let before = report.before.as_ref().map(|a| (a.total_xp, a.coins)).unwrap_or((0, 0));
        let after = report.after.as_ref().map(|a| (a.total_xp, a.coins)).unwrap_or((0, 0));
        println!(
            "Rebuilt aggregate for {}: {} XP / {} coins -> {} XP / {} coins",
            user, before.0, before.1, after.0, after.1
        );
    } else if outcome.is_success() {
        println!("Aggregate for {} matches the ledger", user);
    }
    report_error(&outcome);
    Ok(())
}

/// Upsert the default badge catalog
pub async fn seed_command(engine: &RewardEngine) -> Result<()> {
    let outcome = engine.seed_badges();
    println!("Seeded {} badges", outcome.value.badges.len());
    for badge in &outcome.value.badges {
        println!("  #{} {} [{}]", badge.id, badge.name, badge.rarity.as_str());
    }
    report_error(&outcome);
    Ok(())
}
