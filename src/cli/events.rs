//! Event-driven commands: award, streak, badges, enroll, progress

use anyhow::{Context, Result};
use chrono::NaiveDate;

use progression::TimedEngine;
use progression::engine::Grant;
use progression::notify::Delivery;

use super::report_error;

fn print_grant(grant: &Grant) {
    if !grant.granted {
        println!("  Nothing granted");
        return;
    }
    println!("  +{} XP, +{} coins", grant.xp, grant.coins);
    if let Some(up) = &grant.level_up {
        println!("  Level up: {} -> {} ({})", up.old_level, up.new_level, up.title);
    }
    if let Delivery::Failed(reason) = &grant.notification {
        println!("  Notification failed: {}", reason);
    }
}

/// Award the table reward for one event
pub async fn award_command(
    engine: &TimedEngine,
    user: &str,
    kind: &str,
    reference: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let outcome = engine.award_reward(user, kind, reference, description).await;
    println!("Award {} to {}:", kind, user);
    print_grant(&outcome.value);
    report_error(&outcome);
    Ok(())
}

/// Record activity for `user` on `date` (today when omitted)
pub async fn streak_command(engine: &TimedEngine, user: &str, date: Option<&str>) -> Result<()> {
    let outcome = match date {
        Some(date) => {
            let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", date))?;
            engine.touch_streak(user, day).await
        }
        None => engine.touch_streak_today(user).await,
    };

    let touch = &outcome.value;
    if touch.already_touched_today {
        println!("Streak for {}: {} days (already counted today)", user, touch.streak);
    } else {
        println!("Streak for {}: {} days (longest {})", user, touch.streak, touch.longest);
    }
    if let Some(bonus) = &touch.bonus {
        println!("  Streak bonus:");
        print_grant(bonus);
    }
    report_error(&outcome);
    Ok(())
}

/// Evaluate badge rules for a user
pub async fn badges_command(engine: &TimedEngine, user: &str) -> Result<()> {
    let outcome = engine.evaluate_badges(user).await;
    if outcome.value.awarded.is_empty() {
        println!("No new badges for {}", user);
    } else {
        println!("New badges for {} ({}):", user, outcome.value.newly_awarded);
        for name in &outcome.value.awarded {
            println!("  - {}", name);
        }
    }
    report_error(&outcome);
    Ok(())
}

/// Enroll a user in every active challenge
pub async fn enroll_command(engine: &TimedEngine, user: &str) -> Result<()> {
    let outcome = engine.auto_enroll(user).await;
    println!("Enrolled {} in {} challenge(s)", user, outcome.value.enrolled);
    report_error(&outcome);
    Ok(())
}

/// Advance a user's challenges for one event
pub async fn progress_command(engine: &TimedEngine, user: &str, kind: &str) -> Result<()> {
    let outcome = engine.record_progress(user, kind).await;
    println!(
        "Progress for {} on {}: {} challenge(s) advanced",
        user, kind, outcome.value.advanced
    );
    for id in &outcome.value.completed {
        println!("  Completed challenge #{}", id);
    }
    report_error(&outcome);
    Ok(())
}
