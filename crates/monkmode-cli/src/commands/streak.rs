use chrono::Utc;
use clap::Subcommand;
use monkmode_core::{Database, Streaks};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Show current streak data
    Show,
    /// Reset all streak data
    Reset,
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StreakAction::Show => {
            let streaks = Streaks::load(&db)?;
            let detail = serde_json::json!({
                "last_credited_date": streaks.last_credited_date,
                "current_streak": streaks.current_streak,
                "longest_streak": streaks.longest_streak,
                "total_days": streaks.total_days,
                // Whether practicing today keeps (or starts) the streak.
                "maintains_today": streaks.would_maintain(Utc::now().date_naive()),
            });
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        StreakAction::Reset => {
            Streaks::default().save(&db)?;
            println!("streaks reset");
        }
    }
    Ok(())
}
