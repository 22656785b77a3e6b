use clap::Subcommand;
use monkmode_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's practice statistics
    Today,
    /// All-time practice statistics
    All,
    /// The most recently started session
    Last,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Today => {
            let stats = db.stats_today()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::All => {
            let stats = db.stats_all()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Last => match db.last_session()? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("null"),
        },
    }
    Ok(())
}
