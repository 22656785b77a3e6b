use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "monkmode-cli", version, about = "MonkMode CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Meditation session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Preset catalog
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Practice statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Daily streak tracking
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
