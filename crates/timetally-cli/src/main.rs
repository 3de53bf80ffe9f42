use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "timetally", version, about = "Timetally activity tracker CLI")]
struct Cli {
    /// User id to act as (a chat transport supplies this in production).
    #[arg(long, global = true, default_value_t = 1)]
    user: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start (or switch to) an activity
    Start {
        /// One of: work, study, sport, hobby, sleep, rest
        activity: String,
    },
    /// Current activity and local time
    Status,
    /// Activity statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Reminder and timezone settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Reminder loop control
    Remind {
        #[command(subcommand)]
        action: commands::remind::RemindAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List known users with their local time
    Users,
    /// Delete tracked data and reset settings
    Clear,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("timetally_core=info,timetally=info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Start { activity } => commands::start::run(cli.user, &activity),
        Commands::Status => commands::status::run(cli.user),
        Commands::Stats { action } => commands::stats::run(cli.user, action),
        Commands::Settings { action } => commands::settings::run(cli.user, action),
        Commands::Remind { action } => commands::remind::run(cli.user, action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Users => commands::users::run(),
        Commands::Clear => commands::clear::run(cli.user),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
