use clap::{Parser, Subcommand};
use routimer_core::Config;
use tracing_subscriber::EnvFilter;

mod bridge;
mod commands;
mod display;

#[derive(Parser)]
#[command(name = "routimer", version, about = "Routimer CLI")]
struct Cli {
    /// Log at debug level regardless of RUST_LOG and config
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run, pause, skip and stop routines
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Build and inspect groups of tasks
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// User preferences
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config, cli.verbose);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config),
        Commands::Group { action } => commands::group::run(action, &config),
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
