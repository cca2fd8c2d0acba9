use std::time::Duration;

use clap::Subcommand;
use routimer_core::{Config, ConfigError};

use super::CmdResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dot-separated key
    Get {
        /// e.g. "timer.tick_interval_ms", "storage.database_file", "log_level"
        key: String,
    },
    /// Change one value and save
    Set {
        key: String,
        value: String,
    },
    /// Print every key as `key = value`
    List {
        /// Print the whole file as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Restore defaults, for one key or the whole file
    Reset {
        key: Option<String>,
    },
    /// Print where config.toml lives
    Path,
}

pub fn run(action: ConfigAction) -> CmdResult {
    let mut config = Config::load_or_default();
    match action {
        ConfigAction::Get { key } => {
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            let requested = Duration::from_millis(config.timer.tick_interval_ms);
            if key == "timer.tick_interval_ms" && config.tick_interval() != requested {
                eprintln!(
                    "note: polling runs no faster than every {}ms",
                    config.tick_interval().as_millis()
                );
            }
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in config.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset { key: Some(key) } => {
            config.reset_key(&key)?;
            println!("{key} = {}", config.get(&key).unwrap_or_default());
        }
        ConfigAction::Reset { key: None } => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
