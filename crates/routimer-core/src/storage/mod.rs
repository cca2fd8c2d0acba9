mod config;
pub mod database;
mod persistence;
mod settings;
mod store;

pub use config::{Config, StorageConfig, TimerConfig};
pub use database::SqliteStore;
pub use persistence::{Persistence, CHECKPOINT_KEY, GROUPS_KEY, SETTINGS_KEY};
pub use settings::{Settings, Theme};
pub use store::{KeyValueStore, MemoryStore};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `ROUTIMER_DATA_DIR` wins when set. Otherwise `~/.config/routimer[-dev]/`
/// based on `ROUTIMER_ENV` (set `ROUTIMER_ENV=dev` for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("ROUTIMER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ROUTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("routimer-dev")
            } else {
                base_dir.join("routimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
