pub mod config;
pub mod group;
pub mod settings;
pub mod timer;

use routimer_core::{Config, Persistence, SqliteStore};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the configured SQLite store behind the persistence gateway.
pub fn open_persistence(config: &Config) -> routimer_core::error::Result<Persistence<SqliteStore>> {
    Ok(Persistence::new(SqliteStore::open(&config.storage.database_file)?))
}
