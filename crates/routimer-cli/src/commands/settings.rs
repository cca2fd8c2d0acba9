use clap::Subcommand;
use routimer_core::storage::Theme;
use routimer_core::Config;

use super::{open_persistence, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print current settings as JSON
    Show,
    /// Change one or more settings
    Set {
        /// light, dark or system
        #[arg(long)]
        theme: Option<Theme>,
        /// Show notifications at task boundaries
        #[arg(long)]
        notifications: Option<bool>,
        /// Hold a wake lock while a routine runs
        #[arg(long)]
        keep_awake: Option<bool>,
    },
}

pub fn run(action: SettingsAction, config: &Config) -> CmdResult {
    let persistence = open_persistence(config)?;
    match action {
        SettingsAction::Show => {
            let settings = persistence.load_settings();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set {
            theme,
            notifications,
            keep_awake,
        } => {
            let mut settings = persistence.load_settings();
            if let Some(theme) = theme {
                settings.theme = theme;
            }
            if let Some(enabled) = notifications {
                settings.notifications_enabled = enabled;
            }
            if let Some(enabled) = keep_awake {
                settings.keep_screen_awake = enabled;
            }
            persistence.save_settings(&settings);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
