//! tokio host loop for a [`TimerEngine`].
//!
//! Delivers ticks at the engine's cadence while polling is armed and applies
//! user commands between ticks. Everything runs on the caller's task; the
//! engine is never shared.

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::clock::Clock;
use super::engine::TimerEngine;
use crate::storage::KeyValueStore;

/// A user request delivered while a routine is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Skip,
    Stop,
    /// Stop driving but leave the run and its checkpoint in place.
    Detach,
}

/// Why [`drive`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Finished,
    Stopped,
    Detached,
}

/// Drive the engine until the routine ends or the caller detaches.
///
/// When the command channel closes the loop keeps ticking; a paused routine
/// with no way to receive commands detaches.
pub async fn drive<S, C>(
    engine: &mut TimerEngine<S, C>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> DriveOutcome
where
    S: KeyValueStore,
    C: Clock,
{
    let mut ticks = interval(engine.cadence());
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut commands_open = true;

    loop {
        if !engine.is_active() {
            return DriveOutcome::Finished;
        }
        let polling = engine.is_polling();
        if !polling && !commands_open {
            return DriveOutcome::Detached;
        }

        tokio::select! {
            _ = ticks.tick(), if polling => engine.tick(),
            command = commands.recv(), if commands_open => {
                let Some(command) = command else {
                    debug!("command channel closed");
                    commands_open = false;
                    continue;
                };
                debug!(?command, "applying command");
                match command {
                    Command::TogglePause => {
                        if engine.toggle_pause().is_ok() {
                            ticks.reset();
                        }
                    }
                    Command::Skip => {
                        if let Err(e) = engine.skip_task() {
                            debug!("skip ignored: {e}");
                        }
                    }
                    Command::Stop => {
                        engine.stop_timer();
                        return DriveOutcome::Stopped;
                    }
                    Command::Detach => return DriveOutcome::Detached,
                }
            }
        }
    }
}
