use clap::Subcommand;
use routimer_core::timer::{drive, Command, DriveOutcome};
use routimer_core::error::Result;
use routimer_core::{format_duration, Config, EngineError, Persistence, SqliteStore, TimerEngine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{open_persistence, CmdResult};
use crate::bridge::DesktopBridge;
use crate::display::TerminalObserver;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a group in the foreground
    Start {
        /// Group ID
        group_id: String,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Continue the routine left by an earlier process
    Attach {
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Pause the running routine, or resume a paused one
    Pause,
    /// Skip to the next task
    Skip,
    /// Stop the routine and discard its checkpoint
    Stop,
    /// Print the routine in progress as JSON
    Status,
}

const HELP_LINE: &str = "keys: p+enter pause/resume, s skip, x stop, q detach";

fn foreground_engine(
    persistence: Persistence<SqliteStore>,
    config: &Config,
    json: bool,
    total_tasks: usize,
) -> TimerEngine<SqliteStore> {
    TimerEngine::new(persistence, config.tick_interval())
        .with_bridge(DesktopBridge::new())
        .with_observer(TerminalObserver::new(json, total_tasks))
}

/// One-shot engine for commands that act on the stored run and exit.
fn stored_engine(config: &Config) -> Result<TimerEngine<SqliteStore>> {
    let mut engine = TimerEngine::new(open_persistence(config)?, config.tick_interval());
    if !engine.recover_from_store() {
        return Err(EngineError::NoActiveRun.into());
    }
    Ok(engine)
}

async fn read_commands(tx: mpsc::UnboundedSender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let command = match line.trim() {
            "p" => Command::TogglePause,
            "s" => Command::Skip,
            "x" => Command::Stop,
            "q" => Command::Detach,
            "" => continue,
            _ => {
                eprintln!("{HELP_LINE}");
                continue;
            }
        };
        if tx.send(command).is_err() {
            break;
        }
    }
}

fn run_foreground(engine: &mut TimerEngine<SqliteStore>, json: bool) -> CmdResult {
    if !json {
        eprintln!("{HELP_LINE}");
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let outcome = runtime.block_on(async {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(read_commands(tx.clone()));
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(Command::Detach);
            }
        });
        drive(engine, &mut rx).await
    });
    // stdin reads block a worker thread; don't wait for them.
    runtime.shutdown_background();

    if outcome == DriveOutcome::Detached && !json {
        println!("\nDetached. Run `routimer timer attach` to continue.");
    }
    Ok(())
}

pub fn run(action: TimerAction, config: &Config) -> CmdResult {
    match action {
        TimerAction::Start { group_id, json } => {
            let persistence = open_persistence(config)?;
            let total_tasks = persistence
                .load_groups()
                .get(&group_id)
                .map(|g| g.tasks.len())
                .unwrap_or(0);
            let mut engine = foreground_engine(persistence, config, json, total_tasks);
            engine.start_timer(&group_id)?;
            run_foreground(&mut engine, json)?;
        }
        TimerAction::Attach { json } => {
            let persistence = open_persistence(config)?;
            let total_tasks = persistence
                .load_checkpoint()
                .and_then(|cp| persistence.load_groups().get(&cp.group_id).map(|g| g.tasks.len()))
                .unwrap_or(0);
            let mut engine = foreground_engine(persistence, config, json, total_tasks);
            if !engine.recover_from_store() {
                return Err(EngineError::NoActiveRun.into());
            }
            run_foreground(&mut engine, json)?;
        }
        TimerAction::Pause => {
            let mut engine = stored_engine(config)?;
            let state = engine.toggle_pause()?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        TimerAction::Skip => {
            let mut engine = stored_engine(config)?;
            engine.skip_task()?;
            println!("{}", serde_json::to_string_pretty(&engine.state())?);
        }
        TimerAction::Stop => {
            let mut engine = TimerEngine::new(open_persistence(config)?, config.tick_interval());
            engine.recover_from_store();
            engine.stop_timer();
            println!("{{\"state\": \"idle\"}}");
        }
        TimerAction::Status => {
            let mut engine = TimerEngine::new(open_persistence(config)?, config.tick_interval());
            engine.recover_from_store();
            let status = match (engine.session(), engine.snapshot()) {
                (Some(session), Some(checkpoint)) => serde_json::json!({
                    "state": engine.state(),
                    "group": session.group().name,
                    "task": session.current_task().map(|t| t.name.clone()),
                    "remaining": format_duration(checkpoint.remaining_ms),
                    "checkpoint": checkpoint,
                }),
                _ => serde_json::json!({ "state": engine.state() }),
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
