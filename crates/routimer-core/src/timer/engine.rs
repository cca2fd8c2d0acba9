//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the host is responsible for calling `tick()` at the
//! cadence reported by `cadence()` (see [`super::drive`] for a tokio host).
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running(0) --tick..--> Running(i+1) --..--> Finished -> Idle
//!                  |      ^
//!            toggle|      |toggle
//!                  v      |
//!                 Paused(i) --skip--> Running(i+1) | Finished
//! ```
//!
//! `Finished` is never observable: the tick that completes the last task
//! ends the routine before returning.
//!
//! ## Timing
//!
//! Remaining time is always recomputed as
//! `task_duration - (now - start_epoch)`, never accumulated per poll, so late
//! or skipped polls cannot cause drift. Resuming re-anchors `start_epoch` so
//! the same formula keeps applying.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::checkpoint::TimerCheckpoint;
use super::clock::{Clock, SystemClock};
use super::ticker::Ticker;
use crate::bridge::{NotifyPhase, NullBridge, PlatformBridge};
use crate::error::EngineError;
use crate::events::{NullObserver, TimerObserver};
use crate::group::{Group, GroupCatalog, Task};
use crate::storage::{KeyValueStore, Persistence, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running { task_index: usize },
    Paused { task_index: usize },
}

/// Run-time state of the active routine.
#[derive(Debug, Clone)]
pub struct Session {
    group: Group,
    task_index: usize,
    paused: bool,
    /// Epoch ms at which the current task would have started had it never
    /// been paused.
    start_epoch_ms: u64,
    task_duration_ms: u64,
    remaining_ms: u64,
}

impl Session {
    fn new(group: Group) -> Self {
        Self {
            group,
            task_index: 0,
            paused: false,
            start_epoch_ms: 0,
            task_duration_ms: 0,
            remaining_ms: 0,
        }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn task_index(&self) -> usize {
        self.task_index
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn start_epoch_ms(&self) -> u64 {
        self.start_epoch_ms
    }

    pub fn task_duration_ms(&self) -> u64 {
        self.task_duration_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.group.tasks.get(self.task_index)
    }

    fn checkpoint(&self, now_ms: u64) -> TimerCheckpoint {
        TimerCheckpoint {
            group_id: self.group.id.clone(),
            task_index: self.task_index,
            paused: self.paused,
            remaining_ms: self.remaining_ms,
            task_duration_ms: self.task_duration_ms,
            last_tick_epoch_ms: now_ms,
        }
    }

    fn anchor_start(&mut self, now_ms: u64) {
        let elapsed = self.task_duration_ms.saturating_sub(self.remaining_ms);
        self.start_epoch_ms = now_ms.saturating_sub(elapsed);
    }
}

/// Core timer engine.
///
/// Owns the only [`Session`]; all entry points are synchronous and perform at
/// most one persistence write each.
pub struct TimerEngine<S, C = SystemClock> {
    persistence: Persistence<S>,
    catalog: GroupCatalog,
    settings: Settings,
    clock: C,
    bridge: Box<dyn PlatformBridge>,
    observer: Box<dyn TimerObserver>,
    ticker: Ticker,
    session: Option<Session>,
    wake_held: bool,
}

impl<S: KeyValueStore> TimerEngine<S, SystemClock> {
    /// Engine on the system clock, loading catalog and settings from storage.
    pub fn new(persistence: Persistence<S>, cadence: Duration) -> Self {
        Self::with_clock(persistence, SystemClock, cadence)
    }
}

impl<S: KeyValueStore, C: Clock> TimerEngine<S, C> {
    pub fn with_clock(persistence: Persistence<S>, clock: C, cadence: Duration) -> Self {
        let catalog = persistence.load_groups();
        let settings = persistence.load_settings();
        Self {
            persistence,
            catalog,
            settings,
            clock,
            bridge: Box::new(NullBridge),
            observer: Box::new(NullObserver),
            ticker: Ticker::new(cadence),
            session: None,
            wake_held: false,
        }
    }

    pub fn with_bridge(mut self, bridge: impl PlatformBridge + 'static) -> Self {
        self.bridge = Box::new(bridge);
        self
    }

    pub fn with_observer(mut self, observer: impl TimerObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        match &self.session {
            None => TimerState::Idle,
            Some(s) if s.paused => TimerState::Paused {
                task_index: s.task_index,
            },
            Some(s) => TimerState::Running {
                task_index: s.task_index,
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the host should keep delivering ticks.
    pub fn is_polling(&self) -> bool {
        self.ticker.is_armed()
    }

    pub fn cadence(&self) -> Duration {
        self.ticker.cadence()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.session.as_ref()?.current_task()
    }

    pub fn remaining_ms(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.remaining_ms)
    }

    /// The checkpoint that would be written right now.
    pub fn snapshot(&self) -> Option<TimerCheckpoint> {
        let now = self.clock.now_ms();
        self.session.as_ref().map(|s| s.checkpoint(now))
    }

    pub fn catalog(&self) -> &GroupCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Replace the in-memory catalog after the builder changed it.
    /// A running session keeps the copy it loaded at start.
    pub fn set_catalog(&mut self, catalog: GroupCatalog) {
        self.catalog = catalog;
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.persistence.save_settings(&settings);
        self.settings = settings;
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start running a group from its first task.
    ///
    /// A routine that is already running is stopped first.
    pub fn start_timer(&mut self, group_id: &str) -> Result<(), EngineError> {
        let Some(group) = self.catalog.get(group_id).cloned() else {
            warn!(group_id, "cannot start: no such group");
            return Err(EngineError::InvalidGroupReference {
                group_id: group_id.to_string(),
            });
        };
        if group.tasks.is_empty() {
            warn!(group_id, "cannot start: group has no tasks");
            return Err(EngineError::EmptyGroup {
                group_id: group_id.to_string(),
            });
        }

        if self.session.is_some() {
            self.end_routine(false);
        }

        info!(group_id, group = %group.name, tasks = group.tasks.len(), "starting routine");
        self.acquire_wake_hold();
        self.session = Some(Session::new(group));
        self.begin_task();
        Ok(())
    }

    /// Recompute remaining time. Called by the host on every poll.
    ///
    /// Does nothing unless polling is armed, which also covers "no session"
    /// and "paused".
    pub fn tick(&mut self) {
        if !self.ticker.is_armed() {
            return;
        }
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            self.ticker.cancel();
            return;
        };

        let elapsed = now.saturating_sub(session.start_epoch_ms);
        session.remaining_ms = session.task_duration_ms.saturating_sub(elapsed);
        debug!(
            task_index = session.task_index,
            remaining_ms = session.remaining_ms,
            "tick"
        );

        self.observer
            .on_tick(session.remaining_ms, session.task_duration_ms);
        self.persistence.save_checkpoint(&session.checkpoint(now));

        if session.remaining_ms == 0 {
            self.complete_task();
        }
    }

    /// Pause a running task or resume a paused one.
    pub fn toggle_pause(&mut self) -> Result<TimerState, EngineError> {
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::NoActiveRun);
        };

        if session.paused {
            session.paused = false;
            session.anchor_start(now);
            self.persistence.save_checkpoint(&session.checkpoint(now));
            self.ticker.arm();
            info!(task_index = session.task_index, remaining_ms = session.remaining_ms, "resumed");
        } else {
            self.ticker.cancel();
            let elapsed = now.saturating_sub(session.start_epoch_ms);
            session.remaining_ms = session.task_duration_ms.saturating_sub(elapsed);
            session.paused = true;
            self.persistence.save_checkpoint(&session.checkpoint(now));
            info!(task_index = session.task_index, remaining_ms = session.remaining_ms, "paused");
        }
        Ok(self.state())
    }

    /// Abandon the current task and move on, running or paused alike.
    ///
    /// Skipping does not announce the skipped task's end.
    pub fn skip_task(&mut self) -> Result<(), EngineError> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::NoActiveRun);
        };
        self.ticker.cancel();
        info!(task_index = session.task_index, "skipping task");
        session.task_index += 1;
        self.begin_task();
        Ok(())
    }

    /// Stop the routine. No tick or notification fires afterwards.
    pub fn stop_timer(&mut self) {
        self.end_routine(false);
    }

    /// Restore a run from a stored checkpoint.
    ///
    /// Time that passed while the process was away is deducted unless the
    /// checkpoint was paused. An unusable checkpoint is discarded when idle;
    /// an active run and its checkpoint are left alone.
    pub fn recover_timer(&mut self, checkpoint: &TimerCheckpoint) -> Result<(), EngineError> {
        if let Err(e) = self.validate_checkpoint(checkpoint) {
            warn!(group_id = %checkpoint.group_id, "recovery failed: {e}");
            if self.session.is_none() {
                self.persistence.clear_checkpoint();
            }
            return Err(e);
        }
        let Some(group) = self.catalog.get(&checkpoint.group_id).cloned() else {
            return Err(EngineError::InvalidGroupReference {
                group_id: checkpoint.group_id.clone(),
            });
        };

        if self.session.is_some() {
            self.end_routine(false);
        }

        let now = self.clock.now_ms();
        let mut remaining_ms = checkpoint.remaining_ms.min(checkpoint.task_duration_ms);
        if !checkpoint.paused {
            let away_ms = now.saturating_sub(checkpoint.last_tick_epoch_ms);
            remaining_ms = remaining_ms.saturating_sub(away_ms);
        }

        let mut session = Session {
            group,
            task_index: checkpoint.task_index,
            paused: checkpoint.paused,
            start_epoch_ms: 0,
            task_duration_ms: checkpoint.task_duration_ms,
            remaining_ms,
        };
        session.anchor_start(now);

        info!(
            group = %session.group.name,
            task_index = session.task_index,
            remaining_ms,
            paused = session.paused,
            "recovered routine"
        );

        self.acquire_wake_hold();
        if let Some(task) = session.group.tasks.get(session.task_index) {
            self.observer
                .on_task_begin(task, &session.group.name, session.task_index + 1);
        }
        // Replacing a run cleared the store; write the recovered one back.
        self.persistence.save_checkpoint(&session.checkpoint(now));
        let paused = session.paused;
        self.session = Some(session);
        if !paused {
            self.ticker.arm();
        }
        Ok(())
    }

    /// Boot-time recovery from whatever checkpoint the store holds.
    ///
    /// Returns whether a run was restored. Anything unusable is cleared so the
    /// engine is left idle with no checkpoint.
    pub fn recover_from_store(&mut self) -> bool {
        let recovered = match self.persistence.load_checkpoint() {
            Some(checkpoint) => self.recover_timer(&checkpoint).is_ok(),
            None => false,
        };
        if !recovered && self.session.is_none() {
            self.persistence.clear_checkpoint();
        }
        recovered
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn validate_checkpoint(&self, checkpoint: &TimerCheckpoint) -> Result<(), EngineError> {
        let Some(group) = self.catalog.get(&checkpoint.group_id) else {
            return Err(EngineError::CorruptCheckpoint {
                reason: format!("group '{}' no longer exists", checkpoint.group_id),
            });
        };
        if checkpoint.task_index >= group.tasks.len() {
            return Err(EngineError::CorruptCheckpoint {
                reason: format!(
                    "task index {} out of range for group '{}' with {} tasks",
                    checkpoint.task_index,
                    group.name,
                    group.tasks.len()
                ),
            });
        }
        if checkpoint.task_duration_ms == 0 {
            return Err(EngineError::CorruptCheckpoint {
                reason: "task duration is zero".into(),
            });
        }
        Ok(())
    }

    /// Make `session.task_index` the current task, or finish if past the end.
    fn begin_task(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(task) = session.group.tasks.get(session.task_index) else {
            self.end_routine(true);
            return;
        };

        let now = self.clock.now_ms();
        session.paused = false;
        session.task_duration_ms = task.duration_ms;
        session.remaining_ms = task.duration_ms;
        session.start_epoch_ms = now;
        info!(
            task = %task.name,
            task_index = session.task_index,
            duration_ms = task.duration_ms,
            "task started"
        );

        self.observer
            .on_task_begin(task, &session.group.name, session.task_index + 1);
        if task.notify_policy.on_start() {
            send_notification(
                self.bridge.as_mut(),
                self.settings.notifications_enabled,
                &task.name,
                NotifyPhase::Start,
            );
        }

        self.ticker.arm();
        self.tick();
    }

    fn complete_task(&mut self) {
        self.ticker.cancel();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(task) = session.group.tasks.get(session.task_index) {
            info!(task = %task.name, task_index = session.task_index, "task finished");
            if task.notify_policy.on_end() {
                send_notification(
                    self.bridge.as_mut(),
                    self.settings.notifications_enabled,
                    &task.name,
                    NotifyPhase::End,
                );
            }
        }
        session.task_index += 1;
        self.begin_task();
    }

    /// Polling is cancelled before any state is cleared.
    fn end_routine(&mut self, finished_naturally: bool) {
        self.ticker.cancel();
        let session = self.session.take();
        self.persistence.clear_checkpoint();
        self.release_wake_hold();

        if let Some(session) = session {
            info!(group = %session.group.name, finished_naturally, "routine ended");
            self.observer.on_routine_ended(finished_naturally);
        }
    }

    fn acquire_wake_hold(&mut self) {
        if !self.settings.keep_screen_awake {
            return;
        }
        match self.bridge.request_wake_hold() {
            Ok(()) => self.wake_held = true,
            Err(e) => debug!("wake hold unavailable: {e}"),
        }
    }

    fn release_wake_hold(&mut self) {
        if !std::mem::take(&mut self.wake_held) {
            return;
        }
        if let Err(e) = self.bridge.release_wake_hold() {
            debug!("failed to release wake hold: {e}");
        }
    }
}

fn send_notification(
    bridge: &mut dyn PlatformBridge,
    enabled: bool,
    task_name: &str,
    phase: NotifyPhase,
) {
    if !enabled {
        return;
    }
    if let Err(e) = bridge.notify(task_name, phase) {
        warn!(task = task_name, ?phase, "notification not delivered: {e}");
    }
}
