use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::group::Task;

/// Receives the engine's outward notifications. The UI owns all rendering.
pub trait TimerObserver {
    /// A task became current. `task_number` is 1-based.
    fn on_task_begin(&mut self, task: &Task, group_name: &str, task_number: usize);

    /// The active task's remaining time was recomputed.
    fn on_tick(&mut self, remaining_ms: u64, total_ms: u64);

    /// The routine left the engine, either by finishing or by being stopped.
    fn on_routine_ended(&mut self, finished_naturally: bool);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TimerObserver for NullObserver {
    fn on_task_begin(&mut self, _task: &Task, _group_name: &str, _task_number: usize) {}
    fn on_tick(&mut self, _remaining_ms: u64, _total_ms: u64) {}
    fn on_routine_ended(&mut self, _finished_naturally: bool) {}
}

/// Every observer callback as a serializable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TaskBegan {
        task_name: String,
        icon: String,
        group_name: String,
        task_number: usize,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    Tick {
        remaining_ms: u64,
        total_ms: u64,
        at: DateTime<Utc>,
    },
    RoutineEnded {
        finished_naturally: bool,
        at: DateTime<Utc>,
    },
}

/// Observer that records events. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.lock())
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.lock().clone()
    }

    fn push(&self, event: Event) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimerObserver for EventLog {
    fn on_task_begin(&mut self, task: &Task, group_name: &str, task_number: usize) {
        self.push(Event::TaskBegan {
            task_name: task.name.clone(),
            icon: task.icon.clone(),
            group_name: group_name.to_string(),
            task_number,
            duration_ms: task.duration_ms,
            at: Utc::now(),
        });
    }

    fn on_tick(&mut self, remaining_ms: u64, total_ms: u64) {
        self.push(Event::Tick {
            remaining_ms,
            total_ms,
            at: Utc::now(),
        });
    }

    fn on_routine_ended(&mut self, finished_naturally: bool) {
        self.push(Event::RoutineEnded {
            finished_naturally,
            at: Utc::now(),
        });
    }
}
