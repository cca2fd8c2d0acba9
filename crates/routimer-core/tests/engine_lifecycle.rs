//! End-to-end engine behaviour against an in-memory store.
//!
//! Covers task ordering, notification counts, pause/resume, recovery and
//! stop guarantees using a hand-driven clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use routimer_core::storage::CHECKPOINT_KEY;
use routimer_core::timer::ManualClock;
use routimer_core::{
    BridgeError, EngineError, Event, EventLog, Group, GroupCatalog, MemoryStore, NotifyPhase,
    NotifyPolicy, Persistence, PlatformBridge, Settings, Task, TimerCheckpoint, TimerEngine,
    TimerState,
};

const T0: u64 = 1_700_000_000_000;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum BridgeCall {
    WakeRequested,
    WakeReleased,
    Notified(String, NotifyPhase),
}

#[derive(Clone, Default)]
struct RecordingBridge {
    calls: Arc<Mutex<Vec<BridgeCall>>>,
    fail_notifications: bool,
}

impl RecordingBridge {
    fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().unwrap().clone()
    }

    fn notifications(&self) -> Vec<(String, NotifyPhase)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BridgeCall::Notified(name, phase) => Some((name, phase)),
                _ => None,
            })
            .collect()
    }
}

impl PlatformBridge for RecordingBridge {
    fn request_wake_hold(&mut self) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(BridgeCall::WakeRequested);
        Ok(())
    }

    fn release_wake_hold(&mut self) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(BridgeCall::WakeReleased);
        Ok(())
    }

    fn notify(&mut self, task_name: &str, phase: NotifyPhase) -> Result<(), BridgeError> {
        self.calls
            .lock()
            .unwrap()
            .push(BridgeCall::Notified(task_name.to_string(), phase));
        if self.fail_notifications {
            return Err(BridgeError::Failed("denied".into()));
        }
        Ok(())
    }
}

fn circuit() -> Group {
    Group {
        id: "circuit".into(),
        name: "Circuit".into(),
        color: Some("#22c55e".into()),
        tasks: vec![
            Task::new("Warm Up", 5_000, NotifyPolicy::Start),
            Task::new("Squats", 30_000, NotifyPolicy::Both),
            Task::new("Rest", 10_000, NotifyPolicy::None),
            Task::new("Cool Down", 5_000, NotifyPolicy::End),
        ],
    }
}

struct Harness {
    engine: TimerEngine<MemoryStore, ManualClock>,
    clock: ManualClock,
    store: MemoryStore,
    bridge: RecordingBridge,
    log: EventLog,
}

fn harness_with(bridge: RecordingBridge, settings: Settings) -> Harness {
    let store = MemoryStore::new();
    let persistence = Persistence::new(store.clone());
    persistence.save_groups(&GroupCatalog::new(vec![circuit()]));
    persistence.save_settings(&settings);
    let clock = ManualClock::new(T0);
    let log = EventLog::new();
    let engine = TimerEngine::with_clock(persistence, clock.clone(), Duration::from_millis(250))
        .with_bridge(bridge.clone())
        .with_observer(log.clone());
    Harness {
        engine,
        clock,
        store,
        bridge,
        log,
    }
}

fn harness() -> Harness {
    harness_with(RecordingBridge::default(), Settings::default())
}

/// Advance in cadence-sized steps, ticking after each, until idle.
fn run_to_completion(h: &mut Harness) -> Vec<usize> {
    let mut visited = Vec::new();
    for _ in 0..10_000 {
        match h.engine.state() {
            TimerState::Running { task_index } => {
                if visited.last() != Some(&task_index) {
                    visited.push(task_index);
                }
            }
            TimerState::Idle => return visited,
            TimerState::Paused { .. } => panic!("unexpected pause"),
        }
        h.clock.advance(250);
        h.engine.tick();
    }
    panic!("routine never finished");
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn full_run_visits_each_task_once_in_order() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    assert_eq!(run_to_completion(&mut h), vec![0, 1, 2, 3]);
    assert!(!h.store.contains(CHECKPOINT_KEY));
}

#[test]
fn full_run_emits_one_notification_per_policy_boundary() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    run_to_completion(&mut h);

    assert_eq!(
        h.bridge.notifications(),
        vec![
            ("Warm Up".to_string(), NotifyPhase::Start),
            ("Squats".to_string(), NotifyPhase::Start),
            ("Squats".to_string(), NotifyPhase::End),
            ("Cool Down".to_string(), NotifyPhase::End),
        ]
    );
}

#[test]
fn full_run_reports_task_begins_and_natural_end() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    run_to_completion(&mut h);

    let events = h.log.drain();
    let begun: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::TaskBegan { task_number, .. } => Some(*task_number),
            _ => None,
        })
        .collect();
    assert_eq!(begun, vec![1, 2, 3, 4]);
    assert!(matches!(
        events.last(),
        Some(Event::RoutineEnded {
            finished_naturally: true,
            ..
        })
    ));
}

#[test]
fn wake_hold_is_requested_on_start_and_released_on_finish() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    run_to_completion(&mut h);
    let calls = h.bridge.calls();
    assert_eq!(calls.first(), Some(&BridgeCall::WakeRequested));
    assert_eq!(calls.last(), Some(&BridgeCall::WakeReleased));
}

#[test]
fn each_run_requests_a_fresh_wake_hold() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    h.engine.stop_timer();
    h.engine.start_timer("circuit").unwrap();
    let requests = h
        .bridge
        .calls()
        .into_iter()
        .filter(|c| *c == BridgeCall::WakeRequested)
        .count();
    assert_eq!(requests, 2);
}

#[test]
fn disabled_settings_suppress_bridge_calls() {
    let settings = Settings {
        notifications_enabled: false,
        keep_screen_awake: false,
        ..Settings::default()
    };
    let mut h = harness_with(RecordingBridge::default(), settings);
    h.engine.start_timer("circuit").unwrap();
    run_to_completion(&mut h);
    assert!(h.bridge.calls().is_empty());
}

#[test]
fn failing_notifications_do_not_stop_the_run() {
    let bridge = RecordingBridge {
        fail_notifications: true,
        ..RecordingBridge::default()
    };
    let mut h = harness_with(bridge, Settings::default());
    h.engine.start_timer("circuit").unwrap();
    assert_eq!(run_to_completion(&mut h), vec![0, 1, 2, 3]);
}

#[test]
fn pause_and_resume_after_long_delay_keeps_remaining() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    h.engine.skip_task().unwrap();
    h.clock.advance(12_345);
    h.engine.tick();
    h.engine.toggle_pause().unwrap();
    let frozen = h.engine.remaining_ms().unwrap();
    assert_eq!(frozen, 30_000 - 12_345);

    h.clock.advance(9 * 3_600_000);
    h.engine.toggle_pause().unwrap();
    assert_eq!(h.engine.remaining_ms(), Some(frozen));
    h.engine.tick();
    assert_eq!(h.engine.remaining_ms(), Some(frozen));
}

#[test]
fn checkpoint_is_written_on_every_tick() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    for step in 1..=3u64 {
        h.clock.advance(1_000);
        h.engine.tick();
        let cp = h.engine.persistence().load_checkpoint().unwrap();
        assert_eq!(cp.last_tick_epoch_ms, T0 + step * 1_000);
        assert_eq!(cp.remaining_ms, 5_000 - step * 1_000);
        assert_eq!(cp.task_duration_ms, 5_000);
    }
}

#[test]
fn no_checkpoint_writes_while_paused() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    h.engine.toggle_pause().unwrap();
    let at_pause = h.engine.persistence().load_checkpoint().unwrap();
    h.clock.advance(5_000);
    h.engine.tick();
    assert_eq!(h.engine.persistence().load_checkpoint().unwrap(), at_pause);
}

#[test]
fn recovery_deducts_time_spent_away() {
    let mut h = harness();
    let cp = TimerCheckpoint {
        group_id: "circuit".into(),
        task_index: 1,
        paused: false,
        remaining_ms: 10_000,
        task_duration_ms: 30_000,
        last_tick_epoch_ms: T0,
    };
    h.clock.set(T0 + 4_000);
    h.engine.recover_timer(&cp).unwrap();
    assert_eq!(h.engine.remaining_ms(), Some(6_000));
    assert_eq!(h.engine.state(), TimerState::Running { task_index: 1 });
}

#[test]
fn recovery_after_task_expired_completes_on_next_tick() {
    let mut h = harness();
    let cp = TimerCheckpoint {
        group_id: "circuit".into(),
        task_index: 0,
        paused: false,
        remaining_ms: 2_000,
        task_duration_ms: 5_000,
        last_tick_epoch_ms: T0,
    };
    h.clock.set(T0 + 60_000);
    h.engine.recover_timer(&cp).unwrap();
    assert_eq!(h.engine.remaining_ms(), Some(0));
    h.engine.tick();
    assert_eq!(h.engine.state(), TimerState::Running { task_index: 1 });
}

#[test]
fn recovery_of_unknown_group_fails_and_leaves_nothing() {
    let mut h = harness();
    let cp = TimerCheckpoint {
        group_id: "deleted".into(),
        task_index: 0,
        paused: false,
        remaining_ms: 1_000,
        task_duration_ms: 5_000,
        last_tick_epoch_ms: T0,
    };
    h.engine.persistence().save_checkpoint(&cp);
    assert!(matches!(
        h.engine.recover_timer(&cp),
        Err(EngineError::CorruptCheckpoint { .. })
    ));
    assert_eq!(h.engine.state(), TimerState::Idle);
    assert!(!h.store.contains(CHECKPOINT_KEY));
}

#[test]
fn failed_recovery_leaves_the_active_run_and_its_checkpoint() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    h.engine.toggle_pause().unwrap();
    let live = h.engine.persistence().load_checkpoint().unwrap();

    let stale = TimerCheckpoint {
        group_id: "deleted".into(),
        task_index: 0,
        paused: false,
        remaining_ms: 1_000,
        task_duration_ms: 5_000,
        last_tick_epoch_ms: T0,
    };
    assert!(h.engine.recover_timer(&stale).is_err());

    assert_eq!(h.engine.state(), TimerState::Paused { task_index: 0 });
    assert_eq!(h.engine.is_active(), h.store.contains(CHECKPOINT_KEY));
    assert_eq!(h.engine.persistence().load_checkpoint(), Some(live));
}

#[test]
fn recovering_over_an_active_run_persists_the_recovered_checkpoint() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();

    let cp = TimerCheckpoint {
        group_id: "circuit".into(),
        task_index: 1,
        paused: true,
        remaining_ms: 12_000,
        task_duration_ms: 30_000,
        last_tick_epoch_ms: T0,
    };
    h.clock.advance(3_000);
    h.engine.recover_timer(&cp).unwrap();

    assert_eq!(h.engine.state(), TimerState::Paused { task_index: 1 });
    assert_eq!(h.engine.is_active(), h.store.contains(CHECKPOINT_KEY));
    let stored = h.engine.persistence().load_checkpoint().unwrap();
    assert_eq!(stored.task_index, 1);
    assert!(stored.paused);
    assert_eq!(stored.remaining_ms, 12_000);
    assert_eq!(stored.last_tick_epoch_ms, T0 + 3_000);
}

#[test]
fn boot_recovery_picks_up_a_previous_process() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    {
        let persistence = Persistence::new(store.clone());
        persistence.save_groups(&GroupCatalog::new(vec![circuit()]));
        let mut first =
            TimerEngine::with_clock(persistence, clock.clone(), Duration::from_millis(250));
        first.start_timer("circuit").unwrap();
        clock.advance(2_000);
        first.tick();
        // Process dies here without stopping.
    }

    clock.advance(1_500);
    let mut second = TimerEngine::with_clock(
        Persistence::new(store.clone()),
        clock.clone(),
        Duration::from_millis(250),
    );
    assert!(second.recover_from_store());
    assert_eq!(second.state(), TimerState::Running { task_index: 0 });
    assert_eq!(second.remaining_ms(), Some(1_500));
}

#[test]
fn stop_guarantees_silence_afterwards() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    h.engine.stop_timer();
    let calls_at_stop = h.bridge.calls().len();
    let events_at_stop = h.log.snapshot().len();

    for _ in 0..100 {
        h.clock.advance(1_000);
        h.engine.tick();
    }
    assert_eq!(h.bridge.calls().len(), calls_at_stop);
    assert_eq!(h.log.snapshot().len(), events_at_stop);
    assert!(!h.store.contains(CHECKPOINT_KEY));
    assert!(matches!(
        h.log.snapshot().last(),
        Some(Event::RoutineEnded {
            finished_naturally: false,
            ..
        })
    ));
}

#[test]
fn skipping_through_the_last_task_completes_the_routine() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    for _ in 0..4 {
        h.engine.skip_task().unwrap();
    }
    assert_eq!(h.engine.state(), TimerState::Idle);
    assert_eq!(h.engine.skip_task(), Err(EngineError::NoActiveRun));
    assert!(matches!(
        h.log.snapshot().last(),
        Some(Event::RoutineEnded {
            finished_naturally: true,
            ..
        })
    ));
}

#[test]
fn restarting_stops_the_previous_run_first() {
    let mut h = harness();
    h.engine.start_timer("circuit").unwrap();
    h.engine.skip_task().unwrap();
    h.engine.start_timer("circuit").unwrap();
    assert_eq!(h.engine.state(), TimerState::Running { task_index: 0 });
    let ended = h
        .log
        .snapshot()
        .into_iter()
        .filter(|e| matches!(e, Event::RoutineEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}
