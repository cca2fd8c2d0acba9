//! # Routimer Core Library
//!
//! This library provides the core logic for Routimer, a routine/interval
//! timer. Users define groups of sequential timed tasks and run a group as a
//! countdown with per-task notifications, pause/resume/skip/stop, and
//! recovery after the process restarts.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the host
//!   to periodically invoke `tick()`; [`timer::drive`] is a tokio host
//! - **Storage**: A best-effort gateway over a synchronous key-value store
//!   (SQLite or in-memory) and TOML-based configuration
//! - **Bridge**: Wake-hold and notification capabilities supplied by the platform
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Persistence`]: Group catalog, settings and checkpoint storage
//! - [`Config`]: Application configuration management
//! - [`PlatformBridge`]: Trait for platform wake-hold and notifications

pub mod bridge;
pub mod duration;
pub mod error;
pub mod events;
pub mod group;
pub mod storage;
pub mod timer;

pub use bridge::{NotifyPhase, NullBridge, PlatformBridge};
pub use duration::{format_duration, parse_duration, MAX_DURATION_MS};
pub use error::{BridgeError, ConfigError, CoreError, EngineError, StoreError, ValidationError};
pub use events::{Event, EventLog, NullObserver, TimerObserver};
pub use group::{Group, GroupCatalog, NotifyPolicy, Task};
pub use storage::{Config, KeyValueStore, MemoryStore, Persistence, Settings, SqliteStore};
pub use timer::{TimerCheckpoint, TimerEngine, TimerState};
