//! Platform capabilities the engine calls into but does not implement.
//!
//! Every method is best-effort. The engine logs a returned error and carries
//! on; it never retries and never waits for delivery.

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Which task boundary a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyPhase {
    Start,
    End,
}

pub trait PlatformBridge {
    /// Ask the platform to keep the display awake while a routine runs.
    fn request_wake_hold(&mut self) -> Result<(), BridgeError>;

    /// Drop any hold acquired by [`PlatformBridge::request_wake_hold`].
    /// Must be safe to call when nothing is held.
    fn release_wake_hold(&mut self) -> Result<(), BridgeError>;

    /// Show a user-visible notification for a task boundary.
    fn notify(&mut self, task_name: &str, phase: NotifyPhase) -> Result<(), BridgeError>;
}

/// Bridge for platforms with neither capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

impl PlatformBridge for NullBridge {
    fn request_wake_hold(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn release_wake_hold(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn notify(&mut self, _task_name: &str, _phase: NotifyPhase) -> Result<(), BridgeError> {
        Ok(())
    }
}
