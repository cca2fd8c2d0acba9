//! Cancellable repeating-timer handle.
//!
//! The engine owns at most one live [`PollHandle`]. Ticks delivered by the
//! host loop are ignored unless a handle is armed, so cancelling here is
//! enough to stop all further tick processing.

use std::time::Duration;

/// Identifies one polling cycle. A new cycle never reuses a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollHandle {
    generation: u64,
}

impl PollHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct Ticker {
    cadence: Duration,
    next_generation: u64,
    active: Option<PollHandle>,
}

impl Ticker {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            next_generation: 1,
            active: None,
        }
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Start a new polling cycle, cancelling any outstanding one first.
    pub fn arm(&mut self) -> PollHandle {
        self.cancel();
        let handle = PollHandle {
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.active = Some(handle);
        handle
    }

    /// Stop polling. Safe to call repeatedly.
    pub fn cancel(&mut self) -> Option<PollHandle> {
        self.active.take()
    }

    pub fn active(&self) -> Option<PollHandle> {
        self.active
    }

    pub fn is_armed(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_replaces_previous_cycle() {
        let mut ticker = Ticker::new(Duration::from_millis(250));
        let first = ticker.arm();
        let second = ticker.arm();
        assert_ne!(first, second);
        assert_eq!(ticker.active(), Some(second));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut ticker = Ticker::new(Duration::from_millis(250));
        let handle = ticker.arm();
        assert_eq!(ticker.cancel(), Some(handle));
        assert_eq!(ticker.cancel(), None);
        assert!(!ticker.is_armed());
    }

    #[test]
    fn generations_are_never_reused() {
        let mut ticker = Ticker::new(Duration::from_millis(250));
        let a = ticker.arm();
        ticker.cancel();
        let b = ticker.arm();
        assert!(b.generation() > a.generation());
    }
}
