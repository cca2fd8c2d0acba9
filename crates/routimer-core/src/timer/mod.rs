mod checkpoint;
mod clock;
mod driver;
mod engine;
mod ticker;

pub use checkpoint::TimerCheckpoint;
pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{drive, Command, DriveOutcome};
pub use engine::{Session, TimerEngine, TimerState};
pub use ticker::{PollHandle, Ticker};
