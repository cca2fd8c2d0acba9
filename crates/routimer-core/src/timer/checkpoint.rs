use serde::{Deserialize, Serialize};

/// Durable snapshot of an in-flight run.
///
/// The JSON field names are a compatibility contract: recovery must read
/// checkpoints written by older runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerCheckpoint {
    pub group_id: String,
    pub task_index: usize,
    pub paused: bool,
    pub remaining_ms: u64,
    pub task_duration_ms: u64,
    pub last_tick_epoch_ms: u64,
}
