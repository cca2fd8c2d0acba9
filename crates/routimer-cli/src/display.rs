//! Terminal rendering of engine callbacks.

use std::io::Write;

use chrono::Utc;
use routimer_core::{format_duration, Event, Task, TimerObserver};

/// Prints task changes and a countdown line, or JSON events with `json`.
pub struct TerminalObserver {
    json: bool,
    total_tasks: usize,
    last_second: Option<u64>,
}

impl TerminalObserver {
    pub fn new(json: bool, total_tasks: usize) -> Self {
        Self {
            json,
            total_tasks,
            last_second: None,
        }
    }

    fn emit(&self, event: &Event) {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
    }
}

impl TimerObserver for TerminalObserver {
    fn on_task_begin(&mut self, task: &Task, group_name: &str, task_number: usize) {
        self.last_second = None;
        if self.json {
            self.emit(&Event::TaskBegan {
                task_name: task.name.clone(),
                icon: task.icon.clone(),
                group_name: group_name.to_string(),
                task_number,
                duration_ms: task.duration_ms,
                at: Utc::now(),
            });
            return;
        }
        let icon = if task.icon.is_empty() { "▶" } else { task.icon.as_str() };
        println!(
            "\n{icon} [{task_number}/{}] {} ({}) · {group_name}",
            self.total_tasks,
            task.name,
            task.duration_label()
        );
    }

    fn on_tick(&mut self, remaining_ms: u64, total_ms: u64) {
        // Redraw only when the displayed second changes.
        let second = remaining_ms.div_ceil(1000);
        if self.last_second == Some(second) {
            return;
        }
        self.last_second = Some(second);

        if self.json {
            self.emit(&Event::Tick {
                remaining_ms,
                total_ms,
                at: Utc::now(),
            });
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let _ = write!(
            stdout,
            "\r  {} / {}   ",
            format_duration(second * 1000),
            format_duration(total_ms)
        );
        let _ = stdout.flush();
    }

    fn on_routine_ended(&mut self, finished_naturally: bool) {
        if self.json {
            self.emit(&Event::RoutineEnded {
                finished_naturally,
                at: Utc::now(),
            });
            return;
        }
        if finished_naturally {
            println!("\nRoutine complete.");
        } else {
            println!("\nRoutine stopped.");
        }
    }
}
