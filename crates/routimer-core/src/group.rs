//! Groups of sequential timed tasks.
//!
//! A [`Group`] is one routine. Its tasks run in order; each carries a
//! [`NotifyPolicy`] deciding which boundaries produce a notification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::duration::format_duration;
use crate::error::ValidationError;

/// Upper bound on tasks per group accepted by the builder.
pub const MAX_TASKS_PER_GROUP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyPolicy {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl NotifyPolicy {
    pub fn on_start(self) -> bool {
        matches!(self, NotifyPolicy::Start | NotifyPolicy::Both)
    }

    pub fn on_end(self) -> bool {
        matches!(self, NotifyPolicy::End | NotifyPolicy::Both)
    }
}

impl std::str::FromStr for NotifyPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(NotifyPolicy::None),
            "start" => Ok(NotifyPolicy::Start),
            "end" => Ok(NotifyPolicy::End),
            "both" => Ok(NotifyPolicy::Both),
            other => Err(ValidationError::InvalidValue {
                field: "notifyPolicy".into(),
                message: format!("expected none, start, end or both, got '{other}'"),
            }),
        }
    }
}

/// One timed step within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub notify_policy: NotifyPolicy,
    #[serde(default)]
    pub icon: String,
}

impl Task {
    pub fn new(name: impl Into<String>, duration_ms: u64, notify_policy: NotifyPolicy) -> Self {
        Self {
            name: name.into(),
            duration_ms,
            notify_policy,
            icon: String::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Duration as `HH:MM:SS`.
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_ms)
    }
}

/// A named, ordered list of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Group {
    /// Create an empty group with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            color: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.tasks
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.duration_ms))
    }

    /// Check the constraints the group builder enforces before saving.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "group name must not be empty".into(),
            });
        }
        if self.tasks.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "group '{}' has no tasks",
                self.name
            )));
        }
        if self.tasks.len() > MAX_TASKS_PER_GROUP {
            return Err(ValidationError::TooMany {
                collection: format!("group '{}'", self.name),
                len: self.tasks.len(),
                max: MAX_TASKS_PER_GROUP,
            });
        }
        for (i, task) in self.tasks.iter().enumerate() {
            if task.name.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("tasks[{i}].name"),
                    message: "task name must not be empty".into(),
                });
            }
            if task.duration_ms == 0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("tasks[{i}].durationMs"),
                    message: format!("task '{}' must last longer than 00:00:00", task.name),
                });
            }
        }
        Ok(())
    }
}

/// The in-memory catalog of groups, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupCatalog {
    groups: Vec<Group>,
}

impl GroupCatalog {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn get(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// Insert a group, replacing any existing group with the same id in place.
    pub fn insert(&mut self, group: Group) {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Group> {
        let pos = self.groups.iter().position(|g| g.id == id)?;
        Some(self.groups.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
