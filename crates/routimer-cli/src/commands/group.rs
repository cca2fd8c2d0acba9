use clap::Subcommand;
use routimer_core::{format_duration, parse_duration, Config, Group, NotifyPolicy, Task};

use super::{open_persistence, CmdResult};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Create a group from one or more task specs
    Create {
        /// Group name
        name: String,
        /// Display color (e.g. "#22c55e")
        #[arg(long)]
        color: Option<String>,
        /// Task spec "name,HH:MM:SS[,notify[,icon]]"; repeat in run order
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
    },
    /// Append a task to an existing group
    AddTask {
        /// Group ID
        group_id: String,
        /// Task name
        name: String,
        /// Duration as HH:MM:SS
        duration: String,
        /// When to notify: none, start, end or both
        #[arg(long, default_value = "none")]
        notify: NotifyPolicy,
        /// Short icon shown next to the task
        #[arg(long, default_value = "")]
        icon: String,
    },
    /// List groups
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one group with its tasks
    Show {
        /// Group ID
        group_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a group
    Remove {
        /// Group ID
        group_id: String,
    },
}

/// Parse "name,HH:MM:SS[,notify[,icon]]".
fn parse_task_spec(spec: &str) -> Result<Task, Box<dyn std::error::Error>> {
    let mut parts = spec.split(',').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let duration = parts
        .next()
        .ok_or_else(|| format!("task spec '{spec}' is missing a duration"))?;
    let notify = match parts.next() {
        Some(p) if !p.is_empty() => p.parse::<NotifyPolicy>()?,
        _ => NotifyPolicy::None,
    };
    let icon = parts.next().unwrap_or_default();
    Ok(Task::new(name, parse_duration(duration), notify).with_icon(icon))
}

fn print_group(group: &Group) {
    println!("{} ({})", group.name, group.id);
    if let Some(color) = &group.color {
        println!("  color: {color}");
    }
    for (i, task) in group.tasks.iter().enumerate() {
        let icon = if task.icon.is_empty() { " " } else { task.icon.as_str() };
        println!(
            "  {:>3}. {icon} {:<24} {}  notify={:?}",
            i + 1,
            task.name,
            task.duration_label(),
            task.notify_policy
        );
    }
    println!("  total: {}", format_duration(group.total_duration_ms()));
}

pub fn run(action: GroupAction, config: &Config) -> CmdResult {
    let persistence = open_persistence(config)?;
    let mut catalog = persistence.load_groups();

    match action {
        GroupAction::Create { name, color, tasks } => {
            let mut group = Group::new(name);
            group.color = color;
            for spec in &tasks {
                group.tasks.push(parse_task_spec(spec)?);
            }
            group.validate()?;
            println!("{}", group.id);
            catalog.insert(group);
            persistence.save_groups(&catalog);
        }
        GroupAction::AddTask {
            group_id,
            name,
            duration,
            notify,
            icon,
        } => {
            let group = catalog
                .get_mut(&group_id)
                .ok_or_else(|| format!("no group with id '{group_id}'"))?;
            group
                .tasks
                .push(Task::new(name, parse_duration(&duration), notify).with_icon(icon));
            group.validate()?;
            println!("group now has {} tasks", group.tasks.len());
            persistence.save_groups(&catalog);
        }
        GroupAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else if catalog.is_empty() {
                println!("no groups");
            } else {
                for group in catalog.iter() {
                    println!(
                        "{}  {:<24} {:>3} tasks  {}",
                        group.id,
                        group.name,
                        group.tasks.len(),
                        format_duration(group.total_duration_ms())
                    );
                }
            }
        }
        GroupAction::Show { group_id, json } => {
            let group = catalog
                .get(&group_id)
                .ok_or_else(|| format!("no group with id '{group_id}'"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(group)?);
            } else {
                print_group(group);
            }
        }
        GroupAction::Remove { group_id } => {
            let removed = catalog
                .remove(&group_id)
                .ok_or_else(|| format!("no group with id '{group_id}'"))?;
            persistence.save_groups(&catalog);
            println!("removed {}", removed.name);
        }
    }
    Ok(())
}
