//! Task subcommands, shared by the one-shot CLI and the console shell.

use std::io::Write;

use clap::Subcommand;
use serde::Serialize;

use crate::document::DocumentStore;
use crate::error::Result;
use crate::output::{task_line, write_success, HumanOutput, OutputOptions};
use crate::service::TaskService;
use crate::task::{Status, Task, TaskId};

/// Operations on tasks
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// Add a new task
    Add {
        /// Task description (quote it to use several words)
        description: String,
    },

    /// Replace a task's description
    Update {
        /// Task ID
        id: TaskId,

        /// New description
        description: String,

        /// Also set the status: not-done, in-progress, done
        #[arg(long, value_parser = parse_status)]
        status: Option<Status>,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: TaskId,
    },

    /// Show one task
    Get {
        /// Task ID
        id: TaskId,
    },

    /// List tasks, optionally only those with one status
    List {
        /// Status filter: done, not-done, in-progress
        #[arg(value_parser = parse_status)]
        filter: Option<Status>,
    },

    /// Mark a task as in progress
    MarkInProgress {
        /// Task ID
        id: TaskId,
    },

    /// Mark a task as done
    MarkDone {
        /// Task ID
        id: TaskId,
    },
}

fn parse_status(raw: &str) -> std::result::Result<Status, String> {
    raw.parse::<Status>().map_err(|err| err.to_string())
}

impl TaskCommand {
    /// Name used in output envelopes
    pub fn name(&self) -> &'static str {
        match self {
            TaskCommand::Add { .. } => "add",
            TaskCommand::Update { .. } => "update",
            TaskCommand::Delete { .. } => "delete",
            TaskCommand::Get { .. } => "get",
            TaskCommand::List { .. } => "list",
            TaskCommand::MarkInProgress { .. } => "mark-in-progress",
            TaskCommand::MarkDone { .. } => "mark-done",
        }
    }
}

#[derive(Serialize)]
struct IdReport {
    id: TaskId,
}

#[derive(Serialize)]
struct ListReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Status>,
    count: usize,
    tasks: Vec<Task>,
}

/// Run `command` against `service`, writing its result to `out`.
pub fn execute<D: DocumentStore, W: Write>(
    service: &mut TaskService<D>,
    command: TaskCommand,
    options: OutputOptions,
    out: &mut W,
) -> Result<()> {
    let name = command.name();
    match command {
        TaskCommand::Add { description } => {
            let id = service.add_task(&description)?;
            let mut human = HumanOutput::new(format!("Task added successfully. (ID: {id})"));
            human.push_next_step(format!("task-cli mark-in-progress {id}"));
            write_success(out, options, name, &IdReport { id }, Some(&human))
        }
        TaskCommand::Update {
            id,
            description,
            status,
        } => {
            let task = service.update_task(id, &description, status)?;
            let mut human = HumanOutput::new("Task updated successfully.");
            human.push_detail(task_line(&task));
            write_success(out, options, name, &task, Some(&human))
        }
        TaskCommand::Delete { id } => {
            let id = service.delete_task(id)?;
            let human = HumanOutput::new(format!("Task deleted successfully. (ID: {id})"));
            write_success(out, options, name, &IdReport { id }, Some(&human))
        }
        TaskCommand::Get { id } => {
            let task = service.get_task(id)?;
            let mut human = HumanOutput::new(format!("Task {id}"));
            human.push_summary("status", task.status().label());
            human.push_summary("description", task.description());
            human.push_summary("created", task.created_at().to_rfc3339());
            human.push_summary("updated", task.updated_at().to_rfc3339());
            write_success(out, options, name, &task, Some(&human))
        }
        TaskCommand::List { filter } => {
            let tasks = match filter {
                Some(status) => service.list_by_status(status),
                None => service.list_tasks(),
            };
            let human = list_output(&tasks, filter);
            let report = ListReport {
                filter,
                count: tasks.len(),
                tasks,
            };
            write_success(out, options, name, &report, Some(&human))
        }
        TaskCommand::MarkInProgress { id } => {
            let previous = service.get_task(id)?.status();
            let task = service.mark_in_progress(id)?;
            let human = status_output("Task marked in progress successfully.", previous, &task);
            write_success(out, options, name, &task, Some(&human))
        }
        TaskCommand::MarkDone { id } => {
            let previous = service.get_task(id)?.status();
            let task = service.mark_done(id)?;
            let human = status_output("Task marked done successfully.", previous, &task);
            write_success(out, options, name, &task, Some(&human))
        }
    }
}

fn status_output(header: &str, previous: Status, task: &Task) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_detail(task_line(task));
    if previous == task.status() {
        human.push_warning(format!(
            "task {} was already {}",
            task.id(),
            previous.label()
        ));
    }
    human
}

fn list_output(tasks: &[Task], filter: Option<Status>) -> HumanOutput {
    let mut human = match (tasks.is_empty(), filter) {
        (true, Some(status)) => HumanOutput::new(format!("No tasks are {}", status.label())),
        (true, None) => HumanOutput::new("No tasks yet"),
        (false, _) => {
            let noun = if tasks.len() == 1 { "task" } else { "tasks" };
            HumanOutput::new(format!("{} {noun}", tasks.len()))
        }
    };
    for task in tasks {
        human.push_detail(task_line(task));
    }
    if tasks.is_empty() && filter.is_none() {
        human.push_next_step("task-cli add \"<description>\"");
    }
    human
}
