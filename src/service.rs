//! Task service: the operations front ends call.

use crate::document::DocumentStore;
use crate::error::{Error, Result};
use crate::gateway::PersistenceGateway;
use crate::task::{Status, Task, TaskId, TaskPatch};

/// Thin façade over [`PersistenceGateway`] that checks caller input.
#[derive(Debug)]
pub struct TaskService<D: DocumentStore> {
    gateway: PersistenceGateway<D>,
}

impl<D: DocumentStore> TaskService<D> {
    pub fn new(gateway: PersistenceGateway<D>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &PersistenceGateway<D> {
        &self.gateway
    }

    pub fn add_task(&mut self, description: &str) -> Result<TaskId> {
        let description = require_description(description)?;
        self.gateway.add(description)
    }

    /// Change a task's description and, optionally, its status.
    pub fn update_task(
        &mut self,
        id: TaskId,
        description: &str,
        status: Option<Status>,
    ) -> Result<Task> {
        let description = require_description(description)?;
        self.gateway
            .update(id, TaskPatch::description(description).with_status(status))
    }

    pub fn set_status(&mut self, id: TaskId, status: Status) -> Result<Task> {
        self.gateway.update(id, TaskPatch::status(status))
    }

    pub fn mark_in_progress(&mut self, id: TaskId) -> Result<Task> {
        self.set_status(id, Status::InProgress)
    }

    pub fn mark_done(&mut self, id: TaskId) -> Result<Task> {
        self.set_status(id, Status::Done)
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<TaskId> {
        self.gateway.delete(id)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Task> {
        self.gateway.get(id)
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.gateway.list()
    }

    pub fn list_by_status(&self, status: Status) -> Vec<Task> {
        self.gateway
            .list()
            .into_iter()
            .filter(|task| task.status() == status)
            .collect()
    }

    /// Re-read the task document into memory.
    pub fn reload(&mut self) -> Result<()> {
        self.gateway.reload()
    }
}

fn require_description(description: &str) -> Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(
            "task description cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
