//! Task records and the in-memory task store.
//!
//! The store is plain bookkeeping: it never touches the disk. Records are kept
//! in a map keyed by id, so identity is the id and nothing else, and the
//! `next_id` counter is always strictly greater than every stored id.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier assigned to a task when it is added
pub type TaskId = u64;

/// Id handed out by an empty store
pub const FIRST_TASK_ID: TaskId = 1;

/// Current time at the precision the task document stores.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    NotDone,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::NotDone, Status::InProgress, Status::Done];

    /// Literal written to the task document
    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotDone => "NOT_DONE",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
        }
    }

    /// Spelling used by `list <filter>`
    pub fn filter_name(self) -> &'static str {
        match self {
            Status::NotDone => "not-done",
            Status::InProgress => "in-progress",
            Status::Done => "done",
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Status::NotDone => "Not Done",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Status::ALL
            .into_iter()
            .find(|status| status.filter_name() == normalized)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown status '{}' (expected done, not-done or in-progress)",
                    raw.trim()
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    status: Status,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// A fresh `NOT_DONE` task created at `now`.
    pub fn new(id: TaskId, description: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: Status::NotDone,
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a task from stored fields, as read back from a document.
    pub fn from_parts(
        id: TaskId,
        status: Status,
        description: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status,
            description,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.id, self.description)
    }
}

/// Fields an update may change. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub status: Option<Status>,
}

impl TaskPatch {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            status: None,
        }
    }

    pub fn status(status: Status) -> Self {
        Self {
            description: None,
            status: Some(status),
        }
    }

    pub fn with_status(mut self, status: Option<Status>) -> Self {
        self.status = status;
        self
    }
}

/// In-memory record store: tasks keyed by id plus the id counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStore {
    next_id: TaskId,
    tasks: BTreeMap<TaskId, Task>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            next_id: FIRST_TASK_ID,
            tasks: BTreeMap::new(),
        }
    }

    /// Build a store from a counter and a list of records.
    ///
    /// A repeated id is rejected. A counter that does not exceed the largest
    /// id is raised to `max_id + 1`.
    pub fn from_parts(next_id: Option<TaskId>, tasks: Vec<Task>) -> Result<Self> {
        let mut store = Self::new();
        for task in tasks {
            store.insert(task)?;
        }

        let required = store.next_id;
        match next_id {
            Some(next_id) if next_id >= required => store.next_id = next_id,
            Some(next_id) => {
                tracing::warn!(
                    next_id,
                    required,
                    "task document counter is behind its records; raising it"
                );
            }
            None => {}
        }
        Ok(store)
    }

    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Hand out the current counter value and advance it.
    ///
    /// Fails with `IdOverflow` once the counter has reached `TaskId::MAX`, since
    /// the counter must stay above every id handed out.
    pub fn allocate_id(&mut self) -> Result<TaskId> {
        let id = self.next_id;
        self.next_id = successor(id)?;
        Ok(id)
    }

    /// Give back the most recently allocated id. Returns false when `id` was
    /// not the last allocation, in which case the counter is left alone.
    pub fn release_id(&mut self, id: TaskId) -> bool {
        if id.checked_add(1) == Some(self.next_id) {
            self.next_id = id;
            true
        } else {
            false
        }
    }

    /// Add a record whose id is not yet present.
    pub fn insert(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(Error::DuplicateId(task.id));
        }
        self.next_id = self.next_id.max(successor(task.id)?);
        self.tasks.insert(task.id, task);
        Ok(())
    }

    pub fn get(&self, id: TaskId) -> Result<&Task> {
        self.tasks.get(&id).ok_or(Error::NotFound(id))
    }

    /// Remove a record and hand it back to the caller.
    pub fn remove(&mut self, id: TaskId) -> Result<Task> {
        self.tasks.remove(&id).ok_or(Error::NotFound(id))
    }

    /// Apply `patch` to an existing record in place.
    ///
    /// `id` and `created_at` never change. `updated_at` moves to `now`, or one
    /// second past its previous value when the clock has not advanced that far.
    pub fn replace(&mut self, id: TaskId, patch: TaskPatch, now: DateTime<Utc>) -> Result<&Task> {
        let task = self.tasks.get_mut(&id).ok_or(Error::NotFound(id))?;
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.updated_at = match task.updated_at.checked_add_signed(Duration::seconds(1)) {
            Some(bumped) => now.max(bumped),
            None => now.max(task.updated_at),
        };
        Ok(task)
    }

    /// Put a record back exactly as given, replacing any current value.
    /// Only rollback uses this; it bypasses the insert/replace contracts.
    ///
    /// The record was in this store before, so the counter is already past it.
    pub fn restore(&mut self, task: Task) -> Option<Task> {
        self.tasks.insert(task.id, task)
    }

    /// Snapshot of every record, ordered by id.
    pub fn all(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}

fn successor(id: TaskId) -> Result<TaskId> {
    id.checked_add(1).ok_or(Error::IdOverflow(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn store_with(descriptions: &[&str]) -> TaskStore {
        let mut store = TaskStore::new();
        for (offset, description) in descriptions.iter().enumerate() {
            let id = store.allocate_id().expect("allocate");
            store
                .insert(Task::new(id, *description, at(offset as i64)))
                .expect("insert");
        }
        store
    }

    #[test]
    fn new_store_starts_at_id_one() {
        let store = TaskStore::new();
        assert_eq!(store.next_id(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn allocate_id_increments_counter() {
        let mut store = TaskStore::new();
        assert_eq!(store.allocate_id().expect("allocate"), 1);
        assert_eq!(store.allocate_id().expect("allocate"), 2);
        assert_eq!(store.next_id(), 3);
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut store = store_with(&["first"]);
        let err = store
            .insert(Task::new(1, "impostor", at(10)))
            .expect_err("duplicate");
        assert!(matches!(err, Error::DuplicateId(1)));
        assert_eq!(store.get(1).expect("get").description(), "first");
    }

    #[test]
    fn insert_keeps_counter_ahead_of_ids() {
        let mut store = TaskStore::new();
        store.insert(Task::new(7, "imported", at(0))).expect("insert");
        assert_eq!(store.next_id(), 8);
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut store = store_with(&["a", "b", "c"]);
        store.remove(2).expect("remove");
        assert_eq!(store.next_id(), 4);
        assert_eq!(store.allocate_id().expect("allocate"), 4);
    }

    #[test]
    fn get_and_remove_report_missing_ids() {
        let mut store = store_with(&["a"]);
        assert!(matches!(store.get(9), Err(Error::NotFound(9))));
        assert!(matches!(store.remove(9), Err(Error::NotFound(9))));
    }

    #[test]
    fn replace_keeps_identity_and_creation_time() {
        let mut store = store_with(&["Buy groceries"]);
        let patch = TaskPatch::description("Buy groceries and cook")
            .with_status(Some(Status::InProgress));
        let task = store.replace(1, patch, at(100)).expect("replace").clone();

        assert_eq!(task.id(), 1);
        assert_eq!(task.description(), "Buy groceries and cook");
        assert_eq!(task.status(), Status::InProgress);
        assert_eq!(task.created_at(), at(0));
        assert_eq!(task.updated_at(), at(100));
    }

    #[test]
    fn replace_advances_updated_at_when_clock_stalls() {
        let mut store = store_with(&["a"]);
        let first = store
            .replace(1, TaskPatch::status(Status::Done), at(0))
            .expect("replace")
            .updated_at();
        let second = store
            .replace(1, TaskPatch::status(Status::NotDone), at(0))
            .expect("replace")
            .updated_at();
        assert_eq!(first, at(1));
        assert_eq!(second, at(2));
    }

    #[test]
    fn replace_missing_task_is_not_found() {
        let mut store = TaskStore::new();
        let err = store
            .replace(3, TaskPatch::status(Status::Done), at(0))
            .expect_err("missing");
        assert!(matches!(err, Error::NotFound(3)));
    }

    #[test]
    fn release_id_only_rewinds_last_allocation() {
        let mut store = TaskStore::new();
        let first = store.allocate_id().expect("allocate");
        let second = store.allocate_id().expect("allocate");
        assert!(!store.release_id(first));
        assert!(store.release_id(second));
        assert_eq!(store.next_id(), 2);
    }

    #[test]
    fn all_is_ordered_by_id() {
        let mut store = store_with(&["a", "b", "c"]);
        store.remove(1).expect("remove");
        let ids: Vec<TaskId> = store.all().iter().map(Task::id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn from_parts_rejects_duplicates() {
        let tasks = vec![Task::new(1, "a", at(0)), Task::new(1, "b", at(0))];
        let err = TaskStore::from_parts(Some(5), tasks).expect_err("duplicate");
        assert!(matches!(err, Error::DuplicateId(1)));
    }

    #[test]
    fn from_parts_raises_stale_counter() {
        let tasks = vec![Task::new(4, "a", at(0))];
        let store = TaskStore::from_parts(Some(2), tasks).expect("store");
        assert_eq!(store.next_id(), 5);

        let store = TaskStore::from_parts(None, vec![]).expect("store");
        assert_eq!(store.next_id(), 1);
    }

    #[test]
    fn largest_id_cannot_be_stored() {
        let mut store = TaskStore::new();
        let err = store
            .insert(Task::new(TaskId::MAX, "edge", at(0)))
            .expect_err("overflow");
        assert!(matches!(err, Error::IdOverflow(TaskId::MAX)));
        assert!(store.is_empty());
        assert_eq!(store.next_id(), FIRST_TASK_ID);

        let store = TaskStore::from_parts(None, vec![Task::new(TaskId::MAX - 1, "last", at(0))])
            .expect("store");
        assert_eq!(store.next_id(), TaskId::MAX);
    }

    #[test]
    fn exhausted_counter_refuses_to_allocate() {
        let mut store = TaskStore::from_parts(Some(TaskId::MAX), vec![]).expect("store");
        assert!(matches!(
            store.allocate_id(),
            Err(Error::IdOverflow(TaskId::MAX))
        ));
        assert_eq!(store.next_id(), TaskId::MAX);
        assert!(!store.release_id(TaskId::MAX));
    }

    #[test]
    fn status_parses_filter_and_document_spellings() {
        assert_eq!("not-done".parse::<Status>().unwrap(), Status::NotDone);
        assert_eq!("IN_PROGRESS".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("in progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!(" Done ".parse::<Status>().unwrap(), Status::Done);
        assert!(matches!(
            "later".parse::<Status>(),
            Err(Error::InvalidArgument(_))
        ));
    }
}
