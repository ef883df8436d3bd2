//! Persistence gateway.
//!
//! Every mutation follows the same cycle: change the in-memory store, encode
//! the whole store, write the document, read it back and adopt what was read.
//! If any step after the change fails, the change is undone and the error is
//! returned, so a caller either sees a committed, durable operation or no
//! effect at all.

use std::io;

use crate::codec::Codec;
use crate::config::{ConfigSource, DOCUMENT_PATH_KEY, DOCUMENT_PRETTY_KEY};
use crate::document::{DocumentStore, FileDocument};
use crate::error::{Error, Result};
use crate::task::{timestamp_now, Task, TaskId, TaskPatch, TaskStore};

/// How to take back an in-memory change after a failed persist.
#[derive(Debug)]
enum Undo {
    Added(TaskId),
    Updated(Task),
    Deleted(Task),
}

/// Sole owner of the task document and of the store loaded from it.
#[derive(Debug)]
pub struct PersistenceGateway<D: DocumentStore> {
    document: D,
    codec: Codec,
    store: TaskStore,
}

impl PersistenceGateway<FileDocument> {
    /// Open the file named by `json.file.path`.
    ///
    /// Fails fast when the key is missing or blank, or when the document exists
    /// but cannot be decoded.
    pub fn from_config(config: &dyn ConfigSource) -> Result<Self> {
        let path = config
            .get_property(DOCUMENT_PATH_KEY)
            .filter(|path| !path.trim().is_empty())
            .ok_or_else(|| {
                Error::InvalidConfig(format!("{DOCUMENT_PATH_KEY} is not set"))
            })?;

        let pretty = match config.get_property(DOCUMENT_PRETTY_KEY) {
            None => true,
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                Error::InvalidConfig(format!(
                    "{DOCUMENT_PRETTY_KEY} must be true or false, got '{raw}'"
                ))
            })?,
        };

        Self::open(FileDocument::new(path), Codec::new(pretty))
    }
}

impl<D: DocumentStore> PersistenceGateway<D> {
    /// Load the store from `document`. A missing or blank document is an
    /// empty store whose first id is 1.
    pub fn open(document: D, codec: Codec) -> Result<Self> {
        let store = load(&document, &codec)?;
        tracing::debug!(
            location = %document.location(),
            tasks = store.len(),
            next_id = store.next_id(),
            "loaded task document"
        );
        Ok(Self {
            document,
            codec,
            store,
        })
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn location(&self) -> String {
        self.document.location()
    }

    /// Create a `NOT_DONE` task and return its id.
    pub fn add(&mut self, description: String) -> Result<TaskId> {
        let id = self.store.allocate_id()?;
        let task = Task::new(id, description, timestamp_now());
        if let Err(err) = self.store.insert(task) {
            self.store.release_id(id);
            tracing::error!(id, "allocated task id is already in use");
            return Err(err);
        }

        self.persist(Undo::Added(id))?;
        tracing::debug!(id, "task added");
        Ok(id)
    }

    /// Apply `patch` to task `id` and return the task as stored.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        let before = self.store.get(id)?.clone();
        self.store.replace(id, patch, timestamp_now())?;

        self.persist(Undo::Updated(before))?;
        tracing::debug!(id, "task updated");
        self.get(id)
    }

    /// Remove task `id` and return the id.
    pub fn delete(&mut self, id: TaskId) -> Result<TaskId> {
        let removed = self.store.remove(id)?;

        self.persist(Undo::Deleted(removed))?;
        tracing::debug!(id, "task deleted");
        Ok(id)
    }

    pub fn get(&self, id: TaskId) -> Result<Task> {
        self.store.get(id).cloned()
    }

    pub fn list(&self) -> Vec<Task> {
        self.store.all()
    }

    /// Replace the in-memory store with a fresh read of the document.
    pub fn reload(&mut self) -> Result<()> {
        self.store = load(&self.document, &self.codec)?;
        Ok(())
    }

    fn persist(&mut self, undo: Undo) -> Result<()> {
        if let Err(err) = self.write_store() {
            tracing::warn!(
                location = %self.document.location(),
                error = %err,
                "task document write failed; rolling back"
            );
            self.rollback(undo);
            return Err(err);
        }

        match self.read_back() {
            Ok(store) => {
                self.store = store;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    location = %self.document.location(),
                    error = %err,
                    "task document reload failed; rolling back"
                );
                self.rollback(undo);
                // The new document may already be on disk; put the old one back.
                if let Err(restore_err) = self.write_store() {
                    tracing::error!(
                        location = %self.document.location(),
                        error = %restore_err,
                        "could not restore previous task document"
                    );
                }
                Err(err)
            }
        }
    }

    fn rollback(&mut self, undo: Undo) {
        match undo {
            Undo::Added(id) => {
                let _ = self.store.remove(id);
                self.store.release_id(id);
            }
            Undo::Updated(task) | Undo::Deleted(task) => {
                self.store.restore(task);
            }
        }
    }

    fn write_store(&mut self) -> Result<()> {
        let text = self.codec.encode(&self.store)?;
        self.document.write(&text)
    }

    fn read_back(&self) -> Result<TaskStore> {
        let location = self.document.location();
        let text = self.document.read()?.ok_or_else(|| Error::PersistenceFailure {
            location: location.clone(),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                "task document missing right after it was written",
            ),
        })?;
        // The document was just written from memory, so text that no longer
        // decodes means the write did not land intact.
        self.codec
            .decode(&text, &location)
            .map_err(|err| match err {
                Error::MalformedDocument { location, message } => Error::PersistenceFailure {
                    location,
                    source: io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("task document did not read back: {message}"),
                    ),
                },
                other => other,
            })
    }
}

fn load<D: DocumentStore>(document: &D, codec: &Codec) -> Result<TaskStore> {
    match document.read()? {
        Some(text) => codec.decode(&text, &document.location()),
        None => Ok(TaskStore::new()),
    }
}
