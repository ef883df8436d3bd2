//! Durable task document I/O.
//!
//! [`DocumentStore`] is the raw read/write seam under the persistence
//! gateway: it moves whole documents and knows nothing about tasks.
//! [`FileDocument`] is the real backend; [`MemoryDocument`] keeps the text in
//! memory and can be told to fail, which is how rollback gets exercised.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Whole-document storage.
pub trait DocumentStore {
    /// Read the full document. `Ok(None)` means there is no document yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the full document with `text`.
    fn write(&mut self, text: &str) -> Result<()>;

    /// Where the document lives, for messages and logs.
    fn location(&self) -> String;
}

fn persistence_failure(location: String, source: io::Error) -> Error {
    Error::PersistenceFailure { location, source }
}

/// Task document stored in a single file.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write through a temp file in the same directory, then rename over the
    /// target so a reader never sees a half-written document.
    fn write_atomic(&self, data: &[u8]) -> io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl DocumentStore for FileDocument {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(persistence_failure(self.location(), err)),
        }
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.write_atomic(text.as_bytes())
            .map_err(|err| persistence_failure(self.location(), err))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory document.
///
/// Uses `RefCell`/`Cell` so tests can flip failure switches through a shared
/// reference while the gateway owns the store.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    text: RefCell<Option<String>>,
    fail_writes: Cell<bool>,
    fail_reads: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let document = Self::default();
        document.text.replace(Some(text.into()));
        document
    }

    /// Make every following write fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Make every following read fail with an I/O error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Current document text
    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    /// Number of successful writes so far
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    fn simulated(&self, what: &str) -> Error {
        persistence_failure(
            self.location(),
            io::Error::other(format!("simulated {what} failure")),
        )
    }
}

impl DocumentStore for MemoryDocument {
    fn read(&self) -> Result<Option<String>> {
        if self.fail_reads.get() {
            return Err(self.simulated("read"));
        }
        Ok(self.text.borrow().clone())
    }

    fn write(&mut self, text: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(self.simulated("write"));
        }
        self.text.replace(Some(text.to_string()));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
