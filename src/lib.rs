//! task-cli - Task Tracker Library
//!
//! A small task tracker that keeps its tasks in a single JSON document and
//! writes every change through to it.
//!
//! # Core Concepts
//!
//! - **Tasks**: numbered records with a description, a status and timestamps
//! - **Task store**: the in-memory map of tasks plus the next-ID counter
//! - **Document**: the persisted JSON text, on disk or in memory for tests
//! - **Gateway**: applies a change in memory, writes the document, reads it
//!   back, and undoes the in-memory change if any step fails
//! - **Modes**: one-shot CLI commands, an interactive console, scripts
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `codec`: JSON encoding of the task store
//! - `config`: Configuration loading from `task-cli.toml`
//! - `document`: Where the JSON text lives
//! - `error`: Error types and result aliases
//! - `gateway`: Write-through persistence with rollback
//! - `mode`: Console and API front ends
//! - `output`: Human and JSON output
//! - `service`: Task operations with input checks
//! - `shell`: Console line reading and parsing
//! - `task`: Task records, statuses and the task store

pub mod cli;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod mode;
pub mod output;
pub mod service;
pub mod shell;
pub mod task;

pub use error::{Error, Result};
