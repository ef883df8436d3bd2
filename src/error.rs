//! Error types for task-cli
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown task, bad args, bad config, unsupported mode)
//! - 4: Operation failed (document unreadable, write failed, store corrupted)

use thiserror::Error;

use crate::task::TaskId;

/// Exit codes for the task-cli binary
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for task operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    // Operation failures (exit code 4)
    #[error("Duplicate task id {0}: id allocator and store are out of sync")]
    DuplicateId(TaskId),

    #[error("Task id {0} is the largest possible id; no further ids can be assigned")]
    IdOverflow(TaskId),

    #[error("Malformed task document {location}: {message}")]
    MalformedDocument { location: String, message: String },

    #[error("Could not persist task document {location}: {source}")]
    PersistenceFailure {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::Unsupported(_) => exit_codes::USER_ERROR,

            Error::DuplicateId(_)
            | Error::IdOverflow(_)
            | Error::MalformedDocument { .. }
            | Error::PersistenceFailure { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Short machine-readable name of the error variant
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::InvalidConfig(_) => "invalid_config",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Unsupported(_) => "unsupported",
            Error::DuplicateId(_) => "duplicate_id",
            Error::IdOverflow(_) => "id_overflow",
            Error::MalformedDocument { .. } => "malformed_document",
            Error::PersistenceFailure { .. } => "persistence_failure",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::TomlParse(_) => "toml",
        }
    }

    /// Structured fields for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound(id) | Error::DuplicateId(id) | Error::IdOverflow(id) => {
                Some(serde_json::json!({ "id": id }))
            }
            Error::MalformedDocument { location, message } => Some(serde_json::json!({
                "location": location,
                "message": message,
            })),
            Error::PersistenceFailure { location, source } => Some(serde_json::json!({
                "location": location,
                "io_error": source.to_string(),
            })),
            Error::InvalidConfig(message)
            | Error::InvalidArgument(message)
            | Error::Unsupported(message) => Some(serde_json::json!({ "message": message })),
            _ => None,
        }
    }
}

/// Result type alias for task operations
pub type Result<T> = std::result::Result<T, Error>;

