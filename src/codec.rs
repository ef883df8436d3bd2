//! Task document codec.
//!
//! Maps a [`TaskStore`] to and from its JSON document:
//!
//! ```text
//! {
//!   "nextId": 3,
//!   "tasks": [
//!     {
//!       "id": 1,
//!       "status": "NOT_DONE",
//!       "description": "Buy groceries",
//!       "createdAt": "2026-10-19T08:30:00Z",
//!       "updatedAt": "2026-10-19T08:30:00Z"
//!     }
//!   ]
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{Status, Task, TaskId, TaskStore};

/// Timestamp layout written to the document
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_id: Option<TaskId>,
    #[serde(default)]
    tasks: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    id: TaskId,
    status: Status,
    #[serde(alias = "task")]
    description: String,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    updated_at: DateTime<Utc>,
}

impl From<&Task> for Entry {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            status: task.status(),
            description: task.description().to_string(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

impl From<Entry> for Task {
    fn from(entry: Entry) -> Self {
        Task::from_parts(
            entry.id,
            entry.status,
            entry.description,
            entry.created_at,
            entry.updated_at,
        )
    }
}

/// Encodes and decodes task documents.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    pretty: bool,
}

impl Default for Codec {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Codec {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn encode(&self, store: &TaskStore) -> Result<String> {
        let document = Document {
            next_id: Some(store.next_id()),
            tasks: store.iter().map(Entry::from).collect(),
        };
        let mut text = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        text.push('\n');
        Ok(text)
    }

    /// Decode a document. Blank text is a brand new, empty store.
    ///
    /// `location` only labels errors.
    pub fn decode(&self, text: &str, location: &str) -> Result<TaskStore> {
        if text.trim().is_empty() {
            return Ok(TaskStore::new());
        }

        let malformed = |message: String| Error::MalformedDocument {
            location: location.to_string(),
            message,
        };

        let document: Document =
            serde_json::from_str(text).map_err(|err| malformed(err.to_string()))?;
        let tasks = document.tasks.into_iter().map(Task::from).collect();
        TaskStore::from_parts(document.next_id, tasks).map_err(|err| match err {
            Error::DuplicateId(id) => malformed(format!("task id {id} appears more than once")),
            Error::IdOverflow(id) => malformed(format!("task id {id} leaves no room for a next id")),
            other => other,
        })
    }
}

/// Serde adapter for document timestamps.
///
/// Writes [`TIMESTAMP_FORMAT`]. Reads RFC 3339 as well as offset-less ISO
/// date-times, which are taken as UTC. Sub-second digits are dropped.
pub mod timestamp {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map(|value| value.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|value| value.and_utc())
            })
            .ok()?;
        Some(parsed.trunc_subsecs(0))
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskPatch;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn sample_store() -> TaskStore {
        let mut store = TaskStore::new();
        for (offset, description) in ["Buy groceries", "Write \"report\"", "Ship it"]
            .iter()
            .enumerate()
        {
            let id = store.allocate_id().expect("allocate");
            store
                .insert(Task::new(id, *description, at(offset as i64)))
                .expect("insert");
        }
        store
            .replace(2, TaskPatch::status(Status::InProgress), at(50))
            .expect("replace");
        store.remove(3).expect("remove");
        store
    }

    #[test]
    fn decode_reverses_encode() {
        let store = sample_store();
        for codec in [Codec::new(true), Codec::new(false)] {
            let text = codec.encode(&store).expect("encode");
            let decoded = codec.decode(&text, "test").expect("decode");
            assert_eq!(decoded, store);
            assert_eq!(decoded.next_id(), 4);
        }
    }

    #[test]
    fn encode_uses_document_field_names() {
        let text = Codec::default().encode(&sample_store()).expect("encode");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");

        assert_eq!(value["nextId"], 4);
        let first = &value["tasks"][0];
        assert_eq!(first["id"], 1);
        assert_eq!(first["status"], "NOT_DONE");
        assert_eq!(first["description"], "Buy groceries");
        assert_eq!(first["createdAt"], format(&at(0)).as_str());
        assert_eq!(value["tasks"][1]["status"], "IN_PROGRESS");
    }

    fn format(value: &DateTime<Utc>) -> String {
        timestamp::format(value)
    }

    #[test]
    fn blank_document_is_empty_store() {
        for text in ["", "   \n\t"] {
            let store = Codec::default().decode(text, "blank").expect("decode");
            assert_eq!(store, TaskStore::new());
            assert_eq!(store.next_id(), 1);
        }
    }

    #[test]
    fn syntax_errors_are_malformed() {
        let err = Codec::default()
            .decode("{\"nextId\": 2, \"tasks\": [", "tasks.json")
            .expect_err("malformed");
        match err {
            Error::MalformedDocument { location, .. } => assert_eq!(location, "tasks.json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_status_is_malformed() {
        let text = r#"{"nextId": 2, "tasks": [{"id": 1, "status": "LATER", "description": "x",
            "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-01T00:00:00Z"}]}"#;
        let err = Codec::default().decode(text, "t").expect_err("malformed");
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[test]
    fn duplicate_ids_are_malformed() {
        let text = r#"{"nextId": 3, "tasks": [
            {"id": 1, "status": "DONE", "description": "a",
             "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-01T00:00:00Z"},
            {"id": 1, "status": "DONE", "description": "b",
             "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-01T00:00:00Z"}]}"#;
        let err = Codec::default().decode(text, "t").expect_err("duplicate");
        match err {
            Error::MalformedDocument { message, .. } => assert!(message.contains("task id 1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn legacy_documents_load() {
        let text = r#"{
            "nextId": 3,
            "tasks": [
                {"id": 2, "status": "IN_PROGRESS", "task": "Buy milk",
                 "createdAt": "2025-04-01T10:20:30.123456", "updatedAt": "2025-04-02T11:00:00"}
            ]
        }"#;
        let store = Codec::default().decode(text, "legacy").expect("decode");
        let task = store.get(2).expect("task");
        assert_eq!(task.description(), "Buy milk");
        assert_eq!(task.status(), Status::InProgress);
        assert_eq!(
            task.created_at(),
            Utc.with_ymd_and_hms(2025, 4, 1, 10, 20, 30).unwrap()
        );
        assert_eq!(store.next_id(), 3);
    }

    #[test]
    fn missing_counter_is_derived_from_records() {
        let text = r#"{"tasks": [{"id": 5, "status": "DONE", "description": "x",
            "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-01T00:00:00Z"}]}"#;
        let store = Codec::default().decode(text, "t").expect("decode");
        assert_eq!(store.next_id(), 6);
    }

    #[test]
    fn largest_possible_id_is_malformed() {
        let text = r#"{"tasks": [{"id": 18446744073709551615, "status": "DONE", "description": "x",
            "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-01T00:00:00Z"}]}"#;
        let err = Codec::default().decode(text, "t").expect_err("overflow");
        match err {
            Error::MalformedDocument { message, .. } => {
                assert!(message.contains("18446744073709551615"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timestamps_accept_offsets() {
        let parsed = timestamp::parse("2025-06-01T12:00:00.999+02:00").expect("parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap());
        assert!(timestamp::parse("yesterday").is_none());
    }
}
