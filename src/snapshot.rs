// Serialized form of the task collection

use crate::models::{Task, TaskId};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    tasks: Vec<Task>,
}

/// Either the versioned envelope or a bare array of tasks
#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Versioned(Envelope),
    Bare(Vec<Task>),
}

/// Encode the whole collection
pub fn encode(tasks: &[Task]) -> Result<String> {
    let envelope = EnvelopeRef {
        version: CURRENT_VERSION,
        tasks,
    };
    serde_json::to_string(&envelope).context("Failed to serialize tasks")
}

/// Decode a stored collection, preserving order
///
/// Rejects versions newer than this build understands, tasks whose text is
/// blank, and collections that repeat an id.
pub fn decode(data: &str) -> Result<Vec<Task>> {
    let stored: Stored = serde_json::from_str(data).context("Failed to parse stored tasks")?;

    let tasks = match stored {
        Stored::Versioned(envelope) => {
            if envelope.version > CURRENT_VERSION {
                return Err(eyre!(
                    "Unsupported snapshot version {} (max {})",
                    envelope.version,
                    CURRENT_VERSION
                ));
            }
            envelope.tasks
        }
        Stored::Bare(tasks) => {
            debug!(count = tasks.len(), "decode: read unversioned snapshot");
            tasks
        }
    };

    if let Some(task) = tasks.iter().find(|t| t.text.trim().is_empty()) {
        return Err(eyre!("Stored task {} has empty text", task.id));
    }

    let mut seen: HashSet<TaskId> = HashSet::with_capacity(tasks.len());
    if let Some(task) = tasks.iter().find(|t| !seen.insert(t.id)) {
        return Err(eyre!("Stored task id {} appears more than once", task.id));
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sample() -> Vec<Task> {
        let created = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();
        let mut paid = Task::new("Pay rent", Some(created - Duration::days(1)), created);
        paid.completed = true;
        vec![
            Task::new("Buy milk", None, created),
            paid,
            Task::new("Call mom", Some(created + Duration::hours(3)), created + Duration::seconds(5)),
        ]
    }

    #[test]
    fn test_roundtrip_preserves_everything() {
        let tasks = sample();
        let decoded = decode(&encode(&tasks).unwrap()).unwrap();
        assert_eq!(decoded, tasks);
    }

    #[test]
    fn test_encode_envelope_shape() {
        let json: serde_json::Value = serde_json::from_str(&encode(&sample()).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["tasks"].as_array().unwrap().len(), 3);
        assert!(json["tasks"][0]["due_at"].is_null());
        assert_eq!(json["tasks"][1]["completed"], true);
    }

    #[test]
    fn test_decode_bare_array() {
        let tasks = sample();
        let bare = serde_json::to_string(&tasks).unwrap();
        assert_eq!(decode(&bare).unwrap(), tasks);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode(r#"{"version":1,"tasks":[]}"#).unwrap().is_empty());
        assert!(decode("[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let err = decode(r#"{"version":2,"tasks":[]}"#).unwrap_err();
        assert!(err.to_string().contains("Unsupported snapshot version 2"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("").is_err());
        assert!(decode("{malformed json}").is_err());
        assert!(decode(r#"{"tasks":"nope"}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_duplicate_ids() {
        let mut tasks = sample();
        tasks[2].id = tasks[0].id;
        let data = encode(&tasks).unwrap();

        let err = decode(&data).unwrap_err();
        assert!(err.to_string().contains("appears more than once"));

        let bare = serde_json::to_string(&tasks).unwrap();
        assert!(decode(&bare).is_err());
    }

    #[test]
    fn test_decode_rejects_blank_text() {
        let mut tasks = sample();
        tasks[0].text = "   ".to_string();
        let data = encode(&tasks).unwrap();
        assert!(decode(&data).is_err());
    }
}
