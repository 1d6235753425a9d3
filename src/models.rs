// Data models for taskboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable task identifier
///
/// UUIDv7: time-ordered, with a per-process counter so ids minted within the
/// same millisecond still sort and never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub due_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Build a fresh, not-yet-completed task. Text is stored trimmed.
    pub(crate) fn new(text: &str, due_at: Option<DateTime<Utc>>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            text: text.trim().to_string(),
            due_at,
            completed: false,
            created_at,
        }
    }

    /// A task is overdue when it is not completed and its deadline is strictly in the past
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_at.is_some_and(|due| due < now)
    }
}

/// Derived counts over the whole collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    /// Always `total - completed`
    pub pending: usize,
    /// Pending tasks past their deadline at the time of the call
    pub overdue: usize,
}

impl Stats {
    pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let overdue = tasks.iter().filter(|t| t.is_overdue(now)).count();
        Self {
            total,
            completed,
            pending: total - completed,
            overdue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_800_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_task_new_trims_text() {
        let task = Task::new("  Buy milk \n", None, at(0));
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.created_at, at(0));
        assert!(task.due_at.is_none());
    }

    #[test]
    fn test_task_ids_unique_and_ordered() {
        let ids: Vec<TaskId> = (0..1000).map(|_| TaskId::new()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_task_id_parse_display() {
        let id = TaskId::new();
        let parsed: TaskId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_is_overdue() {
        let now = at(0);
        let mut task = Task::new("Pay rent", Some(now - Duration::seconds(1)), at(-100));
        assert!(task.is_overdue(now));

        // Deadline equal to now is not yet overdue
        task.due_at = Some(now);
        assert!(!task.is_overdue(now));

        task.due_at = Some(now + Duration::hours(1));
        assert!(!task.is_overdue(now));

        task.due_at = None;
        assert!(!task.is_overdue(now));

        task.due_at = Some(now - Duration::days(3));
        task.completed = true;
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn test_stats_compute() {
        let now = at(0);
        let mut done = Task::new("done", None, now);
        done.completed = true;
        let late = Task::new("late", Some(now - Duration::minutes(5)), now);
        let open = Task::new("open", None, now);

        let stats = Stats::compute(&[done, late, open], now);
        assert_eq!(
            stats,
            Stats {
                total: 3,
                completed: 1,
                pending: 2,
                overdue: 1,
            }
        );
        assert_eq!(Stats::compute(&[], now), Stats::default());
    }

    #[test]
    fn test_task_serialization_field_names() {
        let task = Task::new("Test", None, at(0));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["text"], "Test");
        assert_eq!(json["completed"], false);
        assert!(json["due_at"].is_null());
        assert_eq!(json["id"], task.id.to_string());
        assert!(json["created_at"].is_string());
    }
}
