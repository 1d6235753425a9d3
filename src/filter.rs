// Named views over the task collection

use crate::models::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Filter selecting which tasks a view shows
///
/// Every non-completed task falls in exactly one of `Active` or `Overdue`;
/// every completed task falls in `Completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
    Overdue,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 4] = [
        TaskFilter::All,
        TaskFilter::Active,
        TaskFilter::Completed,
        TaskFilter::Overdue,
    ];

    /// Whether `task` belongs in this view at instant `now`
    pub fn matches(self, task: &Task, now: DateTime<Utc>) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed && !task.is_overdue(now),
            TaskFilter::Completed => task.completed,
            TaskFilter::Overdue => task.is_overdue(now),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Active => "active",
            TaskFilter::Completed => "completed",
            TaskFilter::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "active" => Ok(TaskFilter::Active),
            "completed" | "done" => Ok(TaskFilter::Completed),
            "overdue" => Ok(TaskFilter::Overdue),
            other => Err(format!(
                "Unknown filter: {} (expected all, active, completed or overdue)",
                other
            )),
        }
    }
}
