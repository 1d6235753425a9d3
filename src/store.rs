// Task store: authoritative collection, mutation rules, persistence

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TaskError};
use crate::filter::TaskFilter;
use crate::kv::KvStore;
use crate::models::{Stats, Task, TaskId};
use crate::snapshot;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Key holding the serialized collection
pub const TASKS_KEY: &str = "tasks";

/// Owns the task collection and keeps it in step with a [`KvStore`]
///
/// Every mutation persists the whole collection before returning. Mutations
/// are staged on a copy that replaces the live collection only after the
/// write succeeds, so a failed write leaves state exactly as it was.
pub struct TaskStore<K: KvStore, C: Clock = SystemClock> {
    kv: K,
    clock: C,
    tasks: Vec<Task>,
}

impl<K: KvStore> TaskStore<K> {
    /// Restore from `kv` using the wall clock
    pub fn open(kv: K) -> Self {
        Self::load(kv, SystemClock)
    }
}

impl<K: KvStore, C: Clock> TaskStore<K, C> {
    /// Restore the collection from `kv`
    ///
    /// Never fails: a missing, unreadable, or undecodable value starts the
    /// store empty.
    pub fn load(kv: K, clock: C) -> Self {
        let tasks = match kv.get(TASKS_KEY) {
            Ok(Some(data)) => match snapshot::decode(&data) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(backend = kv.name(), error = %format!("{:#}", e), "Stored tasks unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!(backend = kv.name(), "No stored tasks, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(backend = kv.name(), error = %format!("{:#}", e), "Failed to read stored tasks, starting empty");
                Vec::new()
            }
        };

        info!(backend = kv.name(), count = tasks.len(), "Loaded tasks");

        Self { kv, clock, tasks }
    }

    /// Flush the current collection to the backend
    pub fn save(&mut self) -> Result<()> {
        Self::persist(&mut self.kv, &self.tasks)
    }

    /// Give the backend back, e.g. to reopen over the same storage
    pub fn into_inner(self) -> K {
        self.kv
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new task
    pub fn add(&mut self, text: &str, due_at: Option<DateTime<Utc>>) -> Result<Task> {
        Self::validate_text(text)?;

        let task = Task::new(text, due_at, self.clock.now());
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;

        debug!(id = %task.id, "add: created task");
        Ok(task)
    }

    /// Replace a task's text and deadline; `None` clears the deadline
    pub fn edit(&mut self, id: TaskId, text: &str, due_at: Option<DateTime<Utc>>) -> Result<Task> {
        let index = self.position(id)?;
        Self::validate_text(text)?;

        let mut next = self.tasks.clone();
        let task = &mut next[index];
        task.text = text.trim().to_string();
        task.due_at = due_at;
        let updated = task.clone();
        self.commit(next)?;

        debug!(%id, "edit: updated task");
        Ok(updated)
    }

    /// Flip a task's completion flag
    pub fn toggle_completed(&mut self, id: TaskId) -> Result<Task> {
        let index = self.position(id)?;

        let mut next = self.tasks.clone();
        next[index].completed = !next[index].completed;
        let updated = next[index].clone();
        self.commit(next)?;

        debug!(%id, completed = updated.completed, "toggle_completed: flipped task");
        Ok(updated)
    }

    /// Remove a task, returning it
    ///
    /// Unknown ids are an error rather than a no-op.
    pub fn delete(&mut self, id: TaskId) -> Result<Task> {
        let index = self.position(id)?;

        let mut next = self.tasks.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        debug!(%id, "delete: removed task");
        Ok(removed)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Tasks in `filter`'s view, in stored order
    pub fn list(&self, filter: TaskFilter) -> Vec<Task> {
        let now = self.clock.now();
        self.tasks.iter().filter(|t| filter.matches(t, now)).cloned().collect()
    }

    pub fn stats(&self) -> Stats {
        Stats::compute(&self.tasks, self.clock.now())
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks.iter().find(|t| t.id == id).cloned()
    }

    /// The whole collection, in stored order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_overdue(&self, task: &Task) -> bool {
        task.is_overdue(self.clock.now())
    }

    /// Resolve a user-typed reference to a task id
    ///
    /// A decimal number is a 1-based position in stored order. Anything else,
    /// including a number past the end of the list, is a full id or a unique,
    /// case-insensitive prefix of one (with or without hyphens).
    pub fn resolve(&self, reference: &str) -> Result<TaskId> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(TaskError::not_found(reference));
        }

        if reference.chars().all(|c| c.is_ascii_digit()) {
            let by_position = reference
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.tasks.get(i));
            if let Some(task) = by_position {
                return Ok(task.id);
            }
        }

        if let Ok(id) = reference.parse::<TaskId>() {
            return self.position(id).map(|_| id);
        }

        let needle = reference.to_ascii_lowercase();
        let matches: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| {
                let uuid = t.id.as_uuid();
                uuid.hyphenated().to_string().starts_with(&needle) || uuid.simple().to_string().starts_with(&needle)
            })
            .map(|t| t.id)
            .collect();

        match matches.len() {
            0 => Err(TaskError::not_found(reference)),
            1 => Ok(matches[0]),
            _ => Err(TaskError::AmbiguousReference {
                reference: reference.to_string(),
                matches,
            }),
        }
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn position(&self, id: TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::not_found(id))
    }

    fn validate_text(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(TaskError::Validation);
        }
        Ok(())
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        Self::persist(&mut self.kv, &next)?;
        self.tasks = next;
        Ok(())
    }

    fn persist(kv: &mut K, tasks: &[Task]) -> Result<()> {
        let data = snapshot::encode(tasks).map_err(TaskError::Persistence)?;
        kv.set(TASKS_KEY, &data).map_err(|e| {
            warn!(backend = kv.name(), error = %format!("{:#}", e), "Failed to persist tasks");
            TaskError::Persistence(e)
        })
    }
}
