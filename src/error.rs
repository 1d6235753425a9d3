// Error types for task store operations

use crate::models::TaskId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    /// Task text was empty or whitespace-only
    #[error("Task text cannot be empty")]
    Validation,

    #[error("Task not found: {0}")]
    NotFound(String),

    /// A reference prefix matched more than one task
    #[error("Reference '{reference}' is ambiguous ({} matches)", .matches.len())]
    AmbiguousReference { reference: String, matches: Vec<TaskId> },

    #[error("Invalid due date '{0}' (expected YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)")]
    InvalidDue(String),

    /// The backend failed to write; in-memory state was left untouched
    #[error("Persistence failed: {0:#}")]
    Persistence(eyre::Report),
}

pub type Result<T> = std::result::Result<T, TaskError>;

impl TaskError {
    pub(crate) fn not_found(id: impl ToString) -> Self {
        TaskError::NotFound(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::eyre;

    #[test]
    fn test_error_messages() {
        assert_eq!(TaskError::Validation.to_string(), "Task text cannot be empty");
        assert_eq!(TaskError::not_found("abc").to_string(), "Task not found: abc");
        assert!(TaskError::InvalidDue("soon".to_string()).to_string().contains("'soon'"));
    }

    #[test]
    fn test_persistence_error_shows_chain() {
        let report = eyre!("disk full").wrap_err("Failed to write tasks");
        let message = TaskError::Persistence(report).to_string();
        assert!(message.contains("Failed to write tasks"));
        assert!(message.contains("disk full"));
    }

    #[test]
    fn test_ambiguous_reference_counts_matches() {
        let err = TaskError::AmbiguousReference {
            reference: "01".to_string(),
            matches: vec![TaskId::new(), TaskId::new()],
        };
        assert_eq!(err.to_string(), "Reference '01' is ambiguous (2 matches)");
    }
}
