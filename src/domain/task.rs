use super::money::MoneyValue;
use super::{AccountId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Executioner id of a task nobody has acquired yet.
pub const UNASSIGNED: AccountId = 0;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Posted and open for acquisition.
    Free,
    /// Acquired by an executioner; their funds cover the cost.
    Executing,
    /// Reserved. No transitions lead in or out.
    Paused,
    /// The executioner delivered a solution; awaiting the customer.
    Completed,
    /// The customer accepted and the cost was settled. Terminal.
    Accepted,
    /// Withdrawn by the customer before acquisition. Terminal.
    Closed,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Executing => "executing",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Accepted => "accepted",
            Self::Closed => "closed",
        }
    }

    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Closed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command issued by a caller against a task.
///
/// The set is closed; anything else is rejected at the parse boundary before
/// it reaches the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    Acquire,
    Finish { solution: String },
    Accept,
    Close,
}

impl TaskCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Acquire => "acquire",
            Self::Finish { .. } => "finish",
            Self::Accept => "accept",
            Self::Close => "close",
        }
    }
}

/// A posted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub customer: AccountId,
    /// [`UNASSIGNED`] until somebody acquires the task.
    pub executioner: AccountId,
    pub title: String,
    pub state: TaskState,
    /// Immutable once the task leaves `Free`, except under admin permission.
    pub cost: MoneyValue,
    pub problem: String,
    pub solution: String,
    pub begin_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a freshly posted task. The id is assigned by the store.
    pub fn new(customer: AccountId, title: String, cost: MoneyValue, problem: String) -> Self {
        Self {
            id: 0,
            customer,
            executioner: UNASSIGNED,
            title,
            state: TaskState::Free,
            cost,
            problem,
            solution: String::new(),
            begin_time: None,
            end_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_task_starts_free() {
        let task = Task::new(
            2,
            "Make online shop".to_string(),
            MoneyValue::from_decimal(dec!(100.12)).unwrap(),
            "storefront with checkout".to_string(),
        );
        assert_eq!(task.state, TaskState::Free);
        assert_eq!(task.executioner, UNASSIGNED);
        assert!(task.begin_time.is_none());
        assert!(task.end_time.is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Accepted.is_terminal());
        assert!(TaskState::Closed.is_terminal());
        assert!(!TaskState::Free.is_terminal());
        assert!(!TaskState::Executing.is_terminal());
        assert!(!TaskState::Paused.is_terminal());
        assert!(!TaskState::Completed.is_terminal());
    }

    #[test]
    fn test_state_display_matches_wire_names() {
        assert_eq!(TaskState::Free.to_string(), "free");
        assert_eq!(TaskState::Executing.to_string(), "executing");
        assert_eq!(TaskCommand::Acquire.name(), "acquire");
        assert_eq!(
            TaskCommand::Finish {
                solution: String::new()
            }
            .name(),
            "finish"
        );
    }
}
