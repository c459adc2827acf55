use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an insert task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Authoritative record of one insert run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    pub id: String,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub cancel_requested: bool,
}

impl TaskState {
    pub fn progress(&self) -> TaskProgress {
        TaskProgress {
            status: self.status,
            completed: self.completed,
            failed: self.failed,
            total: self.total,
            error: self.error.clone(),
        }
    }
}

/// Snapshot of a task carried inside events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub status: TaskStatus,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskEventType {
    Log,
    Progress,
    Status,
}

/// A notification about one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    pub task_id: String,
    #[serde(rename = "type")]
    pub event_type: TaskEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<TaskProgress>,
}

impl TaskEvent {
    pub fn log(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            event_type: TaskEventType::Log,
            message: Some(message.into()),
            progress: None,
        }
    }

    pub fn status(
        task_id: impl Into<String>,
        message: impl Into<String>,
        progress: Option<TaskProgress>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            event_type: TaskEventType::Status,
            message: Some(message.into()),
            progress,
        }
    }

    pub fn progress(
        task_id: impl Into<String>,
        message: impl Into<String>,
        progress: Option<TaskProgress>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            event_type: TaskEventType::Progress,
            message: Some(message.into()),
            progress,
        }
    }

    /// The event ends its task's stream.
    pub fn is_terminal(&self) -> bool {
        self.event_type == TaskEventType::Status
            && self.progress.as_ref().is_some_and(|p| p.status.is_terminal())
    }
}

/// Partial update merged into a [`TaskState`]. `None` fields are left as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub completed: Option<usize>,
    pub failed: Option<usize>,
    pub error: Option<String>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn failed(failed: usize, error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            failed: Some(failed),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn counts(completed: usize, failed: usize) -> Self {
        Self {
            completed: Some(completed),
            failed: Some(failed),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn apply(self, task: &mut TaskState) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(failed) = self.failed {
            task.failed = failed;
        }
        if let Some(error) = self.error {
            task.error = Some(error);
        }
    }
}

/// Push payload: every event buffered during one flush window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMessage {
    pub batch: bool,
    pub events: Vec<TaskEvent>,
}

impl BatchMessage {
    pub fn new(events: Vec<TaskEvent>) -> Self {
        Self {
            batch: true,
            events,
        }
    }
}
