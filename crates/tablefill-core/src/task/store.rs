//! # Task Store
//!
//! Process-wide registry of insert tasks keyed by id. Every accessor returns
//! a snapshot; the stored record changes only through [`TaskStore`] methods.
//! Tasks are never evicted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::task::state::{TaskState, TaskStatus, TaskUpdate};

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Mutex<HashMap<String, TaskState>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending task for `total` rows.
    pub fn create_task(&self, total: usize) -> TaskState {
        let task = TaskState {
            id: Uuid::new_v4().to_string(),
            total,
            completed: 0,
            failed: 0,
            status: TaskStatus::Pending,
            error: None,
            cancel_requested: false,
        };
        self.lock().insert(task.id.clone(), task.clone());
        task
    }

    pub fn get_task(&self, id: &str) -> Option<TaskState> {
        self.lock().get(id).cloned()
    }

    /// Merge `update` into the task. Unknown ids yield `None`.
    pub fn update_task(&self, id: &str, update: TaskUpdate) -> Option<TaskState> {
        let mut tasks = self.lock();
        let task = tasks.get_mut(id)?;
        update.apply(task);
        Some(task.clone())
    }

    /// Flag the task for cancellation. `status` is left for the runner to
    /// change at its next check.
    pub fn cancel_task(&self, id: &str) -> Option<TaskState> {
        let mut tasks = self.lock();
        let task = tasks.get_mut(id)?;
        task.cancel_requested = true;
        Some(task.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TaskState>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
