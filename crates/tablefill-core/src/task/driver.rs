//! # Insert Execution Driver
//!
//! Owns the task lifecycle. `start_insert` validates synchronously, records a
//! pending task and hands the run to a detached tokio task; from then on all
//! outcomes are reported through the task store and task events, never as a
//! returned error.
//!
//! A run goes:
//!
//! 1. resolve the database profile (explicit id, else the active one) and the
//!    target database (request override, else the profile's)
//! 2. mark the task running and open one executor for the whole run
//! 3. per batch: honor a pending cancellation, build the statement, execute
//!    it, record progress
//! 4. close the executor and record the terminal status
//!
//! Cancellation is cooperative and checked once per batch, so the batch in
//! flight when `cancel_task` is called still completes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::{DbProfile, ProfileSource, ValueListSource};
use crate::error::Result;
use crate::generate::enrich::enrich_generation_input;
use crate::generate::field::GenerationInput;
use crate::generate::registry::GeneratorRegistry;
use crate::output::direct::{BatchExecutor, ConnectionFactory};
use crate::output::sql::{
    build_batch_statements, generate_preview_statements, validate_counts,
    validate_generation_input, Preview,
};
use crate::task::hub::{BroadcastHub, ClientHandle, PushClient};
use crate::task::state::{TaskEvent, TaskProgress, TaskState, TaskStatus, TaskUpdate};
use crate::task::store::TaskStore;

/// Receiver for a run's events. When none is given the driver's hub is used.
pub type EventSink = Arc<dyn Fn(TaskEvent) + Send + Sync>;

/// Statements returned by a preview unless configured otherwise.
pub const DEFAULT_PREVIEW_STATEMENTS: usize = 1;

/// How the batch loop ended without an error.
enum RunEnd {
    Completed,
    Cancelled,
}

/// Task manager for insert runs. Clones share the same store, hub and
/// collaborators.
#[derive(Clone)]
pub struct InsertDriver {
    store: Arc<TaskStore>,
    hub: BroadcastHub,
    registry: Arc<GeneratorRegistry>,
    profiles: Arc<dyn ProfileSource>,
    lists: Arc<dyn ValueListSource>,
    connector: Arc<dyn ConnectionFactory>,
    preview_statements: usize,
}

impl InsertDriver {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        lists: Arc<dyn ValueListSource>,
        connector: Arc<dyn ConnectionFactory>,
    ) -> Self {
        Self {
            store: Arc::new(TaskStore::new()),
            hub: BroadcastHub::default(),
            registry: Arc::new(GeneratorRegistry::builtin().clone()),
            profiles,
            lists,
            connector,
            preview_statements: DEFAULT_PREVIEW_STATEMENTS,
        }
    }

    pub fn with_hub(mut self, hub: BroadcastHub) -> Self {
        self.hub = hub;
        self
    }

    pub fn with_registry(mut self, registry: GeneratorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_preview_statements(mut self, max: usize) -> Self {
        self.preview_statements = max.max(1);
        self
    }

    /// Enrich and validate `input`, then return the first statement(s) and the
    /// prepared-rows events. Touches no database.
    pub async fn preview_insert(&self, input: &GenerationInput) -> Result<Preview> {
        let enriched = enrich_generation_input(input, self.lists.as_ref()).await?;
        validate_generation_input(&enriched)?;
        generate_preview_statements(&self.registry, &enriched, self.preview_statements)
    }

    /// Validate `input`, create a task and start running it in the background.
    ///
    /// Errors are returned only for problems found before the task exists.
    pub async fn start_insert(
        &self,
        input: GenerationInput,
        sink: Option<EventSink>,
    ) -> Result<String> {
        let enriched = enrich_generation_input(&input, self.lists.as_ref()).await?;
        let (total_rows, _) = validate_generation_input(&enriched)?;

        let task = self.store.create_task(total_rows);
        let emit: EventSink = match sink {
            Some(sink) => sink,
            None => {
                let hub = self.hub.clone();
                Arc::new(move |event: TaskEvent| hub.emit_event(event))
            }
        };
        info!(task_id = %task.id, table = %enriched.table_name, rows = total_rows, "task created");
        emit(TaskEvent::status(&task.id, "Task created", Some(task.progress())));

        let driver = self.clone();
        let task_id = task.id.clone();
        tokio::spawn(async move {
            driver.run_insert_task(&task_id, enriched, emit).await;
        });

        Ok(task.id)
    }

    /// Run an already created task to a terminal state.
    pub async fn run_insert_task(&self, task_id: &str, input: GenerationInput, emit: EventSink) {
        let (total_rows, batch_size) = match validate_counts(&input) {
            Ok(counts) => counts,
            Err(e) => return self.fail_before_start(task_id, &e.to_string(), &emit),
        };

        let profile = match self.resolve_profile(input.db_profile_id).await {
            Ok(profile) => profile,
            Err(message) => return self.fail_before_start(task_id, &message, &emit),
        };
        let database = input
            .database
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&profile.database);
        if database.is_empty() {
            return self.fail_before_start(task_id, "No database selected", &emit);
        }

        self.store.update_task(
            task_id,
            TaskUpdate::counts(0, 0).with_status(TaskStatus::Running),
        );
        emit(TaskEvent::status(task_id, "Task started", self.progress(task_id)));

        let target = profile.target(Some(database));
        debug!(task_id, target = %target.display_url(), "connecting");
        let mut executor = match self.connector.connect(&target).await {
            Ok(executor) => executor,
            Err(e) => return self.finish(task_id, Err(e.to_string()), 0, &emit),
        };

        let (completed, outcome) = self
            .insert_batches(task_id, &input, (total_rows, batch_size), executor.as_mut(), &emit)
            .await;
        executor.close().await;

        self.finish(task_id, outcome.map_err(|e| e.to_string()), completed, &emit);
    }

    /// The batch loop. Returns the rows inserted so far alongside how it
    /// ended.
    async fn insert_batches(
        &self,
        task_id: &str,
        input: &GenerationInput,
        (total_rows, batch_size): (usize, usize),
        executor: &mut dyn BatchExecutor,
        emit: &EventSink,
    ) -> (usize, Result<RunEnd>) {
        let mut completed = 0usize;
        while completed < total_rows {
            if self
                .store
                .get_task(task_id)
                .is_some_and(|t| t.cancel_requested)
            {
                return (completed, Ok(RunEnd::Cancelled));
            }

            let current = batch_size.min(total_rows - completed);
            let batch = match build_batch_statements(&self.registry, input, completed, current) {
                Ok(batch) => batch,
                Err(e) => return (completed, Err(e)),
            };
            let sql = batch.statements.join("\n");
            emit(TaskEvent::log(
                task_id,
                format!(
                    "Inserting batch starting at row {} ({} rows)",
                    completed + 1,
                    current
                ),
            ));
            if let Err(e) = executor.execute(&input.table_name, completed, &sql).await {
                return (completed, Err(e));
            }

            completed += batch.row_count;
            self.store
                .update_task(task_id, TaskUpdate::counts(completed, 0));
            debug!(task_id, rows = completed, "batch inserted");
            emit(TaskEvent::progress(
                task_id,
                format!("Inserted {}/{}", completed, total_rows),
                self.progress(task_id),
            ));
        }
        (completed, Ok(RunEnd::Completed))
    }

    /// Record the terminal state of a running task.
    fn finish(
        &self,
        task_id: &str,
        outcome: std::result::Result<RunEnd, String>,
        completed: usize,
        emit: &EventSink,
    ) {
        match outcome {
            Ok(RunEnd::Completed) => {
                self.store.update_task(
                    task_id,
                    TaskUpdate::counts(completed, 0).with_status(TaskStatus::Completed),
                );
                info!(task_id, rows = completed, "task completed");
                emit(TaskEvent::status(task_id, "Task completed", self.progress(task_id)));
            }
            Ok(RunEnd::Cancelled) => {
                self.store
                    .update_task(task_id, TaskUpdate::status(TaskStatus::Cancelled));
                info!(task_id, rows = completed, "task cancelled");
                emit(TaskEvent::status(task_id, "Task cancelled", self.progress(task_id)));
            }
            Err(message) => {
                self.store
                    .update_task(task_id, TaskUpdate::failed(1, message.clone()));
                warn!(task_id, rows = completed, error = %message, "task failed");
                emit(TaskEvent::status(
                    task_id,
                    format!("Task failed: {}", message),
                    self.progress(task_id),
                ));
            }
        }
    }

    /// Fail a task whose run never reached the database.
    fn fail_before_start(&self, task_id: &str, message: &str, emit: &EventSink) {
        self.store.update_task(
            task_id,
            TaskUpdate {
                status: Some(TaskStatus::Failed),
                error: Some(message.to_string()),
                ..TaskUpdate::default()
            },
        );
        warn!(task_id, error = message, "task failed before start");
        emit(TaskEvent::status(task_id, message, self.progress(task_id)));
    }

    async fn resolve_profile(&self, id: Option<i64>) -> std::result::Result<DbProfile, String> {
        match id {
            Some(id) => self
                .profiles
                .profile_by_id(id)
                .await
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("Database profile {} not found", id)),
            None => self
                .profiles
                .active_profile()
                .await
                .map_err(|e| e.to_string())?
                .ok_or_else(|| "No active database profile".to_string()),
        }
    }

    fn progress(&self, task_id: &str) -> Option<TaskProgress> {
        self.store.get_task(task_id).map(|t| t.progress())
    }

    /// Request cancellation. The hub is told immediately; the task's status
    /// becomes `cancelled` when its run next checks, between batches.
    pub fn cancel_task(&self, id: &str) -> bool {
        let Some(task) = self.store.cancel_task(id) else {
            return false;
        };
        let progress = TaskProgress {
            status: TaskStatus::Cancelled,
            ..task.progress()
        };
        self.hub
            .emit_event(TaskEvent::status(id, "Task cancelled", Some(progress)));
        true
    }

    pub fn get_task(&self, id: &str) -> Option<TaskState> {
        self.store.get_task(id)
    }

    /// Register a push client on the driver's hub.
    pub fn subscribe(&self, client: Box<dyn PushClient>) -> ClientHandle {
        self.hub.register_client(client)
    }
}
