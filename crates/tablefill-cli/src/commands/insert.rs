use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use tablefill_core::task::hub::ChannelClient;
use tablefill_core::task::state::{BatchMessage, TaskEventType, TaskState, TaskStatus};
use tablefill_core::InsertDriver;

use crate::args::{Cli, JobArgs};
use crate::commands::Workspace;

pub async fn run(cli: &Cli, args: &JobArgs) -> Result<()> {
    let workspace = Workspace::load(cli)?;
    let input = workspace.build_input(args).await?;
    let driver = workspace.driver();

    let (client, mut rx) = ChannelClient::new();
    let subscription = driver.subscribe(Box::new(client));
    let task_id = driver.start_insert(input, None).await?;
    let total = driver.get_task(&task_id).map(|t| t.total).unwrap_or(0);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} Inserting... {bar:40.cyan/dim} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut cancel_sent = false;
    let finished = loop {
        tokio::select! {
            payload = rx.recv() => {
                let Some(payload) = payload else {
                    bail!("Progress channel closed before task {} finished", task_id);
                };
                let batch: BatchMessage = serde_json::from_str(&payload)
                    .context("Malformed progress payload")?;
                for event in batch.events.iter().filter(|e| e.task_id == task_id) {
                    match event.event_type {
                        TaskEventType::Progress => {
                            if let Some(progress) = &event.progress {
                                pb.set_position(progress.completed as u64);
                            }
                        }
                        TaskEventType::Log | TaskEventType::Status => {
                            if let Some(message) = &event.message {
                                tracing::debug!(task_id = %task_id, "{}", message);
                            }
                        }
                    }
                }
                // The store, not the event stream, decides when the run is over:
                // cancel_task announces "cancelled" before the run stops.
                if let Some(task) = terminal_state(&driver, &task_id) {
                    break task;
                }
            }
            _ = tokio::signal::ctrl_c(), if !cancel_sent => {
                cancel_sent = true;
                driver.cancel_task(&task_id);
                pb.set_message("cancelling after current batch");
            }
        }
    };
    subscription.unregister();

    pb.set_position(finished.completed as u64);
    match finished.status {
        TaskStatus::Completed => {
            pb.finish_with_message("✓");
            eprintln!("\n✓ Inserted {} rows (task {})", finished.completed, task_id);
            Ok(())
        }
        TaskStatus::Cancelled => {
            pb.abandon_with_message("cancelled");
            eprintln!(
                "\nCancelled after {}/{} rows (task {})",
                finished.completed, finished.total, task_id
            );
            Ok(())
        }
        _ => {
            pb.abandon_with_message("failed");
            bail!(
                "Insert failed after {}/{} rows: {}",
                finished.completed,
                finished.total,
                finished.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

fn terminal_state(driver: &InsertDriver, task_id: &str) -> Option<TaskState> {
    driver
        .get_task(task_id)
        .filter(|t| t.status.is_terminal())
}
