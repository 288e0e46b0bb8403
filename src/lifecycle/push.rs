//! Push workflow: deliver staged tasks and pending completions to the
//! plugin.
//!
//! Failure policy is per-task and non-fatal: a task whose create or done
//! operation fails stays in its collection for retry on the next push,
//! and the remaining tasks are still processed. The store is rewritten
//! once at the end with exactly the failures retained, which gives each
//! task at-least-once delivery (the plugin's create must be idempotent by
//! id, since a crash between a successful create and the store rewrite
//! replays it).

use tracing::{info, warn};

use crate::context::AppContext;
use crate::error::{Result, SnagError};
use crate::plugin::PluginOp;
use crate::store::{StoreLock, TaskStore};

/// One task-scoped delivery failure
#[derive(Debug)]
pub struct PushFailure {
    /// Id of the affected task
    pub id: String,
    /// Human-readable task description for create failures
    pub task: Option<String>,
    /// The underlying plugin error
    pub error: SnagError,
}

/// What one push invocation delivered
#[derive(Debug, Default)]
pub struct PushSummary {
    /// Ids created in the external system this run
    pub created: Vec<String>,
    /// Ids confirmed done this run
    pub completed: Vec<String>,
    /// Per-task failures; the tasks remain staged for the next push
    pub failures: Vec<PushFailure>,
    /// True when both collections were empty and nothing was attempted
    pub nothing_to_do: bool,
}

/// Deliver every staged task and pending-done id to the plugin
pub fn push(ctx: &AppContext) -> Result<PushSummary> {
    let _lock = StoreLock::acquire(&ctx.snag_dir())?;
    let mut store = TaskStore::load(&ctx.store_path())?;

    if store.is_empty() {
        info!("no new or done tasks to push");
        return Ok(PushSummary {
            nothing_to_do: true,
            ..PushSummary::default()
        });
    }

    let config = ctx.load_config()?;
    let runner = ctx.plugin_runner(&config)?;
    let mut summary = PushSummary::default();

    // Creations first, in stable key order
    let staged_ids: Vec<String> = store.new_tasks.keys().cloned().collect();
    for id in staged_ids {
        let task = &store.new_tasks[&id];
        match runner.run(PluginOp::Create { task }) {
            Ok(_) => {
                store.remove_new(&id);
                summary.created.push(id);
            }
            Err(error) => {
                warn!("failed to add task '{task}': {error}");
                summary.failures.push(PushFailure {
                    id: id.clone(),
                    task: Some(task.to_string()),
                    error,
                });
            }
        }
    }

    // Then completions; failures stay queued
    let mut retained = Vec::new();
    for id in std::mem::take(&mut store.done_tasks) {
        match runner.run(PluginOp::Done { id: &id }) {
            Ok(_) => summary.completed.push(id),
            Err(error) => {
                warn!("failed to mark {id} as done: {error}");
                retained.push(id.clone());
                summary.failures.push(PushFailure {
                    id,
                    task: None,
                    error,
                });
            }
        }
    }
    store.done_tasks = retained;

    store.save(&ctx.store_path())?;
    info!(
        "pushed {} created, {} done, {} failed",
        summary.created.len(),
        summary.completed.len(),
        summary.failures.len()
    );

    Ok(summary)
}
