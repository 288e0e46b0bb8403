//! Commit workflow: scan the pending diff and stage newly discovered
//! tasks.
//!
//! Candidates already present in the store (same file, line and text) are
//! skipped, so re-running against the same staged diff cannot duplicate
//! entries. Each genuinely new candidate gets an identity from the
//! plugin's getid operation before it is persisted; a getid failure
//! aborts the whole invocation without saving, since an un-identified
//! task cannot be safely stored.

use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::error::{Result, SnagError};
use crate::plugin::PluginOp;
use crate::scanner::Scanner;
use crate::store::{StoreLock, Task, TaskStore};

/// What one commit invocation staged
#[derive(Debug, Default)]
pub struct CommitSummary {
    /// Tasks staged this run, in discovery order
    pub staged: Vec<Task>,
    /// Candidates skipped because the store already tracks them
    pub already_tracked: usize,
    /// File-scoped scan failures; the rest of the diff was processed
    pub parse_failures: Vec<SnagError>,
}

/// Scan the pending diff and stage every new annotation as a task
pub fn commit(ctx: &AppContext, staged: bool) -> Result<CommitSummary> {
    let config = ctx.load_config()?;
    let scanner = Scanner::new(&config.marker)?;

    let diff = ctx.vc().get_diff(staged)?;
    let report = scanner.scan(&diff);

    for failure in &report.failures {
        warn!("{failure}");
    }

    if report.candidates.is_empty() {
        debug!("no annotation candidates in diff");
        return Ok(CommitSummary {
            parse_failures: report.failures,
            ..CommitSummary::default()
        });
    }

    let _lock = StoreLock::acquire(&ctx.snag_dir())?;
    let mut store = TaskStore::load(&ctx.store_path())?;
    let runner = ctx.plugin_runner(&config)?;

    let mut summary = CommitSummary {
        parse_failures: report.failures,
        ..CommitSummary::default()
    };

    for candidate in report.candidates {
        if store.contains_annotation(&candidate.file, candidate.line, &candidate.text) {
            summary.already_tracked += 1;
            continue;
        }

        let mut task = Task::new(
            candidate.text,
            candidate.file,
            candidate.line,
            config.author.as_str(),
        );
        let id = runner.run(PluginOp::GetId { task: &task })?;
        if id.is_empty() {
            return Err(SnagError::plugin("getid", "returned an empty id"));
        }
        task.id = id;

        debug!("staged {} as {}", task, task.id);
        store.add_new(task.clone());
        summary.staged.push(task);
    }

    store.save(&ctx.store_path())?;
    info!(
        "staged {} new task(s), {} already tracked",
        summary.staged.len(),
        summary.already_tracked
    );

    Ok(summary)
}
