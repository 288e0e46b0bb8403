//! Local done-marking.
//!
//! Completion is delivered to the plugin at the next push; this only
//! records the intent. An id still sitting in the staged collection was
//! never delivered at all, so it is dropped outright instead of being
//! queued, keeping every id in at most one collection.

use tracing::info;

use crate::context::AppContext;
use crate::error::Result;
use crate::store::{DoneOutcome, StoreLock, TaskStore};

/// Mark a task id as done locally and persist the store
pub fn mark_done(ctx: &AppContext, id: &str) -> Result<DoneOutcome> {
    let _lock = StoreLock::acquire(&ctx.snag_dir())?;
    let mut store = TaskStore::load(&ctx.store_path())?;

    let outcome = store.mark_done(id);
    store.save(&ctx.store_path())?;

    match outcome {
        DoneOutcome::DroppedLocal => info!("{id} was never pushed, dropped locally"),
        DoneOutcome::Queued => info!("{id} queued for completion at next push"),
        DoneOutcome::AlreadyQueued => info!("{id} already queued"),
    }

    Ok(outcome)
}
