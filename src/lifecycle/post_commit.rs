//! PostCommit workflow: attach the just-created commit hash.
//!
//! Runs from the post-commit hook, in a separate process from the commit
//! scan. Any staged task whose hash is still empty was introduced by the
//! commit that just completed, so it receives that commit's hash; tasks
//! that already carry a hash are left untouched.

use tracing::{debug, info};

use crate::context::AppContext;
use crate::error::Result;
use crate::store::{StoreLock, TaskStore};

/// What one post-commit invocation updated
#[derive(Debug, Default)]
pub struct PostCommitSummary {
    /// Number of tasks that received the hash
    pub updated: usize,
    /// The hash attached, empty when nothing needed updating
    pub hash: String,
}

/// Fill in the latest commit hash on tasks that lack one
pub fn post_commit(ctx: &AppContext) -> Result<PostCommitSummary> {
    let _lock = StoreLock::acquire(&ctx.snag_dir())?;
    let mut store = TaskStore::load(&ctx.store_path())?;

    if !store.new_tasks.values().any(|task| task.hash.is_empty()) {
        debug!("no tasks awaiting a commit hash");
        return Ok(PostCommitSummary::default());
    }

    let hash = ctx.vc().latest_commit_hash()?;
    let mut updated = 0;

    for task in store.new_tasks.values_mut() {
        if task.hash.is_empty() {
            task.hash = hash.clone();
            updated += 1;
        }
    }

    store.save(&ctx.store_path())?;
    info!("attached {hash} to {updated} task(s)");

    Ok(PostCommitSummary { updated, hash })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Task;
    use crate::testing::MockVersionControl;
    use tempfile::TempDir;

    fn staged_task(id: &str, hash: &str) -> Task {
        let mut task = Task::new("text", "file.rs", 1, "dev@example.com");
        task.id = id.to_string();
        task.hash = hash.to_string();
        task
    }

    fn context(hash: Option<&str>) -> (TempDir, AppContext) {
        let temp = TempDir::new().unwrap();
        let mut vc = MockVersionControl::new(temp.path().to_path_buf());
        if let Some(hash) = hash {
            vc = vc.with_hash(hash);
        }
        let ctx = AppContext::new(Box::new(vc), temp.path().join("home"));
        (temp, ctx)
    }

    #[test]
    fn test_fills_only_empty_hashes() {
        let (_temp, ctx) = context(Some("abc123"));

        let mut store = TaskStore::default();
        store.add_new(staged_task("T-1", ""));
        store.add_new(staged_task("T-2", "earlier"));
        store.save(&ctx.store_path()).unwrap();

        let summary = post_commit(&ctx).unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.hash, "abc123");

        let store = TaskStore::load(&ctx.store_path()).unwrap();
        assert_eq!(store.new_tasks["T-1"].hash, "abc123");
        assert_eq!(store.new_tasks["T-2"].hash, "earlier");
    }

    #[test]
    fn test_noop_when_all_hashes_set() {
        // The mock has no hash configured: proving the adapter is never
        // asked when nothing needs updating
        let (_temp, ctx) = context(None);

        let mut store = TaskStore::default();
        store.add_new(staged_task("T-1", "earlier"));
        store.save(&ctx.store_path()).unwrap();

        let summary = post_commit(&ctx).unwrap();
        assert_eq!(summary.updated, 0);
        assert!(summary.hash.is_empty());
    }

    #[test]
    fn test_noop_on_empty_store() {
        let (_temp, ctx) = context(None);

        let summary = post_commit(&ctx).unwrap();
        assert_eq!(summary.updated, 0);
    }
}
