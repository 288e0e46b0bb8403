//! Task model and the persisted task store.
//!
//! The store is the single source of truth between hook-triggered
//! invocations: each command fully reads it at start and fully rewrites it
//! at the end. One store exists per repository, at
//! `<vcdir>/snag/tasks.json`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnagError};

/// A single tracked annotation.
///
/// `id` is empty until the plugin's getid operation has assigned one;
/// `hash` is empty until the post-commit step fills in the enclosing
/// commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub file: String,
    pub line: u32,
    pub author: String,
    pub hash: String,
}

impl Task {
    /// Create a freshly discovered task: no id, no commit hash yet
    pub fn new(
        text: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            file: file.into(),
            line,
            author: author.into(),
            hash: String::new(),
        }
    }

    /// Whether this task was discovered from the same annotation
    pub fn matches(&self, file: &str, line: u32, text: &str) -> bool {
        self.file == file && self.line == line && self.text == text
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.text)
    }
}

/// What locally marking a task done amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneOutcome {
    /// The id was still staged in NewTasks: never delivered, dropped
    /// without involving the plugin
    DroppedLocal,
    /// Queued for the plugin's done operation at next push
    Queued,
    /// Already queued, nothing to do
    AlreadyQueued,
}

/// The full persisted state for one repository.
///
/// An id appears in at most one of `new_tasks` or `done_tasks`:
/// completion presupposes prior successful creation, which removes the
/// task from `new_tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStore {
    /// Tasks discovered but not yet created in the external system,
    /// keyed by pre-assigned id
    #[serde(rename = "NewTasks", default)]
    pub new_tasks: BTreeMap<String, Task>,

    /// External ids marked complete locally but not yet confirmed done
    #[serde(rename = "DoneTasks", default)]
    pub done_tasks: Vec<String>,
}

impl TaskStore {
    /// True when there is nothing to push
    pub fn is_empty(&self) -> bool {
        self.new_tasks.is_empty() && self.done_tasks.is_empty()
    }

    /// Stage a task under its pre-assigned id
    pub fn add_new(&mut self, task: Task) {
        self.new_tasks.insert(task.id.clone(), task);
    }

    /// Drop a task that has been created externally
    pub fn remove_new(&mut self, id: &str) -> Option<Task> {
        self.new_tasks.remove(id)
    }

    /// Whether an annotation with this location and text is already staged
    pub fn contains_annotation(&self, file: &str, line: u32, text: &str) -> bool {
        self.new_tasks
            .values()
            .any(|task| task.matches(file, line, text))
    }

    /// Mark an id as done locally, preserving the one-collection invariant
    pub fn mark_done(&mut self, id: &str) -> DoneOutcome {
        if self.new_tasks.remove(id).is_some() {
            return DoneOutcome::DroppedLocal;
        }
        if self.done_tasks.iter().any(|done| done == id) {
            return DoneOutcome::AlreadyQueued;
        }
        self.done_tasks.push(id.to_string());
        DoneOutcome::Queued
    }

    /// Load the store from `path`, or start empty if no store exists yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|err| {
            SnagError::store_with_path(
                format!("could not read task store: {err}"),
                path.to_path_buf(),
            )
        })?;

        serde_json::from_str(&raw).map_err(|err| {
            SnagError::store_with_path(
                format!("could not parse task store: {err}"),
                path.to_path_buf(),
            )
        })
    }

    /// Rewrite the store at `path` in full.
    ///
    /// The content is written to a sibling temp file first and renamed
    /// into place, so a crash mid-write leaves the previous store intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|err| {
                    SnagError::store_with_path(
                        format!("could not create store directory: {err}"),
                        parent.to_path_buf(),
                    )
                })?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|err| {
            SnagError::store_with_path(format!("could not write task store: {err}"), tmp.clone())
        })?;
        fs::rename(&tmp, path).map_err(|err| {
            SnagError::store_with_path(
                format!("could not replace task store: {err}"),
                path.to_path_buf(),
            )
        })
    }
}

impl fmt::Display for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No staged or pending-done tasks");
        }
        let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        write!(f, "{json}")
    }
}

/// Advisory exclusive lock held for the duration of a store-writing
/// workflow.
///
/// Hooks are serialized by the version-control tool itself; the lock
/// covers direct invocations racing a hook.
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Block until the repository's store lock is held
    pub fn acquire(snag_dir: &Path) -> Result<Self> {
        if !snag_dir.exists() {
            fs::create_dir_all(snag_dir).map_err(|err| {
                SnagError::store_with_path(
                    format!("could not create snag directory: {err}"),
                    snag_dir.to_path_buf(),
                )
            })?;
        }

        let path = snag_dir.join("tasks.lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                SnagError::store_with_path(format!("could not open lock file: {err}"), path.clone())
            })?;

        file.lock_exclusive().map_err(|err| {
            SnagError::store_with_path(format!("could not lock task store: {err}"), path.clone())
        })?;

        Ok(Self { file, path })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(err) = fs2::FileExt::unlock(&self.file) {
            tracing::debug!("failed to unlock {}: {err}", self.path.display());
        }
    }
}
