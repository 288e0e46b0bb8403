//! snag - track inline task annotations through version control.
//!
//! snag watches the diffs flowing through a repository's commit and push
//! hooks, turns newly added annotation comments (TODO and friends) into
//! tasks, and hands them to a user-supplied plugin that talks to the
//! actual task manager.
//!
//! # Architecture
//!
//! - [`config`] - per-repository configuration
//! - [`context`] - per-invocation context: backend and derived paths
//! - [`error`] - custom error types and exit codes
//! - [`lifecycle`] - the commit, post-commit and push workflows
//! - [`plugin`] - subprocess protocol to the task-manager plugin
//! - [`scanner`] - unified-diff annotation scanner
//! - [`store`] - task model and persisted store
//! - [`vcs`] - version-control backends (Git, Mercurial)
//! - [`testing`] - controllable test doubles

pub mod config;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod plugin;
pub mod scanner;
pub mod store;
pub mod testing;
pub mod vcs;

// Re-export commonly used types
pub use error::{Result, SnagError};

pub use config::Config;
pub use context::AppContext;
pub use lifecycle::{
    commit, init, mark_done, post_commit, push, CommitSummary, InitOptions, InitSummary,
    PostCommitSummary, PushFailure, PushSummary,
};
pub use plugin::{PluginOp, PluginRunner};
pub use scanner::{Candidate, ScanReport, Scanner};
pub use store::{DoneOutcome, StoreLock, Task, TaskStore};
pub use vcs::VersionControl;
