//! Test support: a controllable version-control double.
//!
//! `MockVersionControl` lets workflow tests script the diff, identity and
//! commit hash the adapter reports, without a real repository or the git
//! binary.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, SnagError};
use crate::vcs::VersionControl;

/// Mock version-control backend.
///
/// Unset values produce the corresponding adapter error, so failure paths
/// are as scriptable as success paths.
#[derive(Debug)]
pub struct MockVersionControl {
    root: PathBuf,
    diff: Option<String>,
    email: Option<String>,
    hash: Option<String>,
    hooks_installed: AtomicBool,
}

impl MockVersionControl {
    /// Create a mock rooted at `root` with nothing configured
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            diff: None,
            email: None,
            hash: None,
            hooks_installed: AtomicBool::new(false),
        }
    }

    /// Set the diff returned by `get_diff`
    #[must_use]
    pub fn with_diff(mut self, diff: &str) -> Self {
        self.diff = Some(diff.to_string());
        self
    }

    /// Set the identity returned by `get_email`
    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Set the hash returned by `latest_commit_hash`
    #[must_use]
    pub fn with_hash(mut self, hash: &str) -> Self {
        self.hash = Some(hash.to_string());
        self
    }

    /// Whether `set_hooks` was called
    pub fn hooks_installed(&self) -> bool {
        self.hooks_installed.load(Ordering::Relaxed)
    }
}

impl VersionControl for MockVersionControl {
    fn name_of_dir(&self) -> &'static str {
        ".mock"
    }

    fn name_of_vc(&self) -> &'static str {
        "MockVC"
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn get_diff(&self, _staged: bool) -> Result<String> {
        self.diff
            .clone()
            .ok_or_else(|| SnagError::vc_unavailable(self.name_of_vc(), "no diff configured"))
    }

    fn get_email(&self) -> Result<String> {
        self.email
            .clone()
            .ok_or_else(|| SnagError::identity_unset(self.name_of_vc(), "no identity configured"))
    }

    fn latest_commit_hash(&self) -> Result<String> {
        self.hash
            .clone()
            .ok_or_else(|| SnagError::vc_unavailable(self.name_of_vc(), "no commits"))
    }

    fn set_hooks(&self) -> Result<()> {
        self.hooks_installed.store(true, Ordering::Relaxed);
        Ok(())
    }
}
