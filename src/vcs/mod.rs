//! Version-control abstraction.
//!
//! The core needs five capabilities from the underlying system: the name
//! of its metadata directory, a diagnostic name, a unified diff of pending
//! changes, the configured user identity, the latest commit hash, and hook
//! installation. Backends are registered in a flat table and selected by
//! walking ancestor directories for a metadata directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, SnagError};

pub mod git;
pub mod mercurial;

pub use git::Git;
pub use mercurial::Mercurial;

/// Capability set every backend must provide
pub trait VersionControl: std::fmt::Debug {
    /// Name of the metadata directory, e.g. ".git"
    fn name_of_dir(&self) -> &'static str;

    /// Human-readable name, used for diagnostics
    fn name_of_vc(&self) -> &'static str;

    /// Repository root this backend operates on
    fn root(&self) -> &Path;

    /// Unified diff of pending changes; `staged` restricts to the index
    /// where the backend has one
    fn get_diff(&self, staged: bool) -> Result<String>;

    /// Configured user identity
    fn get_email(&self) -> Result<String>;

    /// Hash of the most recent commit
    fn latest_commit_hash(&self) -> Result<String>;

    /// Install hook scripts invoking snag's commit, post-commit and push
    /// commands. Idempotent: hooks already mentioning snag are left
    /// untouched.
    fn set_hooks(&self) -> Result<()>;
}

/// Registry entry tying a backend name to its metadata directory and
/// constructor
pub struct Backend {
    pub name: &'static str,
    pub dir: &'static str,
    ctor: fn(PathBuf) -> Box<dyn VersionControl>,
}

/// All known backends, in detection-priority order
pub fn registry() -> &'static [Backend] {
    &[
        Backend {
            name: "Git",
            dir: ".git",
            ctor: |root| Box::new(Git::new(root)),
        },
        Backend {
            name: "Mercurial",
            dir: ".hg",
            ctor: |root| Box::new(Mercurial::new(root)),
        },
    ]
}

/// Look up a backend by name and bind it to a repository root
pub fn backend(name: &str, root: PathBuf) -> Option<Box<dyn VersionControl>> {
    registry()
        .iter()
        .find(|backend| backend.name == name)
        .map(|backend| (backend.ctor)(root))
}

/// Find the enclosing repository by walking up from `start`.
///
/// The metadata entry may be a directory or a file (git worktrees use a
/// `.git` file).
pub fn detect(start: &Path) -> Result<Box<dyn VersionControl>> {
    for dir in start.ancestors() {
        for entry in registry() {
            if dir.join(entry.dir).exists() {
                return Ok((entry.ctor)(dir.to_path_buf()));
            }
        }
    }

    Err(SnagError::vc_unavailable(
        "version control",
        format!("no repository found above {}", start.display()),
    ))
}

/// Run a backend command in `root`, returning stdout with trailing
/// newline characters stripped
pub(crate) fn run_command(vc: &str, root: &Path, program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|err| {
            SnagError::vc_unavailable(vc, format!("could not run {program}: {err}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SnagError::vc_unavailable(
            vc,
            format!(
                "{program} {} failed: {}",
                args.join(" "),
                stderr.trim_end_matches(['\n', '\r'])
            ),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .trim_end_matches(['\n', '\r'])
        .to_string())
}
