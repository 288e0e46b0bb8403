//! Mercurial backend.
//!
//! Mercurial has no staging area, so the `staged` flag on `get_diff` is
//! accepted and ignored: the pending diff is the same either way. Hooks
//! are registered in `.hg/hgrc` rather than as script files.

use std::fs;
use std::path::{Path, PathBuf};

use super::{run_command, VersionControl};
use crate::error::{Result, SnagError};

/// Lines appended to the repository hgrc under `[hooks]`
const HOOK_BLOCK: &str = "[hooks]\n\
                          precommit.snag = snag commit\n\
                          commit.snag = snag post-commit\n\
                          pre-push.snag = snag push\n";

#[derive(Debug)]
pub struct Mercurial {
    root: PathBuf,
}

impl Mercurial {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        run_command(self.name_of_vc(), &self.root, "hg", args)
    }
}

impl VersionControl for Mercurial {
    fn name_of_dir(&self) -> &'static str {
        ".hg"
    }

    fn name_of_vc(&self) -> &'static str {
        "Mercurial"
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn get_diff(&self, _staged: bool) -> Result<String> {
        self.run(&["diff", "--git"])
    }

    fn get_email(&self) -> Result<String> {
        let username = self
            .run(&["config", "ui.username"])
            .map_err(|err| SnagError::identity_unset(self.name_of_vc(), err.to_string()))?;

        if username.trim().is_empty() {
            return Err(SnagError::identity_unset(
                self.name_of_vc(),
                "hg config ui.username is empty",
            ));
        }
        Ok(username)
    }

    fn latest_commit_hash(&self) -> Result<String> {
        self.run(&["log", "-r", ".", "--template", "{node}"])
    }

    fn set_hooks(&self) -> Result<()> {
        let hgrc = self.root.join(self.name_of_dir()).join("hgrc");

        let existing = if hgrc.exists() {
            fs::read_to_string(&hgrc)?
        } else {
            String::new()
        };

        if existing.contains("snag") {
            return Ok(());
        }

        let mut extended = existing;
        if !extended.is_empty() && !extended.ends_with('\n') {
            extended.push('\n');
        }
        extended.push_str(HOOK_BLOCK);
        fs::write(&hgrc, extended)?;
        Ok(())
    }
}
