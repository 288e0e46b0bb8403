//! Git backend.

use std::fs;
use std::path::{Path, PathBuf};

use super::{run_command, VersionControl};
use crate::error::{Result, SnagError};

/// Hook scripts installed into `.git/hooks`
const HOOKS: &[(&str, &str)] = &[
    ("pre-commit", "snag commit --cached"),
    ("post-commit", "snag post-commit"),
    ("pre-push", "snag push"),
];

#[derive(Debug)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        run_command(self.name_of_vc(), &self.root, "git", args)
    }
}

impl VersionControl for Git {
    fn name_of_dir(&self) -> &'static str {
        ".git"
    }

    fn name_of_vc(&self) -> &'static str {
        "Git"
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn get_diff(&self, staged: bool) -> Result<String> {
        if staged {
            self.run(&["diff", "--cached"])
        } else {
            self.run(&["diff"])
        }
    }

    fn get_email(&self) -> Result<String> {
        let email = self
            .run(&["config", "user.email"])
            .map_err(|err| SnagError::identity_unset(self.name_of_vc(), err.to_string()))?;

        if email.trim().is_empty() {
            return Err(SnagError::identity_unset(
                self.name_of_vc(),
                "git config user.email is empty",
            ));
        }
        Ok(email)
    }

    fn latest_commit_hash(&self) -> Result<String> {
        self.run(&["rev-parse", "HEAD"])
    }

    fn set_hooks(&self) -> Result<()> {
        let hooks_dir = self.root.join(self.name_of_dir()).join("hooks");
        fs::create_dir_all(&hooks_dir)?;

        for (hook, command) in HOOKS {
            install_hook(&hooks_dir.join(hook), command)?;
        }
        Ok(())
    }
}

/// Write or extend one hook script. A hook that already mentions snag is
/// left untouched, so re-running init cannot corrupt it.
fn install_hook(path: &Path, command: &str) -> Result<()> {
    if path.exists() {
        let existing = fs::read_to_string(path)?;
        if existing.contains("snag") {
            return Ok(());
        }
        let mut extended = existing;
        if !extended.ends_with('\n') {
            extended.push('\n');
        }
        extended.push_str(command);
        extended.push('\n');
        fs::write(path, extended)?;
    } else {
        fs::write(path, format!("#!/bin/sh\n{command}\n"))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}
