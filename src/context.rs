//! Per-invocation application context.
//!
//! One `AppContext` is constructed at startup and passed into each
//! workflow. It owns the detected version-control backend and every path
//! the tool derives from it; there is no ambient global state.
//!
//! Layout inside the repository's metadata directory:
//!
//! ```text
//! <vcdir>/snag/config.json        per-repo configuration
//! <vcdir>/snag/tasks.json         the task store
//! <vcdir>/snag/plugins/<name>/    plugin scratch working directory
//! ```
//!
//! Plugin scripts themselves are installed per user, under
//! `~/.snag/plugins/<name>/` (overridable with `SNAG_HOME`).

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Result, SnagError};
use crate::plugin::PluginRunner;
use crate::vcs::{self, VersionControl};

/// Everything one invocation needs: the backend and derived paths
pub struct AppContext {
    vc: Box<dyn VersionControl>,
    home: PathBuf,
}

impl AppContext {
    /// Detect the enclosing repository from `cwd` and resolve the user
    /// home installation directory
    pub fn discover(cwd: &std::path::Path) -> Result<Self> {
        let vc = vcs::detect(cwd)?;
        Ok(Self::new(vc, default_home()?))
    }

    /// Build a context from an explicit backend and home directory
    pub fn new(vc: Box<dyn VersionControl>, home: PathBuf) -> Self {
        Self { vc, home }
    }

    /// The active version-control backend
    pub fn vc(&self) -> &dyn VersionControl {
        self.vc.as_ref()
    }

    /// The tool's private directory inside the repository metadata dir
    pub fn snag_dir(&self) -> PathBuf {
        self.vc.root().join(self.vc.name_of_dir()).join("snag")
    }

    /// Path of the per-repository configuration file
    pub fn config_path(&self) -> PathBuf {
        self.snag_dir().join("config.json")
    }

    /// Path of the persisted task store
    pub fn store_path(&self) -> PathBuf {
        self.snag_dir().join("tasks.json")
    }

    /// Scratch working directory for a plugin's subprocesses
    pub fn plugin_work_dir(&self, plugin: &str) -> PathBuf {
        self.snag_dir().join("plugins").join(plugin)
    }

    /// Directory holding a plugin's operation executables
    pub fn plugin_install_dir(&self, plugin: &str) -> PathBuf {
        self.home.join("plugins").join(plugin)
    }

    /// User home installation directory (`~/.snag` by default)
    pub fn home(&self) -> &std::path::Path {
        &self.home
    }

    /// Load the repository configuration
    pub fn load_config(&self) -> Result<Config> {
        let config = Config::load(&self.config_path())?;
        config.ensure_set()?;
        Ok(config)
    }

    /// Build a plugin runner for the configured plugin
    pub fn plugin_runner(&self, config: &Config) -> Result<PluginRunner> {
        PluginRunner::new(
            &config.interpreter,
            self.plugin_install_dir(&config.plugin),
            self.plugin_work_dir(&config.plugin),
        )
    }
}

/// Resolve the user-level snag directory: `SNAG_HOME` wins, otherwise
/// `~/.snag`
fn default_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("SNAG_HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|home| home.join(".snag"))
        .ok_or_else(|| SnagError::store("could not determine the user home directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::backend;
    use std::fs;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> AppContext {
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        let vc = backend("Git", temp.path().to_path_buf()).unwrap();
        AppContext::new(vc, temp.path().join("snag-home"))
    }

    #[test]
    fn test_paths_derive_from_metadata_dir() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);

        assert_eq!(ctx.snag_dir(), temp.path().join(".git/snag"));
        assert_eq!(ctx.config_path(), temp.path().join(".git/snag/config.json"));
        assert_eq!(ctx.store_path(), temp.path().join(".git/snag/tasks.json"));
        assert_eq!(
            ctx.plugin_work_dir("trello"),
            temp.path().join(".git/snag/plugins/trello")
        );
    }

    #[test]
    fn test_plugin_install_dir_under_home() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);

        assert_eq!(
            ctx.plugin_install_dir("trello"),
            temp.path().join("snag-home/plugins/trello")
        );
    }

    #[test]
    fn test_mercurial_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".hg")).unwrap();
        let vc = backend("Mercurial", temp.path().to_path_buf()).unwrap();
        let ctx = AppContext::new(vc, temp.path().join("home"));

        assert_eq!(ctx.snag_dir(), temp.path().join(".hg/snag"));
    }

    #[test]
    fn test_load_config_requires_init() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);

        let err = ctx.load_config().unwrap_err();
        assert!(matches!(err, SnagError::ConfigIncomplete { .. }));
    }

    #[test]
    fn test_load_config_rejects_blank_fields() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);

        fs::create_dir_all(ctx.snag_dir()).unwrap();
        fs::write(
            ctx.config_path(),
            r#"{"author": "", "plugin_name": "trello", "plugin_interpreter": "python3"}"#,
        )
        .unwrap();

        let err = ctx.load_config().unwrap_err();
        assert!(err.to_string().contains("author"));
    }
}
