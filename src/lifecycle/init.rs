//! Non-interactive repository initialisation.
//!
//! Creates the private directory, resolves and writes the configuration,
//! runs the plugin's setup operation and installs the hooks. Values not
//! supplied on the command line fall back to what can be resolved
//! non-interactively: the author from the version-control identity, the
//! interpreter from the plugin's `interp` file. Anything still missing is
//! a `ConfigIncomplete` error rather than a prompt.

use std::fs;

use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_MARKER};
use crate::context::AppContext;
use crate::error::{Result, SnagError};
use crate::plugin::PluginOp;

/// Values supplied on the init command line
#[derive(Debug, Default)]
pub struct InitOptions {
    pub plugin: String,
    pub author: Option<String>,
    pub interpreter: Option<String>,
    pub marker: Option<String>,
}

/// What init resolved and did
#[derive(Debug)]
pub struct InitSummary {
    pub config: Config,
    pub hooks_installed: bool,
}

/// Initialise snag for the enclosing repository
pub fn init(ctx: &AppContext, opts: InitOptions) -> Result<InitSummary> {
    if opts.plugin.trim().is_empty() {
        return Err(SnagError::config_incomplete("plugin_name"));
    }

    let install_dir = ctx.plugin_install_dir(&opts.plugin);
    if !install_dir.is_dir() {
        return Err(SnagError::config_incomplete(format!(
            "plugin '{}' is not installed under {}",
            opts.plugin,
            install_dir.display()
        )));
    }

    let author = match opts.author {
        Some(author) => author,
        None => ctx.vc().get_email()?,
    };

    let interpreter = match opts.interpreter {
        Some(interpreter) => interpreter,
        None => interp_file(ctx, &opts.plugin)?,
    };
    check_interpreter(&interpreter);

    let config = Config {
        author,
        plugin: opts.plugin,
        interpreter,
        marker: opts.marker.unwrap_or_else(|| DEFAULT_MARKER.to_string()),
    };
    config.ensure_set()?;

    fs::create_dir_all(ctx.snag_dir())?;
    fs::create_dir_all(ctx.plugin_work_dir(&config.plugin))?;
    config.save(&ctx.config_path())?;
    info!("configuration written to {}", ctx.config_path().display());

    let runner = ctx.plugin_runner(&config)?;
    runner.run(PluginOp::Setup)?;

    ctx.vc().set_hooks()?;
    info!("{} hooks installed", ctx.vc().name_of_vc());

    Ok(InitSummary {
        config,
        hooks_installed: true,
    })
}

/// Read the plugin's `interp` file, the non-interactive fallback for the
/// interpreter command
fn interp_file(ctx: &AppContext, plugin: &str) -> Result<String> {
    let path = ctx.plugin_install_dir(plugin).join("interp");
    match fs::read_to_string(&path) {
        Ok(content) => {
            let interp = content.trim_end_matches(['\n', '\r']).to_string();
            debug!("using interpreter '{interp}' from {}", path.display());
            Ok(interp)
        }
        Err(_) => Err(SnagError::config_incomplete("plugin_interpreter")),
    }
}

/// Warn when the interpreter program cannot be found on PATH; the plugin
/// may still work if the environment differs at hook time
fn check_interpreter(interpreter: &str) {
    if let Some(program) = interpreter.split_whitespace().next() {
        if which::which(program).is_err() {
            warn!("interpreter '{program}' not found on PATH");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::backend;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    /// Git-backed fixture: set_hooks writes real files we can assert on
    fn fixture() -> (TempDir, AppContext) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        let home = temp.path().join("home");
        write_script(&home.join("plugins/demo"), "setup", "touch setup-ran");

        let vc = backend("Git", temp.path().to_path_buf()).unwrap();
        let ctx = AppContext::new(vc, home);
        (temp, ctx)
    }

    fn options() -> InitOptions {
        InitOptions {
            plugin: "demo".to_string(),
            author: Some("dev@example.com".to_string()),
            interpreter: Some("sh".to_string()),
            marker: None,
        }
    }

    #[test]
    fn test_init_writes_config_and_hooks() {
        let (temp, ctx) = fixture();

        let summary = init(&ctx, options()).unwrap();
        assert_eq!(summary.config.author, "dev@example.com");
        assert_eq!(summary.config.marker, "TODO");

        let loaded = Config::load(&ctx.config_path()).unwrap();
        assert_eq!(loaded, summary.config);

        for hook in ["pre-commit", "post-commit", "pre-push"] {
            assert!(temp.path().join(".git/hooks").join(hook).exists());
        }
    }

    #[test]
    fn test_init_runs_plugin_setup_in_scratch_dir() {
        let (_temp, ctx) = fixture();

        init(&ctx, options()).unwrap();
        assert!(ctx.plugin_work_dir("demo").join("setup-ran").exists());
    }

    #[test]
    fn test_init_reads_interp_file() {
        let (temp, ctx) = fixture();
        fs::write(temp.path().join("home/plugins/demo/interp"), "sh\n").unwrap();

        let mut opts = options();
        opts.interpreter = None;
        let summary = init(&ctx, opts).unwrap();
        assert_eq!(summary.config.interpreter, "sh");
    }

    #[test]
    fn test_init_without_interpreter_fails() {
        let (_temp, ctx) = fixture();

        let mut opts = options();
        opts.interpreter = None;
        let err = init(&ctx, opts).unwrap_err();
        assert!(err.to_string().contains("plugin_interpreter"));
    }

    #[test]
    fn test_init_rejects_missing_plugin() {
        let (_temp, ctx) = fixture();

        let mut opts = options();
        opts.plugin = "absent".to_string();
        let err = init(&ctx, opts).unwrap_err();
        assert!(matches!(err, SnagError::ConfigIncomplete { .. }));
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_init_author_from_adapter_identity() {
        use crate::testing::MockVersionControl;

        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        write_script(&home.join("plugins/demo"), "setup", "exit 0");

        let vc = MockVersionControl::new(temp.path().to_path_buf()).with_email("vc@example.com");
        let ctx = AppContext::new(Box::new(vc), home);

        let mut opts = options();
        opts.author = None;
        let summary = init(&ctx, opts).unwrap();
        assert_eq!(summary.config.author, "vc@example.com");
    }

    #[test]
    fn test_init_without_identity_fails() {
        use crate::testing::MockVersionControl;

        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        write_script(&home.join("plugins/demo"), "setup", "exit 0");

        let vc = MockVersionControl::new(temp.path().to_path_buf());
        let ctx = AppContext::new(Box::new(vc), home);

        let mut opts = options();
        opts.author = None;
        let err = init(&ctx, opts).unwrap_err();
        assert!(matches!(err, SnagError::IdentityUnset { .. }));
    }

    #[test]
    fn test_init_custom_marker() {
        let (_temp, ctx) = fixture();

        let mut opts = options();
        opts.marker = Some("FIXME".to_string());
        let summary = init(&ctx, opts).unwrap();
        assert_eq!(summary.config.marker, "FIXME");
    }

    #[test]
    fn test_failed_setup_aborts_init() {
        let (temp, ctx) = fixture();
        write_script(&temp.path().join("home/plugins/demo"), "setup", "exit 1");

        let err = init(&ctx, options()).unwrap_err();
        assert!(matches!(err, SnagError::PluginExecution { .. }));
    }
}
