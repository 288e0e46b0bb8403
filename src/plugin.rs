//! Plugin invocation protocol.
//!
//! A plugin is a directory of four executables (`getid`, `create`, `done`,
//! `setup`) supplied by the user and run through a configured interpreter.
//! Every operation is exactly one subprocess: operations are never batched,
//! so a failure is always attributable to a single task.
//!
//! The subprocess runs with its working directory set to a per-plugin
//! scratch directory inside the repository's snag directory, so plugins can
//! keep caches or credentials next to their invocations.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{Result, SnagError};
use crate::store::Task;

/// One plugin operation with its typed payload
#[derive(Debug)]
pub enum PluginOp<'a> {
    /// Ask the task manager for an identity without creating the task
    GetId { task: &'a Task },
    /// Register the task; must succeed idempotently if the id already
    /// exists remotely
    Create { task: &'a Task },
    /// Mark the task complete remotely
    Done { id: &'a str },
    /// Interactive one-time configuration; inherits the terminal
    Setup,
}

impl PluginOp<'_> {
    /// File name of the executable implementing this operation
    pub fn script_name(&self) -> &'static str {
        match self {
            PluginOp::GetId { .. } => "getid",
            PluginOp::Create { .. } => "create",
            PluginOp::Done { .. } => "done",
            PluginOp::Setup => "setup",
        }
    }

    /// Arguments appended after the script path
    fn args(&self) -> Result<Vec<String>> {
        match self {
            PluginOp::GetId { task } => Ok(vec![encode_task(task)?]),
            PluginOp::Create { task } => {
                let mut args = vec![encode_task(task)?];
                if !task.id.is_empty() {
                    args.push(task.id.clone());
                }
                Ok(args)
            }
            PluginOp::Done { id } => Ok(vec![(*id).to_string()]),
            PluginOp::Setup => Ok(Vec::new()),
        }
    }
}

fn encode_task(task: &Task) -> Result<String> {
    Ok(serde_json::to_string_pretty(task)?)
}

/// Runs plugin operations as subprocesses
pub struct PluginRunner {
    program: String,
    leading_args: Vec<String>,
    script_dir: PathBuf,
    work_dir: PathBuf,
}

impl PluginRunner {
    /// Build a runner.
    ///
    /// `interpreter` is a whitespace-separated command line, e.g.
    /// "python3" or "osascript -l JavaScript"; `script_dir` holds the
    /// operation executables; `work_dir` becomes the subprocess cwd.
    pub fn new(interpreter: &str, script_dir: PathBuf, work_dir: PathBuf) -> Result<Self> {
        let mut parts = interpreter.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| SnagError::config_incomplete("plugin_interpreter"))?;

        Ok(Self {
            program,
            leading_args: parts.collect(),
            script_dir,
            work_dir,
        })
    }

    /// Run one operation and return its captured output with trailing
    /// newline characters stripped.
    ///
    /// `Setup` inherits the controlling terminal instead of capturing.
    /// A non-zero exit status or a spawn failure is a `PluginExecution`
    /// error carrying whatever the subprocess printed.
    pub fn run(&self, op: PluginOp<'_>) -> Result<String> {
        fs::create_dir_all(&self.work_dir).map_err(|err| {
            SnagError::store_with_path(
                format!("could not create plugin work dir: {err}"),
                self.work_dir.clone(),
            )
        })?;

        let script = self.script_dir.join(op.script_name());
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg(&script)
            .args(op.args()?)
            .current_dir(&self.work_dir);

        tracing::debug!(
            "running plugin op '{}' via {}",
            op.script_name(),
            self.program
        );

        if matches!(op, PluginOp::Setup) {
            return self.run_interactive(&op, command);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = command
            .output()
            .map_err(|err| SnagError::plugin(op.script_name(), format!("failed to start: {err}")))?;

        // The original merges both streams into one capture buffer
        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));
        let captured = captured.trim_end_matches(['\n', '\r']).to_string();

        if !output.status.success() {
            return Err(SnagError::plugin(op.script_name(), captured));
        }

        Ok(captured)
    }

    fn run_interactive(&self, op: &PluginOp<'_>, mut command: Command) -> Result<String> {
        let status = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|err| SnagError::plugin(op.script_name(), format!("failed to start: {err}")))?;

        if !status.success() {
            return Err(SnagError::plugin(
                op.script_name(),
                format!("exited with {status}"),
            ));
        }
        Ok(String::new())
    }
}
