use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::info;

use crate::config::ExportEnv;
use crate::model::ToolDescriptor;
use crate::services::naming::ArtifactSet;

/// Headless mode: no UI, exit when analysis and scripts finish.
pub const BATCH_FLAG: &str = "-B";
/// Prefix for a load-time script.
pub const SCRIPT_FLAG: &str = "-S";
/// Prefix for the log redirection target.
pub const LOG_FLAG: &str = "-L";

/// One argument on the tool's command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchArg {
    Plain(OsString),
    /// `-S"<script>"`. The quotes are literal: the tool splits the `-S` value
    /// on spaces into script arguments, so the path must stay one token.
    Script(PathBuf),
}

impl LaunchArg {
    /// The argument exactly as the child process receives it.
    pub fn to_os_string(&self) -> OsString {
        match self {
            LaunchArg::Plain(value) => value.clone(),
            LaunchArg::Script(path) => {
                let mut flag = OsString::from(SCRIPT_FLAG);
                flag.push("\"");
                flag.push(path);
                flag.push("\"");
                flag
            }
        }
    }
}

/// Command line and environment overrides for a single tool launch.
///
/// The environment is a per-invocation map applied to the child only; the
/// parent process environment is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<LaunchArg>,
    pub env: BTreeMap<String, OsString>,
}

impl Invocation {
    /// `<tool> -B [-S<script>]... -L<log> <working copy>` plus export-mode env.
    pub fn compose(
        tool: &ToolDescriptor,
        artifacts: &ArtifactSet,
        scripts: &[PathBuf],
        export_env: &ExportEnv,
    ) -> Self {
        let mut args = vec![LaunchArg::Plain(BATCH_FLAG.into())];
        args.extend(scripts.iter().cloned().map(LaunchArg::Script));
        args.push(LaunchArg::Plain(prefixed(LOG_FLAG, &artifacts.log)));
        args.push(LaunchArg::Plain(artifacts.working_copy.clone().into_os_string()));

        let mut env = BTreeMap::new();
        env.insert(export_env.auto_var.clone(), OsString::from("1"));
        env.insert(export_env.export_file_var.clone(), artifacts.export.clone().into_os_string());

        Self { program: tool.path.clone(), args, env }
    }

    /// Arguments as the child receives them.
    pub fn argv(&self) -> Vec<OsString> {
        self.args.iter().map(LaunchArg::to_os_string).collect()
    }

    /// Lossy rendering for logs and reports.
    pub fn display_args(&self) -> Vec<String> {
        self.argv().iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.argv());
        cmd.envs(&self.env);
        cmd
    }
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut value = OsString::from(flag);
    value.push(path);
    value
}

/// Launches the analysis tool and reports its exit code.
pub trait ToolRunner {
    /// Run to completion. `Err` only when the process could not be started.
    fn run(&self, invocation: &Invocation) -> io::Result<i32>;
}

/// Spawns the tool as a child process and blocks until it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<i32> {
        info!(
            program = %invocation.program.display(),
            args = ?invocation.display_args(),
            "launching analysis tool"
        );
        let status = invocation.to_command().status()?;
        Ok(exit_code(status))
    }
}

/// Exit code of a finished child; signal deaths map to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
