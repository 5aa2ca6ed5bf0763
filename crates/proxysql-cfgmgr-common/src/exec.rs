//! External command execution for cfgmgr daemons.
//!
//! Commands are spawned directly with an argument vector, never through a
//! shell, so no argument needs shell quoting. The [`CommandExecutor`] trait
//! is the seam the engine talks to; [`ProcessExecutor`] is the production
//! implementation.
//!
//! # Example
//!
//! ```ignore
//! use proxysql_cfgmgr_common::exec::{CommandExecutor, ProcessExecutor};
//!
//! let mysql = ProcessExecutor::new("mysql");
//! let out = mysql.execute(&["-NBe".into(), "SELECT 1".into()]).await?;
//! ```

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{CfgMgrError, CfgMgrResult};

/// Default client binary used to reach the ProxySQL admin interface.
pub const MYSQL_CMD: &str = "mysql";

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The exit code of the command (0 = success, -1 = killed by signal).
    pub exit_code: i32,
    /// Raw stdout, untrimmed.
    pub stdout: String,
    /// Stderr with surrounding whitespace removed.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs an external client and returns its output.
///
/// Implementations must fail with [`CfgMgrError::CommandFailed`] when the
/// process exits non-zero, carrying the exit status and stderr.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Executes the client with `args` and returns its raw stdout.
    async fn execute(&self, args: &[String]) -> CfgMgrResult<String>;
}

/// Executes a fixed program as a child process.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
}

impl ProcessExecutor {
    /// Creates an executor for `program` (looked up in `PATH` if relative).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the program this executor runs.
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Spawns the program and collects its output without judging the exit code.
    pub async fn run(&self, args: &[String]) -> CfgMgrResult<ExecResult> {
        let program = self.program.display().to_string();
        tracing::debug!(command = %program, argc = args.len(), "Executing command");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CfgMgrError::CommandSpawn {
                command: program.clone(),
                source: e,
            })?;

        let result = ExecResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        if result.success() {
            tracing::trace!(command = %program, "Command succeeded");
        } else {
            tracing::warn!(
                command = %program,
                exit_code = result.exit_code,
                stderr = %result.stderr,
                "Command failed"
            );
        }

        Ok(result)
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(MYSQL_CMD)
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, args: &[String]) -> CfgMgrResult<String> {
        let result = self.run(args).await?;
        if result.success() {
            Ok(result.stdout)
        } else {
            Err(CfgMgrError::CommandFailed {
                command: describe_command(&self.program.display().to_string(), args),
                exit_code: result.exit_code,
                stderr: result.stderr,
            })
        }
    }
}

/// Renders a command line for error messages, hiding credential arguments.
pub fn describe_command(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_string()];
    for arg in args {
        if arg.starts_with("--defaults-file=") || arg.starts_with("--password") {
            continue;
        }
        parts.push(arg.clone());
    }
    parts.join(" ")
}
