//! Admin interface sessions.
//!
//! An [`AdminSession`] runs one bound [`Statement`] against the ProxySQL
//! admin interface and hands back the raw output. [`AdminClient`] is the
//! production session: it drives the `mysql` client through a
//! [`CommandExecutor`], prepending the credentials indirection to every
//! invocation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::CfgMgrResult;
use crate::exec::CommandExecutor;
use crate::statement::Statement;

/// Runs statements against the admin interface.
#[async_trait]
pub trait AdminSession: Send + Sync {
    /// Executes `statement` and returns the client's raw stdout.
    async fn run(&self, statement: &Statement) -> CfgMgrResult<String>;
}

/// Admin session backed by the `mysql` command line client.
#[derive(Debug, Clone)]
pub struct AdminClient<E> {
    executor: E,
    defaults_file: Option<PathBuf>,
}

impl<E: CommandExecutor> AdminClient<E> {
    /// Creates a client with no defaults file.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            defaults_file: None,
        }
    }

    /// Sets the option file holding the admin credentials.
    pub fn with_defaults_file(mut self, path: Option<PathBuf>) -> Self {
        self.defaults_file = path;
        self
    }

    /// Returns the configured defaults file, if any.
    pub fn defaults_file(&self) -> Option<&Path> {
        self.defaults_file.as_deref()
    }

    /// Returns the underlying executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Builds the client argument vector for `statement`.
    ///
    /// `--defaults-file` must come first; the client rejects it anywhere else.
    pub fn build_args(&self, statement: &Statement) -> CfgMgrResult<Vec<String>> {
        let sql = statement.bind()?;
        let mut args = Vec::with_capacity(3);
        if let Some(path) = &self.defaults_file {
            args.push(format!("--defaults-file={}", path.display()));
        }
        args.push(statement.mode().flag().to_string());
        args.push(sql);
        Ok(args)
    }
}

#[async_trait]
impl<E: CommandExecutor> AdminSession for AdminClient<E> {
    async fn run(&self, statement: &Statement) -> CfgMgrResult<String> {
        let args = self.build_args(statement)?;
        tracing::debug!(statement = %statement, "Running admin statement");
        self.executor.execute(&args).await
    }
}

/// Resolves the credentials file the client should read.
///
/// An explicit path always wins. Otherwise `<root_home>/.my.cnf` is used
/// when it exists, and no indirection is applied when it does not.
pub fn resolve_defaults_file(explicit: Option<&Path>, root_home: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = root_home.join(".my.cnf");
    candidate.is_file().then_some(candidate)
}
