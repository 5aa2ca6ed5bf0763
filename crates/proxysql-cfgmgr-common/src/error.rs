//! Error types for ProxySQL configuration manager operations.
//!
//! All errors implement `std::error::Error` via `thiserror`. Nothing in this
//! crate recovers locally: every error travels back to the driver of the
//! reconciliation pass, which decides whether to continue or abort.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for cfgmgr operations.
pub type CfgMgrResult<T> = Result<T, CfgMgrError>;

/// The operation that was being carried out on a resource when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Reading the current rows from the admin interface.
    Discover,
    /// Inserting a new row.
    Create,
    /// Deleting a row by natural key.
    Destroy,
    /// Updating a non-key column in place.
    Update,
    /// Loading the staged configuration into the runtime.
    Activate,
    /// Saving the runtime configuration to disk.
    Persist,
}

impl Operation {
    /// Returns the operation name as used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Discover => "discover",
            Operation::Create => "create",
            Operation::Destroy => "destroy",
            Operation::Update => "update",
            Operation::Activate => "activate",
            Operation::Persist => "persist",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during cfgmgr operations.
#[derive(Debug, Error)]
pub enum CfgMgrError {
    /// The client binary could not be started.
    #[error("Failed to execute command '{command}': {source}")]
    CommandSpawn {
        /// The program that failed to start.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The client binary returned a non-zero exit code.
    #[error("Command failed: '{command}' (exit code {exit_code}): {stderr}")]
    CommandFailed {
        /// The program and its arguments, credentials excluded.
        command: String,
        /// The exit code (-1 when terminated by a signal).
        exit_code: i32,
        /// Captured stderr.
        stderr: String,
    },

    /// Discovery output could not be decoded.
    #[error("Malformed admin output at line {line}: {message}")]
    Parse {
        /// 1-based line number in the raw output.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// A change to an immutable key column was requested.
    #[error(
        "Unsupported change of '{field}' on existing resource '{resource}': {current} -> {desired}"
    )]
    UnsupportedMutation {
        /// The resource name.
        resource: String,
        /// The key column the catalog tried to change.
        field: String,
        /// Value currently stored.
        current: String,
        /// Value requested by the catalog.
        desired: String,
    },

    /// Configuration or catalog validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// A statement's placeholders and parameters do not line up.
    #[error("Cannot bind statement '{sql}': {placeholders} placeholders, {params} parameters")]
    Binding {
        /// The statement template.
        sql: String,
        /// Number of `?` placeholders in the template.
        placeholders: usize,
        /// Number of parameters supplied.
        params: usize,
    },

    /// A resource failed while performing `operation`.
    #[error("Resource '{resource}' failed to {operation}: {source}")]
    Resource {
        /// The resource name.
        resource: String,
        /// What was being done.
        operation: Operation,
        /// The underlying failure.
        #[source]
        source: Box<CfgMgrError>,
    },

    /// File system error while reading configuration.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being accessed.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl CfgMgrError {
    /// Creates a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported mutation error.
    pub fn unsupported_mutation(
        resource: impl Into<String>,
        field: impl Into<String>,
        current: impl ToString,
        desired: impl ToString,
    ) -> Self {
        Self::UnsupportedMutation {
            resource: resource.into(),
            field: field.into(),
            current: current.to_string(),
            desired: desired.to_string(),
        }
    }

    /// Creates an I/O error tagged with the path involved.
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps this error with the resource and operation that produced it.
    pub fn for_resource(self, resource: impl Into<String>, operation: Operation) -> Self {
        Self::Resource {
            resource: resource.into(),
            operation,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through `Resource` wrappers.
    pub fn root(&self) -> &CfgMgrError {
        match self {
            CfgMgrError::Resource { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if this error must abort the whole pass regardless of
    /// the caller's failure policy.
    ///
    /// Malformed discovery output means the engine has no trustworthy view
    /// of the store, so nothing after it can be planned.
    pub fn is_fatal_for_pass(&self) -> bool {
        matches!(
            self.root(),
            CfgMgrError::Parse { .. } | CfgMgrError::Internal { .. }
        )
    }
}
