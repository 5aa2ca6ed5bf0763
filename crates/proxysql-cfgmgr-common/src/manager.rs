//! Configuration manager trait and pass-level policies.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CfgMgrError, CfgMgrResult};

/// What to do when one resource in a pass fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failed resource and skip the commit.
    #[default]
    Abort,
    /// Record the failure, carry on with the remaining resources, then commit.
    Continue,
}

impl FailurePolicy {
    /// Returns the policy name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Continue => "continue",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = CfgMgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(CfgMgrError::invalid_config(
                "failure_policy",
                format!("expected 'abort' or 'continue', got '{}'", other),
            )),
        }
    }
}

/// Whether a pass applies its plan or only reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Issue mutations and commit.
    #[default]
    Apply,
    /// Discover and plan only; no mutating statement is issued.
    Noop,
}

/// Base trait for ProxySQL configuration managers.
///
/// A manager owns one admin table. Each call to [`CfgMgr::reconcile`] is a
/// full pass: discover what exists, converge the declared resources, commit.
///
/// # Example
///
/// ```ignore
/// use proxysql_cfgmgr_common::CfgMgr;
///
/// let report = mgr.reconcile(&catalog).await?;
/// ```
#[async_trait]
pub trait CfgMgr: Send + Sync {
    /// Desired-state record type consumed from the catalog.
    type Resource: Send + Sync;

    /// Summary returned by a completed pass.
    type Report: Send;

    /// Returns the daemon name (e.g., "replhgmgrd").
    fn daemon_name(&self) -> &str;

    /// Returns the admin tables this manager reads and writes.
    fn admin_table_names(&self) -> &[&str];

    /// Runs one reconciliation pass over `desired`.
    async fn reconcile(&mut self, desired: &[Self::Resource]) -> CfgMgrResult<Self::Report>;
}
