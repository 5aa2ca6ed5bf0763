//! Binding of catalog resources to discovered pairs
//!
//! Matching is driven by the catalog only: a discovered pair no resource
//! names is never looked at, so it can never be deleted by a pass.

use std::collections::HashMap;

use proxysql_cfgmgr_common::{CfgMgrError, CfgMgrResult};

use crate::repository::Repository;
use crate::tables::columns;
use crate::types::{Ensure, HostgroupKey, HostgroupPair, ReplicationHostgroup};

/// Change a resource needs to converge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Insert a new row
    Create {
        key: HostgroupKey,
        comment: Option<String>,
    },
    /// Rewrite the comment of an existing row
    UpdateComment {
        key: HostgroupKey,
        from: String,
        to: String,
    },
    /// Delete an existing row
    Destroy { key: HostgroupKey },
    /// Present and matching
    Unchanged,
    /// Declared absent and already missing
    AbsentNoop,
}

impl Action {
    /// True if applying this action issues a statement
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Action::Create { .. } | Action::UpdateComment { .. } | Action::Destroy { .. }
        )
    }

    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create { .. } => "create",
            Action::UpdateComment { .. } => "update_comment",
            Action::Destroy { .. } => "destroy",
            Action::Unchanged => "unchanged",
            Action::AbsentNoop => "absent",
        }
    }
}

/// One catalog resource with what it matched and what must happen to it
#[derive(Debug)]
pub struct PlanEntry {
    /// Catalog resource being planned
    pub resource: ReplicationHostgroup,
    /// Pair it matched, if any
    pub current: Option<HostgroupPair>,
    /// `Err` when the resource cannot be converged without a forbidden change
    pub action: CfgMgrResult<Action>,
}

impl PlanEntry {
    /// Name the resource is matched by
    pub fn name(&self) -> String {
        self.resource.name()
    }
}

/// Ordered list of entries, one per catalog resource
#[derive(Debug, Default)]
pub struct Plan {
    /// One entry per catalog resource, in catalog order
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    /// Number of entries that will issue a statement
    pub fn mutation_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.action, Ok(a) if a.is_mutation()))
            .count()
    }

    /// True if no entry needs a statement
    pub fn is_converged(&self) -> bool {
        self.entries
            .iter()
            .all(|e| matches!(&e.action, Ok(a) if !a.is_mutation()))
    }
}

/// Map each resource name to the discovered pair carrying that name, if any
pub fn match_resources<'a>(
    desired: &[ReplicationHostgroup],
    repo: &'a Repository,
) -> HashMap<String, Option<&'a HostgroupPair>> {
    desired
        .iter()
        .map(|resource| {
            let name = resource.name();
            let found = repo.get_by_name(&name);
            (name, found)
        })
        .collect()
}

/// Classify every resource in catalog order
pub fn plan(desired: &[ReplicationHostgroup], repo: &Repository) -> Plan {
    let matches = match_resources(desired, repo);
    let entries = desired
        .iter()
        .map(|resource| {
            let current = matches.get(&resource.name()).copied().flatten().cloned();
            let action = classify(resource, current.as_ref());
            PlanEntry {
                resource: resource.clone(),
                current,
                action,
            }
        })
        .collect();
    Plan { entries }
}

/// Decide the action for one resource given its match
pub fn classify(
    resource: &ReplicationHostgroup,
    current: Option<&HostgroupPair>,
) -> CfgMgrResult<Action> {
    let declared = resource.key();

    let Some(current) = current else {
        if resource.has_name_mismatch() {
            return Err(CfgMgrError::invalid_config(
                "name",
                format!(
                    "resource '{}' declares hostgroups {} but names a different pair",
                    resource.name(),
                    declared
                ),
            ));
        }
        return Ok(match resource.ensure {
            Ensure::Present => Action::Create {
                key: declared,
                comment: resource.comment.clone(),
            },
            Ensure::Absent => Action::AbsentNoop,
        });
    };

    check_key_unchanged(resource, current)?;

    Ok(match resource.ensure {
        Ensure::Absent => Action::Destroy { key: current.key },
        Ensure::Present => match &resource.comment {
            Some(wanted) if *wanted != current.comment => Action::UpdateComment {
                key: current.key,
                from: current.comment.clone(),
                to: wanted.clone(),
            },
            _ => Action::Unchanged,
        },
    })
}

/// Writer and reader hostgroups cannot be changed in place
fn check_key_unchanged(
    resource: &ReplicationHostgroup,
    current: &HostgroupPair,
) -> CfgMgrResult<()> {
    let name = resource.name();
    if resource.writer_hostgroup != current.writer_hostgroup() {
        return Err(CfgMgrError::unsupported_mutation(
            name,
            columns::WRITER_HOSTGROUP,
            current.writer_hostgroup(),
            resource.writer_hostgroup,
        ));
    }
    if resource.reader_hostgroup != current.reader_hostgroup() {
        return Err(CfgMgrError::unsupported_mutation(
            name,
            columns::READER_HOSTGROUP,
            current.reader_hostgroup(),
            resource.reader_hostgroup,
        ));
    }
    Ok(())
}
