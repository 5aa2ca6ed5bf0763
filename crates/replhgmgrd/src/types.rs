//! Type definitions for replhgmgrd

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tables::NAME_SEPARATOR;

/// Hostgroup identifier as stored by ProxySQL (`INT UNSIGNED`)
pub type HostgroupId = u32;

/// Natural key of a replication hostgroup pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostgroupKey {
    /// Hostgroup receiving writes
    pub writer_hostgroup: HostgroupId,
    /// Hostgroup receiving reads
    pub reader_hostgroup: HostgroupId,
}

impl HostgroupKey {
    /// Create a new HostgroupKey
    pub fn new(writer_hostgroup: HostgroupId, reader_hostgroup: HostgroupId) -> Self {
        Self {
            writer_hostgroup,
            reader_hostgroup,
        }
    }

    /// Display name derived from the key, e.g. `10-11`
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HostgroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.writer_hostgroup, NAME_SEPARATOR, self.reader_hostgroup
        )
    }
}

/// A replication hostgroup pair as it exists in the admin table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostgroupPair {
    /// Natural key
    pub key: HostgroupKey,
    /// Comment column (empty when unset)
    pub comment: String,
}

impl HostgroupPair {
    /// Create a new HostgroupPair
    pub fn new(
        writer_hostgroup: HostgroupId,
        reader_hostgroup: HostgroupId,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            key: HostgroupKey::new(writer_hostgroup, reader_hostgroup),
            comment: comment.into(),
        }
    }

    /// Display name used for matching against the catalog
    pub fn name(&self) -> String {
        self.key.name()
    }

    /// Hostgroup receiving writes
    pub fn writer_hostgroup(&self) -> HostgroupId {
        self.key.writer_hostgroup
    }

    /// Hostgroup receiving reads
    pub fn reader_hostgroup(&self) -> HostgroupId {
        self.key.reader_hostgroup
    }
}

/// Declared presence of a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// The pair must exist
    #[default]
    Present,
    /// The pair must not exist
    Absent,
}

impl Ensure {
    /// Catalog spelling of the value
    pub fn as_str(&self) -> &'static str {
        match self {
            Ensure::Present => "present",
            Ensure::Absent => "absent",
        }
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state of one replication hostgroup pair, as declared in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplicationHostgroup {
    /// Explicit identity; derived from the key when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the pair should exist
    #[serde(default)]
    pub ensure: Ensure,
    /// Immutable once created
    pub writer_hostgroup: HostgroupId,
    /// Immutable once created
    pub reader_hostgroup: HostgroupId,
    /// Left unmanaged when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Request `LOAD MYSQL SERVERS TO RUNTIME` when this resource changes
    #[serde(default)]
    pub load_to_runtime: bool,
    /// Request `SAVE MYSQL SERVERS TO DISK` when this resource changes
    #[serde(default)]
    pub save_to_disk: bool,
}

impl ReplicationHostgroup {
    /// Create a present resource with no comment and no commit flags
    pub fn new(writer_hostgroup: HostgroupId, reader_hostgroup: HostgroupId) -> Self {
        Self {
            name: None,
            ensure: Ensure::Present,
            writer_hostgroup,
            reader_hostgroup,
            comment: None,
            load_to_runtime: false,
            save_to_disk: false,
        }
    }

    /// Set an explicit name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Manage the comment column
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the declared presence
    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    /// Declare the pair absent
    pub fn absent(self) -> Self {
        self.with_ensure(Ensure::Absent)
    }

    /// Set the runtime activation flag
    pub fn with_load_to_runtime(mut self, enabled: bool) -> Self {
        self.load_to_runtime = enabled;
        self
    }

    /// Set the disk persistence flag
    pub fn with_save_to_disk(mut self, enabled: bool) -> Self {
        self.save_to_disk = enabled;
        self
    }

    /// Natural key declared by the resource
    pub fn key(&self) -> HostgroupKey {
        HostgroupKey::new(self.writer_hostgroup, self.reader_hostgroup)
    }

    /// Name the resource is matched by
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.key().name())
    }

    /// True if an explicit name disagrees with the declared key
    pub fn has_name_mismatch(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name != self.key().name())
    }
}

/// State of a resource after an operation, consumed instead of re-read from a cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState {
    /// Natural key of the pair
    pub key: HostgroupKey,
    /// Whether the pair exists
    pub ensure: Ensure,
    /// Comment known to be stored, when present
    pub comment: Option<String>,
}

impl ResourceState {
    /// State of an existing pair
    pub fn present(key: HostgroupKey, comment: impl Into<String>) -> Self {
        Self {
            key,
            ensure: Ensure::Present,
            comment: Some(comment.into()),
        }
    }

    /// State of a pair that is gone
    pub fn absent(key: HostgroupKey) -> Self {
        Self {
            key,
            ensure: Ensure::Absent,
            comment: None,
        }
    }

    /// Convergence check after create/destroy
    pub fn exists(&self) -> bool {
        self.ensure == Ensure::Present
    }
}

impl From<&HostgroupPair> for ResourceState {
    fn from(pair: &HostgroupPair) -> Self {
        ResourceState::present(pair.key, pair.comment.clone())
    }
}

/// Which persistence phases a pass should run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitRequest {
    /// Issue `LOAD MYSQL SERVERS TO RUNTIME`
    pub activate: bool,
    /// Issue `SAVE MYSQL SERVERS TO DISK` (after activation)
    pub persist: bool,
}

impl CommitRequest {
    /// Create a request for the given phases
    pub fn new(activate: bool, persist: bool) -> Self {
        Self { activate, persist }
    }

    /// True if no phase is requested
    pub fn is_empty(&self) -> bool {
        !self.activate && !self.persist
    }

    /// Fold in a resource's commit flags
    pub fn merge(&mut self, resource: &ReplicationHostgroup) {
        self.activate |= resource.load_to_runtime;
        self.persist |= resource.save_to_disk;
    }
}

/// Which persistence phases actually ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Runtime load succeeded
    pub activated: bool,
    /// Disk save succeeded
    pub persisted: bool,
}
