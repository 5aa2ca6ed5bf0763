//! Discovery of existing replication hostgroup pairs
//!
//! A [`Repository`] is the pass-scoped view of what the admin table holds.
//! It is rebuilt by every pass and loses an entry as soon as a mutation
//! touches that key.

use std::collections::HashSet;

use proxysql_cfgmgr_common::{AdminSession, CfgMgrError, CfgMgrResult};
use tracing::{debug, instrument};

use crate::commands::build_discover_stmt;
use crate::tables::{columns, DISCOVERY_COLUMN_COUNT};
use crate::types::{HostgroupId, HostgroupKey, HostgroupPair};

/// Pairs discovered at the start of a pass, in the order the store returned them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    pairs: Vec<HostgroupPair>,
}

impl Repository {
    /// Build a repository from already-known pairs
    pub fn from_pairs(pairs: Vec<HostgroupPair>) -> Self {
        Self { pairs }
    }

    /// Query the admin table and parse every row
    #[instrument(skip(session))]
    pub async fn discover<S: AdminSession + ?Sized>(session: &S) -> CfgMgrResult<Self> {
        let raw = session.run(&build_discover_stmt()).await?;
        let pairs = parse_rows(&raw)?;
        debug!("Discovered {} replication hostgroup pairs", pairs.len());
        Ok(Self { pairs })
    }

    /// Discovered pairs still held
    pub fn pairs(&self) -> &[HostgroupPair] {
        &self.pairs
    }

    /// Number of pairs held
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if nothing is held
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Find the pair whose derived name equals `name`
    pub fn get_by_name(&self, name: &str) -> Option<&HostgroupPair> {
        self.pairs.iter().find(|pair| pair.name() == name)
    }

    /// Find the pair with natural key `key`
    pub fn get(&self, key: HostgroupKey) -> Option<&HostgroupPair> {
        self.pairs.iter().find(|pair| pair.key == key)
    }

    /// Drop the cached entry for `key`; returns whether one was held
    pub fn invalidate(&mut self, key: HostgroupKey) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|pair| pair.key != key);
        before != self.pairs.len()
    }
}

/// Parse `mysql -NB` output into pairs
///
/// Each row must hold exactly writer, reader and comment separated by tabs.
/// A single trailing newline is not a row.
pub fn parse_rows(raw: &str) -> CfgMgrResult<Vec<HostgroupPair>> {
    let body = raw.strip_suffix('\n').unwrap_or(raw);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for (idx, line) in body.split('\n').enumerate() {
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != DISCOVERY_COLUMN_COUNT {
            return Err(CfgMgrError::parse(
                line_no,
                format!(
                    "expected {} tab-separated fields, found {}",
                    DISCOVERY_COLUMN_COUNT,
                    fields.len()
                ),
            ));
        }

        let writer = parse_hostgroup(fields[0], columns::WRITER_HOSTGROUP, line_no)?;
        let reader = parse_hostgroup(fields[1], columns::READER_HOSTGROUP, line_no)?;
        let pair = HostgroupPair::new(writer, reader, unescape_batch(fields[2]));

        if !seen.insert(pair.key) {
            return Err(CfgMgrError::parse(
                line_no,
                format!("duplicate replication hostgroup pair {}", pair.key),
            ));
        }
        pairs.push(pair);
    }
    Ok(pairs)
}

fn parse_hostgroup(field: &str, column: &str, line_no: usize) -> CfgMgrResult<HostgroupId> {
    field.parse::<HostgroupId>().map_err(|e| {
        CfgMgrError::parse(line_no, format!("invalid {} '{}': {}", column, field, e))
    })
}

/// Undo the escaping batch mode applies to column values
fn unescape_batch(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
