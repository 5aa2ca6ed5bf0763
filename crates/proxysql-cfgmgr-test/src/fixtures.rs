//! Test fixtures for replication hostgroup catalogs
//!
//! Provides catalog entries that render to the YAML format replhgmgrd reads,
//! and batch-mode rows for seeding discovery output.

use serde::Serialize;

/// One catalog entry, serialized with only the fields it sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSpec {
    /// Explicit name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `present` or `absent`
    pub ensure: &'static str,
    /// Writer hostgroup
    pub writer_hostgroup: u32,
    /// Reader hostgroup
    pub reader_hostgroup: u32,
    /// Managed comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Runtime activation flag
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub load_to_runtime: bool,
    /// Disk persistence flag
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub save_to_disk: bool,
}

impl ResourceSpec {
    /// A pair that must exist
    pub fn present(writer: u32, reader: u32) -> Self {
        Self {
            name: None,
            ensure: "present",
            writer_hostgroup: writer,
            reader_hostgroup: reader,
            comment: None,
            load_to_runtime: false,
            save_to_disk: false,
        }
    }

    /// A pair that must not exist
    pub fn absent(writer: u32, reader: u32) -> Self {
        Self {
            ensure: "absent",
            ..Self::present(writer, reader)
        }
    }

    /// Set an explicit name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Request both activation and persistence
    pub fn committed(mut self) -> Self {
        self.load_to_runtime = true;
        self.save_to_disk = true;
        self
    }

    /// Request runtime activation
    pub fn with_load_to_runtime(mut self) -> Self {
        self.load_to_runtime = true;
        self
    }

    /// Request disk persistence
    pub fn with_save_to_disk(mut self) -> Self {
        self.save_to_disk = true;
        self
    }
}

#[derive(Serialize)]
struct CatalogDoc<'a> {
    replication_hostgroups: &'a [ResourceSpec],
}

/// Render entries as a catalog document
pub fn catalog_yaml(entries: &[ResourceSpec]) -> String {
    serde_yaml::to_string(&CatalogDoc {
        replication_hostgroups: entries,
    })
    .unwrap_or_else(|e| panic!("catalog fixture does not serialize: {}", e))
}

/// Common topologies
pub mod topologies {
    use super::*;

    /// One primary/replica pair, activated and persisted
    pub fn single_cluster() -> Vec<ResourceSpec> {
        vec![ResourceSpec::present(10, 11)
            .with_comment("primary")
            .committed()]
    }

    /// Three independent clusters
    pub fn three_clusters() -> Vec<ResourceSpec> {
        vec![
            ResourceSpec::present(10, 11).with_comment("orders"),
            ResourceSpec::present(20, 21).with_comment("billing"),
            ResourceSpec::present(30, 31).with_comment("reporting"),
        ]
    }

    /// Retire a cluster
    pub fn decommission(writer: u32, reader: u32) -> Vec<ResourceSpec> {
        vec![ResourceSpec::absent(writer, reader).committed()]
    }
}

/// Render one discovery row the way `mysql -NB` prints it
pub fn batch_row(writer: u32, reader: u32, comment: &str) -> String {
    format!("{}\t{}\t{}\n", writer, reader, escape_batch(comment))
}

/// Apply batch-mode escaping to a column value
pub fn escape_batch(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out
}
