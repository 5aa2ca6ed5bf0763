//! Desired-state catalog loading and validation
//!
//! The catalog is a YAML document:
//!
//! ```yaml
//! replication_hostgroups:
//!   - writer_hostgroup: 10
//!     reader_hostgroup: 11
//!     comment: primary
//!     load_to_runtime: true
//!     save_to_disk: true
//!   - writer_hostgroup: 20
//!     reader_hostgroup: 21
//!     ensure: absent
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use proxysql_cfgmgr_common::{CfgMgrError, CfgMgrResult};
use serde::{Deserialize, Serialize};

use crate::types::ReplicationHostgroup;

/// Parsed catalog file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Declared pairs, in application order
    #[serde(default)]
    pub replication_hostgroups: Vec<ReplicationHostgroup>,
}

impl Catalog {
    /// Parse a catalog from YAML text
    pub fn from_yaml(content: &str) -> CfgMgrResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CfgMgrError::invalid_config("catalog", e.to_string()))
    }

    /// Read, parse and validate a catalog file
    pub fn load(path: impl AsRef<Path>) -> CfgMgrResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CfgMgrError::io(path.display().to_string(), e))?;
        let catalog = Self::from_yaml(&content).map_err(|e| match e {
            CfgMgrError::InvalidConfig { message, .. } => {
                CfgMgrError::invalid_config(path.display().to_string(), message)
            }
            other => other,
        })?;
        validate_catalog(&catalog.replication_hostgroups)?;
        Ok(catalog)
    }

    /// Declared pairs
    pub fn resources(&self) -> &[ReplicationHostgroup] {
        &self.replication_hostgroups
    }
}

/// Reject catalogs that would make two resources fight over one pair
pub fn validate_catalog(resources: &[ReplicationHostgroup]) -> CfgMgrResult<()> {
    let mut names = HashSet::new();
    let mut keys = HashSet::new();
    for resource in resources {
        let name = resource.name();
        if !names.insert(name.clone()) {
            return Err(CfgMgrError::invalid_config(
                "name",
                format!("duplicate resource '{}'", name),
            ));
        }
        if !keys.insert(resource.key()) {
            return Err(CfgMgrError::invalid_config(
                "writer_hostgroup/reader_hostgroup",
                format!(
                    "resource '{}' repeats hostgroup pair {}",
                    name,
                    resource.key()
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ensure;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = "\
replication_hostgroups:
  - writer_hostgroup: 10
    reader_hostgroup: 11
    comment: primary
    load_to_runtime: true
    save_to_disk: true
  - writer_hostgroup: 20
    reader_hostgroup: 21
    ensure: absent
";

    #[test]
    fn test_from_yaml() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        assert_eq!(
            catalog.resources(),
            &[
                ReplicationHostgroup::new(10, 11)
                    .with_comment("primary")
                    .with_load_to_runtime(true)
                    .with_save_to_disk(true),
                ReplicationHostgroup::new(20, 21).with_ensure(Ensure::Absent),
            ]
        );
    }

    #[test]
    fn test_from_yaml_empty() {
        assert!(Catalog::from_yaml("{}").unwrap().resources().is_empty());
    }

    #[test]
    fn test_from_yaml_unknown_field() {
        let err = Catalog::from_yaml(
            "replication_hostgroups:\n  - writer_hostgroup: 1\n    reader_hostgroup: 2\n    check_type: read_only\n",
        )
        .unwrap_err();
        assert!(matches!(err, CfgMgrError::InvalidConfig { .. }));
    }

    #[test]
    fn test_from_yaml_bad_ensure() {
        assert!(Catalog::from_yaml(
            "replication_hostgroups:\n  - writer_hostgroup: 1\n    reader_hostgroup: 2\n    ensure: maybe\n",
        )
        .is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.resources().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load("/nonexistent/catalog.yaml").unwrap_err();
        assert!(matches!(err, CfgMgrError::Io { .. }));
    }

    #[test]
    fn test_validate_duplicate_key() {
        let resources = vec![
            ReplicationHostgroup::new(10, 11),
            ReplicationHostgroup::new(10, 11).with_name("primary-pair"),
        ];
        assert!(validate_catalog(&resources).is_err());
    }

    #[test]
    fn test_validate_duplicate_name() {
        let resources = vec![
            ReplicationHostgroup::new(10, 11),
            ReplicationHostgroup::new(12, 13).with_name("10-11"),
        ];
        let err = validate_catalog(&resources).unwrap_err();
        assert!(err.to_string().contains("duplicate resource '10-11'"));
    }

    #[test]
    fn test_validate_ok() {
        let resources = vec![
            ReplicationHostgroup::new(10, 11),
            ReplicationHostgroup::new(11, 10),
        ];
        assert!(validate_catalog(&resources).is_ok());
    }
}
