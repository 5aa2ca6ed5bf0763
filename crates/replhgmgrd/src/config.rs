//! Configuration file support for replhgmgrd
//!
//! Loads daemon settings from TOML. Default location:
//! /etc/proxysql/replhgmgrd.conf

use std::fs;
use std::path::{Path, PathBuf};

use proxysql_cfgmgr_common::{admin, exec::MYSQL_CMD, CfgMgrError, CfgMgrResult, FailurePolicy};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/proxysql/replhgmgrd.conf";

/// How to reach the admin interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// `mysql` client binary
    #[serde(default = "default_mysql_binary")]
    pub mysql_binary: PathBuf,

    /// Option file with admin credentials; overrides the `.my.cnf` lookup
    #[serde(default)]
    pub defaults_file: Option<PathBuf>,

    /// Home directory searched for `.my.cnf`
    #[serde(default = "default_root_home")]
    pub root_home: PathBuf,
}

/// Pass behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// What happens after a resource fails
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Complete replhgmgrd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MgrConfig {
    /// mysql client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Pass settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

fn default_mysql_binary() -> PathBuf {
    PathBuf::from(MYSQL_CMD)
}

fn default_root_home() -> PathBuf {
    PathBuf::from("/root")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mysql_binary: default_mysql_binary(),
            defaults_file: None,
            root_home: default_root_home(),
        }
    }
}

impl MgrConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> CfgMgrResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content).map_err(|e| {
                    CfgMgrError::invalid_config(
                        path.display().to_string(),
                        format!("failed to parse config file: {}", e),
                    )
                })?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(CfgMgrError::io(path.display().to_string(), e)),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CfgMgrResult<()> {
        if self.client.mysql_binary.as_os_str().is_empty() {
            return Err(CfgMgrError::invalid_config(
                "client.mysql_binary",
                "must not be empty",
            ));
        }
        if let Some(path) = &self.client.defaults_file {
            if path.as_os_str().is_empty() {
                return Err(CfgMgrError::invalid_config(
                    "client.defaults_file",
                    "must not be empty when set",
                ));
            }
        }
        Ok(())
    }

    /// Credentials file the client will be pointed at, if any
    pub fn resolved_defaults_file(&self) -> Option<PathBuf> {
        admin::resolve_defaults_file(self.client.defaults_file.as_deref(), &self.client.root_home)
    }
}
