//! Replication hostgroup configuration manager for ProxySQL
//!
//! Converges the admin table `mysql_replication_hostgroups` onto a declared
//! catalog of writer/reader hostgroup pairs, then optionally loads the
//! result to runtime and saves it to disk.
//!
//! ## Pass
//! 1. Discover every existing pair (one query)
//! 2. Match each catalog resource to a pair by its `<writer>-<reader>` name
//! 3. Insert, update the comment of, or delete pairs as declared
//! 4. `LOAD MYSQL SERVERS TO RUNTIME`, then `SAVE MYSQL SERVERS TO DISK`
//!
//! Pairs the catalog does not mention are never touched.

mod catalog;
mod commands;
mod config;
mod matcher;
mod repl_hg_mgr;
mod repository;
mod tables;
mod types;

pub use catalog::*;
pub use commands::*;
pub use config::*;
pub use matcher::{classify, match_resources, plan, Action, Plan, PlanEntry};
pub use repl_hg_mgr::{PassReport, ReplicationHostgroupMgr, ResourceOutcome};
pub use repository::{parse_rows, Repository};
pub use tables::*;
pub use types::*;
