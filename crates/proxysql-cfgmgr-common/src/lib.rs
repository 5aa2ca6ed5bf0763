//! Common infrastructure for ProxySQL configuration manager daemons.
//!
//! This crate provides shared functionality for managers that converge a
//! ProxySQL admin table onto a declared catalog (replhgmgrd and friends):
//!
//! - [`exec`]: External command execution without a shell
//! - [`statement`]: Parameterized statements and literal binding
//! - [`admin`]: Admin interface sessions over the `mysql` client
//! - [`CfgMgr`]: Base trait for config managers
//! - [`error`]: Error types for cfgmgr operations
//!
//! # Architecture
//!
//! Configuration managers follow this pattern:
//!
//! 1. Read the current rows of their admin table (one query)
//! 2. Match each declared resource to a row by natural key
//! 3. Issue one insert/update/delete per resource needing change
//! 4. Load the staged table to runtime and save it to disk, if asked
//!
//! # Example
//!
//! ```ignore
//! use proxysql_cfgmgr_common::{
//!     admin::{AdminClient, AdminSession},
//!     exec::ProcessExecutor,
//!     statement::Statement,
//!     error::CfgMgrResult,
//! };
//!
//! async fn activate() -> CfgMgrResult<()> {
//!     let client = AdminClient::new(ProcessExecutor::default());
//!     client.run(&Statement::new("LOAD MYSQL SERVERS TO RUNTIME")).await?;
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod error;
pub mod exec;
pub mod manager;
pub mod statement;

// Re-export commonly used items at crate root
pub use admin::{AdminClient, AdminSession};
pub use error::{CfgMgrError, CfgMgrResult, Operation};
pub use exec::{CommandExecutor, ProcessExecutor};
pub use manager::{CfgMgr, FailurePolicy, RunMode};
pub use statement::{SqlValue, Statement, StatementMode};
