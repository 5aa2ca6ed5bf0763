//! In-memory stand-in for the ProxySQL admin interface
//!
//! [`FakeAdminStore`] holds `mysql_replication_hostgroups` rows in insertion
//! order and interprets statements from their template and typed
//! parameters. It enforces the same constraints as the real table:
//! `writer_hostgroup` is the primary key, `reader_hostgroup` is unique and
//! must differ from the writer.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use proxysql_cfgmgr_common::{AdminSession, CfgMgrError, CfgMgrResult, SqlValue, Statement};

use crate::fixtures::batch_row;

/// One row of the fake table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    /// Writer hostgroup column
    pub writer_hostgroup: u32,
    /// Reader hostgroup column
    pub reader_hostgroup: u32,
    /// Comment column
    pub comment: String,
}

impl StoredRow {
    /// Create a row
    pub fn new(writer: u32, reader: u32, comment: impl Into<String>) -> Self {
        Self {
            writer_hostgroup: writer,
            reader_hostgroup: reader,
            comment: comment.into(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    rows: Vec<StoredRow>,
    runtime: Option<Vec<StoredRow>>,
    disk: Option<Vec<StoredRow>>,
    log: Vec<String>,
    failures: Vec<String>,
    raw_discovery: Option<String>,
}

/// Fake admin interface recording every statement it runs
#[derive(Debug, Default)]
pub struct FakeAdminStore {
    state: Mutex<StoreState>,
}

impl FakeAdminStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with rows already in the table
    pub fn with_rows(rows: impl IntoIterator<Item = StoredRow>) -> Self {
        let store = Self::new();
        store.lock().rows = rows.into_iter().collect();
        store
    }

    /// Make every statement whose text starts with `prefix` fail like a
    /// non-zero client exit
    pub fn fail_on(self, prefix: impl Into<String>) -> Self {
        self.lock().failures.push(prefix.into());
        self
    }

    /// Answer discovery with this text instead of the stored rows
    pub fn with_raw_discovery(self, raw: impl Into<String>) -> Self {
        self.lock().raw_discovery = Some(raw.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current table contents, in insertion order
    pub fn rows(&self) -> Vec<StoredRow> {
        self.lock().rows.clone()
    }

    /// Row with the given key, if stored
    pub fn row(&self, writer: u32, reader: u32) -> Option<StoredRow> {
        self.lock()
            .rows
            .iter()
            .find(|r| r.writer_hostgroup == writer && r.reader_hostgroup == reader)
            .cloned()
    }

    /// Rows as of the last `LOAD MYSQL SERVERS TO RUNTIME`
    pub fn runtime_rows(&self) -> Option<Vec<StoredRow>> {
        self.lock().runtime.clone()
    }

    /// Rows as of the last `SAVE MYSQL SERVERS TO DISK`
    pub fn disk_rows(&self) -> Option<Vec<StoredRow>> {
        self.lock().disk.clone()
    }

    /// Every statement run so far, bound, in order
    pub fn statements(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    /// Statements other than discovery
    pub fn write_statements(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|s| !s.starts_with("SELECT"))
            .collect()
    }

    /// Forget the statement log, keeping the table
    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    fn apply(state: &mut StoreState, statement: &Statement) -> CfgMgrResult<String> {
        let sql = statement.sql();
        let params = statement.params();

        if sql.starts_with("SELECT") {
            if let Some(raw) = &state.raw_discovery {
                return Ok(raw.clone());
            }
            return Ok(state
                .rows
                .iter()
                .map(|r| batch_row(r.writer_hostgroup, r.reader_hostgroup, &r.comment))
                .collect());
        }
        if sql.starts_with("INSERT") {
            let row = StoredRow::new(int(params, 0)?, int(params, 1)?, text(params, 2)?);
            check_constraints(&state.rows, &row)?;
            state.rows.push(row);
            return Ok(String::new());
        }
        if sql.starts_with("DELETE") {
            let (w, r) = (int(params, 0)?, int(params, 1)?);
            state
                .rows
                .retain(|row| !(row.writer_hostgroup == w && row.reader_hostgroup == r));
            return Ok(String::new());
        }
        if sql.starts_with("UPDATE") {
            let comment = text(params, 0)?;
            let (w, r) = (int(params, 1)?, int(params, 2)?);
            for row in state
                .rows
                .iter_mut()
                .filter(|row| row.writer_hostgroup == w && row.reader_hostgroup == r)
            {
                row.comment = comment.clone();
            }
            return Ok(String::new());
        }
        if sql.starts_with("LOAD MYSQL SERVERS TO RUNTIME") {
            state.runtime = Some(state.rows.clone());
            return Ok(String::new());
        }
        if sql.starts_with("SAVE MYSQL SERVERS TO DISK") {
            state.disk = Some(state.runtime.clone().unwrap_or_default());
            return Ok(String::new());
        }
        Err(client_error(format!("ERROR 1045 (28000): unsupported statement '{}'", sql)))
    }
}

#[async_trait]
impl AdminSession for FakeAdminStore {
    async fn run(&self, statement: &Statement) -> CfgMgrResult<String> {
        let bound = statement.bind()?;
        let mut state = self.lock();
        state.log.push(bound.clone());

        if state.failures.iter().any(|prefix| bound.starts_with(prefix)) {
            return Err(client_error("ERROR 2013 (HY000): Lost connection to server"));
        }
        Self::apply(&mut state, statement)
    }
}

fn check_constraints(rows: &[StoredRow], row: &StoredRow) -> CfgMgrResult<()> {
    if row.writer_hostgroup == row.reader_hostgroup {
        return Err(client_error(
            "ERROR 1045 (28000): CHECK constraint failed: mysql_replication_hostgroups",
        ));
    }
    if rows.iter().any(|r| r.writer_hostgroup == row.writer_hostgroup) {
        return Err(client_error(
            "ERROR 1045 (28000): UNIQUE constraint failed: mysql_replication_hostgroups.writer_hostgroup",
        ));
    }
    if rows.iter().any(|r| r.reader_hostgroup == row.reader_hostgroup) {
        return Err(client_error(
            "ERROR 1045 (28000): UNIQUE constraint failed: mysql_replication_hostgroups.reader_hostgroup",
        ));
    }
    Ok(())
}

fn int(params: &[SqlValue], idx: usize) -> CfgMgrResult<u32> {
    params
        .get(idx)
        .and_then(SqlValue::as_int)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| client_error(format!("ERROR 1045 (28000): parameter {} is not a hostgroup", idx)))
}

fn text(params: &[SqlValue], idx: usize) -> CfgMgrResult<String> {
    params
        .get(idx)
        .and_then(SqlValue::as_text)
        .map(str::to_string)
        .ok_or_else(|| client_error(format!("ERROR 1045 (28000): parameter {} is not text", idx)))
}

fn client_error(stderr: impl Into<String>) -> CfgMgrError {
    CfgMgrError::CommandFailed {
        command: "mysql".to_string(),
        exit_code: 1,
        stderr: stderr.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(w: u32, r: u32, c: &str) -> Statement {
        Statement::exec("INSERT INTO `mysql_replication_hostgroups` VALUES (?, ?, ?)")
            .param(w)
            .param(r)
            .param(c)
    }

    #[tokio::test]
    async fn test_insert_and_select() {
        let store = FakeAdminStore::new();
        store.run(&insert(10, 11, "a\tb")).await.unwrap();

        let out = store
            .run(&Statement::new("SELECT * FROM `mysql_replication_hostgroups`"))
            .await
            .unwrap();

        assert_eq!(out, "10\t11\ta\\tb\n");
        assert_eq!(store.statements().len(), 2);
    }

    #[tokio::test]
    async fn test_constraints() {
        let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "")]);
        assert!(store.run(&insert(10, 12, "")).await.is_err());
        assert!(store.run(&insert(12, 11, "")).await.is_err());
        assert!(store.run(&insert(13, 13, "")).await.is_err());
        assert!(store.run(&insert(12, 13, "")).await.is_ok());
        assert_eq!(store.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_is_logged() {
        let store = FakeAdminStore::new().fail_on("INSERT");
        let err = store.run(&insert(10, 11, "")).await.unwrap_err();
        assert!(matches!(err, CfgMgrError::CommandFailed { exit_code: 1, .. }));
        assert_eq!(store.statements().len(), 1);
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_runtime_and_disk_snapshots() {
        let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "x")]);
        store
            .run(&Statement::new("SAVE MYSQL SERVERS TO DISK"))
            .await
            .unwrap();
        assert_eq!(store.disk_rows(), Some(vec![]));

        store
            .run(&Statement::new("LOAD MYSQL SERVERS TO RUNTIME"))
            .await
            .unwrap();
        store
            .run(&Statement::new("SAVE MYSQL SERVERS TO DISK"))
            .await
            .unwrap();
        assert_eq!(store.disk_rows(), Some(vec![StoredRow::new(10, 11, "x")]));
    }
}
