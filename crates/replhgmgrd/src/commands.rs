//! Admin statement builders for replication hostgroup operations
//!
//! Every value reaches the admin interface through a bound placeholder.

use proxysql_cfgmgr_common::Statement;

use crate::types::HostgroupKey;

/// Lists every replication hostgroup pair, one tab-separated row each
pub const SELECT_REPLICATION_HOSTGROUPS_SQL: &str =
    "SELECT `writer_hostgroup`, `reader_hostgroup`, `comment` FROM `mysql_replication_hostgroups`";

/// Inserts one pair
pub const INSERT_REPLICATION_HOSTGROUP_SQL: &str = "INSERT INTO `mysql_replication_hostgroups` \
     (`writer_hostgroup`, `reader_hostgroup`, `comment`) VALUES (?, ?, ?)";

/// Deletes one pair by natural key
pub const DELETE_REPLICATION_HOSTGROUP_SQL: &str = "DELETE FROM `mysql_replication_hostgroups` \
     WHERE `writer_hostgroup` = ? AND `reader_hostgroup` = ?";

/// Updates the comment of one pair by natural key
pub const UPDATE_REPLICATION_HOSTGROUP_COMMENT_SQL: &str =
    "UPDATE `mysql_replication_hostgroups` SET `comment` = ? \
     WHERE `writer_hostgroup` = ? AND `reader_hostgroup` = ?";

/// Makes staged server configuration live
pub const LOAD_MYSQL_SERVERS_TO_RUNTIME_SQL: &str = "LOAD MYSQL SERVERS TO RUNTIME";

/// Writes the live server configuration to disk
pub const SAVE_MYSQL_SERVERS_TO_DISK_SQL: &str = "SAVE MYSQL SERVERS TO DISK";

/// Build discovery statement
pub fn build_discover_stmt() -> Statement {
    Statement::new(SELECT_REPLICATION_HOSTGROUPS_SQL)
}

/// Build insert statement
///
/// A missing comment is stored as the empty string
pub fn build_insert_stmt(key: HostgroupKey, comment: Option<&str>) -> Statement {
    Statement::exec(INSERT_REPLICATION_HOSTGROUP_SQL)
        .param(key.writer_hostgroup)
        .param(key.reader_hostgroup)
        .param(comment.unwrap_or(""))
}

/// Build delete statement
pub fn build_delete_stmt(key: HostgroupKey) -> Statement {
    Statement::exec(DELETE_REPLICATION_HOSTGROUP_SQL)
        .param(key.writer_hostgroup)
        .param(key.reader_hostgroup)
}

/// Build comment update statement
pub fn build_update_comment_stmt(key: HostgroupKey, comment: &str) -> Statement {
    Statement::exec(UPDATE_REPLICATION_HOSTGROUP_COMMENT_SQL)
        .param(comment)
        .param(key.writer_hostgroup)
        .param(key.reader_hostgroup)
}

/// Build runtime activation statement
pub fn build_load_to_runtime_stmt() -> Statement {
    Statement::new(LOAD_MYSQL_SERVERS_TO_RUNTIME_SQL)
}

/// Build disk persistence statement
pub fn build_save_to_disk_stmt() -> Statement {
    Statement::new(SAVE_MYSQL_SERVERS_TO_DISK_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxysql_cfgmgr_common::StatementMode;

    #[test]
    fn test_build_discover_stmt() {
        let stmt = build_discover_stmt();
        assert_eq!(stmt.mode(), StatementMode::Query);
        assert!(stmt.params().is_empty());
        assert!(stmt.bind().unwrap().contains("FROM `mysql_replication_hostgroups`"));
    }

    #[test]
    fn test_build_insert_stmt() {
        let stmt = build_insert_stmt(HostgroupKey::new(10, 11), Some("primary"));
        assert_eq!(stmt.mode(), StatementMode::Exec);
        assert!(stmt
            .bind()
            .unwrap()
            .ends_with("VALUES (10, 11, 'primary')"));
    }

    #[test]
    fn test_build_insert_stmt_default_comment() {
        let stmt = build_insert_stmt(HostgroupKey::new(10, 11), None);
        assert!(stmt.bind().unwrap().ends_with("VALUES (10, 11, '')"));
    }

    #[test]
    fn test_build_delete_stmt() {
        let stmt = build_delete_stmt(HostgroupKey::new(10, 11));
        assert!(stmt
            .bind()
            .unwrap()
            .ends_with("WHERE `writer_hostgroup` = 10 AND `reader_hostgroup` = 11"));
    }

    #[test]
    fn test_build_update_comment_stmt() {
        let stmt = build_update_comment_stmt(HostgroupKey::new(10, 11), "replica");
        let sql = stmt.bind().unwrap();
        assert!(sql.contains("SET `comment` = 'replica'"));
        assert!(sql.ends_with("`writer_hostgroup` = 10 AND `reader_hostgroup` = 11"));
    }

    #[test]
    fn test_comment_injection_is_quoted() {
        let stmt = build_update_comment_stmt(HostgroupKey::new(1, 2), "x'; DROP TABLE t; --");
        assert!(stmt.bind().unwrap().contains("'x\\'; DROP TABLE t; --'"));
    }

    #[test]
    fn test_commit_stmts() {
        assert_eq!(
            build_load_to_runtime_stmt().bind().unwrap(),
            "LOAD MYSQL SERVERS TO RUNTIME"
        );
        assert_eq!(
            build_save_to_disk_stmt().bind().unwrap(),
            "SAVE MYSQL SERVERS TO DISK"
        );
    }
}
