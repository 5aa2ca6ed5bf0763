//! Admin table and column names for replhgmgrd

/// Replication hostgroup table in the ProxySQL admin interface
pub const ADMIN_REPLICATION_HOSTGROUPS_TABLE: &str = "mysql_replication_hostgroups";

/// Column names of `mysql_replication_hostgroups`
pub mod columns {
    /// Hostgroup receiving writes
    pub const WRITER_HOSTGROUP: &str = "writer_hostgroup";

    /// Hostgroup receiving reads
    pub const READER_HOSTGROUP: &str = "reader_hostgroup";

    /// Free-form comment
    pub const COMMENT: &str = "comment";
}

/// Number of columns returned by the discovery query
pub const DISCOVERY_COLUMN_COUNT: usize = 3;

/// Separator between the hostgroups in a resource name
pub const NAME_SEPARATOR: char = '-';
