//! Verification helpers for testing configuration managers
//!
//! Provides assertion helpers over the fake store's table contents and
//! statement log

use thiserror::Error;

use crate::store::{FakeAdminStore, StoredRow};

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected pair {writer}-{reader} not found in the admin table")]
    RowNotFound { writer: u32, reader: u32 },

    #[error("Pair {writer}-{reader} unexpectedly present in the admin table")]
    UnexpectedRow { writer: u32, reader: u32 },

    #[error("Comment mismatch for {writer}-{reader}: expected '{expected}', got '{actual}'")]
    CommentMismatch {
        writer: u32,
        reader: u32,
        expected: String,
        actual: String,
    },

    #[error("Expected a statement matching '{expected}', log was {log:?}")]
    StatementMissing { expected: String, log: Vec<String> },

    #[error("Statement matching '{unexpected}' should not have run")]
    StatementUnexpected { unexpected: String },

    #[error("Expected {expected} statements, found {actual}")]
    StatementCountMismatch { expected: usize, actual: usize },

    #[error("Expected '{first}' before '{second}', log was {log:?}")]
    OrderViolation {
        first: String,
        second: String,
        log: Vec<String>,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Admin table verification helper
pub struct TableVerifier<'a> {
    store: &'a FakeAdminStore,
}

impl<'a> TableVerifier<'a> {
    /// Create a verifier over `store`
    pub fn new(store: &'a FakeAdminStore) -> Self {
        Self { store }
    }

    fn find(&self, writer: u32, reader: u32) -> VerifyResult<StoredRow> {
        self.store
            .row(writer, reader)
            .ok_or(VerificationError::RowNotFound { writer, reader })
    }

    /// Verify that a pair exists
    pub fn assert_row_exists(&self, writer: u32, reader: u32) -> VerifyResult<()> {
        self.find(writer, reader).map(|_| ())
    }

    /// Verify that a pair does not exist
    pub fn assert_row_absent(&self, writer: u32, reader: u32) -> VerifyResult<()> {
        match self.store.row(writer, reader) {
            Some(_) => Err(VerificationError::UnexpectedRow { writer, reader }),
            None => Ok(()),
        }
    }

    /// Verify a pair's comment
    pub fn assert_comment(&self, writer: u32, reader: u32, expected: &str) -> VerifyResult<()> {
        let row = self.find(writer, reader)?;
        if row.comment != expected {
            return Err(VerificationError::CommentMismatch {
                writer,
                reader,
                expected: expected.to_string(),
                actual: row.comment,
            });
        }
        Ok(())
    }
}

/// Statement log verifier
pub struct StatementVerifier {
    captured: Vec<String>,
}

impl StatementVerifier {
    /// Create a verifier over bound statements
    pub fn new(captured: Vec<String>) -> Self {
        Self { captured }
    }

    /// Verify only the statements that change state
    pub fn writes_of(store: &FakeAdminStore) -> Self {
        Self::new(store.write_statements())
    }

    fn position(&self, needle: &str) -> Option<usize> {
        self.captured.iter().position(|s| s.contains(needle))
    }

    /// Verify that a statement containing `expected` ran
    pub fn assert_executed(&self, expected: &str) -> VerifyResult<()> {
        match self.position(expected) {
            Some(_) => Ok(()),
            None => Err(VerificationError::StatementMissing {
                expected: expected.to_string(),
                log: self.captured.clone(),
            }),
        }
    }

    /// Verify that no statement containing `unexpected` ran
    pub fn assert_not_executed(&self, unexpected: &str) -> VerifyResult<()> {
        match self.position(unexpected) {
            Some(_) => Err(VerificationError::StatementUnexpected {
                unexpected: unexpected.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Verify the number of statements
    pub fn assert_count(&self, expected: usize) -> VerifyResult<()> {
        let actual = self.captured.len();
        if actual != expected {
            return Err(VerificationError::StatementCountMismatch { expected, actual });
        }
        Ok(())
    }

    /// Verify that `first` ran, `second` ran, and every `first` precedes every `second`
    pub fn assert_order(&self, first: &str, second: &str) -> VerifyResult<()> {
        self.assert_executed(first)?;
        self.assert_executed(second)?;
        let last_first = self.captured.iter().rposition(|s| s.contains(first));
        let first_second = self.position(second);
        match (last_first, first_second) {
            (Some(a), Some(b)) if a < b => Ok(()),
            _ => Err(VerificationError::OrderViolation {
                first: first.to_string(),
                second: second.to_string(),
                log: self.captured.clone(),
            }),
        }
    }

    /// Statements being verified
    pub fn captured(&self) -> &[String] {
        &self.captured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_verifier() {
        let verifier = StatementVerifier::new(vec![
            "INSERT INTO `mysql_replication_hostgroups` VALUES (10, 11, '')".to_string(),
            "LOAD MYSQL SERVERS TO RUNTIME".to_string(),
            "SAVE MYSQL SERVERS TO DISK".to_string(),
        ]);

        assert!(verifier.assert_executed("INSERT").is_ok());
        assert!(verifier.assert_not_executed("DELETE").is_ok());
        assert!(verifier.assert_count(3).is_ok());
        assert!(verifier.assert_order("INSERT", "LOAD").is_ok());
        assert!(verifier.assert_order("LOAD", "SAVE").is_ok());

        assert!(verifier.assert_order("SAVE", "LOAD").is_err());
        assert!(verifier.assert_count(2).is_err());
        assert!(verifier.assert_executed("UPDATE").is_err());
    }

    #[test]
    fn test_table_verifier() {
        let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "primary")]);
        let verifier = TableVerifier::new(&store);

        assert!(verifier.assert_row_exists(10, 11).is_ok());
        assert!(verifier.assert_comment(10, 11, "primary").is_ok());
        assert!(verifier.assert_row_absent(20, 21).is_ok());

        assert!(verifier.assert_comment(10, 11, "replica").is_err());
        assert!(verifier.assert_row_exists(20, 21).is_err());
    }
}
