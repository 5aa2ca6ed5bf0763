//! Parameterized admin statements.
//!
//! Statement templates are fixed `&'static str` SQL with positional `?`
//! placeholders; values never get spliced into the template by callers.
//! [`Statement::bind`] renders the final text by substituting each
//! placeholder with a typed literal: integers in decimal, text as a
//! single-quoted literal escaped the way the MySQL client library escapes
//! string values.
//!
//! # Example
//!
//! ```
//! use proxysql_cfgmgr_common::statement::{Statement, SqlValue};
//!
//! let stmt = Statement::new("UPDATE t SET comment = ? WHERE id = ?")
//!     .param("it's")
//!     .param(7);
//! assert_eq!(stmt.bind().unwrap(), "UPDATE t SET comment = 'it\\'s' WHERE id = 7");
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CfgMgrError, CfgMgrResult};

/// Characters that must be backslash-escaped inside a quoted SQL literal.
static SQL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\\\\'\"\u{0}\n\r\u{1a}]").expect("Invalid regex pattern"));

/// Quotes a string as a MySQL string literal.
///
/// # Example
///
/// ```
/// use proxysql_cfgmgr_common::statement::quote_literal;
///
/// assert_eq!(quote_literal("primary"), "'primary'");
/// assert_eq!(quote_literal("a'b"), "'a\\'b'");
/// ```
pub fn quote_literal(s: &str) -> String {
    let escaped = SQL_ESCAPE_RE.replace_all(s, |caps: &regex::Captures<'_>| {
        match &caps[0] {
            "\u{0}" => "\\0".to_string(),
            "\n" => "\\n".to_string(),
            "\r" => "\\r".to_string(),
            "\u{1a}" => "\\Z".to_string(),
            other => format!("\\{}", other),
        }
    });
    format!("'{}'", escaped)
}

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// Integer column value.
    Int(i64),
    /// Text column value.
    Text(String),
}

impl SqlValue {
    /// Renders the value as a SQL literal.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Text(s) => quote_literal(s),
        }
    }

    /// Returns the integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Text(_) => None,
        }
    }

    /// Returns the text value, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Int(_) => None,
            SqlValue::Text(s) => Some(s),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

/// How the client should present the statement's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementMode {
    /// Tab-separated rows without a header (`-NBe`).
    Query,
    /// Plain execution (`-e`).
    Exec,
}

impl StatementMode {
    /// Returns the client flag that introduces the SQL argument.
    pub fn flag(&self) -> &'static str {
        match self {
            StatementMode::Query => "-NBe",
            StatementMode::Exec => "-e",
        }
    }
}

/// A SQL template plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: &'static str,
    params: Vec<SqlValue>,
    mode: StatementMode,
}

impl Statement {
    /// Creates a statement that produces tabular output.
    pub fn new(sql: &'static str) -> Self {
        Self {
            sql,
            params: Vec::new(),
            mode: StatementMode::Query,
        }
    }

    /// Creates a statement run for its side effect only.
    pub fn exec(sql: &'static str) -> Self {
        Self {
            sql,
            params: Vec::new(),
            mode: StatementMode::Exec,
        }
    }

    /// Appends a positional parameter.
    pub fn param(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Returns the unbound template.
    pub fn sql(&self) -> &'static str {
        self.sql
    }

    /// Returns the bound parameters in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Returns the output mode.
    pub fn mode(&self) -> StatementMode {
        self.mode
    }

    /// Renders the statement text with every placeholder bound.
    pub fn bind(&self) -> CfgMgrResult<String> {
        let placeholders = self.sql.matches('?').count();
        if placeholders != self.params.len() {
            return Err(CfgMgrError::Binding {
                sql: self.sql.to_string(),
                placeholders,
                params: self.params.len(),
            });
        }

        let mut out = String::with_capacity(self.sql.len() + 16 * self.params.len());
        let mut params = self.params.iter();
        for piece in self.sql.split_inclusive('?') {
            match piece.strip_suffix('?') {
                Some(head) => {
                    out.push_str(head);
                    // Counted above, so the iterator cannot run dry here.
                    if let Some(value) = params.next() {
                        out.push_str(&value.to_literal());
                    }
                }
                None => out.push_str(piece),
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql)?;
        if !self.params.is_empty() {
            let rendered: Vec<String> = self.params.iter().map(SqlValue::to_literal).collect();
            write!(f, " [{}]", rendered.join(", "))?;
        }
        Ok(())
    }
}
