//! Table name validation
//!
//! The students table is configurable, and an identifier cannot be bound as
//! a query parameter, so it is checked once here and then interpolated.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// PostgreSQL truncates identifiers beyond NAMEDATALEN - 1
const MAX_TABLE_NAME_LEN: usize = 63;

/// Unquoted identifier: letter or underscore, then letters, digits, underscores
static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid identifier regex")
});

/// Validated, unquoted SQL table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Create a table name, validating identifier format.
    ///
    /// # Example
    /// ```
    /// use edutecno_server::models::TableName;
    ///
    /// assert!(TableName::new("alumnos").is_ok());
    /// assert!(TableName::new("alumnos; DROP TABLE x").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "table name" });
        }

        if s.len() > MAX_TABLE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "table name",
                max: MAX_TABLE_NAME_LEN,
            });
        }

        if !IDENT_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "table name",
                reason: "must be letters, digits and underscores, not starting with a digit",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self("alumnos".to_owned())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
