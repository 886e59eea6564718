//! Error types for rule construction and grouping runs.
//!
//! Errors fall into two families:
//!
//! - **Definition errors** happen while a [`Rule`](crate::Rule) or one of its
//!   clauses is being built. A value that failed validation never exists, so an
//!   engine can never be created from an inconsistent rule.
//! - **Runtime errors** abort a grouping run. There is no partial result and no
//!   retry; the caller decides whether to run again.
//!
//! ## Examples
//!
//! ```rust
//! use tabnest::{Column, Error, ProjectionClause};
//!
//! let columns = vec![Column::new("id").unwrap(), Column::new("id").unwrap()];
//! let err = ProjectionClause::new(columns).unwrap_err();
//! assert!(matches!(err, Error::Definition(_)));
//! assert!(err.to_string().contains("Duplicated names: {id}"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while defining rules or grouping rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed column, projection, group level, plan or rule
    #[error("Definition error: {0}")]
    Definition(String),

    /// Unknown key passed to a projection lookup
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// A row does not line up with the projection or lacks a grouping key
    #[error("Row {row} does not correlate with the rule: {msg}")]
    RowCorrelation { row: usize, msg: String },

    /// The row source produced no records
    #[error("There is no data in the row source")]
    EmptyInput,

    /// Two records of one bucket disagree on a consolidated field
    #[error(
        "Cannot combine similar items for column alias '{field}': found different values '{first}' and '{second}'"
    )]
    ConsolidationConflict {
        field: String,
        first: String,
        second: String,
    },

    /// IO error while opening or reading a row source
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed delimited input
    #[error("CSV error: {0}")]
    Csv(String),
}

impl Error {
    /// Creates a definition error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabnest::Error;
    ///
    /// let err = Error::definition("Groups cannot be empty");
    /// assert_eq!(err.to_string(), "Definition error: Groups cannot be empty");
    /// ```
    pub fn definition<T: fmt::Display>(msg: T) -> Self {
        Error::Definition(msg.to_string())
    }

    /// Creates a lookup error for an unknown projection key.
    pub fn lookup<T: fmt::Display>(msg: T) -> Self {
        Error::Lookup(msg.to_string())
    }

    /// Creates a correlation error for the row at `row` (zero-based).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabnest::Error;
    ///
    /// let err = Error::row_correlation(3, "missing columns: [name]");
    /// assert!(err.to_string().contains("Row 3"));
    /// ```
    pub fn row_correlation<T: fmt::Display>(row: usize, msg: T) -> Self {
        Error::RowCorrelation {
            row,
            msg: msg.to_string(),
        }
    }

    /// Creates a consolidation conflict naming the field and both values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabnest::Error;
    ///
    /// let err = Error::consolidation_conflict("city", "Paris", "Rome");
    /// let msg = err.to_string();
    /// assert!(msg.contains("'city'"));
    /// assert!(msg.contains("'Paris' and 'Rome'"));
    /// ```
    pub fn consolidation_conflict(field: &str, first: &str, second: &str) -> Self {
        Error::ConsolidationConflict {
            field: field.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Creates an I/O error for source opening/reading failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates an error for malformed delimited input.
    pub fn csv(msg: &str) -> Self {
        Error::Csv(msg.to_string())
    }

    /// Returns `true` for errors raised while building a rule.
    #[must_use]
    pub const fn is_definition(&self) -> bool {
        matches!(self, Error::Definition(_))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            Error::Io(err.to_string())
        } else {
            Error::Csv(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::EmptyInput.to_string(),
            "There is no data in the row source"
        );
        assert_eq!(
            Error::lookup("Cannot retrieve column 'x'").to_string(),
            "Lookup error: Cannot retrieve column 'x'"
        );
        assert!(Error::io("denied").to_string().starts_with("IO error"));
    }

    #[test]
    fn test_is_definition() {
        assert!(Error::definition("bad").is_definition());
        assert!(!Error::EmptyInput.is_definition());
    }
}
