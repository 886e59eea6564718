//! # tabnest
//!
//! Declarative multi-level grouping of flat tabular rows into nested,
//! JSON-serializable documents.
//!
//! ## What does it do?
//!
//! Flat rows (CSV lines, query results) often describe nested data: orders
//! with lines, countries with cities. A [`Rule`] says which columns to keep,
//! how to rename them and which fields to group by, outermost first. The
//! [`GroupingEngine`] applies it and returns a [`GroupedDocument`] whose JSON
//! form nests one object level per grouping field.
//!
//! ## Key Features
//!
//! - **Declarative rules**: a rule is plain data (`select` + `groups`) and can
//!   be read from JSON or embedded in a larger serde configuration
//! - **Column aliasing**: rename source columns before grouping
//! - **Consolidation**: fields that are identical across a bucket are promoted
//!   onto the bucket, and the remainder moves under an aggregated property
//! - **Ordered output**: buckets keep the order in which their values first appear
//! - **Validated up front**: inconsistent rules are rejected before any row is read
//!
//! ## Quick Start
//!
//! ```rust
//! use tabnest::{group_rows, record, to_json_string, Rule};
//!
//! let rule = Rule::from_json(r#"{
//!     "select": ["order_id", {"Customer Name": {"as": "customer"}}, "sku", "qty"],
//!     "groups": {
//!         "order_id": {"similar_items": ["customer"], "aggregated_property": "lines"},
//!         "sku": {}
//!     }
//! }"#)
//! .unwrap();
//!
//! let rows = vec![
//!     record! { "order_id": "o1", "Customer Name": "Ada", "sku": "pen", "qty": "2" },
//!     record! { "order_id": "o1", "Customer Name": "Ada", "sku": "ink", "qty": "1" },
//!     record! { "order_id": "o2", "Customer Name": "Bob", "sku": "pen", "qty": "5" },
//! ];
//!
//! let doc = group_rows(&rule, rows).unwrap();
//! assert_eq!(
//!     to_json_string(&doc).unwrap(),
//!     r#"{"o1":{"customer":"Ada","lines":{"pen":[{"qty":"2"}],"ink":[{"qty":"1"}]}},"o2":{"customer":"Bob","lines":{"pen":[{"qty":"5"}]}}}"#
//! );
//! ```
//!
//! ### Building values with `value!` and `record!`
//!
//! ```rust
//! use tabnest::{record, value, Value};
//!
//! let row = record! { "id": 1, "name": "Ada", "tags": ["x", "y"] };
//! assert_eq!(row.get("name").and_then(Value::as_str), Some("Ada"));
//!
//! let raw = value!({"select": ["id"], "groups": {"id": {}}});
//! assert!(raw.is_object());
//! ```
//!
//! ## Grouping model
//!
//! - **Projection**: each row is renamed by the `select` clause. Fields the
//!   clause does not mention pass through unchanged unless
//!   [`GroupOptions::keep_unselected_fields`] is off.
//! - **Bucketing**: rows are split by the value of the first group field, which
//!   is removed from the records. Each bucket is then split by the next field,
//!   and so on.
//! - **Leaves**: after the last level the remaining records form a list.
//!
//! Any failure aborts the run; no partial document is returned. See [`Error`].
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`csv_grouping.rs`** - Grouping a CSV file with a JSON rule
//! - **`consolidation.rs`** - Promoting shared fields and handling conflicts
//!
//! Run any example with: `cargo run --example <name>`

pub mod document;
pub mod engine;
pub mod error;
pub mod macros;
pub mod map;
pub mod options;
pub mod plan;
pub mod projection;
pub mod rule;
pub mod source;
pub mod value;

pub use document::{GroupNode, GroupedDocument};
pub use engine::GroupingEngine;
pub use error::{Error, Result};
pub use map::Record;
pub use options::{Delimiter, GroupOptions};
pub use plan::{GroupLevelSpec, GroupPlan};
pub use projection::{Column, ColumnKey, ProjectionClause};
pub use rule::Rule;
pub use source::{CsvSource, MemorySource, RowSource, Rows};
pub use value::{Number, Value};

use std::io;
use std::path::Path;

/// Groups in-memory rows with `rule` and default options.
///
/// # Examples
///
/// ```rust
/// use tabnest::{group_rows, record, value, Rule};
///
/// let rule = Rule::from_raw(&value!({"select": ["k", "v"], "groups": {"k": {}}})).unwrap();
/// let doc = group_rows(&rule, vec![record! { "k": "a", "v": "1" }]).unwrap();
/// assert_eq!(doc.to_value(), value!({"a": [{"v": "1"}]}));
/// ```
///
/// # Errors
///
/// Returns an error if `rows` is empty, a row lacks a grouping field, or a
/// bucket disagrees on a consolidated field.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn group_rows<I>(rule: &Rule, rows: I) -> Result<GroupedDocument>
where
    I: IntoIterator<Item = Record>,
{
    GroupingEngine::new(rule.clone()).group_records(rows)
}

/// Reads a comma-separated file with a header line and groups it with the raw
/// rule definition `raw_rule`.
///
/// # Examples
///
/// ```rust
/// use std::io::Write;
/// use tabnest::{group_csv, value};
///
/// let mut file = tempfile::NamedTempFile::new().unwrap();
/// writeln!(file, "country,city\nFR,Paris\nFR,Lyon").unwrap();
///
/// let raw = value!({"select": ["country", "city"], "groups": {"country": {}}});
/// let doc = group_csv(file.path(), &raw).unwrap();
/// assert_eq!(doc.get("FR").unwrap().record_count(), 2);
/// ```
///
/// # Errors
///
/// Returns a definition error for an invalid rule, an I/O or CSV error if the
/// file cannot be read, or any error raised while grouping.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn group_csv<P>(path: P, raw_rule: &Value) -> Result<GroupedDocument>
where
    P: AsRef<Path>,
{
    let rule = Rule::from_raw(raw_rule)?;
    let mut source = CsvSource::from_path(path);
    GroupingEngine::new(rule).run(&mut source)
}

/// Serializes a grouped document to compact JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json_string(doc: &GroupedDocument) -> Result<String> {
    serde_json::to_string(doc).map_err(|e| Error::io(&e.to_string()))
}

/// Serializes a grouped document to indented JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json_string_pretty(doc: &GroupedDocument) -> Result<String> {
    serde_json::to_string_pretty(doc).map_err(|e| Error::io(&e.to_string()))
}

/// Writes a grouped document as compact JSON to `writer`.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json_writer<W>(writer: W, doc: &GroupedDocument) -> Result<()>
where
    W: io::Write,
{
    serde_json::to_writer(writer, doc).map_err(|e| Error::io(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record, value};
    use std::io::Write;

    fn country_rule() -> Rule {
        Rule::from_raw(&value!({
            "select": ["country", "currency", "city"],
            "groups": {
                "country": {"similar_items": ["currency"], "aggregated_property": "cities"},
                "city": {}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_group_rows() {
        let doc = group_rows(
            &country_rule(),
            vec![
                record! { "country": "FR", "currency": "EUR", "city": "Paris" },
                record! { "country": "JP", "currency": "JPY", "city": "Osaka" },
            ],
        )
        .unwrap();
        let keys: Vec<_> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, ["FR", "JP"]);
    }

    #[test]
    fn test_group_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "country,currency,city").unwrap();
        writeln!(file, "FR,EUR,Paris").unwrap();
        writeln!(file, "FR,EUR,Lyon").unwrap();
        file.flush().unwrap();

        let doc = group_csv(file.path(), &country_rule().to_value()).unwrap();
        assert_eq!(
            to_json_string(&doc).unwrap(),
            r#"{"FR":{"currency":"EUR","cities":{"Paris":[{}],"Lyon":[{}]}}}"#
        );
    }

    #[test]
    fn test_group_csv_rejects_bad_rule_before_reading() {
        let raw = value!({"select": ["a"], "groups": {"b": {}}});
        let err = group_csv("/no/such/file.csv", &raw).unwrap_err();
        assert!(err.is_definition());
    }

    #[test]
    fn test_group_csv_empty_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "country,currency,city").unwrap();
        file.flush().unwrap();

        let err = group_csv(file.path(), &country_rule().to_value()).unwrap_err();
        assert_eq!(err, Error::EmptyInput);
    }

    #[test]
    fn test_pretty_and_writer_agree() {
        let doc = group_rows(
            &country_rule(),
            vec![record! { "country": "FR", "currency": "EUR", "city": "Paris" }],
        )
        .unwrap();

        let pretty = to_json_string_pretty(&doc).unwrap();
        assert!(pretty.contains('\n'));

        let mut buffer = Vec::new();
        to_json_writer(&mut buffer, &doc).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), to_json_string(&doc).unwrap());

        let reparsed: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(reparsed, serde_json::to_value(&doc).unwrap());
    }
}
