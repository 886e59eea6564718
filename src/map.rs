//! Ordered record type.
//!
//! [`Record`] is a thin wrapper around [`IndexMap`] holding one row of tabular
//! data, one object of a raw rule definition, or one node of a grouped
//! document. Field order is insertion order, and removing a field keeps the
//! relative order of the others, so grouped output is deterministic.
//!
//! ## Examples
//!
//! ```rust
//! use tabnest::{Record, Value};
//!
//! let mut row = Record::new();
//! row.insert("name".to_string(), Value::from("Alice"));
//! row.insert("city".to_string(), Value::from("Paris"));
//!
//! assert_eq!(row.len(), 2);
//! assert_eq!(row.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// An insertion-ordered map of field names to values.
///
/// # Examples
///
/// ```rust
/// use tabnest::{Record, Value};
///
/// let mut row = Record::new();
/// row.insert("first".to_string(), Value::from("1"));
/// row.insert("second".to_string(), Value::from("2"));
/// row.insert("third".to_string(), Value::from("3"));
///
/// row.remove("second");
/// let keys: Vec<_> = row.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "third"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(IndexMap<String, crate::Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Record(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Record(IndexMap::with_capacity(capacity))
    }

    /// Inserts a field. An existing field keeps its position and the old value is returned.
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.0.get(key)
    }

    /// Removes `key`, shifting later fields so the remaining order is preserved.
    pub fn remove(&mut self, key: &str) -> Option<crate::Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the field names, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, crate::Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, crate::Value> {
        self.0.values()
    }

    /// Returns an iterator over the field/value pairs, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, crate::Value> {
        self.0.iter()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter())
    }
}

impl From<HashMap<String, crate::Value>> for Record {
    fn from(map: HashMap<String, crate::Value>) -> Self {
        Record(map.into_iter().collect())
    }
}

impl From<Record> for HashMap<String, crate::Value> {
    fn from(record: Record) -> Self {
        record.0.into_iter().collect()
    }
}

impl IntoIterator for Record {
    type Item = (String, crate::Value);
    type IntoIter = indexmap::map::IntoIter<String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a crate::Value);
    type IntoIter = indexmap::map::Iter<'a, String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, crate::Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, crate::Value)>>(iter: T) -> Self {
        Record(IndexMap::from_iter(iter))
    }
}
