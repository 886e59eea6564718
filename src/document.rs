//! The grouped output tree.
//!
//! A run produces a [`GroupedDocument`]: an ordered mapping from first-level
//! bucket value to [`GroupNode`]. Every node owns its children, so sibling
//! branches never alias each other. Serializing a document yields the nested
//! JSON shape:
//!
//! - a grouped level is an object of bucket value → child node,
//! - a consolidated bucket is an object holding its similar fields followed by
//!   the aggregated property, whose value is the next level (or the leaf list),
//! - the final level is a list of residual records.

use crate::{Record, Value};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// One node of the grouped tree.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupNode {
    /// Leaf list of residual records.
    Records(Vec<Record>),
    /// Sub-buckets keyed by the next level's group value, in first-seen order.
    Buckets(IndexMap<String, GroupNode>),
    /// A consolidated bucket: shared attributes plus the remainder one level down.
    Consolidated {
        attributes: Record,
        aggregated_property: String,
        inner: Box<GroupNode>,
    },
}

impl GroupNode {
    #[must_use]
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            GroupNode::Records(records) => Some(records),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_buckets(&self) -> Option<&IndexMap<String, GroupNode>> {
        match self {
            GroupNode::Buckets(buckets) => Some(buckets),
            _ => None,
        }
    }

    /// Consolidated attributes of this node, if it is consolidated.
    #[must_use]
    pub fn attributes(&self) -> Option<&Record> {
        match self {
            GroupNode::Consolidated { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    #[must_use]
    pub fn aggregated_property(&self) -> Option<&str> {
        match self {
            GroupNode::Consolidated {
                aggregated_property,
                ..
            } => Some(aggregated_property),
            _ => None,
        }
    }

    /// The node below a consolidated node's aggregated property.
    #[must_use]
    pub fn inner(&self) -> Option<&GroupNode> {
        match self {
            GroupNode::Consolidated { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// Follows `key` one step down: a bucket value, or the aggregated property
    /// of a consolidated node.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&GroupNode> {
        match self {
            GroupNode::Buckets(buckets) => buckets.get(key),
            GroupNode::Consolidated {
                aggregated_property,
                inner,
                ..
            } if aggregated_property == key => Some(inner),
            _ => None,
        }
    }

    /// Total number of leaf records below this node.
    #[must_use]
    pub fn record_count(&self) -> usize {
        match self {
            GroupNode::Records(records) => records.len(),
            GroupNode::Buckets(buckets) => buckets.values().map(GroupNode::record_count).sum(),
            GroupNode::Consolidated { inner, .. } => inner.record_count(),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        self.clone().into_value()
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            GroupNode::Records(records) => {
                Value::Array(records.into_iter().map(Value::Object).collect())
            }
            GroupNode::Buckets(buckets) => Value::Object(
                buckets
                    .into_iter()
                    .map(|(key, node)| (key, node.into_value()))
                    .collect(),
            ),
            GroupNode::Consolidated {
                mut attributes,
                aggregated_property,
                inner,
            } => {
                attributes.insert(aggregated_property, inner.into_value());
                Value::Object(attributes)
            }
        }
    }
}

impl Serialize for GroupNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        match self {
            GroupNode::Records(records) => serializer.collect_seq(records),
            GroupNode::Buckets(buckets) => serializer.collect_map(buckets),
            GroupNode::Consolidated {
                attributes,
                aggregated_property,
                inner,
            } => {
                let mut map = serializer.serialize_map(Some(attributes.len() + 1))?;
                for (k, v) in attributes {
                    map.serialize_entry(k, v)?;
                }
                map.serialize_entry(aggregated_property, inner)?;
                map.end()
            }
        }
    }
}

/// The result of a grouping run.
///
/// # Examples
///
/// ```rust
/// use tabnest::{group_rows, record, value, Rule};
///
/// let rule = Rule::from_raw(&value!({"select": ["a", "b", "c"], "groups": {"a": {}}})).unwrap();
/// let doc = group_rows(
///     &rule,
///     vec![
///         record! { "a": "1", "b": "x", "c": "p" },
///         record! { "a": "1", "b": "x", "c": "q" },
///     ],
/// )
/// .unwrap();
///
/// assert_eq!(doc.len(), 1);
/// assert_eq!(
///     doc.to_value(),
///     value!({"1": [{"b": "x", "c": "p"}, {"b": "x", "c": "q"}]})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedDocument {
    buckets: IndexMap<String, GroupNode>,
}

impl GroupedDocument {
    pub(crate) fn new(buckets: IndexMap<String, GroupNode>) -> Self {
        GroupedDocument { buckets }
    }

    /// Node of the first-level bucket `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&GroupNode> {
        self.buckets.get(key)
    }

    /// Follows a path of bucket values and aggregated property names.
    ///
    /// ```rust
    /// use tabnest::{group_rows, record, value, Rule};
    ///
    /// let rule = Rule::from_raw(&value!({
    ///     "select": ["a", "b", "c"],
    ///     "groups": {"a": {"similar_items": ["c"], "aggregated_property": "rest"}, "b": {}}
    /// }))
    /// .unwrap();
    /// let doc = group_rows(&rule, vec![record! { "a": "1", "b": "x", "c": "p" }]).unwrap();
    ///
    /// let leaf = doc.at(&["1", "rest", "x"]).unwrap();
    /// assert_eq!(leaf.as_records().map(<[_]>::len), Some(1));
    /// ```
    #[must_use]
    pub fn at(&self, path: &[&str]) -> Option<&GroupNode> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.buckets.get(*first)?, |node, key| node.child(key))
    }

    /// Number of first-level buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// First-level bucket values, in first-seen order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, GroupNode> {
        self.buckets.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, GroupNode> {
        self.buckets.iter()
    }

    /// Total number of leaf records in the document.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.buckets.values().map(GroupNode::record_count).sum()
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        self.clone().into_value()
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(
            self.buckets
                .into_iter()
                .map(|(key, node)| (key, node.into_value()))
                .collect(),
        )
    }
}

impl Serialize for GroupedDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(&self.buckets)
    }
}

impl IntoIterator for GroupedDocument {
    type Item = (String, GroupNode);
    type IntoIter = indexmap::map::IntoIter<String, GroupNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_iter()
    }
}

impl From<GroupedDocument> for Value {
    fn from(doc: GroupedDocument) -> Self {
        doc.into_value()
    }
}
