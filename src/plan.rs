//! Grouping levels and the ordered plan that stacks them.
//!
//! A [`GroupPlan`] maps each grouping alias to its [`GroupLevelSpec`]. The
//! declaration order is the nesting order of the output document, so the plan
//! is backed by an [`IndexMap`] and can only be built from ordered input.
//!
//! ```rust
//! use tabnest::{value, GroupPlan};
//!
//! let plan = GroupPlan::from_raw(&value!({
//!     "country": {"similar_items": ["currency"], "aggregated_property": "cities"},
//!     "city": {}
//! }))
//! .unwrap();
//!
//! let order: Vec<_> = plan.aliases().collect();
//! assert_eq!(order, vec!["country", "city"]);
//! assert!(plan.level(0).unwrap().consolidates());
//! ```

use crate::{Error, Result, Value};
use indexmap::{IndexMap, IndexSet};
use tracing::warn;

const SIMILAR_ITEMS: &str = "similar_items";
const AGGREGATED_PROPERTY: &str = "aggregated_property";

/// One level of a grouping plan.
///
/// Consolidation is on iff `similar_items` is non-empty, in which case
/// `aggregated_property` is always set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLevelSpec {
    group_name: String,
    similar_items: IndexSet<String>,
    aggregated_property: Option<String>,
}

impl GroupLevelSpec {
    /// A plain level that only groups by `group_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if `group_name` is empty.
    pub fn new(group_name: &str) -> Result<Self> {
        Self::try_new(group_name, Vec::new(), None)
    }

    /// A level that promotes `similar_items` onto each bucket and collects the
    /// remaining fields under `aggregated_property`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabnest::GroupLevelSpec;
    ///
    /// let level = GroupLevelSpec::consolidating("order", ["customer"], "lines").unwrap();
    /// assert!(level.consolidates());
    /// assert_eq!(level.aggregated_property(), Some("lines"));
    /// ```
    ///
    /// # Errors
    ///
    /// See [`GroupLevelSpec::try_new`].
    pub fn consolidating<I, S>(
        group_name: &str,
        similar_items: I,
        aggregated_property: &str,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::try_new(
            group_name,
            similar_items.into_iter().map(Into::into).collect(),
            Some(aggregated_property.to_string()),
        )
    }

    /// Validates and builds a level from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if `group_name` is empty, if a similar
    /// item or the aggregated property is an empty string, if `similar_items`
    /// is non-empty without an `aggregated_property`, or if the aggregated
    /// property is itself one of the similar items.
    pub fn try_new(
        group_name: &str,
        similar_items: Vec<String>,
        aggregated_property: Option<String>,
    ) -> Result<Self> {
        if group_name.is_empty() {
            return Err(Error::definition("Group name must be a non-empty string"));
        }
        if similar_items.iter().any(String::is_empty) {
            return Err(Error::definition(format!(
                "Similar items of group '{group_name}' must be non-empty strings"
            )));
        }
        let similar_items: IndexSet<String> = similar_items.into_iter().collect();

        match aggregated_property.as_deref() {
            Some("") => {
                return Err(Error::definition(format!(
                    "Aggregated property of group '{group_name}' must be a non-empty string"
                )));
            }
            Some(property) if similar_items.contains(property) => {
                return Err(Error::definition(format!(
                    "Aggregated property '{property}' of group '{group_name}' is also listed in similar_items"
                )));
            }
            Some(property) if similar_items.is_empty() => {
                warn!(
                    group = group_name,
                    aggregated_property = property,
                    "aggregated_property has no effect without similar_items"
                );
            }
            None if !similar_items.is_empty() => {
                return Err(Error::definition(format!(
                    "If similar_items is defined then aggregated_property must be defined (group '{group_name}')"
                )));
            }
            _ => {}
        }

        Ok(GroupLevelSpec {
            group_name: group_name.to_string(),
            similar_items,
            aggregated_property,
        })
    }

    /// Builds a level from a raw definition object such as
    /// `{"similar_items": ["x"], "aggregated_property": "rest"}`.
    ///
    /// `null` stands for an empty definition. Only the two known fields are
    /// accepted.
    ///
    /// ```rust
    /// use tabnest::{value, GroupLevelSpec};
    ///
    /// let err = GroupLevelSpec::from_raw("city", &value!({"collect_similar": true})).unwrap_err();
    /// assert!(err.to_string().contains("Unknown field 'collect_similar'"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] for unknown or wrongly typed fields and
    /// for any violation reported by [`GroupLevelSpec::try_new`].
    pub fn from_raw(group_name: &str, raw: &Value) -> Result<Self> {
        let fields = match raw {
            Value::Null => return Self::new(group_name),
            Value::Object(fields) => fields,
            other => {
                return Err(Error::definition(format!(
                    "Definition of group '{group_name}' must be an object, found {}",
                    other.kind()
                )));
            }
        };

        let mut similar_items = Vec::new();
        let mut aggregated_property = None;
        for (field, value) in fields {
            match (field.as_str(), value) {
                (SIMILAR_ITEMS, Value::Null) | (AGGREGATED_PROPERTY, Value::Null) => {}
                (SIMILAR_ITEMS, Value::Array(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        match item {
                            Value::String(s) => similar_items.push(s.clone()),
                            other => {
                                return Err(Error::definition(format!(
                                    "Similar item at index {i} of group '{group_name}' must be a string, found {}",
                                    other.kind()
                                )));
                            }
                        }
                    }
                }
                (AGGREGATED_PROPERTY, Value::String(s)) => aggregated_property = Some(s.clone()),
                (SIMILAR_ITEMS, other) => {
                    return Err(Error::definition(format!(
                        "Field '{SIMILAR_ITEMS}' of group '{group_name}' must be a list of strings, found {}",
                        other.kind()
                    )));
                }
                (AGGREGATED_PROPERTY, other) => {
                    return Err(Error::definition(format!(
                        "Field '{AGGREGATED_PROPERTY}' of group '{group_name}' must be a string, found {}",
                        other.kind()
                    )));
                }
                (unknown, _) => {
                    return Err(Error::definition(format!(
                        "Unknown field '{unknown}' in definition of group '{group_name}'"
                    )));
                }
            }
        }

        Self::try_new(group_name, similar_items, aggregated_property)
    }

    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Fields expected to be constant within a bucket, in declaration order.
    #[must_use]
    pub fn similar_items(&self) -> &IndexSet<String> {
        &self.similar_items
    }

    #[must_use]
    pub fn aggregated_property(&self) -> Option<&str> {
        self.aggregated_property.as_deref()
    }

    /// Returns `true` if buckets of this level are consolidated.
    #[must_use]
    pub fn consolidates(&self) -> bool {
        !self.similar_items.is_empty()
    }

    /// Raw definition object accepted by [`GroupLevelSpec::from_raw`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut fields = crate::Record::new();
        if !self.similar_items.is_empty() {
            fields.insert(
                SIMILAR_ITEMS.to_string(),
                Value::Array(self.similar_items.iter().map(|s| Value::from(s.as_str())).collect()),
            );
        }
        if let Some(property) = &self.aggregated_property {
            fields.insert(AGGREGATED_PROPERTY.to_string(), Value::from(property.as_str()));
        }
        Value::Object(fields)
    }
}

/// The ordered, non-empty list of grouping levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    levels: IndexMap<String, GroupLevelSpec>,
}

impl GroupPlan {
    /// Builds a plan from an ordered mapping of alias to level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if the mapping is empty or a key differs
    /// from its level's `group_name`.
    pub fn new(levels: IndexMap<String, GroupLevelSpec>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::definition("Groups cannot be empty"));
        }
        for (alias, level) in &levels {
            if alias != level.group_name() {
                return Err(Error::definition(format!(
                    "Group key '{alias}' does not match its definition's group name '{}'",
                    level.group_name()
                )));
            }
        }
        Ok(GroupPlan { levels })
    }

    /// Builds a plan from levels listed outermost first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if `levels` is empty or two levels group
    /// by the same alias.
    pub fn from_levels(levels: Vec<GroupLevelSpec>) -> Result<Self> {
        let mut mapping = IndexMap::with_capacity(levels.len());
        for level in levels {
            let alias = level.group_name().to_string();
            if mapping.insert(alias.clone(), level).is_some() {
                return Err(Error::definition(format!(
                    "Group '{alias}' is defined more than once"
                )));
            }
        }
        Self::new(mapping)
    }

    /// Builds a plan from the raw `groups` object of a rule definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if `raw` is not an object, is empty, or
    /// holds an invalid level definition.
    pub fn from_raw(raw: &Value) -> Result<Self> {
        let Value::Object(groups) = raw else {
            return Err(Error::definition(format!(
                "Groups must be an ordered object, found {}",
                raw.kind()
            )));
        };

        let mut mapping = IndexMap::with_capacity(groups.len());
        for (group_name, definition) in groups {
            let level = GroupLevelSpec::from_raw(group_name, definition)?;
            mapping.insert(group_name.clone(), level);
        }
        Self::new(mapping)
    }

    /// Number of levels, i.e. the nesting depth of the output.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always `false`: a plan holds at least one level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The outermost level.
    #[must_use]
    pub fn first(&self) -> &GroupLevelSpec {
        &self.levels[0]
    }

    /// Returns the level at `depth` (0 = outermost).
    #[must_use]
    pub fn level(&self, depth: usize) -> Option<&GroupLevelSpec> {
        self.levels.get_index(depth).map(|(_, level)| level)
    }

    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&GroupLevelSpec> {
        self.levels.get(alias)
    }

    #[must_use]
    pub fn contains(&self, alias: &str) -> bool {
        self.levels.contains_key(alias)
    }

    /// Grouping aliases, outermost first.
    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.levels.keys().map(String::as_str)
    }

    /// (alias, level) pairs, outermost first.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, GroupLevelSpec> {
        self.levels.iter()
    }

    /// Raw `groups` object accepted by [`GroupPlan::from_raw`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.levels
                .iter()
                .map(|(alias, level)| (alias.clone(), level.to_value()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a GroupPlan {
    type Item = (&'a String, &'a GroupLevelSpec);
    type IntoIter = indexmap::map::Iter<'a, String, GroupLevelSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}
