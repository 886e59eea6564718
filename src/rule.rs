//! Grouping rules.
//!
//! A [`Rule`] binds a [`ProjectionClause`] to a [`GroupPlan`] and checks that
//! they agree. It is usually built from a declarative definition:
//!
//! ```rust
//! use tabnest::Rule;
//!
//! let rule = Rule::from_json(r#"{
//!     "select": ["order_id", {"cust": {"as": "customer"}}, "sku", "qty"],
//!     "groups": {
//!         "order_id": {"similar_items": ["customer"], "aggregated_property": "lines"},
//!         "sku": {}
//!     }
//! }"#)
//! .unwrap();
//! assert_eq!(rule.plan().len(), 2);
//! ```
//!
//! ## Definition format
//!
//! - `select`: list of column entries. A bare string selects a column under its
//!   own name; a single-key object `{"name": {"as": "alias"}}` renames it.
//! - `groups`: ordered object of alias → level definition. A level definition
//!   may carry `similar_items` (list of aliases) and `aggregated_property`.
//! - `where`: reserved. Only `null` is accepted since filtering is not supported.

use crate::{Column, Error, GroupPlan, ProjectionClause, Record, Result, Value};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

const SELECT: &str = "select";
const GROUPS: &str = "groups";
const WHERE: &str = "where";
const ALIAS: &str = "as";

/// A validated grouping rule.
///
/// Every plan alias is a projection alias. Every similar item of a level is a
/// projection alias and is not the grouping key of any level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Rule {
    projection: ProjectionClause,
    plan: GroupPlan,
}

impl Rule {
    /// Cross-validates `projection` and `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] naming the offending aliases when the plan
    /// groups by an alias the projection does not produce, or when a level's
    /// similar items are unknown or name a grouping key.
    pub fn new(projection: ProjectionClause, plan: GroupPlan) -> Result<Self> {
        let unknown_groups: Vec<&str> = plan
            .aliases()
            .filter(|alias| !projection.has_alias(alias))
            .collect();
        if !unknown_groups.is_empty() {
            return Err(Error::definition(format!(
                "Groups [{}] do not exist in select clause",
                unknown_groups.join(", ")
            )));
        }

        for (alias, level) in &plan {
            if level.similar_items().contains(alias.as_str()) {
                return Err(Error::definition(format!(
                    "Group '{alias}' cannot list its own key in similar_items"
                )));
            }

            let unknown: BTreeSet<&str> = level
                .similar_items()
                .iter()
                .map(String::as_str)
                .filter(|item| !projection.has_alias(item))
                .collect();
            if !unknown.is_empty() {
                return Err(Error::definition(format!(
                    "Similar items [{}] of group '{alias}' do not exist in select clause",
                    unknown.into_iter().collect::<Vec<_>>().join(", ")
                )));
            }

            let grouping_keys: BTreeSet<&str> = level
                .similar_items()
                .iter()
                .map(String::as_str)
                .filter(|item| plan.contains(item))
                .collect();
            if !grouping_keys.is_empty() {
                return Err(Error::definition(format!(
                    "Similar items [{}] of group '{alias}' are grouping keys of other groups",
                    grouping_keys.into_iter().collect::<Vec<_>>().join(", ")
                )));
            }
        }

        if let Some(last) = plan.level(plan.len() - 1).filter(|l| l.consolidates()) {
            warn!(
                group = last.group_name(),
                "similar_items of the final group have no effect; its buckets stay plain record lists"
            );
        }

        debug!(
            columns = projection.len(),
            levels = plan.len(),
            "grouping rule validated"
        );
        Ok(Rule { projection, plan })
    }

    /// Builds a rule from a raw definition (see the module docs for the format).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] for a malformed definition. Errors about a
    /// `select` entry name the entry's index.
    pub fn from_raw(raw: &Value) -> Result<Self> {
        let Value::Object(definition) = raw else {
            return Err(Error::definition(format!(
                "Rule definition must be an object, found {}",
                raw.kind()
            )));
        };

        for key in definition.keys() {
            match key.as_str() {
                SELECT | GROUPS => {}
                WHERE => {
                    if let Some(clause) = definition.get(WHERE).filter(|v| !v.is_null()) {
                        return Err(Error::definition(format!(
                            "Filtering is not supported: '{WHERE}' must be null, found {}",
                            clause.kind()
                        )));
                    }
                }
                other => {
                    return Err(Error::definition(format!(
                        "Unknown key '{other}' in rule definition"
                    )));
                }
            }
        }

        let select = required(definition, SELECT)?;
        let Value::Array(entries) = select else {
            return Err(Error::definition(format!(
                "'{SELECT}' must be a list of column definitions, found {}",
                select.kind()
            )));
        };
        let columns = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| parse_column(i, entry))
            .collect::<Result<Vec<_>>>()?;

        let projection = ProjectionClause::new(columns)?;
        let plan = GroupPlan::from_raw(required(definition, GROUPS)?)?;
        Self::new(projection, plan)
    }

    /// Parses a JSON rule definition, keeping the declared group order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] for invalid JSON or an invalid definition.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)
            .map_err(|e| Error::definition(format!("Invalid rule JSON: {e}")))?;
        Self::from_raw(&raw)
    }

    #[must_use]
    pub fn projection(&self) -> &ProjectionClause {
        &self.projection
    }

    #[must_use]
    pub fn plan(&self) -> &GroupPlan {
        &self.plan
    }

    /// Raw definition accepted by [`Rule::from_raw`].
    ///
    /// ```rust
    /// use tabnest::{value, Rule};
    ///
    /// let raw = value!({"select": ["a", {"b": {"as": "beta"}}], "groups": {"beta": {}}});
    /// let rule = Rule::from_raw(&raw).unwrap();
    /// assert_eq!(rule.to_value(), raw);
    /// ```
    #[must_use]
    pub fn to_value(&self) -> Value {
        let select = self
            .projection
            .iter()
            .map(|col| {
                if col.is_aliased() {
                    let mut spec = Record::new();
                    spec.insert(ALIAS.to_string(), Value::from(col.alias()));
                    let mut entry = Record::new();
                    entry.insert(col.name().to_string(), Value::Object(spec));
                    Value::Object(entry)
                } else {
                    Value::from(col.name())
                }
            })
            .collect();

        let mut definition = Record::new();
        definition.insert(SELECT.to_string(), Value::Array(select));
        definition.insert(GROUPS.to_string(), self.plan.to_value());
        Value::Object(definition)
    }
}

impl TryFrom<Value> for Rule {
    type Error = Error;

    fn try_from(raw: Value) -> Result<Self> {
        Rule::from_raw(&raw)
    }
}

fn required<'a>(definition: &'a Record, key: &str) -> Result<&'a Value> {
    definition
        .get(key)
        .ok_or_else(|| Error::definition(format!("Rule definition is missing '{key}'")))
}

fn parse_column(index: usize, entry: &Value) -> Result<Column> {
    match entry {
        Value::String(name) => Column::new(name).map_err(|e| at_index(index, e)),
        Value::Object(definition) => {
            if definition.len() != 1 {
                return Err(Error::definition(format!(
                    "Column at index {index} must contain exactly one column definition"
                )));
            }
            let Some((name, spec)) = definition.iter().next() else {
                return Err(Error::definition(format!(
                    "Column at index {index} must contain exactly one column definition"
                )));
            };
            let Value::Object(spec) = spec else {
                return Err(Error::definition(format!(
                    "Column '{name}' at index {index} must map to {{\"{ALIAS}\": alias}}, found {}",
                    spec.kind()
                )));
            };
            if let Some(unknown) = spec.keys().find(|k| k.as_str() != ALIAS) {
                return Err(Error::definition(format!(
                    "Unknown key '{unknown}' for column '{name}' at index {index}"
                )));
            }
            match spec.get(ALIAS) {
                Some(Value::String(alias)) if !alias.is_empty() => {
                    Column::aliased(name, alias).map_err(|e| at_index(index, e))
                }
                _ => Err(Error::definition(format!(
                    "Alias must be defined for column name '{name}' at index {index}"
                ))),
            }
        }
        other => Err(Error::definition(format!(
            "Unknown column definition at index {index}: expected string or object, found {}",
            other.kind()
        ))),
    }
}

fn at_index(index: usize, err: Error) -> Error {
    match err {
        Error::Definition(msg) => Error::definition(format!("Column at index {index}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{value, GroupLevelSpec};

    fn projection(names: &[&str]) -> ProjectionClause {
        ProjectionClause::new(names.iter().map(|n| Column::new(n).unwrap()).collect()).unwrap()
    }

    #[test]
    fn test_group_must_be_selected() {
        let plan = GroupPlan::from_levels(vec![
            GroupLevelSpec::new("a").unwrap(),
            GroupLevelSpec::new("zz").unwrap(),
        ])
        .unwrap();
        let err = Rule::new(projection(&["a", "b"]), plan).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Definition error: Groups [zz] do not exist in select clause"
        );
    }

    #[test]
    fn test_group_uses_alias_not_name() {
        let projection = ProjectionClause::new(vec![Column::aliased("a", "alpha").unwrap()]).unwrap();
        let by_name = GroupPlan::from_levels(vec![GroupLevelSpec::new("a").unwrap()]).unwrap();
        assert!(Rule::new(projection.clone(), by_name).is_err());

        let by_alias = GroupPlan::from_levels(vec![GroupLevelSpec::new("alpha").unwrap()]).unwrap();
        assert!(Rule::new(projection, by_alias).is_ok());
    }

    #[test]
    fn test_similar_items_must_be_selected() {
        let plan = GroupPlan::from_levels(vec![GroupLevelSpec::consolidating(
            "a",
            ["b", "nope", "gone"],
            "rest",
        )
        .unwrap()])
        .unwrap();
        let err = Rule::new(projection(&["a", "b"]), plan).unwrap_err();
        assert!(err.to_string().contains("[gone, nope]"), "{err}");
    }

    #[test]
    fn test_similar_items_cannot_hold_own_group() {
        let plan =
            GroupPlan::from_levels(vec![GroupLevelSpec::consolidating("a", ["a"], "rest").unwrap()])
                .unwrap();
        let err = Rule::new(projection(&["a", "b"]), plan).unwrap_err();
        assert!(err.to_string().contains("its own key"));
    }

    #[test]
    fn test_similar_items_cannot_hold_other_group_keys() {
        let earlier = GroupPlan::from_levels(vec![
            GroupLevelSpec::new("a").unwrap(),
            GroupLevelSpec::consolidating("b", ["a"], "rest").unwrap(),
        ])
        .unwrap();
        assert!(Rule::new(projection(&["a", "b", "c"]), earlier).is_err());

        let later = GroupPlan::from_levels(vec![
            GroupLevelSpec::consolidating("a", ["b"], "rest").unwrap(),
            GroupLevelSpec::new("b").unwrap(),
        ])
        .unwrap();
        let err = Rule::new(projection(&["a", "b", "c"]), later).unwrap_err();
        assert!(err.to_string().contains("grouping keys of other groups"));
    }

    #[test]
    fn test_from_raw_select_forms() {
        let rule = Rule::from_raw(&value!({
            "select": ["colA", {"colB": {"as": "bAlias"}}, "colC", "colD"],
            "where": null,
            "groups": {
                "bAlias": {"similar_items": ["colC"], "aggregated_property": "details"},
                "colD": {}
            }
        }))
        .unwrap();

        assert_eq!(rule.projection().len(), 4);
        assert_eq!(rule.projection().by_name("colB").unwrap().alias(), "bAlias");
        let order: Vec<_> = rule.plan().aliases().collect();
        assert_eq!(order, vec!["bAlias", "colD"]);
    }

    #[test]
    fn test_from_raw_names_offending_index() {
        let cases = [
            (value!({"select": ["a", {"b": {"as": "x"}, "c": {"as": "y"}}], "groups": {"a": {}}}), "index 1"),
            (value!({"select": ["a", "b", {"c": {}}], "groups": {"a": {}}}), "index 2"),
            (value!({"select": [{"c": {"as": ""}}], "groups": {"c": {}}}), "index 0"),
            (value!({"select": ["a", 7], "groups": {"a": {}}}), "index 1"),
            (value!({"select": ["a", ""], "groups": {"a": {}}}), "index 1"),
            (value!({"select": ["a", {"b": "x"}], "groups": {"a": {}}}), "index 1"),
        ];
        for (raw, expected) in cases {
            let err = Rule::from_raw(&raw).unwrap_err();
            assert!(err.is_definition());
            assert!(err.to_string().contains(expected), "{err}");
        }
    }

    #[test]
    fn test_from_raw_top_level_shape() {
        assert!(Rule::from_raw(&value!(["a"])).is_err());
        assert!(Rule::from_raw(&value!({"groups": {"a": {}}})).is_err());
        assert!(Rule::from_raw(&value!({"select": ["a"]})).is_err());
        assert!(Rule::from_raw(&value!({"select": "a", "groups": {"a": {}}})).is_err());
        assert!(Rule::from_raw(&value!({"select": ["a"], "groups": {"a": {}}, "order": []})).is_err());

        let err = Rule::from_raw(&value!({"select": ["a"], "groups": {"a": {}}, "where": "a > 1"}))
            .unwrap_err();
        assert!(err.to_string().contains("Filtering is not supported"));
    }

    #[test]
    fn test_from_json_keeps_group_order() {
        let rule = Rule::from_json(
            r#"{"select": ["z", "a", "m"], "groups": {"z": {}, "a": {}, "m": {}}}"#,
        )
        .unwrap();
        let order: Vec<_> = rule.plan().aliases().collect();
        assert_eq!(order, vec!["z", "a", "m"]);

        assert!(Rule::from_json("{not json").unwrap_err().is_definition());
    }

    #[test]
    fn test_deserialize_embedded_rule() {
        #[derive(Deserialize)]
        struct Job {
            name: String,
            rule: Rule,
        }

        let job: Job = serde_json::from_str(
            r#"{"name": "nightly", "rule": {"select": ["a", "b"], "groups": {"b": {}, "a": {}}}}"#,
        )
        .unwrap();
        assert_eq!(job.name, "nightly");
        assert_eq!(job.rule.plan().level(0).unwrap().group_name(), "b");

        let bad: std::result::Result<Job, _> =
            serde_json::from_str(r#"{"name": "x", "rule": {"select": [], "groups": {}}}"#);
        assert!(bad.is_err());
    }
}
