//! The grouping engine.
//!
//! A run has two phases:
//!
//! 1. **Project and bucket.** Every row from the source is renamed by the
//!    rule's projection and pushed into the bucket of its first-level group
//!    value, with that field removed. The source is released as soon as it is
//!    exhausted.
//! 2. **Refine.** Each bucket is refined recursively, level by level. A level
//!    that consolidates promotes its similar fields onto the bucket node and
//!    moves the remaining fields one level down under its aggregated property.
//!    The working list is then re-bucketed by the next level's group field.
//!    The buckets of the last level are the leaves: plain lists of residual
//!    records, with no consolidation applied.
//!
//! Each recursive call owns the records of its bucket, so sibling branches
//! share nothing. Any error aborts the whole run.

use crate::{
    Error, GroupLevelSpec, GroupNode, GroupOptions, GroupedDocument, Record, Result, RowSource,
    Rule, Value,
};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// A record on its way through the levels, tagged with its source row index.
#[derive(Debug)]
struct Residual {
    row: usize,
    fields: Record,
}

type Buckets = IndexMap<String, Vec<Residual>>;

/// Applies a [`Rule`] to rows and builds the nested [`GroupedDocument`].
///
/// The engine keeps no state between runs and can be reused.
///
/// # Examples
///
/// ```rust
/// use tabnest::{record, value, GroupingEngine, MemorySource, Rule};
///
/// let rule = Rule::from_raw(&value!({
///     "select": ["country", "currency", "city"],
///     "groups": {
///         "country": {"similar_items": ["currency"], "aggregated_property": "cities"},
///         "city": {}
///     }
/// }))
/// .unwrap();
///
/// let mut source = MemorySource::new(vec![
///     record! { "country": "FR", "currency": "EUR", "city": "Paris" },
///     record! { "country": "FR", "currency": "EUR", "city": "Lyon" },
/// ]);
///
/// let doc = GroupingEngine::new(rule).run(&mut source).unwrap();
/// assert_eq!(
///     doc.to_value(),
///     value!({"FR": {"currency": "EUR", "cities": {"Paris": [{}], "Lyon": [{}]}}})
/// );
/// ```
#[derive(Debug, Clone)]
pub struct GroupingEngine {
    rule: Rule,
    options: GroupOptions,
}

impl GroupingEngine {
    #[must_use]
    pub fn new(rule: Rule) -> Self {
        Self::with_options(rule, GroupOptions::default())
    }

    #[must_use]
    pub fn with_options(rule: Rule, options: GroupOptions) -> Self {
        GroupingEngine { rule, options }
    }

    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    #[must_use]
    pub fn options(&self) -> &GroupOptions {
        &self.options
    }

    /// Opens `source`, groups every row it yields and releases it.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if the source yields no rows
    /// - [`Error::RowCorrelation`] if a row misses a selected column (when the
    ///   correlation check is enabled) or a grouping field
    /// - [`Error::ConsolidationConflict`] if a bucket disagrees on a similar field
    /// - any error raised by the source itself
    pub fn run<S>(&self, source: &mut S) -> Result<GroupedDocument>
    where
        S: RowSource + ?Sized,
    {
        let buckets = {
            let rows = source.open()?;
            self.first_pass(rows)?
        };
        self.refine_all(buckets)
    }

    /// Groups rows that are already in memory.
    ///
    /// # Errors
    ///
    /// Same as [`GroupingEngine::run`].
    pub fn group_records<I>(&self, rows: I) -> Result<GroupedDocument>
    where
        I: IntoIterator<Item = Record>,
    {
        let buckets = self.first_pass(rows.into_iter().map(Ok))?;
        self.refine_all(buckets)
    }

    fn first_pass<I>(&self, rows: I) -> Result<Buckets>
    where
        I: Iterator<Item = Result<Record>>,
    {
        let group_name = self.rule.plan().first().group_name();
        let mut buckets = Buckets::new();
        let mut count = 0;

        for (index, row) in rows.enumerate() {
            let residual = self.project(index, row?)?;
            push_into(&mut buckets, residual, group_name)?;
            count += 1;
        }

        if count == 0 {
            return Err(Error::EmptyInput);
        }
        debug!(
            rows = count,
            buckets = buckets.len(),
            group = group_name,
            "first pass complete"
        );
        Ok(buckets)
    }

    fn project(&self, index: usize, row: Record) -> Result<Residual> {
        let projection = self.rule.projection();
        if self.options.correlation_check {
            let missing = projection.missing_columns(&row);
            if !missing.is_empty() {
                return Err(Error::row_correlation(
                    index,
                    format!("missing selected columns [{}]", missing.join(", ")),
                ));
            }
        }

        let fields = if self.options.keep_unselected_fields {
            projection.apply(row)
        } else {
            projection.apply_selected(row)
        };
        Ok(Residual { row: index, fields })
    }

    fn refine_all(&self, buckets: Buckets) -> Result<GroupedDocument> {
        let root = buckets
            .into_iter()
            .map(|(key, records)| Ok((key, self.refine(records, 0)?)))
            .collect::<Result<IndexMap<_, _>>>()?;

        let doc = GroupedDocument::new(root);
        debug!(
            buckets = doc.len(),
            records = doc.record_count(),
            "grouping complete"
        );
        Ok(doc)
    }

    /// Builds the node of a bucket produced by the level at `depth`.
    ///
    /// Buckets of the final level are leaves. Their similar items are not
    /// consolidated and stay in the records.
    fn refine(&self, records: Vec<Residual>, depth: usize) -> Result<GroupNode> {
        let plan = self.rule.plan();
        let Some(level) = plan.level(depth).filter(|_| depth + 1 < plan.len()) else {
            return Ok(leaf(records));
        };

        match level.aggregated_property() {
            Some(property) if level.consolidates() => {
                let (attributes, remainder) = consolidate(records, level)?;
                Ok(GroupNode::Consolidated {
                    attributes,
                    aggregated_property: property.to_string(),
                    inner: Box::new(self.descend(remainder, depth + 1)?),
                })
            }
            _ => self.descend(records, depth + 1),
        }
    }

    /// Re-buckets `records` by the level at `depth`, or makes them a leaf once
    /// every level is used.
    fn descend(&self, records: Vec<Residual>, depth: usize) -> Result<GroupNode> {
        let Some(level) = self.rule.plan().level(depth) else {
            return Ok(leaf(records));
        };

        let mut buckets = Buckets::new();
        for residual in records {
            push_into(&mut buckets, residual, level.group_name())?;
        }
        trace!(
            depth,
            group = level.group_name(),
            buckets = buckets.len(),
            "refined bucket"
        );

        let children = buckets
            .into_iter()
            .map(|(key, records)| Ok((key, self.refine(records, depth)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(GroupNode::Buckets(children))
    }
}

/// Moves `residual` into the bucket of its `group_name` value, removing that field.
fn push_into(buckets: &mut Buckets, mut residual: Residual, group_name: &str) -> Result<()> {
    let value = residual.fields.remove(group_name).ok_or_else(|| {
        Error::row_correlation(
            residual.row,
            format!("record has no field '{group_name}' to group by"),
        )
    })?;
    let key = value.bucket_key().ok_or_else(|| {
        Error::row_correlation(
            residual.row,
            format!(
                "field '{group_name}' holds a value of kind {}, which cannot key a group",
                value.kind()
            ),
        )
    })?;
    buckets.entry(key).or_default().push(residual);
    Ok(())
}

/// Splits a bucket into the values shared by every record for the level's
/// similar items and the per-record remainder.
///
/// An absent field is a value of its own: absent then present is a conflict.
fn consolidate(
    records: Vec<Residual>,
    level: &GroupLevelSpec,
) -> Result<(Record, Vec<Residual>)> {
    let similar = level.similar_items();
    let mut shared: Vec<Option<Value>> = Vec::with_capacity(similar.len());
    let mut remainder = Vec::with_capacity(records.len());

    for (i, mut residual) in records.into_iter().enumerate() {
        for (slot, field) in similar.iter().enumerate() {
            let value = residual.fields.remove(field);
            if i == 0 {
                shared.push(value);
            } else if shared[slot] != value {
                return Err(Error::consolidation_conflict(
                    field,
                    &describe(shared[slot].as_ref()),
                    &describe(value.as_ref()),
                ));
            }
        }
        remainder.push(residual);
    }

    let attributes = similar
        .iter()
        .zip(shared)
        .filter_map(|(field, value)| value.map(|v| (field.clone(), v)))
        .collect();
    Ok((attributes, remainder))
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "<absent>".to_string(), Value::to_string)
}

fn leaf(records: Vec<Residual>) -> GroupNode {
    GroupNode::Records(records.into_iter().map(|r| r.fields).collect())
}
