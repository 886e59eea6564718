//! Column selection and renaming.
//!
//! A [`ProjectionClause`] is the `select` part of a rule: an ordered list of
//! [`Column`]s, each naming an incoming field and the alias it is known by in
//! the grouped output.
//!
//! ```rust
//! use tabnest::{record, Column, ProjectionClause};
//!
//! let projection = ProjectionClause::new(vec![
//!     Column::new("city").unwrap(),
//!     Column::aliased("full_name", "person").unwrap(),
//! ])
//! .unwrap();
//!
//! let row = projection.apply(record! { "full_name": "Ada", "city": "London", "age": "36" });
//! assert_eq!(row, record! { "person": "Ada", "city": "London", "age": "36" });
//! ```

use crate::{Error, Record, Result};
use std::collections::{BTreeSet, HashMap};

/// One selected column: the incoming field name and an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    alias: Option<String>,
}

impl Column {
    /// Selects `name` without renaming it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if `name` is empty.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::definition("Column name should be a non-empty string"));
        }
        Ok(Column {
            name: name.to_string(),
            alias: None,
        })
    }

    /// Selects `name` and renames it to `alias`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabnest::Column;
    ///
    /// let col = Column::aliased("Hello", "World").unwrap();
    /// assert_eq!(col.name(), "Hello");
    /// assert_eq!(col.alias(), "World");
    /// assert!(Column::aliased("Hello", "").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if either string is empty.
    pub fn aliased(name: &str, alias: &str) -> Result<Self> {
        if alias.is_empty() {
            return Err(Error::definition(
                "If column alias is defined it should be a non-empty string",
            ));
        }
        let mut column = Column::new(name)?;
        column.alias = Some(alias.to_string());
        Ok(column)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The alias if one was given, otherwise the name.
    #[must_use]
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn is_aliased(&self) -> bool {
        self.alias.is_some()
    }
}

/// Key accepted by [`ProjectionClause::lookup`]: a position or a column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for ColumnKey<'_> {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnKey<'a> {
    fn from(name: &'a str) -> Self {
        ColumnKey::Name(name)
    }
}

/// The ordered, validated set of selected columns.
///
/// No two columns share a name and no two columns share an effective alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionClause {
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl ProjectionClause {
    /// Validates and builds a projection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if `columns` is empty or if names or
    /// aliases collide. Every duplicated name and alias is reported at once.
    ///
    /// ```rust
    /// use tabnest::{Column, ProjectionClause};
    ///
    /// let err = ProjectionClause::new(vec![
    ///     Column::aliased("first_name", "name").unwrap(),
    ///     Column::new("name").unwrap(),
    /// ])
    /// .unwrap_err();
    /// assert!(err.to_string().contains("Duplicated aliases: {name}"));
    /// ```
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::definition("Columns must not be empty"));
        }

        let mut by_name = HashMap::with_capacity(columns.len());
        let mut by_alias = HashMap::with_capacity(columns.len());
        let mut duplicated_names = BTreeSet::new();
        let mut duplicated_aliases = BTreeSet::new();

        for (i, col) in columns.iter().enumerate() {
            if by_name.insert(col.name().to_string(), i).is_some() {
                duplicated_names.insert(col.name());
            }
            if by_alias.insert(col.alias().to_string(), i).is_some() {
                duplicated_aliases.insert(col.alias());
            }
        }

        if !duplicated_names.is_empty() || !duplicated_aliases.is_empty() {
            let mut msg = String::from("There are duplications in column definitions.");
            if !duplicated_names.is_empty() {
                msg.push_str(&format!(" Duplicated names: {}.", braced(&duplicated_names)));
            }
            if !duplicated_aliases.is_empty() {
                msg.push_str(&format!(
                    " Duplicated aliases: {}.",
                    braced(&duplicated_aliases)
                ));
            }
            return Err(Error::Definition(msg));
        }

        Ok(ProjectionClause {
            columns,
            by_name,
            by_alias,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`: a projection holds at least one column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    #[must_use]
    pub fn by_alias(&self, alias: &str) -> Option<&Column> {
        self.by_alias.get(alias).map(|&i| &self.columns[i])
    }

    #[must_use]
    pub fn has_alias(&self, alias: &str) -> bool {
        self.by_alias.contains_key(alias)
    }

    /// Effective aliases in declaration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(Column::alias)
    }

    /// Retrieves a column by position or by name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabnest::{Column, ProjectionClause};
    ///
    /// let projection = ProjectionClause::new(vec![Column::new("Name").unwrap()]).unwrap();
    /// assert_eq!(projection.lookup(0usize).unwrap().name(), "Name");
    /// assert_eq!(projection.lookup("Name").unwrap().name(), "Name");
    /// assert!(projection.lookup(5usize).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lookup`] for an out-of-range index or unknown name.
    pub fn lookup<'a, K>(&self, key: K) -> Result<&Column>
    where
        K: Into<ColumnKey<'a>>,
    {
        match key.into() {
            ColumnKey::Index(i) => self
                .get(i)
                .ok_or_else(|| Error::lookup(format!("Cannot retrieve column at index {i}"))),
            ColumnKey::Name(name) => self
                .by_name(name)
                .ok_or_else(|| Error::lookup(format!("Cannot retrieve column '{name}'"))),
        }
    }

    /// Renames the fields of `row` that match a column name to that column's
    /// alias. Unmatched fields pass through under their original key.
    #[must_use]
    pub fn apply(&self, row: Record) -> Record {
        row.into_iter()
            .map(|(key, value)| match self.by_name(&key) {
                Some(col) => (col.alias().to_string(), value),
                None => (key, value),
            })
            .collect()
    }

    /// Like [`apply`](Self::apply) but drops fields no column selects.
    #[must_use]
    pub fn apply_selected(&self, row: Record) -> Record {
        row.into_iter()
            .filter_map(|(key, value)| {
                self.by_name(&key)
                    .map(|col| (col.alias().to_string(), value))
            })
            .collect()
    }

    /// Names of selected columns that `row` does not carry, in declaration order.
    #[must_use]
    pub fn missing_columns(&self, row: &Record) -> Vec<&str> {
        self.columns
            .iter()
            .map(Column::name)
            .filter(|name| !row.contains_key(name))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ProjectionClause {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

fn braced(items: &BTreeSet<&str>) -> String {
    let joined: Vec<&str> = items.iter().copied().collect();
    format!("{{{}}}", joined.join(", "))
}
