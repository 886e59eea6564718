//! Runtime configuration for grouping runs and CSV sources.
//!
//! - [`GroupOptions`]: how the engine treats incoming rows
//! - [`Delimiter`]: field separator used by [`CsvSource`](crate::CsvSource)
//!
//! ## Examples
//!
//! ```rust
//! use tabnest::GroupOptions;
//!
//! let options = GroupOptions::new()
//!     .with_correlation_check(true)
//!     .with_keep_unselected_fields(false);
//! assert!(options.correlation_check);
//! assert!(!options.keep_unselected_fields);
//! ```

/// Field delimiter for delimited row sources.
///
/// # Examples
///
/// ```rust
/// use tabnest::Delimiter;
///
/// assert_eq!(Delimiter::Comma.as_byte(), b',');
/// assert_eq!(Delimiter::Tab.as_byte(), b'\t');
/// assert_eq!(Delimiter::Pipe.as_byte(), b'|');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
}

impl Delimiter {
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }
}

/// Configuration options for a [`GroupingEngine`](crate::GroupingEngine).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupOptions {
    /// Reject rows that lack any projected column name.
    pub correlation_check: bool,
    /// Keep fields that no projected column names, under their original key.
    pub keep_unselected_fields: bool,
}

impl Default for GroupOptions {
    fn default() -> Self {
        GroupOptions {
            correlation_check: false,
            keep_unselected_fields: true,
        }
    }
}

impl GroupOptions {
    /// Creates default options: no correlation check, unselected fields kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabnest::GroupOptions;
    ///
    /// let options = GroupOptions::new();
    /// assert!(!options.correlation_check);
    /// assert!(options.keep_unselected_fields);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row must carry every selected column, and only selected
    /// columns reach the output.
    #[must_use]
    pub fn strict() -> Self {
        GroupOptions {
            correlation_check: true,
            keep_unselected_fields: false,
        }
    }

    #[must_use]
    pub fn with_correlation_check(mut self, enabled: bool) -> Self {
        self.correlation_check = enabled;
        self
    }

    #[must_use]
    pub fn with_keep_unselected_fields(mut self, keep: bool) -> Self {
        self.keep_unselected_fields = keep;
        self
    }
}
