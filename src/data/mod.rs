//! Core data models for the movie dataset
//!
//! The dataset is a column-oriented table of loosely typed cells, mirroring the
//! shape of the catalog records fetched from TMDB plus the derived scoring and
//! genre columns the application adds on top of them.

pub mod genres;
pub mod literal;
pub mod repair;
pub mod table;

pub use genres::{GenreError, GenreFetcher, GenreLookup, GenreMap, TmdbGenreClient};
pub use literal::{parse_list, parse_sequence};

use chrono::NaiveDate;
use thiserror::Error;

pub const RELEASE_DATE: &str = "release_date";
pub const GENRE_IDS: &str = "genre_ids";
pub const GENRES: &str = "genres";
pub const GENRES_STR: &str = "genres_str";
pub const GEMS_SCORE: &str = "gems_score";
pub const YEAR: &str = "year";
pub const VOTE_AVERAGE: &str = "vote_average";
pub const VOTE_COUNT: &str = "vote_count";
pub const POPULARITY: &str = "popularity";
pub const TITLE: &str = "title";

/// Errors that can occur while building, reading or repairing a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A column required by a computation is not present
    #[error("Missing column: '{0}'")]
    MissingColumn(String),

    /// A column does not have one value per row
    #[error("Column '{name}' has {actual} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The header row names the same column twice
    #[error("Duplicate column: '{0}'")]
    DuplicateColumn(String),

    /// A column used in a numeric computation holds non-numeric cells
    #[error("Column '{0}' is not numeric")]
    NonNumeric(String),

    /// The flat file could not be parsed or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single cell of the dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value (empty field, NaN, unparseable date)
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    /// Ordered sequence such as `genre_ids` or `genres`
    List(Vec<Value>),
}

impl Value {
    /// Returns true for `Null` and for floats that are NaN
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell, if it holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Renders the cell as a CSV field
    ///
    /// Nulls become empty fields, booleans use `True`/`False` and sequences
    /// are written as list literals (see [`literal::format_list`]).
    pub fn to_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => literal::format_bool(*b).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.is_nan() => String::new(),
            Value::Float(f) => literal::format_float(*f),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::List(items) => literal::format_list(items),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Column-oriented table with a fixed number of rows
///
/// Column order is preserved, so a saved dataset keeps the header order it
/// was built with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Creates an empty dataset with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, builder style
    ///
    /// The first column fixes the row count; later columns must match it.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<Self, DatasetError> {
        self.set_column(name, values)?;
        Ok(self)
    }

    /// Replaces the column with the given name, or appends it if absent
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<(), DatasetError> {
        let name = name.into();

        let only_column = self.columns.len() == 1 && self.columns[0].name == name;
        if self.columns.is_empty() || only_column {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(DatasetError::LengthMismatch {
                name,
                expected: self.rows,
                actual: values.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Values of a column, or `MissingColumn` if it does not exist
    pub fn require(&self, name: &str) -> Result<&[Value], DatasetError> {
        self.column(name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Cell at `row` in the named column
    pub fn row_value(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name)?.values.get(row)
    }
}
