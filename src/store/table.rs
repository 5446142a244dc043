use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;

/// A single typed cell in a table.
///
/// Type inference happens once, when a raw field is parsed: an empty field
/// becomes `Null`, anything that parses as a decimal becomes `Number`, and
/// everything else stays `Text`. Dates are carried as ISO-8601 text and
/// interpreted by the queries that need them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Text(String),
    Number(Decimal),
}

impl Value {
    /// Infers a `Value` from a raw delimited field.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }

        match Decimal::from_str(raw) {
            Ok(number) => Value::Number(number),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(text) => write!(formatter, "{text}"),
            Value::Number(number) => write!(formatter, "{number}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Decimal> for Value {
    fn from(number: Decimal) -> Self {
        Value::Number(number)
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Self {
        Value::Number(Decimal::from(number))
    }
}

/// An ordered set of named columns and the rows beneath them.
///
/// Both the tables held by the store and the result sets produced by the
/// query catalog use this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_columns(columns: &[&str]) -> Self {
        Self::new(columns.iter().map(|column| column.to_string()).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolves a column name to its positional index.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}
