// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

use std::fmt;

use serde::ser::{Serialize, Serializer};

use crate::address::col_letter;

/// An enum to represent all different data types that can appear as
/// a value in a worksheet cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Data {
    /// Signed integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
    /// Boolean
    Bool(bool),
    /// Date or time as seconds since 1970-01-01 00:00:00 UTC
    Timestamp(i64),
    /// Error text as written in the sheet (`#DIV/0!`, `#N/A`...)
    Error(String),
    /// Empty cell
    #[default]
    Empty,
}

impl Data {
    /// Assess if datatype is empty
    pub fn is_empty(&self) -> bool {
        *self == Data::Empty
    }

    /// Try getting int value
    pub fn get_int(&self) -> Option<i64> {
        match self {
            Data::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try getting float value
    pub fn get_float(&self) -> Option<f64> {
        match self {
            Data::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try getting bool value
    pub fn get_bool(&self) -> Option<bool> {
        match self {
            Data::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try getting string value
    pub fn get_string(&self) -> Option<&str> {
        match self {
            Data::String(v) => Some(v),
            _ => None,
        }
    }

    /// Try getting a timestamp
    pub fn get_timestamp(&self) -> Option<i64> {
        match self {
            Data::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Try converting to a f64, ints and timestamps included
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Data::Int(v) | Data::Timestamp(v) => Some(*v as f64),
            Data::Float(v) => Some(*v),
            Data::Bool(v) => Some(*v as u8 as f64),
            Data::String(s) => fast_float2::parse::<f64, _>(s.as_bytes()).ok(),
            _ => None,
        }
    }
}

impl PartialEq<i64> for Data {
    fn eq(&self, other: &i64) -> bool {
        matches!(*self, Data::Int(ref s) if *s == *other)
    }
}

impl PartialEq<f64> for Data {
    fn eq(&self, other: &f64) -> bool {
        matches!(*self, Data::Float(ref s) if *s == *other)
    }
}

impl PartialEq<bool> for Data {
    fn eq(&self, other: &bool) -> bool {
        matches!(*self, Data::Bool(ref s) if *s == *other)
    }
}

impl PartialEq<str> for Data {
    fn eq(&self, other: &str) -> bool {
        matches!(*self, Data::String(ref s) if s == other)
    }
}

impl PartialEq<&str> for Data {
    fn eq(&self, other: &&str) -> bool {
        matches!(*self, Data::String(ref s) if s == *other)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        match *self {
            Data::Int(ref e) => write!(f, "{}", e),
            Data::Float(ref e) => write!(f, "{}", e),
            Data::String(ref e) => write!(f, "{}", e),
            Data::Bool(ref e) => write!(f, "{}", e),
            Data::Timestamp(ref e) => write!(f, "{}", e),
            Data::Error(ref e) => write!(f, "{}", e),
            Data::Empty => Ok(()),
        }
    }
}

impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Int(v) | Data::Timestamp(v) => serializer.serialize_i64(*v),
            Data::Float(v) => serializer.serialize_f64(*v),
            Data::String(v) | Data::Error(v) => serializer.serialize_str(v),
            Data::Bool(v) => serializer.serialize_bool(*v),
            Data::Empty => serializer.serialize_none(),
        }
    }
}

macro_rules! define_from {
    ($variant:path, $ty:ty) => {
        impl From<$ty> for Data {
            fn from(v: $ty) -> Self {
                $variant(v)
            }
        }
    };
}

define_from!(Data::Int, i64);
define_from!(Data::Float, f64);
define_from!(Data::String, String);
define_from!(Data::Bool, bool);

impl<'a> From<&'a str> for Data {
    fn from(v: &'a str) -> Self {
        Data::String(String::from(v))
    }
}

impl From<()> for Data {
    fn from(_: ()) -> Self {
        Data::Empty
    }
}

/// A row or column key in the shaped output
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Numeric key (row numbers, 0/1 based offsets)
    Num(i64),
    /// Text key (column letters, header values, caller keys)
    Str(String),
}

impl Key {
    /// The numeric key if any
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Key::Num(n) => Some(*n),
            Key::Str(_) => None,
        }
    }

    /// The text key if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Num(_) => None,
            Key::Str(s) => Some(s),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Num(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Num(n) => serializer.serialize_i64(*n),
            Key::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Num(v)
    }
}

impl From<u32> for Key {
    fn from(v: u32) -> Self {
        Key::Num(v as i64)
    }
}

/// Resolved type of a cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// `t="b"`
    Bool,
    /// Numbers, general cells
    Number,
    /// Shared, inline and formula strings
    String,
    /// Numbers whose style is a date format, `t="d"`
    Date,
    /// `t="e"`
    Error,
}

/// A fully resolved cell with its raw attributes
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Cell {
    pub(crate) row: u32,
    pub(crate) col: u32,
    pub(crate) raw_type: Option<String>,
    pub(crate) style: usize,
    pub(crate) raw: String,
    pub(crate) formula: Option<String>,
    pub(crate) value: Data,
    #[serde(rename = "type")]
    pub(crate) ty: ValueType,
}

impl Cell {
    /// Row number (1-based)
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Column number (1-based)
    pub fn col(&self) -> u32 {
        self.col
    }

    /// `A1` style address
    pub fn address(&self) -> String {
        format!("{}{}", col_letter(self.col), self.row)
    }

    /// The `t` attribute as written in the sheet
    pub fn raw_type(&self) -> Option<&str> {
        self.raw_type.as_deref()
    }

    /// Style index (`s` attribute, 0 when absent)
    pub fn style(&self) -> usize {
        self.style
    }

    /// Untouched `<v>` text (or inline string text)
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Formula text, always starting with `=`
    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// Resolved value
    pub fn value(&self) -> &Data {
        &self.value
    }

    /// Consumes the cell into its resolved value
    pub fn into_value(self) -> Data {
        self.value
    }

    /// Resolved type
    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    /// An empty cell at `(row, col)`, used to pad rows
    pub(crate) fn empty(row: u32, col: u32) -> Self {
        Cell {
            row,
            col,
            raw_type: None,
            style: 0,
            raw: String::new(),
            formula: None,
            value: Data::Empty,
            ty: ValueType::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_eq() {
        assert_eq!(Data::String("value".to_string()), "value");
        assert_eq!(Data::Float(100.0), 100.0f64);
        assert_eq!(Data::Bool(true), true);
        assert_eq!(Data::Int(100), 100i64);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(Data::Bool(true).as_f64(), Some(1.0f64));
        assert_eq!(Data::Int(42).as_f64(), Some(42.0));
        assert_eq!(Data::String("1.5".to_string()).as_f64(), Some(1.5));
        assert_eq!(Data::Empty.as_f64(), None);
    }

    #[test]
    fn test_serialize() {
        let cell = Cell {
            row: 3,
            col: 2,
            raw_type: Some("s".to_string()),
            style: 1,
            raw: "0".to_string(),
            formula: None,
            value: Data::from("x"),
            ty: ValueType::String,
        };
        assert_eq!(cell.address(), "B3");
        let json = serde_json::to_value(&cell).unwrap();
        assert_eq!(json["value"], "x");
        assert_eq!(json["type"], "string");
        assert_eq!(serde_json::to_string(&Data::Empty).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Key::Num(3)).unwrap(), "3");
    }
}
