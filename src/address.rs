// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Cell address algebra: column letters, A1 references and read areas.
//!
//! All coordinates are 1-based, the way they appear in a sheet (`A1` is row 1,
//! column 1).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::RwLock;

use crate::datatype::Key;

/// Maximum number of rows allowed in an xlsx file
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns allowed in an xlsx file
pub const MAX_COLUMNS: u32 = 16_384;

/// Address and range parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Empty address
    Empty,
    /// The text does not look like an address or a range
    Malformed(String),
    /// Row number is 0 or above `MAX_ROWS`
    RowOutOfRange(u64),
    /// A column key map refers to something that is not a column
    InvalidColumn(String),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AddressError::Empty => write!(f, "Empty address"),
            AddressError::Malformed(s) => write!(f, "Wrong address or range '{s}'"),
            AddressError::RowOutOfRange(r) => {
                write!(f, "Row {r} is out of range (1..={MAX_ROWS})")
            }
            AddressError::InvalidColumn(s) => write!(f, "Invalid column '{s}'"),
        }
    }
}

impl std::error::Error for AddressError {}

/// Converts column letters into a column number (`A` = 1).
///
/// Non letters are ignored and lowercase is accepted. Returns 0 when there are
/// no letters at all and clamps anything above `XFD` to `MAX_COLUMNS`.
pub fn col_num(letters: &str) -> u32 {
    let mut n: u32 = 0;
    for c in letters.bytes().filter(u8::is_ascii_alphabetic) {
        n = n * 26 + (c.to_ascii_uppercase() - b'A') as u32 + 1;
        if n > MAX_COLUMNS {
            return MAX_COLUMNS;
        }
    }
    n
}

/// Converts a column number into its letters (`1` = `A`).
///
/// Bijective base-26: there is no zero digit. `0` gives an empty string and
/// numbers above `MAX_COLUMNS` clamp to `XFD`.
pub fn col_letter(n: u32) -> String {
    let mut n = n.min(MAX_COLUMNS);
    let mut rev = Vec::with_capacity(3);
    while n > 0 {
        let rem = (n - 1) % 26;
        rev.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    rev.iter().rev().map(|&b| b as char).collect()
}

/// Memoized column letters, owned by one workbook
///
/// Letters to numbers need no cache: `r` attributes are parsed in place.
#[derive(Debug, Default)]
pub struct ColumnCache {
    letters: RwLock<HashMap<u32, String>>,
}

impl ColumnCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized [`col_letter`]
    pub fn letter(&self, n: u32) -> String {
        if let Ok(map) = self.letters.read() {
            if let Some(s) = map.get(&n) {
                return s.clone();
            }
        }
        let s = col_letter(n);
        if let Ok(mut map) = self.letters.write() {
            map.insert(n, s.clone());
        }
        s
    }
}

/// Splits a cell reference such as `B12` (bytes of an `r` attribute) into
/// `(row, col)`.
///
/// `$` signs are skipped. Either component is 0 when missing.
pub(crate) fn cell_position(r: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut in_row = false;
    for &c in r {
        match c {
            b'$' => {}
            b'A'..=b'Z' | b'a'..=b'z' if !in_row => {
                col = col
                    .saturating_mul(26)
                    .saturating_add((c.to_ascii_uppercase() - b'A') as u32 + 1);
            }
            b'0'..=b'9' => {
                in_row = true;
                row = row.checked_mul(10)?.checked_add((c - b'0') as u32)?;
            }
            _ => return None,
        }
    }
    Some((row, col.min(MAX_COLUMNS)))
}

/// The rectangle of a sheet that iteration is restricted to, along with how
/// columns are keyed in the output
#[derive(Debug, Clone, PartialEq)]
pub struct ReadArea {
    /// First row (inclusive)
    pub row_min: u32,
    /// Last row (inclusive)
    pub row_max: u32,
    /// First column (inclusive)
    pub col_min: u32,
    /// Last column (inclusive)
    pub col_max: u32,
    /// Use the first row as header providing the column keys
    pub first_row: bool,
    columns: Option<Vec<u32>>,
    column_keys: BTreeMap<u32, Key>,
}

impl Default for ReadArea {
    fn default() -> Self {
        ReadArea {
            row_min: 1,
            row_max: MAX_ROWS,
            col_min: 1,
            col_max: MAX_COLUMNS,
            first_row: false,
            columns: None,
            column_keys: BTreeMap::new(),
        }
    }
}

impl ReadArea {
    /// The full grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a range into an area
    ///
    /// Accepted forms (case insensitive, `$` ignored):
    /// - `C3`: anchored at C3, extending to the last row and column
    /// - `C3:E5`: exact rectangle, reversed corners are normalized
    /// - `C`: column C up to the last column, every row
    /// - `C:AZ`: columns C to AZ, every row, keyed by each of these letters
    ///   even for sparse rows
    pub fn parse(range: &str) -> Result<Self, AddressError> {
        parse_range(range)
    }

    /// Sets whether the first row provides the column keys
    pub fn with_first_row(mut self, first_row: bool) -> Self {
        self.first_row = first_row;
        self
    }

    /// Sets explicit output keys for columns, indexed by column letters
    ///
    /// ```
    /// use xlstream::ReadArea;
    ///
    /// let area = ReadArea::parse("A:C")
    ///     .unwrap()
    ///     .with_column_keys([("a", "name"), ("C", "age")])
    ///     .unwrap();
    /// assert_eq!(area.column_key(1).map(|k| k.to_string()), Some("name".to_string()));
    /// assert!(area.column_key(2).is_none());
    /// ```
    pub fn with_column_keys<I, L, K>(mut self, keys: I) -> Result<Self, AddressError>
    where
        I: IntoIterator<Item = (L, K)>,
        L: AsRef<str>,
        K: Into<Key>,
    {
        self.column_keys.clear();
        for (letters, key) in keys {
            let letters = letters.as_ref();
            if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
                return Err(AddressError::InvalidColumn(letters.to_string()));
            }
            self.column_keys.insert(col_num(letters), key.into());
        }
        Ok(self)
    }

    /// Whether `(row, col)` lies inside the area
    #[inline]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        self.contains_row(row) && self.contains_col(col)
    }

    #[inline]
    pub(crate) fn contains_row(&self, row: u32) -> bool {
        row >= self.row_min && row <= self.row_max
    }

    #[inline]
    pub(crate) fn contains_col(&self, col: u32) -> bool {
        col >= self.col_min && col <= self.col_max
    }

    /// Ordered column template recorded for column ranges such as `C:AZ`
    pub fn columns(&self) -> Option<&[u32]> {
        self.columns.as_deref()
    }

    pub(crate) fn set_columns(&mut self, columns: Option<Vec<u32>>) {
        self.columns = columns;
    }

    /// Explicit key for a column, if one was supplied
    pub fn column_key(&self, col: u32) -> Option<&Key> {
        self.column_keys.get(&col)
    }

    /// Whether explicit column keys were supplied
    pub fn has_column_keys(&self) -> bool {
        !self.column_keys.is_empty()
    }
}

/// Parses a range, see [`ReadArea::parse`]
pub fn parse_range(range: &str) -> Result<ReadArea, AddressError> {
    let range = range.trim();
    if range.is_empty() {
        return Err(AddressError::Empty);
    }
    let malformed = || AddressError::Malformed(range.to_string());
    let mut parts = range.split(':');
    let first = parts.next().ok_or_else(malformed)?;
    let second = parts.next();
    if parts.next().is_some() {
        return Err(malformed());
    }

    let (r1, c1) = split_ref(first).ok_or_else(malformed)?;
    if c1 == 0 {
        return Err(malformed());
    }
    let mut area = ReadArea::default();
    match (r1, second) {
        // C or C3
        (r1, None) => {
            area.col_min = c1;
            if r1 > 0 {
                area.row_min = check_row(r1)?;
            }
        }
        // C:AZ
        (0, Some(second)) => {
            let (r2, c2) = split_ref(second).ok_or_else(malformed)?;
            if r2 != 0 || c2 == 0 {
                return Err(malformed());
            }
            area.col_min = c1.min(c2);
            area.col_max = c1.max(c2);
            area.columns = Some((area.col_min..=area.col_max).collect());
        }
        // C3:E5
        (r1, Some(second)) => {
            let (r2, c2) = split_ref(second).ok_or_else(malformed)?;
            if r2 == 0 || c2 == 0 {
                return Err(malformed());
            }
            let (r1, r2) = (check_row(r1)?, check_row(r2)?);
            area.row_min = r1.min(r2);
            area.row_max = r1.max(r2);
            area.col_min = c1.min(c2);
            area.col_max = c1.max(c2);
        }
    }
    Ok(area)
}

fn check_row(row: u64) -> Result<u32, AddressError> {
    if row == 0 || row > MAX_ROWS as u64 {
        Err(AddressError::RowOutOfRange(row))
    } else {
        Ok(row as u32)
    }
}

/// Splits `$C$3` into `(3, 3)`: letters first then digits, each optional.
fn split_ref(s: &str) -> Option<(u64, u32)> {
    let s = s.trim();
    let mut letters = String::new();
    let mut row: u64 = 0;
    let mut seen_digit = false;
    for c in s.chars() {
        match c {
            '$' => {}
            'A'..='Z' | 'a'..='z' if !seen_digit => letters.push(c),
            '0'..='9' => {
                seen_digit = true;
                row = row.checked_mul(10)?.checked_add(c as u64 - '0' as u64)?;
            }
            _ => return None,
        }
    }
    if letters.is_empty() && !seen_digit {
        return None;
    }
    if seen_digit && row == 0 {
        // A0 is not an address
        return Some((u64::MAX, col_num(&letters)));
    }
    Some((row, col_num(&letters)))
}
