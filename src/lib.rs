// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Streaming xlsx reader
//!
//! # Status
//!
//! **xlstream** reads xlsx workbooks one row at a time, with the typing rules
//! of the spreadsheet: shared strings, booleans, errors, numbers that stay
//! text unless they round trip, and dates recognized from cell styles.
//!
//! Shared strings and styles are loaded once, when the workbook is opened.
//! Sheets are never materialized: rows are parsed on demand and iteration can
//! be cancelled, capped or restarted at any time.
//!
//! # Examples
//! ```no_run
//! use xlstream::{open_workbook, ResultMode, XlsxError};
//!
//! # fn main() -> Result<(), XlsxError> {
//! let mut workbook = open_workbook("tests/people.xlsx")?;
//! workbook.select_sheet("People")?;
//! workbook.set_read_area("A1:C100")?;
//!
//! // row 1 holds the column names
//! for row in workbook.rows(ResultMode::new().with_first_row(true))? {
//!     let row = row?;
//!     println!("{}: {:?} is {:?}", row.key(), row.get("name"), row.get("age"));
//! }
//!
//! // stop after 10 rows
//! let first_rows = workbook
//!     .rows(ResultMode::new())?
//!     .with_limit(10)
//!     .collect::<Result<Vec<_>, _>>()?;
//! println!("{} rows", first_rows.len());
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

#[macro_use]
mod utils;

mod address;
mod aggregate;
mod datatype;
mod dates;
mod errors;
pub mod formats;
mod rows;
mod sheet;
mod style;
mod value;
mod xlsx;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub use crate::address::{
    col_letter, col_num, parse_range, AddressError, ReadArea, MAX_COLUMNS, MAX_ROWS,
};
pub use crate::datatype::{Cell, Data, Key, ValueType};
pub use crate::dates::{serial_to_timestamp, DateFormatFn, DateFormatter, DateModel};
pub use crate::errors::ErrorKind;
pub use crate::formats::{DateFormatPolicy, DefaultDatePolicy, FormatCategory};
pub use crate::rows::{ColIndexing, Record, ResultMode, RowIndexing, RowIter};
pub use crate::sheet::{DefinedName, Dimension, Sheet, SheetVisible};
pub use crate::style::{
    Alignment, Border, BorderSide, Color, CompleteStyle, Fill, Font, StyleRecord, StyleSheet,
};
pub use crate::xlsx::{Xlsx, XlsxError, XlsxOptions};

/// Opens a workbook from a file path
pub fn open_workbook<P: AsRef<Path>>(path: P) -> Result<Xlsx<BufReader<File>>, XlsxError> {
    let file = BufReader::new(File::open(path)?);
    Xlsx::new(file)
}

/// Opens a workbook from a file path with options
pub fn open_workbook_with_options<P: AsRef<Path>>(
    path: P,
    options: XlsxOptions,
) -> Result<Xlsx<BufReader<File>>, XlsxError> {
    let file = BufReader::new(File::open(path)?);
    Xlsx::with_options(file, options)
}
