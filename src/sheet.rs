// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Sheet directory entries and sheet dimensions

use std::borrow::Cow;
use std::fmt;

use crate::address::{cell_position, col_letter, AddressError};

/// Type of visible sheet
///
/// <https://learn.microsoft.com/en-us/openspecs/office_standards/ms-oi29500/74cb1d22-b931-4bf8-997d-17517e2416e9>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetVisible {
    /// Visible
    #[default]
    Visible,
    /// Hidden
    Hidden,
    /// The sheet is hidden and cannot be displayed using the user interface
    VeryHidden,
}

/// Metadata of a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    /// `sheetId` attribute
    pub id: u32,
    /// Name
    pub name: String,
    /// Path of the sheet part in the package (`xl/worksheets/sheet1.xml`)
    pub path: String,
    /// Visibility
    pub visible: SheetVisible,
}

/// A workbook `<definedName>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    /// Name
    pub name: String,
    /// Formula text (`Sheet1!$B$4:$D$11`)
    pub value: String,
    /// Index of the sheet the name is local to
    pub local_sheet_id: Option<usize>,
}

impl DefinedName {
    /// Splits the value into its sheet name (unquoted) and reference
    ///
    /// ```
    /// use xlstream::DefinedName;
    ///
    /// let name = DefinedName {
    ///     name: "Values".to_string(),
    ///     value: "'My Sheet'!$B$4:$D$11".to_string(),
    ///     local_sheet_id: None,
    /// };
    /// assert_eq!(name.sheet_and_range(), (Some("My Sheet".into()), "$B$4:$D$11"));
    /// ```
    pub fn sheet_and_range(&self) -> (Option<Cow<'_, str>>, &str) {
        match self.value.rsplit_once('!') {
            Some((sheet, range)) => {
                let sheet = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
                    Some(quoted) => Cow::Owned(quoted.replace("''", "'")),
                    None => Cow::Borrowed(sheet),
                };
                (Some(sheet), range)
            }
            None => (None, self.value.as_str()),
        }
    }
}

/// Bounds of the used part of a sheet, 1-based and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimension {
    /// First row
    pub row_min: u32,
    /// Last row
    pub row_max: u32,
    /// First column
    pub col_min: u32,
    /// Last column
    pub col_max: u32,
}

impl Dimension {
    /// Parses a `<dimension ref="A1:C10">` value
    pub fn from_ref(r: &str) -> Result<Self, AddressError> {
        let malformed = || AddressError::Malformed(r.to_string());
        let mut parts = r.split(':').map(|p| cell_position(p.trim().as_bytes()));
        let start = parts.next().flatten().ok_or_else(malformed)?;
        let end = match parts.next() {
            Some(p) => p.ok_or_else(malformed)?,
            None => start,
        };
        if parts.next().is_some() || start.0 == 0 || start.1 == 0 || end.0 == 0 || end.1 == 0 {
            return Err(malformed());
        }
        Ok(Dimension {
            row_min: start.0.min(end.0),
            row_max: start.0.max(end.0),
            col_min: start.1.min(end.1),
            col_max: start.1.max(end.1),
        })
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.row_max + 1 - self.row_min
    }

    /// Number of columns
    pub fn cols(&self) -> u32 {
        self.col_max + 1 - self.col_min
    }

    /// Grows the dimension so it includes `(row, col)`
    pub(crate) fn extend(this: &mut Option<Dimension>, row: u32, col: u32) {
        match this {
            Some(d) => {
                d.row_min = d.row_min.min(row);
                d.row_max = d.row_max.max(row);
                d.col_min = d.col_min.min(col);
                d.col_max = d.col_max.max(col);
            }
            None => {
                *this = Some(Dimension {
                    row_min: row,
                    row_max: row,
                    col_min: col,
                    col_max: col,
                })
            }
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            col_letter(self.col_min),
            self.row_min,
            col_letter(self.col_max),
            self.row_max
        )
    }
}
