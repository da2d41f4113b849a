// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Whole sheet helpers built on [`RowIter`](crate::RowIter)

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::ops::ControlFlow;

use log::warn;

use crate::address::MAX_COLUMNS;
use crate::datatype::{Cell, Data, Key};
use crate::rows::{ColIndexing, Record, ResultMode, RowIndexing};
use crate::sheet::Dimension;
use crate::xlsx::{SheetEvent, Xlsx, XlsxError};

impl<RS: Read + Seek> Xlsx<RS> {
    /// Reads all rows of the selected sheet
    ///
    /// With `mode.swap` the rows are transposed into columns: one record per
    /// column key, holding one entry per row key, empty when the row has no
    /// such column.
    pub fn read_rows(&mut self, mode: ResultMode) -> Result<Vec<Record>, XlsxError> {
        let rows = self.rows(mode)?.collect::<Result<Vec<_>, _>>()?;
        Ok(if mode.swap { transpose(rows) } else { rows })
    }

    /// Reads all columns of the selected sheet
    ///
    /// Same as [`Xlsx::read_rows`] with `swap`, offsets being relative to the
    /// area when both a row and a column indexing are set.
    pub fn read_columns(&mut self, mode: ResultMode) -> Result<Vec<Record>, XlsxError> {
        let relative = mode.row != RowIndexing::Original && mode.col != ColIndexing::Letter;
        self.read_rows(mode.with_relative(relative).with_swap(true))
    }

    /// Values of all cells of the read area, by address (`B3`)
    ///
    /// The first row is read as any other row.
    pub fn read_cells(&mut self) -> Result<HashMap<String, Data>, XlsxError> {
        let mut cells = HashMap::new();
        for row in self.rows_in(self.read_area().with_first_row(false), ResultMode::new())? {
            for (_, cell) in row?.into_cells() {
                cells.insert(cell.address(), cell.into_value());
            }
        }
        Ok(cells)
    }

    /// Cells of the read area with their raw text, type, style and formula
    pub fn read_cells_with_styles(&mut self) -> Result<HashMap<String, Cell>, XlsxError> {
        let mut cells = HashMap::new();
        for row in self.rows_in(self.read_area().with_first_row(false), ResultMode::new())? {
            for (_, cell) in row?.into_cells() {
                cells.insert(cell.address(), cell);
            }
        }
        Ok(cells)
    }

    /// The first row of the read area, without reading further
    pub fn first_row(&mut self) -> Result<Option<Record>, XlsxError> {
        let area = self.read_area().with_first_row(false);
        self.rows_in(area, ResultMode::new())?
            .with_limit(1)
            .next()
            .transpose()
    }

    /// Calls `f(row_key, col_key, value)` for every entry until it breaks
    pub fn read_callback<F>(&mut self, mode: ResultMode, f: F) -> Result<(), XlsxError>
    where
        F: FnMut(&Key, &Key, &Data) -> ControlFlow<()>,
    {
        self.rows(mode)?.for_each_cell(f)
    }

    /// Dimension declared by the selected sheet (`<dimension ref>`)
    ///
    /// `None` when the sheet does not declare one or the declaration is
    /// malformed.
    pub fn dimension(&mut self) -> Result<Option<Dimension>, XlsxError> {
        let cursor = self.selected_part()?.open(1, MAX_COLUMNS)?;
        Ok(cursor.dimension().and_then(|r| match Dimension::from_ref(r) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("ignoring sheet dimension: {e}");
                None
            }
        }))
    }

    /// Bounds of the cells actually holding a value or a formula
    ///
    /// Scans the whole sheet, ignoring the read area.
    pub fn actual_dimension(&mut self) -> Result<Option<Dimension>, XlsxError> {
        let mut cursor = self.selected_part()?.open(1, MAX_COLUMNS)?;
        let mut dim = None;
        loop {
            match cursor.next_event()? {
                SheetEvent::Cell(c) => {
                    let has_value = c.v.as_deref().is_some_and(|v| !v.is_empty())
                        || c.inline.as_deref().is_some_and(|v| !v.is_empty())
                        || c.f.is_some();
                    if has_value {
                        Dimension::extend(&mut dim, c.row, c.col);
                    }
                }
                SheetEvent::End => break,
                SheetEvent::RowStart(_) | SheetEvent::RowEnd => (),
            }
        }
        Ok(dim)
    }
}

/// Turns rows into columns
///
/// Column keys keep their first appearance order. Every column gets one
/// entry per row, an empty cell where the row has no value.
pub(crate) fn transpose(rows: Vec<Record>) -> Vec<Record> {
    let mut columns: Vec<(Key, u32, Vec<(Key, Cell)>)> = Vec::new();
    let mut index: HashMap<Key, usize> = HashMap::new();
    for row in &rows {
        for (key, cell) in row.iter() {
            if !index.contains_key(key) {
                index.insert(key.clone(), columns.len());
                columns.push((key.clone(), cell.col(), Vec::with_capacity(rows.len())));
            }
        }
    }
    for row in rows {
        let row_key = row.key().clone();
        let row_num = row.line();
        let mut seen = vec![false; columns.len()];
        for (key, cell) in row.into_cells() {
            if let Some(&i) = index.get(&key) {
                if !seen[i] {
                    seen[i] = true;
                    columns[i].2.push((row_key.clone(), cell));
                }
            }
        }
        for (i, (_, col, entries)) in columns.iter_mut().enumerate() {
            if !seen[i] {
                entries.push((row_key.clone(), Cell::empty(row_num, *col)));
            }
        }
    }
    columns
        .into_iter()
        .map(|(key, col, entries)| Record::new(key, col, entries))
        .collect()
}
