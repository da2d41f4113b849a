// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Lazy row iteration over a sheet
//!
//! [`RowIter`] owns its sheet part and one XML cursor at most. The cursor is
//! opened on the first pull and closed as soon as iteration ends, fails or
//! is cancelled. [`RowIter::reset`] replaces it with a fresh cursor.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::address::ReadArea;
use crate::datatype::{Cell, Data, Key};
use crate::dates::DateFormatter;
use crate::value::{resolve_cell, SharedFormulas, Tables};
use crate::xlsx::{SheetCursor, SheetEvent, SheetPart, XlsxError};

/// How row keys are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowIndexing {
    /// Row number as in the sheet
    #[default]
    Original,
    /// 0 for row 1, or for the first row read when relative. A consumed
    /// header row shifts keys down by one
    ZeroBased,
    /// Same as `ZeroBased` plus one
    OneBased,
}

/// How column keys are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColIndexing {
    /// Column letters
    #[default]
    Letter,
    /// 0 for column A
    ZeroBased,
    /// 1 for column A
    OneBased,
}

/// Output shaping of rows
///
/// ```
/// use xlstream::{ColIndexing, ResultMode, RowIndexing};
///
/// let mode = ResultMode::new()
///     .with_row(RowIndexing::ZeroBased)
///     .with_col(ColIndexing::ZeroBased)
///     .with_relative(true);
/// assert!(mode.validate().is_ok());
/// assert!(ResultMode::new().with_relative(true).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultMode {
    /// The first row provides the column keys and is not yielded (unless
    /// explicit column keys are set on the read area)
    pub first_row: bool,
    /// Row keys
    pub row: RowIndexing,
    /// Column keys
    pub col: ColIndexing,
    /// Offsets start at the first row and column found in the read area
    /// instead of A1, needs both a row and a column indexing
    pub relative: bool,
    /// Transpose rows into columns (whole sheet reads only)
    pub swap: bool,
}

impl ResultMode {
    /// Default mode: row numbers and column letters
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the first row as header
    pub fn with_first_row(mut self, first_row: bool) -> Self {
        self.first_row = first_row;
        self
    }

    /// Set row indexing
    pub fn with_row(mut self, row: RowIndexing) -> Self {
        self.row = row;
        self
    }

    /// Set column indexing
    pub fn with_col(mut self, col: ColIndexing) -> Self {
        self.col = col;
        self
    }

    /// Measure offsets from the first row and column present
    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    /// Transpose whole sheet reads
    pub fn with_swap(mut self, swap: bool) -> Self {
        self.swap = swap;
        self
    }

    /// Rejects combinations that would silently do nothing
    pub fn validate(&self) -> Result<(), XlsxError> {
        if self.relative && (self.row == RowIndexing::Original || self.col == ColIndexing::Letter)
        {
            return Err(XlsxError::InvalidResultMode(
                "relative offsets need both a row and a column indexing",
            ));
        }
        Ok(())
    }
}

/// One shaped row: its key and its cells by column key
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    key: Key,
    line: u32,
    cells: Vec<(Key, Cell)>,
}

impl Record {
    pub(crate) fn new(key: Key, line: u32, cells: Vec<(Key, Cell)>) -> Self {
        Record { key, line, cells }
    }

    /// Row key (or column key once transposed)
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Sheet row number, or column number once transposed
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Value of the entry with key `key`
    pub fn get<K: Into<Key>>(&self, key: K) -> Option<&Data> {
        self.cell(key).map(Cell::value)
    }

    /// Cell of the entry with key `key`
    pub fn cell<K: Into<Key>>(&self, key: K) -> Option<&Cell> {
        let key = key.into();
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, c)| c)
    }

    /// Entries in column order
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Cell)> {
        self.cells.iter().map(|(k, c)| (k, c))
    }

    /// Entry keys in column order
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.cells.iter().map(|(k, _)| k)
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &Data> {
        self.cells.iter().map(|(_, c)| c.value())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no entry at all
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consumes the record into its entries
    pub fn into_cells(self) -> Vec<(Key, Cell)> {
        self.cells
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, c) in &self.cells {
            map.serialize_entry(k, c.value())?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingGrid,
    RowOpen,
    RowClosed,
    End,
}

/// Lazy iterator over the rows of a sheet
///
/// Rows are read one at a time, when pulled. Use [`RowIter::reset`] to read
/// again from the first row and [`RowIter::close`] to release the cursor
/// early.
pub struct RowIter {
    part: SheetPart,
    tables: Arc<Tables>,
    area: ReadArea,
    mode: ResultMode,
    formatter: DateFormatter,
    cursor: Option<SheetCursor>,
    state: State,
    formulas: SharedFormulas,
    limit: Option<usize>,
    yielded: usize,
    current_row: u32,
    buffer: Vec<Cell>,
    row_base: Option<u32>,
    col_base: Option<u32>,
    header: Option<HashMap<u32, Key>>,
    header_consumed: bool,
}

impl RowIter {
    pub(crate) fn new(
        part: SheetPart,
        tables: Arc<Tables>,
        area: ReadArea,
        mode: ResultMode,
        formatter: DateFormatter,
    ) -> Result<Self, XlsxError> {
        mode.validate()?;
        Ok(RowIter {
            part,
            tables,
            area,
            mode,
            formatter,
            cursor: None,
            state: State::SeekingGrid,
            formulas: SharedFormulas::default(),
            limit: None,
            yielded: 0,
            current_row: 0,
            buffer: Vec::new(),
            row_base: None,
            col_base: None,
            header: None,
            header_consumed: false,
        })
    }

    /// Stops after `limit` rows
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The read area
    pub fn area(&self) -> &ReadArea {
        &self.area
    }

    /// The result mode
    pub fn mode(&self) -> &ResultMode {
        &self.mode
    }

    /// Whether a cursor is currently open on the sheet
    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// Pulls one row, same as `next`
    pub fn read_next_row(&mut self) -> Option<Result<Record, XlsxError>> {
        self.next()
    }

    /// Closes the cursor, the next pull starts again from the first row
    pub fn reset(&mut self) {
        self.close();
        self.state = State::SeekingGrid;
        self.formulas.clear();
        self.yielded = 0;
        self.current_row = 0;
        self.buffer.clear();
        self.row_base = None;
        self.col_base = None;
        self.header = None;
        self.header_consumed = false;
    }

    /// Releases the cursor and ends iteration
    pub fn close(&mut self) {
        if self.cursor.take().is_some() {
            debug!("closing {}", self.part.path());
        }
        self.state = State::End;
    }

    /// Calls `f` with each row until it breaks
    ///
    /// Returns the number of rows passed to `f`. The cursor is closed on
    /// every exit.
    pub fn for_each_row<F>(&mut self, mut f: F) -> Result<usize, XlsxError>
    where
        F: FnMut(&Record) -> ControlFlow<()>,
    {
        let mut count = 0;
        while let Some(row) = self.next() {
            count += 1;
            if f(&row?).is_break() {
                break;
            }
        }
        self.close();
        Ok(count)
    }

    /// Calls `f(row_key, col_key, value)` with each entry until it breaks
    pub fn for_each_cell<F>(&mut self, mut f: F) -> Result<(), XlsxError>
    where
        F: FnMut(&Key, &Key, &Data) -> ControlFlow<()>,
    {
        'rows: while let Some(row) = self.next() {
            let row = row?;
            for (col, cell) in row.iter() {
                if f(row.key(), col, cell.value()).is_break() {
                    break 'rows;
                }
            }
        }
        self.close();
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Record>, XlsxError> {
        loop {
            match self.state {
                State::End => return Ok(None),
                State::SeekingGrid => {
                    self.cursor = Some(self.part.open(self.area.col_min, self.area.col_max)?);
                    self.state = State::RowClosed;
                }
                State::RowClosed => {
                    if self.limit.is_some_and(|l| self.yielded >= l) {
                        self.close();
                        return Ok(None);
                    }
                    let Some(cursor) = self.cursor.as_mut() else {
                        self.state = State::End;
                        return Ok(None);
                    };
                    match cursor.next_event()? {
                        SheetEvent::RowStart(r) if r < self.area.row_min => cursor.skip_row()?,
                        SheetEvent::RowStart(r) if r > self.area.row_max => {
                            self.close();
                            return Ok(None);
                        }
                        SheetEvent::RowStart(r) => self.open_row(r),
                        SheetEvent::End => {
                            self.close();
                            return Ok(None);
                        }
                        SheetEvent::Cell(_) | SheetEvent::RowEnd => (),
                    }
                }
                State::RowOpen => {
                    let Some(cursor) = self.cursor.as_mut() else {
                        self.state = State::End;
                        return Ok(None);
                    };
                    match cursor.next_event()? {
                        SheetEvent::Cell(raw) => {
                            if self.col_base.is_none() {
                                self.col_base = Some(raw.col);
                            }
                            let cell =
                                resolve_cell(raw, &self.tables, &mut self.formulas, &self.formatter);
                            self.store(cell);
                        }
                        SheetEvent::RowEnd | SheetEvent::End | SheetEvent::RowStart(_) => {
                            self.state = State::RowClosed;
                            if let Some(record) = self.close_row() {
                                self.yielded += 1;
                                return Ok(Some(record));
                            }
                        }
                    }
                }
            }
        }
    }

    fn open_row(&mut self, row: u32) {
        if self.row_base.is_none() {
            self.row_base = Some(row);
        }
        self.current_row = row;
        self.buffer.clear();
        if let Some(template) = self.area.columns() {
            if self.col_base.is_none() {
                self.col_base = template.first().copied();
            }
            self.buffer
                .extend(template.iter().map(|&col| Cell::empty(row, col)));
        }
        self.state = State::RowOpen;
    }

    fn store(&mut self, cell: Cell) {
        if let Some(first) = self.area.columns().and_then(|t| t.first().copied()) {
            if let Some(slot) = cell
                .col
                .checked_sub(first)
                .and_then(|i| self.buffer.get_mut(i as usize))
            {
                *slot = cell;
                return;
            }
        }
        self.buffer.push(cell);
    }

    /// Shapes the buffered row, `None` when it is consumed as header
    fn close_row(&mut self) -> Option<Record> {
        let cells = std::mem::take(&mut self.buffer);
        if (self.mode.first_row || self.area.first_row) && self.header.is_none() {
            let header = cells
                .iter()
                .map(|c| {
                    let key = match c.value() {
                        Data::Empty => self.default_col_key(c.col),
                        v => Key::Str(v.to_string()),
                    };
                    (c.col, key)
                })
                .collect();
            self.header = Some(header);
            if !self.area.has_column_keys() {
                self.header_consumed = true;
                return None;
            }
        }
        let entries = cells
            .into_iter()
            .map(|c| (self.col_key(c.col), c))
            .collect();
        Some(Record::new(self.row_key(self.current_row), self.current_row, entries))
    }

    fn relative(&self) -> bool {
        self.mode.relative
            && self.mode.row != RowIndexing::Original
            && self.mode.col != ColIndexing::Letter
    }

    fn row_key(&self, row: u32) -> Key {
        let row = row as i64;
        let hdr = self.header_consumed as i64;
        let base = if self.relative() {
            self.row_base.map_or(row, |b| b as i64)
        } else {
            1
        };
        match self.mode.row {
            RowIndexing::Original => Key::Num(row),
            RowIndexing::ZeroBased => Key::Num(row - base - hdr),
            RowIndexing::OneBased => Key::Num(row - base + 1 - hdr),
        }
    }

    fn col_key(&self, col: u32) -> Key {
        if let Some(key) = self.area.column_key(col) {
            return key.clone();
        }
        if let Some(key) = self.header.as_ref().and_then(|h| h.get(&col)) {
            return key.clone();
        }
        self.default_col_key(col)
    }

    fn default_col_key(&self, col: u32) -> Key {
        let base = if self.relative() {
            self.col_base.unwrap_or(1) as i64
        } else {
            1
        };
        match self.mode.col {
            ColIndexing::Letter => Key::Str(self.tables.columns.letter(col)),
            ColIndexing::ZeroBased => Key::Num(col as i64 - base),
            ColIndexing::OneBased => Key::Num(col as i64 - base + 1),
        }
    }
}

impl Iterator for RowIter {
    type Item = Result<Record, XlsxError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_row() {
            Ok(Some(r)) => Some(Ok(r)),
            Ok(None) => None,
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}

impl Drop for RowIter {
    fn drop(&mut self) {
        self.close();
    }
}
