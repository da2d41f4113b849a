// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Streaming reader of xlsx packages

mod cells_reader;
mod style_parser;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::{BufRead, BufReader, Read, Seek};
use std::sync::Arc;

use log::{debug, warn};
use quick_xml::{
    events::{attributes::Attribute, Event},
    name::QName,
    Reader as XmlReader,
};
use zip::read::{ZipArchive, ZipFile};
use zip::result::ZipError;

use crate::address::{parse_range, AddressError, ColumnCache, ReadArea};
use crate::datatype::Key;
use crate::dates::{DateFormatter, DateModel, PatternCache};
use crate::formats::{DateFormatPolicy, DefaultDatePolicy};
use crate::rows::{Record, ResultMode, RowIter};
use crate::sheet::{DefinedName, Sheet, SheetVisible};
use crate::style::StyleSheet;
use crate::utils::unescape_entity_to_buffer;
use crate::value::Tables;

pub(crate) use cells_reader::{FormulaDef, RawCell, SheetCursor, SheetEvent, SheetPart};

pub(crate) type XlReader<'a, RS> = XmlReader<BufReader<ZipFile<'a, RS>>>;

/// An enum for Xlsx specific errors
#[derive(Debug)]
pub enum XlsxError {
    /// Io error
    Io(std::io::Error),
    /// Zip error
    Zip(zip::result::ZipError),
    /// Xml error
    Xml(quick_xml::Error),
    /// Xml attribute error
    XmlAttr(quick_xml::events::attributes::AttrError),
    /// XML Encoding error
    Encoding(quick_xml::encoding::EncodingError),
    /// XML escape error
    Escape(quick_xml::escape::EscapeError),
    /// `ParseInt` error
    ParseInt(std::num::ParseIntError),
    /// Malformed range or column
    Address(AddressError),
    /// Unexpected end of xml
    XmlEof(&'static str),
    /// File not found
    FileNotFound(String),
    /// Relationship not found
    RelationshipNotFound(String),
    /// Compression method other than stored or deflated
    UnsupportedCompression(String),
    /// Unrecognized data
    Unrecognized {
        /// data type
        typ: &'static str,
        /// value found
        val: String,
    },
    /// The workbook has no worksheet
    NoWorksheet,
    /// Worksheet not found
    WorksheetNotFound(String),
    /// Worksheet id not found
    WorksheetIdNotFound(u32),
    /// Defined name not found
    DefinedNameNotFound(String),
    /// Defined name pointing at another sheet than the selected one
    DefinedNameOtherSheet {
        /// Defined name
        name: String,
        /// Sheet it points at
        sheet: String,
    },
    /// Result mode that would silently do nothing
    InvalidResultMode(&'static str),
}

from_err!(std::io::Error, XlsxError, Io);
from_err!(zip::result::ZipError, XlsxError, Zip);
from_err!(quick_xml::Error, XlsxError, Xml);
from_err!(quick_xml::events::attributes::AttrError, XlsxError, XmlAttr);
from_err!(quick_xml::encoding::EncodingError, XlsxError, Encoding);
from_err!(quick_xml::escape::EscapeError, XlsxError, Escape);
from_err!(std::num::ParseIntError, XlsxError, ParseInt);
from_err!(AddressError, XlsxError, Address);

impl fmt::Display for XlsxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XlsxError::Io(e) => write!(f, "I/O error: {e}"),
            XlsxError::Zip(e) => write!(f, "Zip error: {e}"),
            XlsxError::Xml(e) => write!(f, "Xml error: {e}"),
            XlsxError::XmlAttr(e) => write!(f, "Xml attribute error: {e}"),
            XlsxError::Encoding(e) => write!(f, "XML encoding error: {e}"),
            XlsxError::Escape(e) => write!(f, "XML escape error: {e}"),
            XlsxError::ParseInt(e) => write!(f, "Parse integer error: {e}"),
            XlsxError::Address(e) => write!(f, "Address error: {e}"),
            XlsxError::XmlEof(e) => write!(f, "Unexpected end of xml, expecting '</{e}>'"),
            XlsxError::FileNotFound(e) => write!(f, "File not found '{e}'"),
            XlsxError::RelationshipNotFound(id) => write!(f, "Relationship '{id}' not found"),
            XlsxError::UnsupportedCompression(m) => {
                write!(f, "Unsupported compression method: {m}")
            }
            XlsxError::Unrecognized { typ, val } => write!(f, "Unrecognized {typ}: {val}"),
            XlsxError::NoWorksheet => write!(f, "Workbook has no worksheet"),
            XlsxError::WorksheetNotFound(n) => write!(f, "Worksheet '{n}' not found"),
            XlsxError::WorksheetIdNotFound(id) => write!(f, "Worksheet with id {id} not found"),
            XlsxError::DefinedNameNotFound(n) => write!(f, "Defined name '{n}' not found"),
            XlsxError::DefinedNameOtherSheet { name, sheet } => {
                write!(f, "Defined name '{name}' refers to another sheet '{sheet}'")
            }
            XlsxError::InvalidResultMode(e) => write!(f, "Invalid result mode: {e}"),
        }
    }
}

impl std::error::Error for XlsxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XlsxError::Io(e) => Some(e),
            XlsxError::Zip(e) => Some(e),
            XlsxError::Xml(e) => Some(e),
            XlsxError::XmlAttr(e) => Some(e),
            XlsxError::Encoding(e) => Some(e),
            XlsxError::Escape(e) => Some(e),
            XlsxError::ParseInt(e) => Some(e),
            XlsxError::Address(e) => Some(e),
            _ => None,
        }
    }
}

/// Xlsx reader options
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct XlsxOptions {
    /// Decides which number formats hold dates
    pub date_policy: Arc<dyn DateFormatPolicy>,
}

impl Default for XlsxOptions {
    fn default() -> Self {
        XlsxOptions {
            date_policy: Arc::new(DefaultDatePolicy),
        }
    }
}

impl XlsxOptions {
    /// Replaces the date format policy
    pub fn with_date_policy<P: DateFormatPolicy + 'static>(mut self, policy: P) -> Self {
        self.date_policy = Arc::new(policy);
        self
    }
}

/// A `<Relationship>` of `workbook.xml.rels`
#[derive(Debug, Clone)]
struct Relationship {
    /// Part path inside the package
    target: String,
    /// Last segment of the `Type` uri (`worksheet`, `sharedStrings`...)
    typ: String,
}

/// A struct representing xml zipped excel file
///
/// Tables shared by all sheets (shared strings, styles, date epoch) are
/// loaded when the workbook is opened. Sheets are read lazily, one row at a
/// time.
pub struct Xlsx<RS> {
    zip: ZipArchive<RS>,
    tables: Arc<Tables>,
    sheets: Vec<Sheet>,
    defined_names: Vec<DefinedName>,
    /// Loaded sheet parts by path
    parts: HashMap<String, SheetPart>,
    /// Read areas by sheet index
    areas: HashMap<usize, ReadArea>,
    selected: Option<usize>,
    formatter: DateFormatter,
    mode: ResultMode,
    /// Step-wise reader of the selected sheet
    stepper: Option<RowIter>,
}

impl<RS: Read + Seek> Xlsx<RS> {
    /// Opens a workbook with default options
    pub fn new(reader: RS) -> Result<Self, XlsxError> {
        Self::with_options(reader, XlsxOptions::default())
    }

    /// Opens a workbook
    pub fn with_options(reader: RS, options: XlsxOptions) -> Result<Self, XlsxError> {
        let mut zip = ZipArchive::new(reader)?;
        let relationships = read_relationships(&mut zip)?;
        let (sheets, defined_names, is_1904) = read_workbook(&mut zip, &relationships)?;

        let part_of = |typ: &str, default: &str| {
            relationships
                .values()
                .find(|r| r.typ == typ)
                .map_or_else(|| default.to_string(), |r| r.target.clone())
        };
        let strings = read_shared_strings(&mut zip, &part_of("sharedStrings", "xl/sharedStrings.xml"))?;
        let mut styles = read_styles(&mut zip, &part_of("styles", "xl/styles.xml"))?;
        styles.finish(options.date_policy.as_ref());
        debug!(
            "opened workbook: {} sheets, {} shared strings, {} styles, 1904: {is_1904}",
            sheets.len(),
            strings.len(),
            styles.len()
        );

        Ok(Xlsx {
            zip,
            tables: Arc::new(Tables {
                strings,
                styles,
                dates: DateModel::new(is_1904),
                columns: ColumnCache::new(),
                patterns: PatternCache::new(),
            }),
            sheets,
            defined_names,
            parts: HashMap::new(),
            areas: HashMap::new(),
            selected: None,
            formatter: DateFormatter::default(),
            mode: ResultMode::default(),
            stepper: None,
        })
    }

    /// Sheets in workbook order
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Workbook defined names
    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    /// Looks up a defined name, case insensitive
    pub fn defined_name(&self, name: &str) -> Result<&DefinedName, XlsxError> {
        self.defined_names
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| XlsxError::DefinedNameNotFound(name.to_string()))
    }

    /// Shared strings table
    pub fn shared_strings(&self) -> &[String] {
        &self.tables.strings
    }

    /// Style tables
    pub fn styles(&self) -> &StyleSheet {
        &self.tables.styles
    }

    /// Whether dates use the 1904 epoch
    pub fn is_1904(&self) -> bool {
        self.tables.dates.is_1904()
    }

    /// Selects a sheet by name (case insensitive)
    pub fn select_sheet(&mut self, name: &str) -> Result<&Sheet, XlsxError> {
        let idx = self
            .sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| XlsxError::WorksheetNotFound(name.to_string()))?;
        Ok(self.select(idx))
    }

    /// Selects a sheet by name and sets its read area
    pub fn select_sheet_with_area(&mut self, name: &str, range: &str) -> Result<&Sheet, XlsxError> {
        self.select_sheet(name)?;
        self.set_read_area(range)?;
        let idx = self.selected_index()?;
        Ok(&self.sheets[idx])
    }

    /// Selects a sheet by its `sheetId`
    pub fn select_sheet_by_id(&mut self, id: u32) -> Result<&Sheet, XlsxError> {
        let idx = self
            .sheets
            .iter()
            .position(|s| s.id == id)
            .ok_or(XlsxError::WorksheetIdNotFound(id))?;
        Ok(self.select(idx))
    }

    /// Selects the first sheet of the workbook
    pub fn select_first_sheet(&mut self) -> Result<&Sheet, XlsxError> {
        if self.sheets.is_empty() {
            return Err(XlsxError::NoWorksheet);
        }
        Ok(self.select(0))
    }

    /// The selected sheet, the first one when none was selected
    pub fn selected_sheet(&self) -> Option<&Sheet> {
        self.sheets.get(self.selected.unwrap_or(0))
    }

    fn select(&mut self, idx: usize) -> &Sheet {
        if self.selected != Some(idx) {
            self.stepper = None;
            self.selected = Some(idx);
        }
        &self.sheets[idx]
    }

    fn selected_index(&self) -> Result<usize, XlsxError> {
        match self.selected {
            Some(idx) => Ok(idx),
            None if self.sheets.is_empty() => Err(XlsxError::NoWorksheet),
            None => Ok(0),
        }
    }

    /// Restricts reading of the selected sheet to a range or a defined name
    ///
    /// See [`ReadArea::parse`] for the range forms. Defined names are looked
    /// up first and must point at the selected sheet. The first row and
    /// column keys settings of the previous area are kept.
    pub fn set_read_area(&mut self, range: &str) -> Result<(), XlsxError> {
        let idx = self.selected_index()?;
        let parsed = match self
            .defined_names
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(range.trim()))
        {
            Some(name) => {
                let (sheet, reference) = name.sheet_and_range();
                if let Some(sheet) = sheet {
                    if !sheet.eq_ignore_ascii_case(&self.sheets[idx].name) {
                        return Err(XlsxError::DefinedNameOtherSheet {
                            name: name.name.clone(),
                            sheet: sheet.to_string(),
                        });
                    }
                }
                parse_range(reference)?
            }
            None => parse_range(range)?,
        };
        self.update_area(idx, |area| {
            area.row_min = parsed.row_min;
            area.row_max = parsed.row_max;
            area.col_min = parsed.col_min;
            area.col_max = parsed.col_max;
            area.set_columns(parsed.columns().map(<[u32]>::to_vec));
        });
        Ok(())
    }

    /// Restricts reading of the selected sheet to columns (`C:AZ`)
    pub fn set_read_columns(&mut self, columns: &str) -> Result<(), XlsxError> {
        let parsed = parse_range(columns)?;
        if parsed.row_min != 1 || parsed.row_max != crate::address::MAX_ROWS {
            return Err(AddressError::Malformed(columns.to_string()).into());
        }
        self.set_read_area(columns)
    }

    /// Replaces the read area of the selected sheet
    pub fn set_area(&mut self, area: ReadArea) -> Result<(), XlsxError> {
        let idx = self.selected_index()?;
        self.stepper = None;
        self.areas.insert(idx, area);
        Ok(())
    }

    /// Read area of the selected sheet
    pub fn read_area(&self) -> ReadArea {
        self.selected_index()
            .ok()
            .and_then(|idx| self.areas.get(&idx).cloned())
            .unwrap_or_default()
    }

    /// Sets whether the first row of the selected sheet provides column keys
    pub fn set_first_row(&mut self, first_row: bool) -> Result<(), XlsxError> {
        let idx = self.selected_index()?;
        self.update_area(idx, |area| area.first_row = first_row);
        Ok(())
    }

    /// Sets explicit column keys (by column letters) on the selected sheet
    pub fn set_column_keys<I, L, K>(&mut self, keys: I) -> Result<(), XlsxError>
    where
        I: IntoIterator<Item = (L, K)>,
        L: AsRef<str>,
        K: Into<Key>,
    {
        let idx = self.selected_index()?;
        let area = self.read_area().with_column_keys(keys)?;
        self.stepper = None;
        self.areas.insert(idx, area);
        Ok(())
    }

    fn update_area<F: FnOnce(&mut ReadArea)>(&mut self, idx: usize, f: F) {
        self.stepper = None;
        f(self.areas.entry(idx).or_default());
    }

    /// Renders every date with a fixed chrono pattern (`%Y-%m-%d`)
    pub fn set_date_format(&mut self, pattern: &str) {
        self.set_date_formatter(DateFormatter::Pattern(pattern.to_string()));
    }

    /// Sets how date cells are rendered
    pub fn set_date_formatter(&mut self, formatter: DateFormatter) {
        self.formatter = formatter;
        self.stepper = None;
    }

    /// Result mode used by [`Xlsx::read_next_row`]
    pub fn set_result_mode(&mut self, mode: ResultMode) -> Result<(), XlsxError> {
        mode.validate()?;
        self.mode = mode;
        self.stepper = None;
        Ok(())
    }

    fn part(&mut self, idx: usize) -> Result<SheetPart, XlsxError> {
        let path = &self.sheets[idx].path;
        if let Some(part) = self.parts.get(path) {
            return Ok(part.clone());
        }
        let part = SheetPart::load(&mut self.zip, path)?;
        self.parts.insert(path.clone(), part.clone());
        Ok(part)
    }

    /// Lazy rows of the selected sheet
    pub fn rows(&mut self, mode: ResultMode) -> Result<RowIter, XlsxError> {
        let area = self.read_area();
        self.rows_in(area, mode)
    }

    pub(crate) fn rows_in(&mut self, area: ReadArea, mode: ResultMode) -> Result<RowIter, XlsxError> {
        let idx = self.selected_index()?;
        let part = self.part(idx)?;
        RowIter::new(part, self.tables.clone(), area, mode, self.formatter.clone())
    }

    pub(crate) fn selected_part(&mut self) -> Result<SheetPart, XlsxError> {
        let idx = self.selected_index()?;
        self.part(idx)
    }

    /// Reads the next row of the selected sheet
    ///
    /// Rows are shaped with the mode set by [`Xlsx::set_result_mode`].
    /// Returns `None` once the sheet is exhausted, until [`Xlsx::reset`].
    pub fn read_next_row(&mut self) -> Option<Result<Record, XlsxError>> {
        if self.stepper.is_none() {
            match self.rows(self.mode) {
                Ok(rows) => self.stepper = Some(rows),
                Err(e) => return Some(Err(e)),
            }
        }
        self.stepper.as_mut().and_then(Iterator::next)
    }

    /// Restarts [`Xlsx::read_next_row`] from the first row
    pub fn reset(&mut self) {
        if let Some(rows) = self.stepper.as_mut() {
            rows.reset();
        }
    }
}

/// Applies the reader configuration used for every part
pub(crate) fn configure<R>(xml: &mut XmlReader<R>) {
    let config = xml.config_mut();
    config.check_end_names = false;
    config.trim_text(false);
    config.check_comments = false;
    config.expand_empty_elements = true;
}

fn xml_reader<'a, RS: Read + Seek>(
    zip: &'a mut ZipArchive<RS>,
    path: &str,
) -> Option<Result<XlReader<'a, RS>, XlsxError>> {
    let actual_path = zip
        .file_names()
        .find(|n| n.eq_ignore_ascii_case(path))?
        .to_owned();
    match zip.by_name(&actual_path) {
        Ok(f) => {
            debug!("reading part {actual_path}");
            let mut r = XmlReader::from_reader(BufReader::new(f));
            configure(&mut r);
            Some(Ok(r))
        }
        Err(ZipError::FileNotFound) => None,
        Err(e) => Some(Err(e.into())),
    }
}

/// Resolves a relationship target against the `xl/` folder
fn part_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{target}")
    }
}

fn read_relationships<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
) -> Result<BTreeMap<Vec<u8>, Relationship>, XlsxError> {
    let mut xml = match xml_reader(zip, "xl/_rels/workbook.xml.rels") {
        None => {
            return Err(XlsxError::FileNotFound(
                "xl/_rels/workbook.xml.rels".to_string(),
            ));
        }
        Some(x) => x?,
    };
    let mut relationships = BTreeMap::new();
    let mut buf = Vec::with_capacity(64);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = Vec::new();
                let mut target = String::new();
                let mut typ = String::new();
                for a in e.attributes() {
                    match a? {
                        Attribute {
                            key: QName(b"Id"),
                            value: v,
                        } => id.extend_from_slice(&v),
                        Attribute {
                            key: QName(b"Target"),
                            value: v,
                        } => target = xml.decoder().decode(&v)?.into_owned(),
                        Attribute {
                            key: QName(b"Type"),
                            value: v,
                        } => {
                            let uri = xml.decoder().decode(&v)?;
                            typ = uri.rsplit('/').next().unwrap_or_default().to_string();
                        }
                        _ => (),
                    }
                }
                relationships.insert(
                    id,
                    Relationship {
                        target: part_path(&target),
                        typ,
                    },
                );
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"Relationships" => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("Relationships")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(relationships)
}

type WorkbookParts = (Vec<Sheet>, Vec<DefinedName>, bool);

fn read_workbook<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    relationships: &BTreeMap<Vec<u8>, Relationship>,
) -> Result<WorkbookParts, XlsxError> {
    let mut xml = match xml_reader(zip, "xl/workbook.xml") {
        None => return Err(XlsxError::FileNotFound("xl/workbook.xml".to_string())),
        Some(x) => x?,
    };
    let mut sheets = Vec::new();
    let mut defined_names = Vec::new();
    let mut is_1904 = false;
    let mut buf = Vec::with_capacity(1024);
    let mut val_buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut id = None;
                let mut path = None;
                let mut visible = SheetVisible::Visible;
                for a in e.attributes() {
                    let a = a?;
                    match a {
                        Attribute {
                            key: QName(b"name"),
                            ..
                        } => {
                            name = a.decode_and_unescape_value(xml.decoder())?.to_string();
                        }
                        Attribute {
                            key: QName(b"sheetId"),
                            value: ref v,
                        } => id = Some(xml.decoder().decode(v)?.trim().parse::<u32>()?),
                        Attribute {
                            key: QName(b"state"),
                            ..
                        } => {
                            visible = match a.decode_and_unescape_value(xml.decoder())?.as_ref() {
                                "visible" => SheetVisible::Visible,
                                "hidden" => SheetVisible::Hidden,
                                "veryHidden" => SheetVisible::VeryHidden,
                                v => {
                                    return Err(XlsxError::Unrecognized {
                                        typ: "sheet:state",
                                        val: v.to_string(),
                                    })
                                }
                            }
                        }
                        Attribute {
                            key: QName(b"r:id"),
                            value: ref v,
                        }
                        | Attribute {
                            key: QName(b"relationships:id"),
                            value: ref v,
                        } => {
                            let r = relationships.get(&**v).ok_or_else(|| {
                                XlsxError::RelationshipNotFound(
                                    String::from_utf8_lossy(v).into_owned(),
                                )
                            })?;
                            path = Some(r.target.clone());
                        }
                        _ => (),
                    }
                }
                let Some(path) = path else {
                    warn!("sheet '{name}' has no relationship, skipping");
                    continue;
                };
                sheets.push(Sheet {
                    id: id.unwrap_or(sheets.len() as u32 + 1),
                    name,
                    path,
                    visible,
                });
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"workbookPr" => {
                is_1904 = match e.try_get_attribute("date1904")? {
                    Some(c) => ["1", "true"].contains(
                        &c.decode_and_unescape_value(xml.decoder())?.as_ref(),
                    ),
                    None => false,
                };
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"definedName" => {
                let mut name = None;
                let mut local_sheet_id = None;
                for a in e.attributes() {
                    let a = a?;
                    match a.key {
                        QName(b"name") => {
                            name = Some(a.decode_and_unescape_value(xml.decoder())?.into_owned())
                        }
                        QName(b"localSheetId") => {
                            local_sheet_id = xml.decoder().decode(&a.value)?.trim().parse().ok()
                        }
                        _ => (),
                    }
                }
                let closing = e.to_owned();
                let mut value = String::new();
                loop {
                    val_buf.clear();
                    match xml.read_event_into(&mut val_buf)? {
                        Event::Text(t) => value.push_str(&t.xml10_content()?),
                        Event::GeneralRef(r) => unescape_entity_to_buffer(&r, &mut value)?,
                        Event::End(end) if end.name() == closing.name() => break,
                        Event::Eof => return Err(XlsxError::XmlEof("definedName")),
                        _ => (),
                    }
                }
                if let Some(name) = name {
                    defined_names.push(DefinedName {
                        name,
                        value,
                        local_sheet_id,
                    });
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"workbook" => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("workbook")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok((sheets, defined_names, is_1904))
}

fn read_shared_strings<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    path: &str,
) -> Result<Vec<String>, XlsxError> {
    let mut xml = match xml_reader(zip, path) {
        None => return Ok(Vec::new()),
        Some(x) => x?,
    };
    let mut strings = Vec::new();
    let mut buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"si" => {
                let closing = e.to_owned();
                strings.push(read_string(&mut xml, closing.name())?.unwrap_or_default());
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"sst" => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("sst")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(strings)
}

fn read_styles<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    path: &str,
) -> Result<StyleSheet, XlsxError> {
    match xml_reader(zip, path) {
        None => Ok(StyleSheet::default()),
        Some(xml) => style_parser::read_style_sheet(&mut xml?),
    }
}

/// attempts to read either a simple or richtext string
///
/// Phonetic runs (`<rPh>`) are left out.
pub(crate) fn read_string<B: BufRead>(
    xml: &mut XmlReader<B>,
    closing: QName<'_>,
) -> Result<Option<String>, XlsxError> {
    let mut buf = Vec::with_capacity(1024);
    let mut val_buf = Vec::with_capacity(1024);
    let mut value: Option<String> = None;
    let mut is_phonetic_text = false;
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"rPh" => {
                is_phonetic_text = true;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"rPh" => {
                is_phonetic_text = false;
            }
            Ok(Event::End(ref e)) if e.name() == closing => return Ok(value),
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"t" && !is_phonetic_text => {
                let t = e.to_owned();
                let s = value.get_or_insert_with(String::new);
                loop {
                    val_buf.clear();
                    match xml.read_event_into(&mut val_buf)? {
                        Event::Text(text) => s.push_str(&text.xml10_content()?),
                        Event::CData(text) => s.push_str(&String::from_utf8_lossy(&text)),
                        Event::GeneralRef(r) => unescape_entity_to_buffer(&r, s)?,
                        Event::End(end) if end.name() == t.name() => break,
                        Event::Eof => return Err(XlsxError::XmlEof("t")),
                        _ => (),
                    }
                }
            }
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("si")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(xml: &str) -> Option<String> {
        let mut reader = XmlReader::from_str(xml);
        configure(&mut reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if let Ok(Event::Start(e)) = reader.read_event_into(&mut buf) {
                let closing = e.to_owned();
                return read_string(&mut reader, closing.name()).unwrap();
            }
        }
    }

    #[test]
    fn simple_and_rich_strings() {
        assert_eq!(read("<si><t>a &amp; b</t></si>").as_deref(), Some("a & b"));
        assert_eq!(
            read("<si><r><rPr><b/></rPr><t>bold</t></r><r><t xml:space=\"preserve\"> plain</t></r></si>")
                .as_deref(),
            Some("bold plain")
        );
        assert_eq!(
            read("<si><t>漢字</t><rPh sb=\"0\" eb=\"2\"><t>かんじ</t></rPh></si>").as_deref(),
            Some("漢字")
        );
        assert_eq!(read("<si></si>"), None);
        assert_eq!(read("<x:si><x:t>ns</x:t></x:si>").as_deref(), Some("ns"));
    }

    #[test]
    fn relationship_targets() {
        assert_eq!(part_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(part_path("/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(part_path("xl/styles.xml"), "xl/styles.xml");
    }
}
