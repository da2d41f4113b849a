// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Pull cursor over one worksheet part

use std::io::{BufReader, Cursor, Read, Seek};
use std::sync::Arc;

use flate2::read::DeflateDecoder;
use log::debug;
use quick_xml::{
    events::{attributes::Attribute, BytesStart, Event},
    name::QName,
    Reader as XmlReader,
};
use zip::{CompressionMethod, ZipArchive};

use super::{configure, read_string, XlsxError};
use crate::address::cell_position;
use crate::utils::{parse_usize, unescape_entity_to_buffer};

/// Decompressing reader over a part kept in memory
pub(crate) enum PartStream {
    Stored(Cursor<Arc<[u8]>>),
    Deflated(DeflateDecoder<Cursor<Arc<[u8]>>>),
}

impl Read for PartStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            PartStream::Stored(r) => r.read(buf),
            PartStream::Deflated(r) => r.read(buf),
        }
    }
}

pub(crate) type PartReader = XmlReader<BufReader<PartStream>>;

/// A worksheet part, kept compressed, that can be read any number of times
#[derive(Debug, Clone)]
pub(crate) struct SheetPart {
    path: String,
    data: Arc<[u8]>,
    deflated: bool,
}

impl SheetPart {
    /// Loads the raw bytes of `path` (case insensitive)
    pub fn load<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<Self, XlsxError> {
        let actual_path = zip
            .file_names()
            .find(|n| n.eq_ignore_ascii_case(path))
            .ok_or_else(|| XlsxError::FileNotFound(path.to_string()))?
            .to_owned();
        let index = zip
            .index_for_name(&actual_path)
            .ok_or_else(|| XlsxError::FileNotFound(path.to_string()))?;
        let method = zip.by_index_raw(index)?.compression();
        let mut data = Vec::new();
        let deflated = match method {
            CompressionMethod::Stored => {
                zip.by_index_raw(index)?.read_to_end(&mut data)?;
                false
            }
            CompressionMethod::Deflated => {
                zip.by_index_raw(index)?.read_to_end(&mut data)?;
                true
            }
            method => return Err(XlsxError::UnsupportedCompression(format!("{method:?}"))),
        };
        debug!("loaded part {actual_path} ({} bytes, deflated: {deflated})", data.len());
        Ok(SheetPart {
            path: actual_path,
            data: Arc::from(data),
            deflated,
        })
    }

    /// Builds a part from already decompressed xml
    #[cfg(test)]
    pub fn from_xml(xml: &str) -> Self {
        SheetPart {
            path: "xl/worksheets/sheet1.xml".to_string(),
            data: Arc::from(xml.as_bytes()),
            deflated: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn reader(&self) -> PartReader {
        let stream = Cursor::new(self.data.clone());
        let stream = if self.deflated {
            PartStream::Deflated(DeflateDecoder::new(stream))
        } else {
            PartStream::Stored(stream)
        };
        let mut xml = XmlReader::from_reader(BufReader::new(stream));
        configure(&mut xml);
        xml
    }

    /// Opens a new cursor positioned inside `<sheetData>`
    ///
    /// Columns outside `col_min..=col_max` are skipped without being parsed.
    pub fn open(&self, col_min: u32, col_max: u32) -> Result<SheetCursor, XlsxError> {
        let mut xml = self.reader();
        let mut buf = Vec::with_capacity(1024);
        let mut dimension = None;
        let mut at_end = false;
        loop {
            buf.clear();
            match xml.read_event_into(&mut buf).map_err(XlsxError::Xml)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"dimension" => {
                        for a in e.attributes() {
                            if let Attribute {
                                key: QName(b"ref"),
                                value: rdim,
                            } = a?
                            {
                                dimension = Some(xml.decoder().decode(&rdim)?.into_owned());
                                break;
                            }
                        }
                    }
                    b"sheetData" => break,
                    _ => (),
                },
                Event::Eof => {
                    at_end = true;
                    break;
                }
                _ => (),
            }
        }
        debug!("opened cursor on {}", self.path);
        Ok(SheetCursor {
            xml,
            buf,
            cell_buf: Vec::with_capacity(1024),
            dimension,
            col_min,
            col_max,
            row_index: 0,
            col_index: 0,
            at_end,
        })
    }
}

/// A formula as found in `<f>`
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FormulaDef {
    pub text: String,
    /// Shared group id (`si`) of `t="shared"` formulas
    pub shared: Option<String>,
}

/// A cell as found in the sheet, nothing resolved yet
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawCell {
    pub row: u32,
    pub col: u32,
    pub t: Option<String>,
    pub s: usize,
    pub v: Option<String>,
    pub f: Option<FormulaDef>,
    pub inline: Option<String>,
}

#[derive(Debug, PartialEq)]
pub(crate) enum SheetEvent {
    RowStart(u32),
    Cell(RawCell),
    RowEnd,
    End,
}

/// Node stream of `<sheetData>`
pub(crate) struct SheetCursor {
    xml: PartReader,
    buf: Vec<u8>,
    cell_buf: Vec<u8>,
    dimension: Option<String>,
    col_min: u32,
    col_max: u32,
    row_index: u32,
    col_index: u32,
    at_end: bool,
}

impl SheetCursor {
    /// `ref` of `<dimension>` if the sheet declares one
    pub fn dimension(&self) -> Option<&str> {
        self.dimension.as_deref()
    }

    /// Skips the rest of the current row
    pub fn skip_row(&mut self) -> Result<(), XlsxError> {
        self.buf.clear();
        self.xml.read_to_end_into(QName(b"row"), &mut self.buf)?;
        Ok(())
    }

    pub fn next_event(&mut self) -> Result<SheetEvent, XlsxError> {
        if self.at_end {
            return Ok(SheetEvent::End);
        }
        loop {
            self.buf.clear();
            let c_element = match self.xml.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"row" => {
                    let mut row = None;
                    for a in e.attributes() {
                        if let Attribute {
                            key: QName(b"r"),
                            value: v,
                        } = a?
                        {
                            row = parse_usize(&v).map(|r| r as u32);
                            break;
                        }
                    }
                    self.row_index = row.unwrap_or(self.row_index + 1);
                    self.col_index = 0;
                    return Ok(SheetEvent::RowStart(self.row_index));
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"row" => {
                    return Ok(SheetEvent::RowEnd);
                }
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"c" => e.to_owned(),
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"sheetData" => {
                    self.at_end = true;
                    return Ok(SheetEvent::End);
                }
                Ok(Event::Eof) => return Err(XlsxError::XmlEof("sheetData")),
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => continue,
            };
            if let Some(cell) = self.read_cell(&c_element)? {
                return Ok(SheetEvent::Cell(cell));
            }
        }
    }

    /// Reads `<c>` up to its end, `None` when the column is outside the area
    fn read_cell(&mut self, c_element: &BytesStart<'_>) -> Result<Option<RawCell>, XlsxError> {
        let mut pos = None;
        let mut cell = RawCell::default();
        for a in c_element.attributes() {
            match a? {
                Attribute {
                    key: QName(b"r"),
                    value: v,
                } => pos = cell_position(&v),
                Attribute {
                    key: QName(b"t"),
                    value: v,
                } => cell.t = Some(self.xml.decoder().decode(&v)?.into_owned()),
                Attribute {
                    key: QName(b"s"),
                    value: v,
                } => cell.s = parse_usize(&v).unwrap_or(0),
                _ => (),
            }
        }
        let (row, col) = match pos {
            Some((row, col)) if col > 0 => (if row > 0 { row } else { self.row_index }, col),
            _ => (self.row_index, self.col_index + 1),
        };
        self.col_index = col;
        cell.row = row;
        cell.col = col;

        if col < self.col_min || col > self.col_max {
            self.cell_buf.clear();
            self.xml.read_to_end_into(c_element.name(), &mut self.cell_buf)?;
            return Ok(None);
        }

        loop {
            self.cell_buf.clear();
            match self.xml.read_event_into(&mut self.cell_buf) {
                Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"v" => {
                        let e = e.to_owned();
                        cell.v = Some(read_text(&mut self.xml, e.name())?);
                    }
                    b"f" => {
                        let e = e.to_owned();
                        let mut shared = false;
                        let mut si = None;
                        for a in e.attributes() {
                            match a? {
                                Attribute {
                                    key: QName(b"t"),
                                    value: v,
                                } => shared = &*v == b"shared",
                                Attribute {
                                    key: QName(b"si"),
                                    value: v,
                                } => si = Some(self.xml.decoder().decode(&v)?.into_owned()),
                                _ => (),
                            }
                        }
                        let text = read_text(&mut self.xml, e.name())?;
                        cell.f = Some(FormulaDef {
                            text,
                            shared: if shared { si } else { None },
                        });
                    }
                    b"is" => {
                        let e = e.to_owned();
                        cell.inline = Some(read_string(&mut self.xml, e.name())?.unwrap_or_default());
                    }
                    _ => {
                        let e = e.to_owned();
                        let mut skip = Vec::new();
                        self.xml.read_to_end_into(e.name(), &mut skip)?;
                    }
                },
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"c" => break,
                Ok(Event::Eof) => return Err(XlsxError::XmlEof("c")),
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => (),
            }
        }
        Ok(Some(cell))
    }
}

impl Drop for SheetCursor {
    fn drop(&mut self) {
        debug!("closed cursor at row {}", self.row_index);
    }
}

/// Text content of a simple element such as `<v>` or `<f>`
fn read_text(xml: &mut PartReader, closing: QName<'_>) -> Result<String, XlsxError> {
    let mut buf = Vec::with_capacity(64);
    let mut value = String::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Text(t) => value.push_str(&t.xml10_content()?),
            Event::CData(t) => value.push_str(&String::from_utf8_lossy(&t)),
            Event::GeneralRef(e) => unescape_entity_to_buffer(&e, &mut value)?,
            Event::End(end) if end.name() == closing => break,
            Event::Eof => return Err(XlsxError::XmlEof("v")),
            _ => (),
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(xml: &str, col_min: u32, col_max: u32) -> Vec<SheetEvent> {
        let part = SheetPart::from_xml(xml);
        let mut cursor = part.open(col_min, col_max).unwrap();
        let mut out = Vec::new();
        loop {
            let ev = cursor.next_event().unwrap();
            let end = ev == SheetEvent::End;
            out.push(ev);
            if end {
                break;
            }
        }
        out
    }

    #[test]
    fn cells_and_rows() {
        let xml = r#"<worksheet><dimension ref="A1:B2"/><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" s="2"><f>SUM(1,2)</f><v>3</v></c></row>
            <row><c><v>&lt;x&gt;</v></c><c t="inlineStr"><is><t>a&amp;b</t></is></c></row>
            </sheetData></worksheet>"#;
        let ev = events(xml, 1, 100);
        assert_eq!(ev.len(), 9);
        assert_eq!(ev[0], SheetEvent::RowStart(1));
        match &ev[2] {
            SheetEvent::Cell(c) => {
                assert_eq!((c.row, c.col, c.s), (1, 2, 2));
                assert_eq!(c.f.as_ref().map(|f| f.text.as_str()), Some("SUM(1,2)"));
                assert_eq!(c.v.as_deref(), Some("3"));
            }
            e => panic!("unexpected {e:?}"),
        }
        assert_eq!(ev[4], SheetEvent::RowStart(2));
        match (&ev[5], &ev[6]) {
            (SheetEvent::Cell(a), SheetEvent::Cell(b)) => {
                assert_eq!((a.row, a.col), (2, 1));
                assert_eq!(a.v.as_deref(), Some("<x>"));
                assert_eq!((b.row, b.col), (2, 2));
                assert_eq!(b.inline.as_deref(), Some("a&b"));
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn dimension_and_column_filter() {
        let xml = r#"<worksheet><dimension ref="A1:C1"/><sheetData>
            <row r="1"><c r="A1"><v>1</v></c><c r="B1"><v>2</v></c><c r="C1"><v>3</v></c></row>
            </sheetData></worksheet>"#;
        let part = SheetPart::from_xml(xml);
        let cursor = part.open(2, 2).unwrap();
        assert_eq!(cursor.dimension(), Some("A1:C1"));
        let ev = events(xml, 2, 2);
        assert_eq!(ev.len(), 4);
        match &ev[1] {
            SheetEvent::Cell(c) => assert_eq!((c.col, c.v.as_deref()), (2, Some("2"))),
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn shared_formula() {
        let xml = r#"<worksheet><sheetData><row r="1">
            <c r="A1"><f t="shared" ref="A1:A2" si="0">B1*2</f><v>2</v></c>
            <c r="A2"><f t="shared" si="0"/><v>4</v></c>
            </row></sheetData></worksheet>"#;
        let ev = events(xml, 1, 10);
        let formulas: Vec<_> = ev
            .iter()
            .filter_map(|e| match e {
                SheetEvent::Cell(c) => c.f.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(formulas[0].shared.as_deref(), Some("0"));
        assert_eq!(formulas[0].text, "B1*2");
        assert_eq!(formulas[1].shared.as_deref(), Some("0"));
        assert_eq!(formulas[1].text, "");
    }

    #[test]
    fn empty_sheet() {
        assert_eq!(events("<worksheet></worksheet>", 1, 10), vec![SheetEvent::End]);
        assert_eq!(
            events("<worksheet><sheetData/></worksheet>", 1, 10),
            vec![SheetEvent::End]
        );
    }
}
