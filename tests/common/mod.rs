// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! In memory xlsx packages

#![allow(dead_code)]

use std::io::{Cursor, Write};

use xlstream::Xlsx;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Minimal style sheet: 0 general, 1 `m/d/yyyy` (14), 2 custom date time,
/// 3 bold red font on a yellow fill, 4 text (`@`)
pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts>
<fonts count="2">
<font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>
<font><b/><sz val="11"/><color rgb="FFFF0000"/><name val="Calibri"/></font>
</fonts>
<fills count="3">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
<fill><patternFill patternType="solid"><fgColor indexed="13"/><bgColor indexed="64"/></patternFill></fill>
</fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="5">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/>
<xf numFmtId="49" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
</cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

/// Builder of a package holding worksheets, shared strings and styles
#[derive(Debug, Clone)]
pub struct Package {
    sheets: Vec<(String, String)>,
    strings: Vec<String>,
    styles: Option<String>,
    names: Vec<(String, String)>,
    date1904: bool,
    method: CompressionMethod,
}

impl Default for Package {
    fn default() -> Self {
        Package {
            sheets: Vec::new(),
            strings: Vec::new(),
            styles: Some(STYLES.to_string()),
            names: Vec::new(),
            date1904: false,
            method: CompressionMethod::Deflated,
        }
    }
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet made of `<row>` elements
    pub fn sheet(self, name: &str, rows: &str) -> Self {
        self.sheet_with_dimension(name, None, rows)
    }

    /// Adds a sheet made of `<row>` elements, declaring a dimension
    pub fn sheet_with_dimension(mut self, name: &str, dimension: Option<&str>, rows: &str) -> Self {
        let dimension = dimension
            .map(|d| format!(r#"<dimension ref="{d}"/>"#))
            .unwrap_or_default();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{NS}" xmlns:r="{REL}">{dimension}<sheetViews><sheetView workbookViewId="0"/></sheetViews><sheetData>{rows}</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#
        );
        self.sheets.push((name.to_string(), xml));
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn without_styles(mut self) -> Self {
        self.styles = None;
        self
    }

    pub fn defined_name(mut self, name: &str, value: &str) -> Self {
        self.names.push((name.to_string(), value.to_string()));
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    pub fn compression(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(self.method);
        let mut add = |name: &str, content: &str| {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        let mut rels = String::new();
        let mut sheets = String::new();
        for (i, (name, xml)) in self.sheets.iter().enumerate() {
            let n = i + 1;
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="{REL}/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));
            sheets.push_str(&format!(
                r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
            ));
            add(&format!("xl/worksheets/sheet{n}.xml"), xml);
        }
        if !self.strings.is_empty() {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdS" Type="{REL}/sharedStrings" Target="sharedStrings.xml"/>"#
            ));
            let items: String = self
                .strings
                .iter()
                .map(|s| format!("<si><t>{s}</t></si>"))
                .collect();
            add(
                "xl/sharedStrings.xml",
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{NS}" count="{0}" uniqueCount="{0}">{items}</sst>"#,
                    self.strings.len()
                ),
            );
        }
        if let Some(styles) = &self.styles {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdT" Type="{REL}/styles" Target="styles.xml"/>"#
            ));
            add("xl/styles.xml", styles);
        }
        let names = if self.names.is_empty() {
            String::new()
        } else {
            let items: String = self
                .names
                .iter()
                .map(|(n, v)| format!(r#"<definedName name="{n}">{v}</definedName>"#))
                .collect();
            format!("<definedNames>{items}</definedNames>")
        };
        let pr = if self.date1904 {
            r#"<workbookPr date1904="1"/>"#
        } else {
            r#"<workbookPr defaultThemeVersion="164011"/>"#
        };
        add(
            "xl/workbook.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{NS}" xmlns:r="{REL}">{pr}<sheets>{sheets}</sheets>{names}</workbook>"#
            ),
        );
        add(
            "xl/_rels/workbook.xml.rels",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        );
        zip.finish().unwrap().into_inner()
    }

    pub fn open(&self) -> Xlsx<Cursor<Vec<u8>>> {
        Xlsx::new(Cursor::new(self.build())).unwrap()
    }
}

/// A sheet of `n` rows, `A{i}` holding `i` and `B{i}` holding `i * 10`
pub fn numbered_rows(n: u32) -> String {
    (1..=n)
        .map(|i| {
            format!(
                r#"<row r="{i}"><c r="A{i}"><v>{i}</v></c><c r="B{i}"><v>{}</v></c></row>"#,
                i * 10
            )
        })
        .collect()
}
