// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

use quick_xml::{
    events::{attributes::Attribute, BytesStart, Event},
    name::QName,
    Reader,
};
use std::io::BufRead;
use std::sync::Arc;

use log::warn;

use crate::style::{Alignment, Border, BorderSide, Color, Fill, Font, StyleSheet, XfEntry};
use crate::utils::parse_usize;
use crate::XlsxError;

fn is_true(v: &[u8]) -> bool {
    v == b"1" || v == b"true"
}

/// Parse color from element attributes
///
/// Follows Excel precedence: rgb > theme > indexed > auto
fn parse_color(e: &BytesStart<'_>) -> Result<Option<Color>, XlsxError> {
    let mut rgb = None;
    let mut theme = None;
    let mut tint = None;
    let mut indexed = None;
    let mut auto = false;
    for attr in e.attributes() {
        match attr? {
            Attribute {
                key: QName(b"rgb"),
                value: v,
            } => {
                let s = String::from_utf8_lossy(&v);
                match (s.len(), u32::from_str_radix(&s, 16)) {
                    (8, Ok(argb)) => rgb = Some(argb),
                    (6, Ok(v)) => rgb = Some(0xFF00_0000 | v),
                    _ => warn!("invalid color '{s}'"),
                }
            }
            Attribute {
                key: QName(b"theme"),
                value: v,
            } => theme = atoi_simd::parse::<u32>(&v).ok(),
            Attribute {
                key: QName(b"tint"),
                value: v,
            } => {
                tint = fast_float2::parse::<f64, _>(&*v)
                    .ok()
                    .map(|t| t.clamp(-1.0, 1.0))
            }
            Attribute {
                key: QName(b"indexed"),
                value: v,
            } => indexed = atoi_simd::parse::<u32>(&v).ok(),
            Attribute {
                key: QName(b"auto"),
                value: v,
            } => auto = is_true(&v),
            _ => (),
        }
    }
    Ok(match (rgb, theme, indexed) {
        (Some(argb), _, _) => Some(Color::Argb(argb)),
        (None, Some(index), _) => Some(Color::Theme { index, tint }),
        (None, None, Some(i)) => Some(Color::Indexed(i)),
        _ if auto => Some(Color::Auto),
        _ => None,
    })
}

/// `val` attribute of an element, decoded
fn val<RS: BufRead>(xml: &Reader<RS>, e: &BytesStart<'_>) -> Result<Option<String>, XlsxError> {
    match e.try_get_attribute("val")? {
        Some(a) => Ok(Some(a.decode_and_unescape_value(xml.decoder())?.into_owned())),
        None => Ok(None),
    }
}

/// Flag elements such as `<b/>`, `<b val="0"/>`
fn flag<RS: BufRead>(xml: &Reader<RS>, e: &BytesStart<'_>) -> Result<bool, XlsxError> {
    Ok(val(xml, e)?.is_none_or(|v| v != "0" && v != "false"))
}

fn skip<RS: BufRead>(xml: &mut Reader<RS>, e: &BytesStart<'_>) -> Result<(), XlsxError> {
    let mut buf = Vec::new();
    xml.read_to_end_into(e.name(), &mut buf)?;
    Ok(())
}

/// Parse a `<font>` element
fn parse_font<RS: BufRead>(xml: &mut Reader<RS>) -> Result<Font, XlsxError> {
    let mut font = Font::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let e = e.to_owned();
                match e.local_name().as_ref() {
                    b"name" | b"rFont" => font.name = val(xml, &e)?,
                    b"sz" => {
                        font.size = val(xml, &e)?.and_then(|v| fast_float2::parse(v).ok());
                    }
                    b"b" => font.bold = flag(xml, &e)?,
                    b"i" => font.italic = flag(xml, &e)?,
                    b"strike" => font.strike = flag(xml, &e)?,
                    b"u" => {
                        font.underline = Some(val(xml, &e)?.unwrap_or_else(|| "single".into()));
                        font.underline.take_if(|u| u == "none");
                    }
                    b"color" => font.color = parse_color(&e)?,
                    b"family" => {
                        font.family = val(xml, &e)?.and_then(|v| v.parse().ok());
                    }
                    b"scheme" => font.scheme = val(xml, &e)?,
                    _ => (),
                }
                skip(xml, &e)?;
            }
            Event::End(ref e) if e.local_name().as_ref() == b"font" => break,
            Event::Eof => return Err(XlsxError::XmlEof("font")),
            _ => (),
        }
    }
    Ok(font)
}

/// Parse a `<fill>` element
fn parse_fill<RS: BufRead>(xml: &mut Reader<RS>) -> Result<Fill, XlsxError> {
    let mut fill = Fill::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"patternFill" => {
                    if let Some(a) = e.try_get_attribute("patternType")? {
                        fill.pattern = Some(a.decode_and_unescape_value(xml.decoder())?.into_owned());
                    }
                }
                b"fgColor" => fill.fg_color = parse_color(e)?,
                b"bgColor" => fill.bg_color = parse_color(e)?,
                b"gradientFill" => {
                    fill.pattern = Some("gradient".to_string());
                    let e = e.to_owned();
                    skip(xml, &e)?;
                }
                _ => (),
            },
            Event::End(ref e) if e.local_name().as_ref() == b"fill" => break,
            Event::Eof => return Err(XlsxError::XmlEof("fill")),
            _ => (),
        }
    }
    Ok(fill)
}

/// Parse one side of a `<border>` element
fn parse_border_side<RS: BufRead>(
    xml: &mut Reader<RS>,
    element: &BytesStart<'_>,
) -> Result<BorderSide, XlsxError> {
    let mut side = BorderSide::default();
    if let Some(a) = element.try_get_attribute("style")? {
        side.style = Some(a.decode_and_unescape_value(xml.decoder())?.into_owned());
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"color" => {
                side.color = parse_color(e)?;
            }
            Event::End(ref e) if e.local_name() == element.local_name() => break,
            Event::Eof => return Err(XlsxError::XmlEof("border side")),
            _ => (),
        }
    }
    Ok(side)
}

/// Parse a `<border>` element
fn parse_border<RS: BufRead>(xml: &mut Reader<RS>) -> Result<Border, XlsxError> {
    let mut border = Border::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let e = e.to_owned();
                match e.local_name().as_ref() {
                    b"left" | b"start" => border.left = parse_border_side(xml, &e)?,
                    b"right" | b"end" => border.right = parse_border_side(xml, &e)?,
                    b"top" => border.top = parse_border_side(xml, &e)?,
                    b"bottom" => border.bottom = parse_border_side(xml, &e)?,
                    b"diagonal" => border.diagonal = parse_border_side(xml, &e)?,
                    _ => skip(xml, &e)?,
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"border" => break,
            Event::Eof => return Err(XlsxError::XmlEof("border")),
            _ => (),
        }
    }
    Ok(border)
}

/// Parse an `<alignment>` element
fn parse_alignment<RS: BufRead>(
    xml: &Reader<RS>,
    e: &BytesStart<'_>,
) -> Result<Alignment, XlsxError> {
    let mut alignment = Alignment::default();
    for attr in e.attributes() {
        match attr? {
            Attribute {
                key: QName(b"horizontal"),
                value: v,
            } => alignment.horizontal = Some(xml.decoder().decode(&v)?.into_owned()),
            Attribute {
                key: QName(b"vertical"),
                value: v,
            } => alignment.vertical = Some(xml.decoder().decode(&v)?.into_owned()),
            Attribute {
                key: QName(b"wrapText"),
                value: v,
            } => alignment.wrap_text = is_true(&v),
            Attribute {
                key: QName(b"shrinkToFit"),
                value: v,
            } => alignment.shrink_to_fit = is_true(&v),
            Attribute {
                key: QName(b"indent"),
                value: v,
            } => alignment.indent = atoi_simd::parse::<u32>(&v).ok(),
            Attribute {
                key: QName(b"textRotation"),
                value: v,
            } => alignment.text_rotation = atoi_simd::parse::<u32>(&v).ok(),
            _ => (),
        }
    }
    Ok(alignment)
}

/// Parse a `<xf>` element of `cellXfs` or `cellStyleXfs`
fn parse_xf<RS: BufRead>(
    xml: &mut Reader<RS>,
    element: &BytesStart<'_>,
) -> Result<XfEntry, XlsxError> {
    let mut xf = XfEntry::default();
    for attr in element.attributes() {
        match attr? {
            Attribute {
                key: QName(b"numFmtId"),
                value: v,
            } => xf.num_fmt_id = atoi_simd::parse::<u32>(&v).ok(),
            Attribute {
                key: QName(b"fontId"),
                value: v,
            } => xf.font_id = parse_usize(&v),
            Attribute {
                key: QName(b"fillId"),
                value: v,
            } => xf.fill_id = parse_usize(&v),
            Attribute {
                key: QName(b"borderId"),
                value: v,
            } => xf.border_id = parse_usize(&v),
            Attribute {
                key: QName(b"xfId"),
                value: v,
            } => xf.xf_id = parse_usize(&v),
            Attribute {
                key: QName(b"applyFont"),
                value: v,
            } => xf.apply_font = is_true(&v),
            Attribute {
                key: QName(b"applyFill"),
                value: v,
            } => xf.apply_fill = is_true(&v),
            Attribute {
                key: QName(b"applyBorder"),
                value: v,
            } => xf.apply_border = is_true(&v),
            Attribute {
                key: QName(b"applyAlignment"),
                value: v,
            } => xf.apply_alignment = is_true(&v),
            _ => (),
        }
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"alignment" => {
                xf.alignment = Some(parse_alignment(xml, e)?);
            }
            Event::End(ref e) if e.local_name().as_ref() == b"xf" => break,
            Event::Eof => return Err(XlsxError::XmlEof("xf")),
            _ => (),
        }
    }
    Ok(xf)
}

/// Reads the children `item` of the list element `list`
fn parse_list<RS, T, F>(
    xml: &mut Reader<RS>,
    list: &'static str,
    item: &[u8],
    mut parse: F,
) -> Result<Vec<T>, XlsxError>
where
    RS: BufRead,
    F: FnMut(&mut Reader<RS>, &BytesStart<'_>) -> Result<T, XlsxError>,
{
    let mut items = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == item => {
                let e = e.to_owned();
                items.push(parse(xml, &e)?);
            }
            Event::End(ref e) if e.local_name().as_ref() == list.as_bytes() => break,
            Event::Eof => return Err(XlsxError::XmlEof(list)),
            _ => (),
        }
    }
    Ok(items)
}

/// Reads `styles.xml` into its tables
///
/// The returned sheet still has to be finished with a date policy.
pub(crate) fn read_style_sheet<RS: BufRead>(
    xml: &mut Reader<RS>,
) -> Result<StyleSheet, XlsxError> {
    let mut sheet = StyleSheet::default();
    let mut buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"numFmts" => {
                    let formats = parse_list(xml, "numFmts", b"numFmt", |xml, e| {
                        let mut id = None;
                        let mut code = None;
                        for a in e.attributes() {
                            let a = a?;
                            match a.key {
                                QName(b"numFmtId") => id = atoi_simd::parse::<u32>(&a.value).ok(),
                                QName(b"formatCode") => {
                                    code = Some(a.decode_and_unescape_value(xml.decoder())?.into_owned())
                                }
                                _ => (),
                            }
                        }
                        let mut skip_buf = Vec::new();
                        xml.read_to_end_into(e.name(), &mut skip_buf)?;
                        Ok(id.zip(code))
                    })?;
                    sheet.num_fmts = formats
                        .into_iter()
                        .flatten()
                        .filter(|(_, code)| !code.is_empty())
                        .map(|(id, code)| (id, Arc::from(code)))
                        .collect();
                }
                b"fonts" => sheet.fonts = parse_list(xml, "fonts", b"font", |xml, _| parse_font(xml))?,
                b"fills" => sheet.fills = parse_list(xml, "fills", b"fill", |xml, _| parse_fill(xml))?,
                b"borders" => {
                    sheet.borders = parse_list(xml, "borders", b"border", |xml, _| parse_border(xml))?
                }
                b"cellStyleXfs" => sheet.cell_style_xfs = parse_list(xml, "cellStyleXfs", b"xf", parse_xf)?,
                b"cellXfs" => sheet.cell_xfs = parse_list(xml, "cellXfs", b"xf", parse_xf)?,
                b"styleSheet" => (),
                _ => {
                    let e = e.to_owned();
                    skip(xml, &e)?;
                }
            },
            Event::End(ref e) if e.local_name().as_ref() == b"styleSheet" => break,
            Event::Eof => break,
            _ => (),
        }
    }
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{DefaultDatePolicy, FormatCategory};

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="2">
    <numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/>
    <numFmt numFmtId="165" formatCode="&quot;USD&quot; #,##0.00"/>
  </numFmts>
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>
    <font><b/><i val="0"/><u/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
  </fonts>
  <fills count="2">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="solid"><fgColor indexed="10"/><bgColor auto="1"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"><color rgb="FF000000"/></left><right/><top/><bottom style="double"/><diagonal/></border>
  </borders>
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="1" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1"/>
    <xf numFmtId="165" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1">
      <alignment horizontal="center" wrapText="1" textRotation="90"/>
    </xf>
    <xf numFmtId="22" fontId="7" fillId="0" borderId="0" xfId="0"/>
  </cellXfs>
  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

    fn sheet() -> StyleSheet {
        let mut xml = Reader::from_str(STYLES);
        crate::xlsx::configure(&mut xml);
        let mut sheet = read_style_sheet(&mut xml).unwrap();
        sheet.finish(&DefaultDatePolicy);
        sheet
    }

    #[test]
    fn tables() {
        let sheet = sheet();
        assert_eq!(sheet.len(), 4);
        assert_eq!(sheet.fonts.len(), 2);
        assert_eq!(sheet.fills.len(), 2);
        assert_eq!(sheet.borders.len(), 2);
        assert_eq!(sheet.cell_style_xfs.len(), 1);
        assert_eq!(sheet.num_fmts.get(&165).map(|s| &**s), Some("\"USD\" #,##0.00"));
    }

    #[test]
    fn fonts_fills_borders() {
        let sheet = sheet();
        let font = &sheet.fonts[1];
        assert!(font.bold);
        assert!(!font.italic);
        assert_eq!(font.underline.as_deref(), Some("single"));
        assert_eq!(font.size, Some(14.0));
        assert_eq!(font.name.as_deref(), Some("Arial"));
        assert_eq!(font.color.and_then(|c| c.to_hex()).as_deref(), Some("#FF0000"));
        assert_eq!(sheet.fonts[0].color, Some(Color::Theme { index: 1, tint: None }));
        assert_eq!(sheet.fonts[0].family, Some(2));

        let fill = &sheet.fills[1];
        assert_eq!(fill.pattern.as_deref(), Some("solid"));
        assert_eq!(fill.fg_color, Some(Color::Indexed(10)));
        assert_eq!(fill.bg_color, Some(Color::Auto));

        let border = &sheet.borders[1];
        assert!(border.left.is_visible());
        assert_eq!(border.bottom.style.as_deref(), Some("double"));
        assert!(!border.top.is_visible());
    }

    #[test]
    fn records_and_categories() {
        let sheet = sheet();
        assert_eq!(sheet.category(0), FormatCategory::General);
        assert_eq!(sheet.category(1), FormatCategory::Date);
        assert_eq!(sheet.pattern(1), Some("yyyy\\-mm\\-dd"));
        assert_eq!(sheet.category(2), FormatCategory::Number);
        assert_eq!(sheet.category(3), FormatCategory::Date);
        assert_eq!(sheet.pattern(3), Some("m/d/yy h:mm"));

        let style = sheet.complete_style(2);
        let alignment = style.alignment.as_ref().unwrap();
        assert_eq!(alignment.horizontal.as_deref(), Some("center"));
        assert!(alignment.wrap_text);
        assert_eq!(alignment.text_rotation, Some(90));

        // font 7 does not exist
        let style = sheet.complete_style(3);
        assert_eq!(style.font_id, Some(7));
        assert!(style.font.is_none());
    }
}
