// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Style tables and style resolution
//!
//! `styles.xml` is loaded into flat tables (number formats, fonts, fills,
//! borders, cell formats and cell style formats). Cross references are plain
//! indices. [`StyleSheet::style_by_index`] is O(1) and
//! [`StyleSheet::complete_style`] merges everything a style index refers to,
//! memoizing the result.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::formats::{builtin_format_by_id, DateFormatPolicy, FormatCategory};

/// Excel's 64 indexed colors (legacy palette), as RGB
const INDEXED_COLORS: [u32; 64] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, //
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, //
    0x800000, 0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080, //
    0x9999FF, 0x993366, 0xFFFFCC, 0xCCFFFF, 0x660066, 0xFF8080, 0x0066CC, 0xCCCCFF, //
    0x000080, 0xFF00FF, 0xFFFF00, 0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF, //
    0x00CCFF, 0xCCFFFF, 0xCCFFCC, 0xFFFF99, 0x99CCFF, 0xFF99CC, 0xCC99FF, 0xFFCC99, //
    0x3366FF, 0x33CCCC, 0x99CC00, 0xFFCC00, 0xFF9900, 0xFF6600, 0x666699, 0x969696, //
    0x003366, 0x339966, 0x003300, 0x333300, 0x993300, 0x993366, 0x333399, 0x333333, //
];

/// A color as declared in the style sheet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// `auto="1"` or nothing
    #[default]
    Auto,
    /// `rgb="FFRRGGBB"`
    Argb(u32),
    /// `theme="n"` with an optional `tint`
    Theme {
        /// Theme color index
        index: u32,
        /// Lighten (positive) or darken (negative) factor
        tint: Option<f64>,
    },
    /// `indexed="n"`, legacy palette
    Indexed(u32),
}

impl Color {
    /// ARGB value when it can be known without the workbook theme
    pub fn to_argb(&self) -> Option<u32> {
        match *self {
            Color::Argb(v) => Some(v),
            Color::Indexed(i) => match i {
                64 => Some(0xFF00_0000),
                65 => Some(0xFFFF_FFFF),
                i => INDEXED_COLORS.get(i as usize).map(|rgb| 0xFF00_0000 | rgb),
            },
            Color::Auto | Color::Theme { .. } => None,
        }
    }

    /// `#RRGGBB` representation, see [`Color::to_argb`]
    pub fn to_hex(&self) -> Option<String> {
        self.to_argb().map(|v| format!("#{:06X}", v & 0x00FF_FFFF))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.to_hex()) {
            (_, Some(hex)) => f.write_str(&hex),
            (Color::Theme { index, .. }, None) => write!(f, "theme:{index}"),
            _ => f.write_str("auto"),
        }
    }
}

/// Font of a style
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Font {
    /// Font name (`Calibri`)
    pub name: Option<String>,
    /// Size in points
    pub size: Option<f64>,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
    /// Underline style (`single`, `double`...)
    pub underline: Option<String>,
    /// Strike through
    pub strike: bool,
    /// Font color
    pub color: Option<Color>,
    /// Font family
    pub family: Option<u32>,
    /// Font scheme (`minor`, `major`)
    pub scheme: Option<String>,
}

/// Fill of a style
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Fill {
    /// Pattern type (`solid`, `gray125`...)
    pub pattern: Option<String>,
    /// Foreground color
    pub fg_color: Option<Color>,
    /// Background color
    pub bg_color: Option<Color>,
}

/// One side of a border
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BorderSide {
    /// Line style (`thin`, `medium`...), `None` when there is no line
    pub style: Option<String>,
    /// Line color
    pub color: Option<Color>,
}

impl BorderSide {
    /// Whether a line is drawn
    pub fn is_visible(&self) -> bool {
        self.style.as_deref().is_some_and(|s| s != "none")
    }
}

/// Borders of a style
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Border {
    /// Left
    pub left: BorderSide,
    /// Right
    pub right: BorderSide,
    /// Top
    pub top: BorderSide,
    /// Bottom
    pub bottom: BorderSide,
    /// Diagonal
    pub diagonal: BorderSide,
}

/// Alignment of a cell format
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Alignment {
    /// Horizontal alignment (`left`, `center`...)
    pub horizontal: Option<String>,
    /// Vertical alignment (`top`, `center`...)
    pub vertical: Option<String>,
    /// Wrap text
    pub wrap_text: bool,
    /// Indent level
    pub indent: Option<u32>,
    /// Text rotation in degrees (255 is vertical text)
    pub text_rotation: Option<u32>,
    /// Shrink to fit
    pub shrink_to_fit: bool,
}

/// A `<xf>` entry of `cellXfs` or `cellStyleXfs`
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct XfEntry {
    pub num_fmt_id: Option<u32>,
    pub font_id: Option<usize>,
    pub fill_id: Option<usize>,
    pub border_id: Option<usize>,
    pub xf_id: Option<usize>,
    pub alignment: Option<Alignment>,
    pub apply_font: bool,
    pub apply_fill: bool,
    pub apply_border: bool,
    pub apply_alignment: bool,
}

/// Direct view of one cell format
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StyleRecord {
    /// Number format id, 0 (General) when absent
    pub num_fmt_id: u32,
    /// Font index
    pub font_id: Option<usize>,
    /// Fill index
    pub fill_id: Option<usize>,
    /// Border index
    pub border_id: Option<usize>,
    /// Cell style format index
    pub xf_id: Option<usize>,
    /// Custom or built-in number format pattern
    pub pattern: Option<Arc<str>>,
    /// What the number format says about the values
    pub category: FormatCategory,
}

/// A style index with every reference resolved
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompleteStyle {
    /// Number format id
    pub num_fmt_id: Option<u32>,
    /// Font index
    pub font_id: Option<usize>,
    /// Fill index
    pub fill_id: Option<usize>,
    /// Border index
    pub border_id: Option<usize>,
    /// Cell style format index
    pub xf_id: Option<usize>,
    /// Number format pattern
    pub num_fmt: Option<Arc<str>>,
    /// Number format category
    pub category: FormatCategory,
    /// Font, absent when the index does not resolve
    pub font: Option<Font>,
    /// Fill, absent when the index does not resolve
    pub fill: Option<Fill>,
    /// Border, absent when the index does not resolve
    pub border: Option<Border>,
    /// Alignment
    pub alignment: Option<Alignment>,
}

impl CompleteStyle {
    /// Overlays the fields `xf` sets, skipping those `keep` applies itself
    ///
    /// The number format is not overlaid: it always comes from the cell
    /// format, the one values are typed with.
    fn overlay(&mut self, xf: &XfEntry, keep: Option<&XfEntry>) {
        let keep_font = keep.is_some_and(|k| k.apply_font);
        let keep_fill = keep.is_some_and(|k| k.apply_fill);
        let keep_border = keep.is_some_and(|k| k.apply_border);
        let keep_alignment = keep.is_some_and(|k| k.apply_alignment);
        if let (Some(v), false) = (xf.font_id, keep_font) {
            self.font_id = Some(v);
        }
        if let (Some(v), false) = (xf.fill_id, keep_fill) {
            self.fill_id = Some(v);
        }
        if let (Some(v), false) = (xf.border_id, keep_border) {
            self.border_id = Some(v);
        }
        if let (Some(v), false) = (&xf.alignment, keep_alignment) {
            self.alignment = Some(v.clone());
        }
        if keep.is_none() {
            self.xf_id = xf.xf_id;
        }
    }
}

/// All style tables of a workbook
#[derive(Debug, Default)]
pub struct StyleSheet {
    pub(crate) num_fmts: HashMap<u32, Arc<str>>,
    pub(crate) fonts: Vec<Font>,
    pub(crate) fills: Vec<Fill>,
    pub(crate) borders: Vec<Border>,
    pub(crate) cell_xfs: Vec<XfEntry>,
    pub(crate) cell_style_xfs: Vec<XfEntry>,
    records: Vec<StyleRecord>,
    complete: RwLock<HashMap<usize, Arc<CompleteStyle>>>,
}

impl StyleSheet {
    /// Builds the per index records, called once the tables are loaded
    pub(crate) fn finish(&mut self, policy: &dyn DateFormatPolicy) {
        let records = self
            .cell_xfs
            .iter()
            .map(|xf| {
                let num_fmt_id = xf.num_fmt_id.unwrap_or(0);
                let pattern = self.pattern_by_id(num_fmt_id);
                StyleRecord {
                    num_fmt_id,
                    font_id: xf.font_id,
                    fill_id: xf.fill_id,
                    border_id: xf.border_id,
                    xf_id: xf.xf_id,
                    category: policy.category(num_fmt_id, pattern.as_deref()),
                    pattern,
                }
            })
            .collect();
        self.records = records;
    }

    fn pattern_by_id(&self, id: u32) -> Option<Arc<str>> {
        self.num_fmts
            .get(&id)
            .cloned()
            .or_else(|| builtin_format_by_id(id).map(Arc::from))
    }

    /// Number of cell formats
    pub fn len(&self) -> usize {
        self.cell_xfs.len()
    }

    /// Whether there are no cell formats at all
    pub fn is_empty(&self) -> bool {
        self.cell_xfs.is_empty()
    }

    /// Direct ids and number format category of a style index
    pub fn style_by_index(&self, idx: usize) -> Option<&StyleRecord> {
        self.records.get(idx)
    }

    /// Number format category of a style index, `General` when unknown
    #[inline]
    pub fn category(&self, idx: usize) -> FormatCategory {
        self.records.get(idx).map_or(FormatCategory::General, |r| r.category)
    }

    /// Number format pattern of a style index
    #[inline]
    pub fn pattern(&self, idx: usize) -> Option<&str> {
        self.records.get(idx).and_then(|r| r.pattern.as_deref())
    }

    /// Fully merged style of a style index
    ///
    /// Starts from style 0 (the workbook default), overlays the cell format
    /// then the cell style format it refers to, and resolves font, fill and
    /// border by id. Ids that do not resolve leave the corresponding field
    /// empty. Number format and category are those of [`Self::style_by_index`],
    /// `General` for an unknown index.
    pub fn complete_style(&self, idx: usize) -> Arc<CompleteStyle> {
        if let Ok(cache) = self.complete.read() {
            if let Some(cached) = cache.get(&idx) {
                return cached.clone();
            }
        }
        let mut style = if idx != 0 {
            (*self.complete_style(0)).clone()
        } else {
            CompleteStyle::default()
        };
        if let Some(xf) = self.cell_xfs.get(idx) {
            style.overlay(xf, None);
            if let Some(xf_id) = xf.xf_id {
                if idx == 0 || xf_id != 0 {
                    if let Some(named) = self.cell_style_xfs.get(xf_id) {
                        style.overlay(named, Some(xf));
                    }
                }
            }
        }
        match self.records.get(idx) {
            Some(record) => {
                style.num_fmt_id = Some(record.num_fmt_id);
                style.num_fmt = record.pattern.clone();
                style.category = record.category;
            }
            None => {
                style.num_fmt_id = None;
                style.num_fmt = None;
                style.category = FormatCategory::General;
            }
        }
        style.font = style.font_id.and_then(|i| self.fonts.get(i)).cloned();
        style.fill = style.fill_id.and_then(|i| self.fills.get(i)).cloned();
        style.border = style.border_id.and_then(|i| self.borders.get(i)).cloned();

        let style = Arc::new(style);
        if let Ok(mut cache) = self.complete.write() {
            cache.entry(idx).or_insert_with(|| style.clone()).clone()
        } else {
            style
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::DefaultDatePolicy;

    fn xf(num_fmt_id: u32, font_id: usize, xf_id: Option<usize>) -> XfEntry {
        XfEntry {
            num_fmt_id: Some(num_fmt_id),
            font_id: Some(font_id),
            fill_id: Some(0),
            border_id: Some(0),
            xf_id,
            ..Default::default()
        }
    }

    fn sheet() -> StyleSheet {
        let mut styles = StyleSheet {
            fonts: vec![
                Font {
                    name: Some("Calibri".to_string()),
                    size: Some(11.),
                    ..Default::default()
                },
                Font {
                    name: Some("Arial".to_string()),
                    bold: true,
                    ..Default::default()
                },
            ],
            fills: vec![Fill::default()],
            borders: vec![Border::default()],
            cell_style_xfs: vec![
                xf(0, 0, None),
                XfEntry {
                    font_id: Some(1),
                    ..Default::default()
                },
            ],
            cell_xfs: vec![
                xf(0, 0, Some(0)),
                xf(14, 0, Some(0)),
                xf(164, 7, Some(0)),
                xf(2, 0, Some(1)),
                XfEntry {
                    font_id: Some(0),
                    apply_font: true,
                    xf_id: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        styles.num_fmts.insert(164, Arc::from("yyyy-mm-dd"));
        styles.finish(&DefaultDatePolicy);
        styles
    }

    #[test]
    fn records() {
        let styles = sheet();
        assert_eq!(styles.len(), 5);
        assert_eq!(styles.category(0), FormatCategory::General);
        assert_eq!(styles.category(1), FormatCategory::Date);
        assert_eq!(styles.pattern(1), Some("mm-dd-yy"));
        assert_eq!(styles.category(2), FormatCategory::Date);
        assert_eq!(styles.category(3), FormatCategory::Number);
        assert_eq!(styles.category(99), FormatCategory::General);
        assert!(styles.style_by_index(99).is_none());
    }

    #[test]
    fn complete_is_idempotent() {
        let styles = sheet();
        let a = styles.complete_style(2);
        let b = styles.complete_style(2);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *styles.complete_style(2));
        assert_eq!(a.num_fmt.as_deref(), Some("yyyy-mm-dd"));
    }

    #[test]
    fn missing_ids_are_absent() {
        let styles = sheet();
        let style = styles.complete_style(2);
        assert_eq!(style.font_id, Some(7));
        assert!(style.font.is_none());
        assert!(style.fill.is_some());
    }

    #[test]
    fn named_style_overlay() {
        let styles = sheet();
        // xf_id 1 brings the bold Arial font
        let style = styles.complete_style(3);
        assert_eq!(style.font.as_ref().and_then(|f| f.name.as_deref()), Some("Arial"));
        assert_eq!(style.num_fmt.as_deref(), Some("0.00"));
        // applyFont keeps the cell format font
        let style = styles.complete_style(4);
        assert_eq!(style.font.as_ref().and_then(|f| f.name.as_deref()), Some("Calibri"));
    }

    #[test]
    fn number_format_matches_category() {
        let mut styles = sheet();
        // the named style carries a date format, the cell format says General
        styles.cell_style_xfs.push(xf(14, 0, None));
        styles.cell_xfs.push(XfEntry {
            xf_id: Some(2),
            ..Default::default()
        });
        styles.cell_xfs.push(XfEntry {
            num_fmt_id: Some(14),
            xf_id: Some(1),
            ..Default::default()
        });
        styles.finish(&DefaultDatePolicy);
        let general = styles.complete_style(5);
        assert_eq!(general.num_fmt_id, Some(0));
        assert_eq!(general.num_fmt.as_deref(), Some("General"));
        assert_eq!(general.category, styles.category(5));
        assert_eq!(general.category, FormatCategory::General);
        let date = styles.complete_style(6);
        assert_eq!(date.num_fmt.as_deref(), Some("mm-dd-yy"));
        assert_eq!(date.category, FormatCategory::Date);
        assert_eq!(date.font.as_ref().and_then(|f| f.name.as_deref()), Some("Arial"));
    }

    #[test]
    fn unknown_index_inherits_default() {
        let styles = sheet();
        let style = styles.complete_style(42);
        assert_eq!(style.font_id, Some(0));
        assert_eq!(style.category, FormatCategory::General);
        assert_eq!(style.num_fmt, None);
    }

    #[test]
    fn colors() {
        assert_eq!(Color::Indexed(10).to_hex().as_deref(), Some("#FF0000"));
        assert_eq!(Color::Indexed(64).to_hex().as_deref(), Some("#000000"));
        assert_eq!(Color::Indexed(200).to_hex(), None);
        assert_eq!(Color::Argb(0xFF12_3456).to_hex().as_deref(), Some("#123456"));
        assert_eq!(
            Color::Theme {
                index: 1,
                tint: None
            }
            .to_hex(),
            None
        );
        assert_eq!(Color::Auto.to_string(), "auto");
    }
}
