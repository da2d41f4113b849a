// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Turns raw `<c>` elements into typed cells

use std::collections::HashMap;

use log::warn;

use crate::address::ColumnCache;
use crate::datatype::{Cell, Data, ValueType};
use crate::dates::{DateFormatter, DateModel, PatternCache};
use crate::formats::FormatCategory;
use crate::style::StyleSheet;
use crate::xlsx::{FormulaDef, RawCell};

/// Workbook level tables, immutable once loaded
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub strings: Vec<String>,
    pub styles: StyleSheet,
    pub dates: DateModel,
    pub columns: ColumnCache,
    pub patterns: PatternCache,
}

/// Shared formula texts of one sheet, by group id
#[derive(Debug, Default)]
pub(crate) struct SharedFormulas {
    groups: HashMap<String, String>,
}

impl SharedFormulas {
    /// Formula text of a cell, starting with `=`
    ///
    /// The first cell of a shared group defines the text, later cells of the
    /// group only carry the group id and reuse it as is.
    pub fn resolve(&mut self, f: &FormulaDef) -> Option<String> {
        let text = match &f.shared {
            Some(si) if f.text.is_empty() => self.groups.get(si)?.clone(),
            Some(si) => {
                self.groups.insert(si.clone(), f.text.clone());
                f.text.clone()
            }
            None if f.text.is_empty() => return None,
            None => f.text.clone(),
        };
        Some(if text.starts_with('=') {
            text
        } else {
            format!("={text}")
        })
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

/// Resolves one cell
pub(crate) fn resolve_cell(
    raw: RawCell,
    tables: &Tables,
    formulas: &mut SharedFormulas,
    formatter: &DateFormatter,
) -> Cell {
    let formula = raw.f.as_ref().and_then(|f| formulas.resolve(f));
    let t = raw.t.as_deref().unwrap_or("");
    let style = raw.s;
    let raw_text = match t {
        "inlineStr" => raw.inline.clone().unwrap_or_default(),
        _ => raw.v.clone().unwrap_or_default(),
    };

    // shared strings are looked up before anything else
    let text = if t == "s" {
        match atoi_simd::parse::<usize>(raw_text.trim().as_bytes())
            .ok()
            .and_then(|i| tables.strings.get(i))
        {
            Some(s) => Some(s.as_str()),
            None => {
                if !raw_text.is_empty() {
                    warn!(
                        "cell ({}, {}): shared string index '{raw_text}' not found",
                        raw.row, raw.col
                    );
                }
                None
            }
        }
    } else {
        Some(raw_text.as_str())
    };

    let is_date = t == "d"
        || (matches!(t, "" | "n" | "s")
            && tables.styles.category(style) == FormatCategory::Date);

    let (value, ty) = match (t, text) {
        (_, None) => (Data::Empty, ValueType::String),
        (_, Some(text)) if is_date => {
            if text.trim().is_empty() {
                (Data::Empty, ValueType::Date)
            } else {
                match tables.dates.to_timestamp(text) {
                    Some(ts) => (
                        formatter.format(
                            ts,
                            tables.styles.pattern(style),
                            Some(style),
                            &tables.patterns,
                        ),
                        ValueType::Date,
                    ),
                    None => (Data::String(text.to_string()), ValueType::String),
                }
            }
        }
        ("b", Some(text)) => {
            if text.is_empty() {
                (Data::Empty, ValueType::Bool)
            } else {
                (Data::Bool(text.trim() != "0"), ValueType::Bool)
            }
        }
        ("s" | "inlineStr", Some(text)) => (Data::String(text.to_string()), ValueType::String),
        ("e", Some(text)) => (Data::Error(text.to_string()), ValueType::Error),
        (t, Some(text)) => {
            if !matches!(t, "" | "n" | "str") {
                warn!("cell ({}, {}): unknown type '{t}'", raw.row, raw.col);
            }
            let value = coerce(text);
            let ty = match value {
                Data::Int(_) | Data::Float(_) => ValueType::Number,
                Data::Empty if matches!(t, "" | "n") => ValueType::Number,
                _ => ValueType::String,
            };
            (value, ty)
        }
    };

    Cell {
        row: raw.row,
        col: raw.col,
        raw_type: raw.t,
        style,
        raw: raw_text,
        formula,
        value,
        ty,
    }
}

/// Numeric text to a number, anything else stays text
///
/// Integers must print back to the exact same text. Floats must be written
/// the way spreadsheets write them (no leading zeros, no `+` sign).
fn coerce(text: &str) -> Data {
    if text.is_empty() {
        return Data::Empty;
    }
    if let Ok(i) = atoi_simd::parse::<i64>(text.as_bytes()) {
        if i.to_string() == text {
            return Data::Int(i);
        }
    }
    if is_plain_number(text) {
        if let Ok(f) = fast_float2::parse::<f64, _>(text.as_bytes()) {
            if f.is_finite() {
                return Data::Float(f);
            }
        }
    }
    Data::String(text.to_string())
}

fn is_plain_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text).as_bytes();
    match digits {
        [] => false,
        [b'0', b'0'..=b'9', ..] => false,
        [first, ..] if !first.is_ascii_digit() => false,
        _ => digits
            .iter()
            .all(|b| matches!(b, b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::DefaultDatePolicy;
    use crate::style::XfEntry;

    fn tables() -> Tables {
        let mut styles = StyleSheet::default();
        styles.cell_xfs = vec![
            XfEntry::default(),
            XfEntry {
                num_fmt_id: Some(14),
                ..Default::default()
            },
        ];
        styles.finish(&DefaultDatePolicy);
        Tables {
            strings: ["hello", "2021-01-01", "42", "3.5"]
                .map(str::to_string)
                .to_vec(),
            styles,
            ..Default::default()
        }
    }

    fn cell(t: Option<&str>, s: usize, v: &str) -> RawCell {
        RawCell {
            row: 1,
            col: 1,
            t: t.map(str::to_string),
            s,
            v: Some(v.to_string()),
            ..Default::default()
        }
    }

    fn resolve(raw: RawCell) -> Cell {
        resolve_cell(
            raw,
            &tables(),
            &mut SharedFormulas::default(),
            &DateFormatter::PassThrough,
        )
    }

    #[test]
    fn numbers() {
        assert_eq!(resolve(cell(None, 0, "42")).value, Data::Int(42));
        assert_eq!(resolve(cell(Some("n"), 0, "-1.5")).value, Data::Float(-1.5));
        assert_eq!(
            resolve(cell(None, 0, "0.30000000000000004")).value,
            Data::Float(0.30000000000000004)
        );
        assert_eq!(resolve(cell(None, 0, "1E-3")).value, Data::Float(0.001));
        let c = resolve(cell(Some("str"), 0, "007"));
        assert_eq!(c.value, Data::String("007".to_string()));
        assert_eq!(c.value_type(), ValueType::String);
        assert_eq!(resolve(cell(None, 0, "+5")).value, Data::String("+5".to_string()));
        assert_eq!(resolve(cell(None, 0, "")).value, Data::Empty);
    }

    #[test]
    fn shared_strings() {
        let c = resolve(cell(Some("s"), 0, "0"));
        assert_eq!(c.value, Data::String("hello".to_string()));
        assert_eq!(c.raw(), "0");
        assert_eq!(resolve(cell(Some("s"), 0, "9")).value, Data::Empty);
        assert_eq!(resolve(cell(Some("s"), 0, "x")).value, Data::Empty);
        // numeric text stays text
        let c = resolve(cell(Some("s"), 0, "2"));
        assert_eq!(c.value, Data::String("42".to_string()));
        assert_eq!(c.value_type(), ValueType::String);
        let c = resolve(cell(Some("s"), 0, "3"));
        assert_eq!(c.value, Data::String("3.5".to_string()));
        assert_eq!(c.value_type(), ValueType::String);
        // date style on a shared string
        let c = resolve(cell(Some("s"), 1, "1"));
        assert_eq!(c.value, Data::Timestamp(1_609_459_200));
        assert_eq!(c.value_type(), ValueType::Date);
    }

    #[test]
    fn booleans_errors_inline() {
        assert_eq!(resolve(cell(Some("b"), 0, "1")).value, Data::Bool(true));
        assert_eq!(resolve(cell(Some("b"), 0, "0")).value, Data::Bool(false));
        let c = resolve(cell(Some("e"), 0, "#DIV/0!"));
        assert_eq!(c.value, Data::Error("#DIV/0!".to_string()));
        assert_eq!(c.value_type(), ValueType::Error);
        let mut raw = cell(Some("inlineStr"), 0, "");
        raw.v = None;
        raw.inline = Some("12".to_string());
        let c = resolve(raw);
        assert_eq!(c.value, Data::String("12".to_string()));
        assert_eq!(c.raw(), "12");
    }

    #[test]
    fn dates() {
        let c = resolve(cell(None, 1, "45"));
        assert_eq!(c.value, Data::Timestamp(-2_205_187_200));
        assert_eq!(c.value_type(), ValueType::Date);
        let c = resolve(cell(None, 1, ""));
        assert_eq!((c.value, c.ty), (Data::Empty, ValueType::Date));
        let c = resolve(cell(Some("d"), 0, "2021-01-01T00:00:00"));
        assert_eq!(c.value, Data::Timestamp(1_609_459_200));
        let c = resolve(cell(Some("d"), 0, "someday"));
        assert_eq!(c.value, Data::String("someday".to_string()));
        // serials beyond the calendar keep their text
        for v in ["1e15", "-1e15"] {
            let c = resolve(cell(None, 1, v));
            assert_eq!(c.value, Data::String(v.to_string()));
            assert_eq!(c.value_type(), ValueType::String);
        }

        let c = resolve_cell(
            cell(None, 1, "45"),
            &tables(),
            &mut SharedFormulas::default(),
            &DateFormatter::Pattern("%Y-%m-%d".to_string()),
        );
        assert_eq!(c.value, Data::String("1900-02-14".to_string()));
        let c = resolve_cell(
            cell(None, 1, "45"),
            &tables(),
            &mut SharedFormulas::default(),
            &DateFormatter::StylePattern,
        );
        assert_eq!(c.value, Data::String("02-14-00".to_string()));
    }

    #[test]
    fn shared_formula() {
        let mut formulas = SharedFormulas::default();
        let first = FormulaDef {
            text: "B1*2".to_string(),
            shared: Some("0".to_string()),
        };
        let second = FormulaDef {
            text: String::new(),
            shared: Some("0".to_string()),
        };
        assert_eq!(formulas.resolve(&first).as_deref(), Some("=B1*2"));
        assert_eq!(formulas.resolve(&second).as_deref(), Some("=B1*2"));
        let unknown = FormulaDef {
            text: String::new(),
            shared: Some("1".to_string()),
        };
        assert_eq!(formulas.resolve(&unknown), None);
        let plain = FormulaDef {
            text: "=A1".to_string(),
            shared: None,
        };
        assert_eq!(formulas.resolve(&plain).as_deref(), Some("=A1"));
    }
}
