// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Number formats: built-in patterns and date detection

use std::fmt;

/// Semantic category of a number format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatCategory {
    /// `General` or no format at all
    #[default]
    General,
    /// Any numeric format (decimals, percentages, currencies...)
    Number,
    /// Date, time or elapsed time
    Date,
    /// Text format (`@`)
    String,
}

impl fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormatCategory::General => "general",
            FormatCategory::Number => "number",
            FormatCategory::Date => "date",
            FormatCategory::String => "string",
        })
    }
}

/// Canonical pattern of a built-in number format
///
/// ECMA-376 Part 1, 18.8.30 (numFmt). Ids without a locale independent
/// pattern return `None`.
pub fn builtin_format_by_id(id: u32) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "\"$\"#,##0_);(\"$\"#,##0)",
        6 => "\"$\"#,##0_);[Red](\"$\"#,##0)",
        7 => "\"$\"#,##0.00_);(\"$\"#,##0.00)",
        8 => "\"$\"#,##0.00_);[Red](\"$\"#,##0.00)",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        41 => "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)",
        42 => "_(\"$\"* #,##0_);_(\"$\"* (#,##0);_(\"$\"* \"-\"_);_(@_)",
        43 => "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)",
        44 => "_(\"$\"* #,##0.00_);_(\"$\"* (#,##0.00);_(\"$\"* \"-\"??_);_(@_)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

/// Decides whether a number format denotes a date
///
/// Dates are stored as plain numbers, only their format tells them apart.
/// The default rules cover the reserved built-in ids and the usual date
/// tokens; implement this trait to handle locale specific formats.
pub trait DateFormatPolicy: Send + Sync + fmt::Debug {
    /// Returns true if the format `num_fmt_id` with pattern `pattern` is a
    /// date, time or elapsed time format
    fn is_date_format(&self, num_fmt_id: u32, pattern: Option<&str>) -> bool;

    /// Category of a number format
    fn category(&self, num_fmt_id: u32, pattern: Option<&str>) -> FormatCategory {
        if self.is_date_format(num_fmt_id, pattern) {
            return FormatCategory::Date;
        }
        match (num_fmt_id, pattern) {
            (49, _) => FormatCategory::String,
            (_, Some("@")) => FormatCategory::String,
            (0, _) => FormatCategory::General,
            (_, Some(p)) if p.eq_ignore_ascii_case("general") => FormatCategory::General,
            (_, Some(_)) => FormatCategory::Number,
            (_, None) if builtin_format_by_id(num_fmt_id).is_some() => FormatCategory::Number,
            (_, None) => FormatCategory::General,
        }
    }
}

/// Reserved date ids and date token scanning
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDatePolicy;

impl DateFormatPolicy for DefaultDatePolicy {
    fn is_date_format(&self, num_fmt_id: u32, pattern: Option<&str>) -> bool {
        is_builtin_date_id(num_fmt_id) || pattern.is_some_and(is_date_pattern)
    }
}

/// Built-in ids reserved for dates and times, including the CJK and Thai
/// locale ids
pub fn is_builtin_date_id(id: u32) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58 | 71..=81)
}

/// Scans a custom format for date tokens
///
/// Only the first section is considered. Quoted text, escaped characters and
/// colors are skipped. Elapsed time (`[h]`, `[mm]`, `[ss]`) and the
/// `[$-F800]`/`[$-F400]` system date/time locales count as dates.
///
/// ```
/// use xlstream::formats::is_date_pattern;
///
/// assert!(is_date_pattern("yyyy-mm-dd"));
/// assert!(is_date_pattern("[h]:mm:ss"));
/// assert!(is_date_pattern("[$-F800]dddd\\,\\ mmmm\\ dd\\,\\ yyyy"));
/// assert!(!is_date_pattern("0.00%"));
/// assert!(!is_date_pattern("\"Day\" 0"));
/// assert!(!is_date_pattern("[Red]#,##0"));
/// ```
pub fn is_date_pattern(format: &str) -> bool {
    let mut escaped = false;
    let mut is_quote = false;
    let mut bracket: Option<String> = None;
    let mut ap = false;

    for s in format.chars() {
        if let Some(ref mut inner) = bracket {
            if s == ']' {
                let inner = inner.to_ascii_uppercase();
                if is_elapsed(&inner) || inner.starts_with("$-F800") || inner.starts_with("$-F400")
                {
                    return true;
                }
                bracket = None;
            } else {
                inner.push(s);
            }
            continue;
        }
        match (s, escaped, is_quote, ap) {
            (_, true, ..) => escaped = false, // if escaped, ignore
            ('_' | '\\' | '*', ..) => escaped = true,
            ('"', _, true, _) => is_quote = false,
            (_, _, true, _) => (),
            ('"', ..) => is_quote = true,
            (';', ..) => return false, // first format only
            ('[', ..) => bracket = Some(String::new()),
            ('a' | 'A', _, _, false) => ap = true,
            ('p' | 'm' | '/' | 'P' | 'M', _, _, true) => return true,
            ('d' | 'm' | 'h' | 'y' | 's' | 'D' | 'M' | 'H' | 'Y' | 'S', _, _, false) => {
                return true
            }
            _ => ap = false,
        }
    }
    false
}

fn is_elapsed(inner: &str) -> bool {
    !inner.is_empty()
        && inner.bytes().all(|b| b == inner.as_bytes()[0])
        && matches!(inner.as_bytes()[0], b'H' | b'M' | b'S')
}
