// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Date serials, timestamps and date rendering

use std::collections::HashMap;
use std::fmt::{self, Write};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::warn;

use crate::datatype::Data;

/// Days between 1899-12-30 and 1970-01-01
const UNIX_EPOCH_SERIAL: i64 = 25_569;

/// https://learn.microsoft.com/en-us/office/troubleshoot/excel/1900-and-1904-date-system
const EXCEL_1900_1904_DIFF: i64 = 1462;

const SECONDS_PER_DAY: f64 = 86_400.;

/// Converts a serial date into seconds since 1970-01-01 00:00:00 UTC
///
/// In the 1900 system, serials up to 59 (before the phantom 1900-02-29) are
/// shifted by one day so that they land on real calendar dates.
///
/// Returns `None` for serials that are not finite or fall outside the
/// calendar range chrono can represent.
///
/// ```
/// use xlstream::serial_to_timestamp;
///
/// // 1900-02-14
/// assert_eq!(serial_to_timestamp(45., false), Some(-2_205_187_200));
/// // 1970-01-01 12:00
/// assert_eq!(serial_to_timestamp(25_569.5, false), Some(43_200));
/// assert_eq!(serial_to_timestamp(1e15, false), None);
/// ```
pub fn serial_to_timestamp(serial: f64, is_1904: bool) -> Option<i64> {
    if !serial.is_finite() {
        return None;
    }
    let day = serial.floor();
    let time = serial - day;
    // beyond i64 days the cast saturates
    if day.abs() >= i64::MAX as f64 {
        return None;
    }
    let mut day = day as i64;
    if is_1904 {
        day = day.checked_add(EXCEL_1900_1904_DIFF)?;
    } else if day <= 59 {
        day += 1;
    }
    let timestamp = day
        .checked_sub(UNIX_EPOCH_SERIAL)?
        .checked_mul(86_400)?
        .checked_add((time * SECONDS_PER_DAY).round() as i64)?;
    DateTime::from_timestamp(timestamp, 0).map(|_| timestamp)
}

/// Parses a textual date (ISO 8601 and a few common layouts) as UTC
pub fn parse_date_text(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    for f in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, f) {
            return Some(dt.and_utc().timestamp());
        }
    }
    for f in ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(text, f) {
            return Some(d.and_time(NaiveTime::MIN).and_utc().timestamp());
        }
    }
    for f in ["%H:%M:%S%.f", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(text, f) {
            return Some(t.signed_duration_since(NaiveTime::MIN).num_seconds());
        }
    }
    None
}

/// Serial number <-> timestamp conversion for one workbook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateModel {
    is_1904: bool,
}

impl DateModel {
    /// Date model of a workbook, `is_1904` from `workbookPr/@date1904`
    pub fn new(is_1904: bool) -> Self {
        DateModel { is_1904 }
    }

    /// Whether the workbook uses the 1904 epoch
    pub fn is_1904(&self) -> bool {
        self.is_1904
    }

    /// Converts a raw value (serial number or date text) into a timestamp
    ///
    /// Returns `None` when the text is neither, or when the serial is out of
    /// the representable date range.
    pub fn to_timestamp(&self, raw: &str) -> Option<i64> {
        match fast_float2::parse::<f64, _>(raw.trim().as_bytes()) {
            Ok(serial) => serial_to_timestamp(serial, self.is_1904),
            _ => parse_date_text(raw),
        }
    }
}

/// Custom date rendering
///
/// Arguments are the timestamp, the number format pattern of the cell style
/// (if any) and the style index (if any).
pub type DateFormatFn = dyn Fn(i64, Option<&str>, Option<usize>) -> Data + Send + Sync;

/// How date cells are rendered
#[derive(Clone, Default)]
pub enum DateFormatter {
    /// Keep the raw timestamp
    #[default]
    PassThrough,
    /// Render every date with a fixed chrono pattern (`%Y-%m-%d`)
    Pattern(String),
    /// Render with the cell style number format, translated to chrono
    StylePattern,
    /// Custom rendering
    Custom(Arc<DateFormatFn>),
}

impl fmt::Debug for DateFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFormatter::PassThrough => f.write_str("PassThrough"),
            DateFormatter::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            DateFormatter::StylePattern => f.write_str("StylePattern"),
            DateFormatter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl DateFormatter {
    /// Creates a custom formatter from a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(i64, Option<&str>, Option<usize>) -> Data + Send + Sync + 'static,
    {
        DateFormatter::Custom(Arc::new(f))
    }

    /// Renders a timestamp
    pub(crate) fn format(
        &self,
        timestamp: i64,
        style_pattern: Option<&str>,
        style: Option<usize>,
        patterns: &PatternCache,
    ) -> Data {
        match self {
            DateFormatter::PassThrough => Data::Timestamp(timestamp),
            DateFormatter::Pattern(p) => render(timestamp, p),
            DateFormatter::StylePattern => match style_pattern {
                Some(p) => render(timestamp, &patterns.translate(p)),
                None => Data::Timestamp(timestamp),
            },
            DateFormatter::Custom(f) => f(timestamp, style_pattern, style),
        }
    }
}

/// Formats a timestamp with a chrono pattern, keeping the timestamp when the
/// pattern cannot be rendered
fn render(timestamp: i64, pattern: &str) -> Data {
    let Some(dt) = DateTime::from_timestamp(timestamp, 0) else {
        return Data::Timestamp(timestamp);
    };
    let mut s = String::new();
    match write!(s, "{}", dt.naive_utc().format(pattern)) {
        Ok(()) => Data::String(s),
        Err(_) => {
            warn!("invalid date pattern '{pattern}'");
            Data::Timestamp(timestamp)
        }
    }
}

/// Memoized number format to chrono pattern translation
#[derive(Debug, Default)]
pub struct PatternCache {
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates a number format, reusing previous translations
    pub fn translate(&self, pattern: &str) -> Arc<str> {
        if let Ok(cache) = self.cache.read() {
            if let Some(cached) = cache.get(pattern) {
                return cached.clone();
            }
        }
        let translated: Arc<str> = Arc::from(translate_pattern(pattern));
        if let Ok(mut cache) = self.cache.write() {
            cache
                .entry(pattern.to_string())
                .or_insert_with(|| translated.clone())
                .clone()
        } else {
            translated
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Year(usize),
    /// Month or minute, decided by the neighbours
    M(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    Fraction,
    AmPm,
    Lit(char),
}

/// Translates a date number format (`yyyy-mm-dd hh:mm AM/PM`) into a chrono
/// pattern (`%Y-%m-%d %I:%M %p`)
///
/// Only the first section is used; colors, locale prefixes and fill
/// characters are dropped.
pub fn translate_pattern(format: &str) -> String {
    let tokens = tokenize(format);
    let twelve_hours = tokens.contains(&Token::AmPm);
    let mut out = String::with_capacity(format.len() * 2);
    for (i, tok) in tokens.iter().enumerate() {
        match *tok {
            Token::Year(n) if n <= 2 => out.push_str("%y"),
            Token::Year(_) => out.push_str("%Y"),
            Token::M(n) => {
                let minute = is_minute(&tokens, i);
                out.push_str(match (minute, n) {
                    (true, 1) => "%-M",
                    (true, _) => "%M",
                    (false, 1) => "%-m",
                    (false, 2) => "%m",
                    (false, 3) | (false, 5) => "%b",
                    (false, _) => "%B",
                });
            }
            Token::Day(1) => out.push_str("%-d"),
            Token::Day(2) => out.push_str("%d"),
            Token::Day(3) => out.push_str("%a"),
            Token::Day(_) => out.push_str("%A"),
            Token::Hour(n) => out.push_str(match (twelve_hours, n) {
                (true, 1) => "%-I",
                (true, _) => "%I",
                (false, 1) => "%-H",
                (false, _) => "%H",
            }),
            Token::Second(1) => out.push_str("%-S"),
            Token::Second(_) => out.push_str("%S"),
            Token::Fraction => out.push_str("%.3f"),
            Token::AmPm => out.push_str("%p"),
            Token::Lit('%') => out.push_str("%%"),
            Token::Lit(c) => out.push(c),
        }
    }
    out
}

/// `m` is a minute right after an hour or right before a second
fn is_minute(tokens: &[Token], i: usize) -> bool {
    let prev = tokens[..i].iter().rev().find(|t| !matches!(t, Token::Lit(_)));
    let next = tokens[i + 1..].iter().find(|t| !matches!(t, Token::Lit(_)));
    matches!(prev, Some(Token::Hour(_))) || matches!(next, Some(Token::Second(_)))
}

fn tokenize(format: &str) -> Vec<Token> {
    let chars: Vec<char> = format.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let run = |i: usize, c: char| {
        chars[i..]
            .iter()
            .take_while(|x| x.eq_ignore_ascii_case(&c))
            .count()
    };
    while i < chars.len() {
        let c = chars[i];
        match c {
            ';' => break,
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    tokens.push(Token::Lit(chars[i]));
                    i += 1;
                }
                i += 1;
            }
            '\\' => {
                if let Some(&n) = chars.get(i + 1) {
                    tokens.push(Token::Lit(n));
                }
                i += 2;
            }
            '_' => {
                tokens.push(Token::Lit(' '));
                i += 2;
            }
            '*' => i += 2,
            '[' => {
                let end = chars[i..].iter().position(|&x| x == ']').map(|p| i + p);
                let inner: String = match end {
                    Some(end) => chars[i + 1..end].iter().collect(),
                    None => String::new(),
                };
                // elapsed time
                match inner.to_ascii_lowercase().as_str() {
                    "h" | "hh" => tokens.push(Token::Hour(2)),
                    "m" | "mm" => tokens.push(Token::M(2)),
                    "s" | "ss" => tokens.push(Token::Second(2)),
                    _ => {}
                }
                i = end.map_or(chars.len(), |e| e + 1);
            }
            'y' | 'Y' | 'e' | 'E' => {
                let n = run(i, c);
                tokens.push(Token::Year(if c.eq_ignore_ascii_case(&'e') { 4 } else { n }));
                i += n;
            }
            'm' | 'M' => {
                let n = run(i, 'm');
                tokens.push(Token::M(n));
                i += n;
            }
            'd' | 'D' => {
                let n = run(i, 'd');
                tokens.push(Token::Day(n));
                i += n;
            }
            'h' | 'H' => {
                let n = run(i, 'h');
                tokens.push(Token::Hour(n));
                i += n;
            }
            's' | 'S' => {
                let n = run(i, 's');
                tokens.push(Token::Second(n));
                i += n;
            }
            '.' if matches!(tokens.last(), Some(Token::Second(_)))
                && chars.get(i + 1) == Some(&'0') =>
            {
                tokens.push(Token::Fraction);
                i += 1;
                while chars.get(i) == Some(&'0') {
                    i += 1;
                }
            }
            'a' | 'A' => {
                let rest: String = chars[i..].iter().take(5).collect();
                if rest.eq_ignore_ascii_case("am/pm") {
                    tokens.push(Token::AmPm);
                    i += 5;
                } else if chars[i..].len() >= 3
                    && chars[i + 1] == '/'
                    && chars[i + 2].eq_ignore_ascii_case(&'p')
                {
                    tokens.push(Token::AmPm);
                    i += 3;
                } else {
                    tokens.push(Token::Lit(c));
                    i += 1;
                }
            }
            _ => {
                tokens.push(Token::Lit(c));
                i += 1;
            }
        }
    }
    tokens
}
