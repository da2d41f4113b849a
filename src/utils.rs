// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Internal module providing handy function

use quick_xml::events::BytesRef;

macro_rules! from_err {
    ($from:ty, $to:tt, $var:tt) => {
        impl From<$from> for $to {
            fn from(e: $from) -> $to {
                $to::$var(e)
            }
        }
    };
}

/// Appends the text an xml entity reference stands for.
///
/// Character references are decoded, the five predefined entities are
/// resolved and anything else is written back verbatim.
pub(crate) fn unescape_entity_to_buffer(
    e: &BytesRef<'_>,
    buf: &mut String,
) -> Result<(), crate::XlsxError> {
    if let Some(c) = e.resolve_char_ref()? {
        buf.push(c);
        return Ok(());
    }
    let name = e.decode()?;
    match quick_xml::escape::resolve_predefined_entity(&name) {
        Some(s) => buf.push_str(s),
        None => {
            buf.push('&');
            buf.push_str(&name);
            buf.push(';');
        }
    }
    Ok(())
}

/// Parses an unsigned decimal attribute value, `None` when malformed.
#[inline]
pub(crate) fn parse_usize(v: &[u8]) -> Option<usize> {
    atoi_simd::parse::<usize>(v).ok()
}
