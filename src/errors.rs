// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Error classification
//!
//! Every [`XlsxError`] falls into one [`ErrorKind`], so callers can tell bad
//! input from a bad package or a misconfigured read without matching on
//! every variant.

use std::fmt;

use crate::xlsx::XlsxError;

/// Broad category of an [`XlsxError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed range or column
    Address,
    /// Sheet or defined name not found, or pointing elsewhere
    Lookup,
    /// Missing file, corrupt package or missing part
    Archive,
    /// Malformed xml in a part
    Parse,
    /// Invalid reading configuration
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Address => "address",
            ErrorKind::Lookup => "lookup",
            ErrorKind::Archive => "archive",
            ErrorKind::Parse => "parse",
            ErrorKind::Config => "config",
        })
    }
}

impl XlsxError {
    /// Category of the error
    ///
    /// ```
    /// use xlstream::{ErrorKind, XlsxError};
    ///
    /// let e = XlsxError::WorksheetNotFound("Data".to_string());
    /// assert_eq!(e.kind(), ErrorKind::Lookup);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            XlsxError::Address(_) => ErrorKind::Address,
            XlsxError::NoWorksheet
            | XlsxError::WorksheetNotFound(_)
            | XlsxError::WorksheetIdNotFound(_)
            | XlsxError::DefinedNameNotFound(_)
            | XlsxError::DefinedNameOtherSheet { .. } => ErrorKind::Lookup,
            XlsxError::Io(_)
            | XlsxError::Zip(_)
            | XlsxError::FileNotFound(_)
            | XlsxError::RelationshipNotFound(_)
            | XlsxError::UnsupportedCompression(_) => ErrorKind::Archive,
            XlsxError::Xml(_)
            | XlsxError::XmlAttr(_)
            | XlsxError::Encoding(_)
            | XlsxError::Escape(_)
            | XlsxError::ParseInt(_)
            | XlsxError::XmlEof(_)
            | XlsxError::Unrecognized { .. } => ErrorKind::Parse,
            XlsxError::InvalidResultMode(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressError;

    #[test]
    fn kinds() {
        assert_eq!(XlsxError::from(AddressError::Empty).kind(), ErrorKind::Address);
        assert_eq!(XlsxError::WorksheetIdNotFound(3).kind(), ErrorKind::Lookup);
        assert_eq!(
            XlsxError::FileNotFound("xl/workbook.xml".into()).kind(),
            ErrorKind::Archive
        );
        assert_eq!(XlsxError::XmlEof("row").kind(), ErrorKind::Parse);
        assert_eq!(XlsxError::InvalidResultMode("x").kind(), ErrorKind::Config);
        assert_eq!(ErrorKind::Config.to_string(), "config");
    }
}
